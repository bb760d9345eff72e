//! Media stream WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::stream::media_stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media stream WebSocket router
///
/// # Endpoint
///
/// `GET /stream` - WebSocket upgrade for one call's media stream
///
/// # Protocol
///
/// The provider sends JSON text frames: `connected`, `start`, `media`,
/// `mark` and `stop`. The server answers with `media`, `mark` and `clear`
/// frames addressed by the stream SID received in `start`.
pub fn create_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stream", get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
