//! HTTP and WebSocket request handlers
//!
//! This module organizes all handlers into logical groups:
//! - `api` - Health check endpoint
//! - `voice` - Telephony webhooks (incoming call, stream status)
//! - `stream` - Media stream WebSocket (relay and capture modes)

pub mod api;
pub mod stream;
pub mod voice;

// Re-export commonly used handlers for convenient access
pub use stream::media_stream_handler;
