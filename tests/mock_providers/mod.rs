//! Mock Provider Servers
//!
//! Stand-ins for the remote services the gateway talks to:
//! - WebSocket speech service (OpenAI Realtime style)

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod realtime_mock;

pub use realtime_mock::{Handshake, RealtimeMock, close_directive, spawn_realtime_mock};
