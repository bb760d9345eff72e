//! Per-call mutable state shared by the two relay loops.
//!
//! The provider loop and the speech-service loop both read and write a
//! [`CallSession`]. It lives behind one `parking_lot::Mutex`; every
//! read-modify-write below is a single method call made under that lock,
//! and the lock is never held across an `.await`.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Session shared between the loops of one call.
pub type SharedCallSession = Arc<Mutex<CallSession>>;

/// Playback state derived from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No AI response is being played
    Idle,
    /// AI response audio has been forwarded and may still be playing
    Speaking,
}

/// Outbound addressing for one forwarded AI chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackTicket {
    pub stream_id: String,
    pub mark: String,
}

/// What an interruption has to cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interruption {
    pub stream_id: String,
    pub item_id: String,
}

/// State of one call.
///
/// Invariant: `pending_marks` is empty whenever `in_flight_item` is `None`.
#[derive(Debug, Default)]
pub struct CallSession {
    stream_id: Option<String>,
    call_id: Option<String>,
    pending_marks: VecDeque<String>,
    in_flight_item: Option<String>,
    response_start_marker: Option<u64>,
    next_mark_seq: u64,
}

impl CallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCallSession {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    pub fn in_flight_item(&self) -> Option<&str> {
        self.in_flight_item.as_deref()
    }

    pub fn response_start_marker(&self) -> Option<u64> {
        self.response_start_marker
    }

    /// Marks sent but not yet acknowledged, oldest first.
    pub fn pending_marks(&self) -> &VecDeque<String> {
        &self.pending_marks
    }

    pub fn state(&self) -> CoordinatorState {
        if self.in_flight_item.is_some() {
            CoordinatorState::Speaking
        } else {
            CoordinatorState::Idle
        }
    }

    /// Record the provider's stream and call identifiers.
    pub fn start(&mut self, stream_id: impl Into<String>, call_id: Option<String>) {
        self.stream_id = Some(stream_id.into());
        self.call_id = call_id;
    }

    /// Account for one AI audio chunk about to be forwarded.
    ///
    /// Returns `None`, leaving the session untouched, when the stream id is
    /// not known yet. A chunk for a different item replaces the in-flight
    /// item and resets the start marker; pending marks are kept because
    /// their audio is still queued at the provider.
    pub fn record_audio_delta(
        &mut self,
        item_id: &str,
        timestamp: Option<u64>,
    ) -> Option<PlaybackTicket> {
        let stream_id = self.stream_id.clone()?;

        if self.in_flight_item.as_deref() != Some(item_id) {
            if self.in_flight_item.is_some() {
                self.response_start_marker = None;
            }
            self.in_flight_item = Some(item_id.to_string());
        }
        if self.response_start_marker.is_none() {
            self.response_start_marker = timestamp;
        }

        self.next_mark_seq += 1;
        let mark = format!("mark-{}", self.next_mark_seq);
        self.pending_marks.push_back(mark.clone());

        Some(PlaybackTicket { stream_id, mark })
    }

    /// Pop the oldest pending mark. No-op on an empty queue.
    pub fn acknowledge_mark(&mut self) -> Option<String> {
        self.pending_marks.pop_front()
    }

    /// Take what must be cancelled and reset playback state, atomically.
    ///
    /// Returns `None` unless audio is pending playback for an in-flight item.
    pub fn take_interruption(&mut self) -> Option<Interruption> {
        if self.pending_marks.is_empty() || self.in_flight_item.is_none() {
            return None;
        }
        let stream_id = self.stream_id.clone()?;
        let item_id = self.in_flight_item.take()?;
        self.pending_marks.clear();
        self.response_start_marker = None;
        Some(Interruption { stream_id, item_id })
    }
}
