pub mod codec;
pub mod interruption;
pub mod realtime;
pub mod session;
pub mod telephony;

// Re-export commonly used types for convenience
pub use codec::{AudioCaptureBuffer, CodecError};

pub use interruption::InterruptionCoordinator;

pub use realtime::{
    RealtimeError, RealtimeResult, SpeechEventStream, SpeechServiceClient, SpeechServiceConfig,
    SpeechServiceEvent, SpeechServiceHandle,
};

pub use session::{CallSession, CoordinatorState, SharedCallSession};

pub use telephony::{ProviderEvent, ProviderOutbound, TelephonyError};
