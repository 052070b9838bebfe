//! # pcm-feedback-core
//!
//! Platform-agnostic core of the PCM feedback tool.
//!
//! Provides the stream models, the endpoint traits and the copy loop that
//! moves blocks from a capture endpoint to a playback endpoint. Platform
//! backends (Linux ALSA) implement `PcmBackend` and plug into the generic
//! `FeedbackSession`.
//!
//! ## Architecture
//!
//! ```text
//! pcm-feedback-core (this crate)
//! ├── traits/       ← PcmBackend, PcmEndpoint, SessionObserver
//! ├── models/       ← FeedbackError, SessionState, SessionConfig, PcmFormat, etc.
//! └── session/      ← FeedbackSession (copy loop), CancelToken
//! ```

pub mod models;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{DeviceAddress, DeviceId, Direction, PcmFormat};
pub use models::config::{SessionConfig, StreamConfig};
pub use models::error::FeedbackError;
pub use models::state::SessionState;
pub use models::transfer_report::{StopReason, TransferReport};
pub use session::cancel::CancelToken;
pub use session::feedback::{FeedbackSession, SessionSnapshot, SessionStatus};
pub use traits::pcm_backend::{PcmBackend, PcmEndpoint};
pub use traits::session_observer::SessionObserver;
