//! # pcm-feedback-alsa
//!
//! Linux ALSA backend for pcm-feedback.
//!
//! Provides:
//! - `AlsaBackend` — Opens `hw:CARD,DEVICE` PCMs for the core `FeedbackSession`
//! - `AlsaEndpoint` — Blocking interleaved capture/playback stream with xrun recovery
//!
//! ## Platform Requirements
//! - Linux with ALSA (`libasound` and its headers for linking)
//!
//! ## Usage
//! ```ignore
//! use pcm_feedback_alsa::AlsaBackend;
//! use pcm_feedback_core::{CancelToken, FeedbackSession, SessionConfig};
//!
//! let mut session = FeedbackSession::new(AlsaBackend::new(), SessionConfig::default());
//! let report = session.run(&CancelToken::new())?;
//! ```

#[cfg(target_os = "linux")]
pub mod alsa_backend;
#[cfg(target_os = "linux")]
pub mod alsa_pcm;

#[cfg(target_os = "linux")]
pub use alsa_backend::AlsaBackend;
#[cfg(target_os = "linux")]
pub use alsa_pcm::AlsaEndpoint;
