use thiserror::Error;

use super::audio_models::DeviceAddress;

/// Errors that can occur while running a feedback session.
///
/// Device errors carry the backend's own error string so diagnostics show
/// what the driver reported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("unable to open PCM {} device {address} ({message})", .address.direction)]
    OpenFailed {
        address: DeviceAddress,
        message: String,
    },

    #[error("{address}: {message}")]
    Device {
        address: DeviceAddress,
        message: String,
    },

    #[error("unable to allocate {bytes} bytes")]
    AllocationFailed { bytes: usize },

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}

impl FeedbackError {
    /// The endpoint this error refers to, if any.
    pub fn address(&self) -> Option<&DeviceAddress> {
        match self {
            Self::OpenFailed { address, .. } | Self::Device { address, .. } => Some(address),
            _ => None,
        }
    }
}
