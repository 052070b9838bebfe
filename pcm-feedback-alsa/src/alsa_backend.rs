use pcm_feedback_core::models::audio_models::DeviceAddress;
use pcm_feedback_core::models::config::StreamConfig;
use pcm_feedback_core::models::error::FeedbackError;
use pcm_feedback_core::traits::pcm_backend::PcmBackend;

use crate::alsa_pcm::AlsaEndpoint;

/// Opens hardware PCMs through ALSA.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaBackend;

impl AlsaBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PcmBackend for AlsaBackend {
    type Endpoint = AlsaEndpoint;

    fn name(&self) -> &str {
        "alsa"
    }

    fn open(
        &self,
        address: DeviceAddress,
        config: &StreamConfig,
    ) -> Result<AlsaEndpoint, FeedbackError> {
        log::debug!("Opening {} ({})", address, address.hw_name());
        AlsaEndpoint::open(address, config)
    }
}
