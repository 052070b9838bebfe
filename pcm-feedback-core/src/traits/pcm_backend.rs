use crate::models::audio_models::DeviceAddress;
use crate::models::config::StreamConfig;
use crate::models::error::FeedbackError;

/// An open PCM stream bound to one card/device pair in one direction.
///
/// Implemented by:
/// - `AlsaEndpoint` (Linux)
///
/// Dropping the endpoint closes the underlying device handle. Calls block
/// until the whole block has been moved or the device reports an error.
pub trait PcmEndpoint {
    /// The card/device/direction this endpoint was opened on.
    fn address(&self) -> DeviceAddress;

    /// Size of the device buffer in frames, as negotiated at open time.
    fn buffer_size_frames(&self) -> u64;

    fn frames_to_bytes(&self, frames: u64) -> usize;

    fn bytes_to_frames(&self, bytes: u64) -> u64;

    /// Fill `buf` completely with captured frames.
    fn read_block(&mut self, buf: &mut [u8]) -> Result<(), FeedbackError>;

    /// Play all of `buf`.
    fn write_block(&mut self, buf: &[u8]) -> Result<(), FeedbackError>;
}

/// Opens PCM endpoints for a platform audio layer.
pub trait PcmBackend {
    type Endpoint: PcmEndpoint;

    /// Short backend name for diagnostics (e.g. "alsa").
    fn name(&self) -> &str;

    /// Open `address` with `config` applied.
    ///
    /// A handle that opens but is not ready for I/O is reported as
    /// `FeedbackError::OpenFailed`, the same as a failed open.
    fn open(
        &self,
        address: DeviceAddress,
        config: &StreamConfig,
    ) -> Result<Self::Endpoint, FeedbackError>;
}
