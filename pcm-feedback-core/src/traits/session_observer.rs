use crate::models::config::StreamConfig;
use crate::models::error::FeedbackError;
use crate::models::audio_models::DeviceAddress;
use crate::models::state::SessionState;
use crate::models::transfer_report::TransferReport;

/// Event observer for feedback session notifications.
///
/// All methods are called synchronously from the thread running the copy
/// loop. Only `on_state_changed` is required.
pub trait SessionObserver {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: SessionState);

    /// Called once per endpoint after it opened successfully.
    fn on_endpoint_opened(&self, _address: &DeviceAddress, _config: &StreamConfig) {}

    /// Called with the scratch buffer size, before it is allocated.
    fn on_buffer_sized(&self, _bytes: usize, _frames: u64) {}

    /// Called when an error ends the session or the streaming loop.
    fn on_error(&self, _error: &FeedbackError) {}

    /// Called when streaming finishes, before the endpoints are closed.
    fn on_streaming_finished(&self, _report: &TransferReport) {}
}
