//! Human-readable progress lines on stdout.

use pcm_feedback_core::models::audio_models::DeviceAddress;
use pcm_feedback_core::models::config::SessionConfig;
use pcm_feedback_core::models::state::SessionState;
use pcm_feedback_core::traits::session_observer::SessionObserver;

/// Prints buffer geometry and stream descriptions as the session comes up.
///
/// Failures are not printed here; they reach stderr through the logger.
pub struct ConsoleObserver {
    config: SessionConfig,
}

impl ConsoleObserver {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_state_changed(&self, state: SessionState) {
        log::debug!("Session {}", state);
        if state.is_streaming() {
            let capture = self.config.capture_address();
            let playback = self.config.playback_address();
            println!("{}", describe_stream("Read sample", "from", &capture, &self.config));
            println!("{}", describe_stream("Write sample", "to", &playback, &self.config));
        }
    }

    fn on_buffer_sized(&self, bytes: usize, frames: u64) {
        println!("buffer size {}", bytes);
        println!("pcm_get_buffer_size {}", frames);
    }
}

/// e.g. `Read sample: 2 ch, 48000 hz, 16 bit from /dev/snd/pcmC0D0c`
pub fn describe_stream(
    action: &str,
    preposition: &str,
    address: &DeviceAddress,
    config: &SessionConfig,
) -> String {
    format!(
        "{}: {} ch, {} hz, {} bit {} {}",
        action,
        config.channels,
        config.rate,
        config.format.bits(),
        preposition,
        address.node_path()
    )
}
