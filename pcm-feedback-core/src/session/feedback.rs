use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{SessionConfig, StreamConfig};
use crate::models::error::FeedbackError;
use crate::models::state::SessionState;
use crate::models::transfer_report::{StopReason, TransferReport};
use crate::session::cancel::CancelToken;
use crate::traits::pcm_backend::{PcmBackend, PcmEndpoint};
use crate::traits::session_observer::SessionObserver;

/// Progress of a session, readable from other threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub bytes: u64,
    pub blocks: u64,
}

impl SessionSnapshot {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            bytes: 0,
            blocks: 0,
        }
    }
}

/// Cloneable read-only view of a running session.
///
/// Handed to signal handlers and watchdogs that want to report where the
/// copy loop was when they fired.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    inner: Arc<Mutex<SessionSnapshot>>,
}

impl SessionStatus {
    pub fn snapshot(&self) -> SessionSnapshot {
        *self.inner.lock()
    }
}

/// Copies blocks from a capture endpoint to a playback endpoint.
///
/// Generic over the platform audio layer via `PcmBackend`. Data flow:
/// ```text
/// [capture endpoint] → read_block → [scratch buffer] → write_block → [playback endpoint]
/// ```
///
/// Endpoints and the scratch buffer live only for the duration of `run` and
/// are released on every exit path, so a session can be run again.
pub struct FeedbackSession<B: PcmBackend> {
    backend: B,
    config: SessionConfig,
    session_state: Arc<Mutex<SessionSnapshot>>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl<B: PcmBackend> FeedbackSession<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            session_state: Arc::new(Mutex::new(SessionSnapshot::new())),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    pub fn state(&self) -> SessionState {
        self.session_state.lock().state
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            inner: Arc::clone(&self.session_state),
        }
    }

    /// Open both endpoints and stream until `cancel` is set or a device fails.
    ///
    /// Open, allocation and configuration failures return `Err` and no
    /// frames were moved. Read and write failures end the loop and are
    /// reported through `TransferReport::stop_reason`.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<TransferReport, FeedbackError> {
        *self.session_state.lock() = SessionSnapshot::new();

        let stream = self.config.stream_config();
        let result = self.open_and_stream(&stream, cancel);

        if let Err(ref e) = result {
            log::error!("Feedback session failed: {}", e);
            if let Some(ref observer) = self.observer {
                observer.on_error(e);
            }
        }

        self.set_state(SessionState::Closed);
        result
    }

    // --- Internal helpers ---

    fn open_and_stream(
        &self,
        stream: &StreamConfig,
        cancel: &CancelToken,
    ) -> Result<TransferReport, FeedbackError> {
        self.set_state(SessionState::OpeningCapture);
        let mut capture = self.backend.open(self.config.capture_address(), stream)?;
        let capture_address = capture.address();
        log::debug!("Opened {} via {}", capture_address, self.backend.name());
        if let Some(ref observer) = self.observer {
            observer.on_endpoint_opened(&capture_address, stream);
        }

        // From here on `capture` is closed by its Drop on every early return.
        self.set_state(SessionState::OpeningPlayback);
        let mut playback = self.backend.open(self.config.playback_address(), stream)?;
        let playback_address = playback.address();
        log::debug!("Opened {} via {}", playback_address, self.backend.name());
        if let Some(ref observer) = self.observer {
            observer.on_endpoint_opened(&playback_address, stream);
        }

        let buffer_frames = capture.buffer_size_frames();
        let block_bytes = capture.frames_to_bytes(buffer_frames);
        if block_bytes == 0 {
            return Err(FeedbackError::ConfigurationFailed(format!(
                "{} reported an empty buffer",
                capture_address
            )));
        }

        log::info!(
            "Scratch buffer: {} bytes ({} frames) per block",
            block_bytes,
            buffer_frames
        );
        if let Some(ref observer) = self.observer {
            observer.on_buffer_sized(block_bytes, buffer_frames);
        }

        let mut buffer: Vec<u8> = Vec::new();
        buffer
            .try_reserve_exact(block_bytes)
            .map_err(|_| FeedbackError::AllocationFailed { bytes: block_bytes })?;
        buffer.resize(block_bytes, 0);

        self.set_state(SessionState::Streaming);
        let (bytes, blocks, stop_reason) =
            self.stream_blocks(&mut capture, &mut playback, &mut buffer, cancel);

        let report = TransferReport {
            frames: capture.bytes_to_frames(bytes),
            bytes,
            blocks,
            block_bytes,
            stop_reason,
        };
        log::info!(
            "Streaming stopped after {} blocks ({} frames): {:?}",
            report.blocks,
            report.frames,
            report.stop_reason
        );
        if let Some(ref observer) = self.observer {
            observer.on_streaming_finished(&report);
        }

        drop(buffer);
        drop(playback);
        drop(capture);
        Ok(report)
    }

    /// The streaming loop. Returns bytes moved, blocks moved, and why it stopped.
    fn stream_blocks(
        &self,
        capture: &mut B::Endpoint,
        playback: &mut B::Endpoint,
        buffer: &mut [u8],
        cancel: &CancelToken,
    ) -> (u64, u64, StopReason) {
        let mut bytes: u64 = 0;
        let mut blocks: u64 = 0;

        let stop_reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Interrupted;
            }

            if let Err(e) = capture.read_block(buffer) {
                log::warn!("Capture stopped: {}", e);
                if let Some(ref observer) = self.observer {
                    observer.on_error(&e);
                }
                break StopReason::ReadFailed(e);
            }

            if let Err(e) = playback.write_block(buffer) {
                log::error!("Playback write failed: {}", e);
                if let Some(ref observer) = self.observer {
                    observer.on_error(&e);
                }
                break StopReason::WriteFailed(e);
            }

            bytes += buffer.len() as u64;
            blocks += 1;
            {
                let mut s = self.session_state.lock();
                s.bytes = bytes;
                s.blocks = blocks;
            }
            log::trace!("Block {} copied ({} bytes total)", blocks, bytes);
        };

        (bytes, blocks, stop_reason)
    }

    fn set_state(&self, new_state: SessionState) {
        {
            let mut s = self.session_state.lock();
            if !s.state.can_transition_to(new_state) && s.state != new_state {
                log::debug!("Unexpected state transition {} -> {}", s.state, new_state);
            }
            s.state = new_state;
        }
        if let Some(ref observer) = self.observer {
            observer.on_state_changed(new_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::{DeviceAddress, DeviceId, Direction};

    /// Everything the scripted backend saw, in order.
    #[derive(Debug, Default)]
    struct Journal {
        opened: Vec<DeviceAddress>,
        closed: Vec<DeviceAddress>,
        reads: u64,
        writes: u64,
        /// First byte of every written block.
        written_tags: Vec<u8>,
    }

    #[derive(Debug, Clone)]
    struct Script {
        fail_open: Option<Direction>,
        buffer_frames: u64,
        frame_bytes: usize,
        fail_read_at: Option<u64>,
        fail_write_at: Option<u64>,
        cancel_after_writes: Option<u64>,
    }

    impl Script {
        fn for_config(config: &SessionConfig) -> Self {
            Self {
                fail_open: None,
                buffer_frames: u64::from(config.period_size),
                frame_bytes: config.stream_config().frame_bytes(),
                fail_read_at: None,
                fail_write_at: None,
                cancel_after_writes: None,
            }
        }
    }

    struct ScriptedBackend {
        script: Script,
        journal: Arc<Mutex<Journal>>,
        cancel: CancelToken,
    }

    struct ScriptedEndpoint {
        address: DeviceAddress,
        script: Script,
        journal: Arc<Mutex<Journal>>,
        cancel: CancelToken,
    }

    impl Drop for ScriptedEndpoint {
        fn drop(&mut self) {
            self.journal.lock().closed.push(self.address);
        }
    }

    impl PcmEndpoint for ScriptedEndpoint {
        fn address(&self) -> DeviceAddress {
            self.address
        }

        fn buffer_size_frames(&self) -> u64 {
            self.script.buffer_frames
        }

        fn frames_to_bytes(&self, frames: u64) -> usize {
            frames as usize * self.script.frame_bytes
        }

        fn bytes_to_frames(&self, bytes: u64) -> u64 {
            bytes / self.script.frame_bytes as u64
        }

        fn read_block(&mut self, buf: &mut [u8]) -> Result<(), FeedbackError> {
            let mut j = self.journal.lock();
            j.reads += 1;
            if self.script.fail_read_at == Some(j.reads) {
                return Err(FeedbackError::Device {
                    address: self.address,
                    message: "Input/output error".into(),
                });
            }
            buf.fill(j.reads as u8);
            Ok(())
        }

        fn write_block(&mut self, buf: &[u8]) -> Result<(), FeedbackError> {
            let mut j = self.journal.lock();
            j.writes += 1;
            if self.script.fail_write_at == Some(j.writes) {
                return Err(FeedbackError::Device {
                    address: self.address,
                    message: "Broken pipe".into(),
                });
            }
            j.written_tags.push(buf[0]);
            if self.script.cancel_after_writes == Some(j.writes) {
                self.cancel.cancel();
            }
            Ok(())
        }
    }

    impl PcmBackend for ScriptedBackend {
        type Endpoint = ScriptedEndpoint;

        fn name(&self) -> &str {
            "scripted"
        }

        fn open(
            &self,
            address: DeviceAddress,
            _config: &StreamConfig,
        ) -> Result<ScriptedEndpoint, FeedbackError> {
            if self.script.fail_open == Some(address.direction) {
                return Err(FeedbackError::OpenFailed {
                    address,
                    message: "No such device".into(),
                });
            }
            self.journal.lock().opened.push(address);
            Ok(ScriptedEndpoint {
                address,
                script: self.script.clone(),
                journal: Arc::clone(&self.journal),
                cancel: self.cancel.clone(),
            })
        }
    }

    /// Records every state change.
    #[derive(Default)]
    struct StateLog {
        states: Mutex<Vec<SessionState>>,
        errors: Mutex<Vec<FeedbackError>>,
        buffer_sizes: Mutex<Vec<(usize, u64)>>,
        endpoints: Mutex<Vec<DeviceAddress>>,
    }

    impl SessionObserver for StateLog {
        fn on_state_changed(&self, state: SessionState) {
            self.states.lock().push(state);
        }

        fn on_endpoint_opened(&self, address: &DeviceAddress, _config: &StreamConfig) {
            self.endpoints.lock().push(*address);
        }

        fn on_buffer_sized(&self, bytes: usize, frames: u64) {
            self.buffer_sizes.lock().push((bytes, frames));
        }

        fn on_error(&self, error: &FeedbackError) {
            self.errors.lock().push(error.clone());
        }
    }

    fn session(
        config: SessionConfig,
        script: Script,
    ) -> (FeedbackSession<ScriptedBackend>, Arc<Mutex<Journal>>, CancelToken) {
        let journal = Arc::new(Mutex::new(Journal::default()));
        let cancel = CancelToken::new();
        let backend = ScriptedBackend {
            script,
            journal: Arc::clone(&journal),
            cancel: cancel.clone(),
        };
        (FeedbackSession::new(backend, config), journal, cancel)
    }

    fn capture_addr() -> DeviceAddress {
        DeviceAddress::capture(DeviceId::new(0, 0))
    }

    fn playback_addr() -> DeviceAddress {
        DeviceAddress::playback(DeviceId::new(1, 1))
    }

    #[test]
    fn interrupt_after_n_blocks_reports_n_periods() {
        let config = SessionConfig::default();
        let script = Script {
            cancel_after_writes: Some(5),
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);

        let report = session.run(&cancel).unwrap();

        assert_eq!(report.stop_reason, StopReason::Interrupted);
        assert_eq!(report.blocks, 5);
        assert_eq!(report.frames, 5 * 1024);
        assert_eq!(report.bytes, 5 * 4096);
        assert_eq!(report.block_bytes, 4096);

        let j = journal.lock();
        assert_eq!(j.opened, vec![capture_addr(), playback_addr()]);
        assert_eq!(j.closed, vec![playback_addr(), capture_addr()]);
    }

    #[test]
    fn blocks_are_written_unchanged() {
        let config = SessionConfig::default();
        let script = Script {
            cancel_after_writes: Some(3),
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);

        session.run(&cancel).unwrap();

        assert_eq!(journal.lock().written_tags, vec![1, 2, 3]);
    }

    #[test]
    fn capture_open_failure_never_opens_playback() {
        let config = SessionConfig::default();
        let script = Script {
            fail_open: Some(Direction::Capture),
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);

        let err = session.run(&cancel).unwrap_err();

        assert!(matches!(
            err,
            FeedbackError::OpenFailed { address, .. } if address == capture_addr()
        ));
        let j = journal.lock();
        assert!(j.opened.is_empty());
        assert!(j.closed.is_empty());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn playback_open_failure_closes_capture() {
        let config = SessionConfig::default();
        let script = Script {
            fail_open: Some(Direction::Playback),
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);

        let err = session.run(&cancel).unwrap_err();

        assert!(matches!(
            err,
            FeedbackError::OpenFailed { address, .. } if address == playback_addr()
        ));
        let j = journal.lock();
        assert_eq!(j.opened, vec![capture_addr()]);
        assert_eq!(j.closed, vec![capture_addr()]);
        assert_eq!(j.reads, 0);
    }

    #[test]
    fn write_failure_after_k_blocks() {
        let config = SessionConfig {
            period_size: 256,
            ..SessionConfig::default()
        };
        let script = Script {
            fail_write_at: Some(4),
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);
        let observer = Arc::new(StateLog::default());
        session.set_observer(observer.clone());

        let report = session.run(&cancel).unwrap();

        assert_eq!(report.blocks, 3);
        assert_eq!(report.frames, 3 * 256);
        assert!(matches!(report.stop_reason, StopReason::WriteFailed(_)));
        assert_eq!(observer.errors.lock().len(), 1);

        let j = journal.lock();
        assert_eq!(j.closed.len(), 2);
    }

    #[test]
    fn read_failure_is_a_soft_stop() {
        let config = SessionConfig::default();
        let script = Script {
            fail_read_at: Some(3),
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);

        let report = session.run(&cancel).unwrap();

        assert_eq!(report.blocks, 2);
        assert_eq!(report.frames, 2 * 1024);
        match report.stop_reason {
            StopReason::ReadFailed(ref e) => assert_eq!(e.address(), Some(&capture_addr())),
            ref other => panic!("unexpected stop reason {:?}", other),
        }
        assert_eq!(journal.lock().closed.len(), 2);
    }

    #[test]
    fn cancelled_before_start_moves_nothing() {
        let config = SessionConfig::default();
        let script = Script::for_config(&config);
        let (mut session, journal, cancel) = session(config, script);
        cancel.cancel();

        let report = session.run(&cancel).unwrap();

        assert_eq!(report.frames, 0);
        assert_eq!(report.blocks, 0);
        assert_eq!(report.stop_reason, StopReason::Interrupted);
        let j = journal.lock();
        assert_eq!(j.reads, 0);
        assert_eq!(j.closed.len(), 2);
    }

    #[test]
    fn empty_capture_buffer_is_rejected() {
        let config = SessionConfig::default();
        let script = Script {
            buffer_frames: 0,
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);

        let err = session.run(&cancel).unwrap_err();

        assert!(matches!(err, FeedbackError::ConfigurationFailed(_)));
        assert_eq!(journal.lock().closed, vec![playback_addr(), capture_addr()]);
    }

    #[test]
    fn allocation_failure_closes_both_endpoints() {
        let config = SessionConfig::default();
        let script = Script {
            buffer_frames: (isize::MAX as u64) / 4,
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);
        let observer = Arc::new(StateLog::default());
        session.set_observer(observer.clone());

        let err = session.run(&cancel).unwrap_err();

        let expected_bytes = ((isize::MAX as u64) / 4) as usize * 4;
        assert_eq!(err, FeedbackError::AllocationFailed { bytes: expected_bytes });
        // Buffer geometry is reported before the allocation is attempted.
        assert_eq!(
            *observer.buffer_sizes.lock(),
            vec![(expected_bytes, (isize::MAX as u64) / 4)]
        );
        assert_eq!(observer.errors.lock().len(), 1);
        assert_eq!(*observer.endpoints.lock(), vec![capture_addr(), playback_addr()]);

        let j = journal.lock();
        assert_eq!(j.reads, 0);
        assert_eq!(j.closed, vec![playback_addr(), capture_addr()]);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn frames_use_capture_buffer_size() {
        let config = SessionConfig::default();
        let script = Script {
            buffer_frames: 4096,
            cancel_after_writes: Some(2),
            ..Script::for_config(&config)
        };
        let (mut session, _journal, cancel) = session(config, script);

        let report = session.run(&cancel).unwrap();

        assert_eq!(report.block_bytes, 4096 * 4);
        assert_eq!(report.frames, 2 * 4096);
    }

    #[test]
    fn state_sequence_for_interrupted_run() {
        let config = SessionConfig::default();
        let script = Script {
            cancel_after_writes: Some(1),
            ..Script::for_config(&config)
        };
        let (mut session, _journal, cancel) = session(config, script);
        let observer = Arc::new(StateLog::default());
        session.set_observer(observer.clone());

        session.run(&cancel).unwrap();

        assert_eq!(
            *observer.states.lock(),
            vec![
                SessionState::OpeningCapture,
                SessionState::OpeningPlayback,
                SessionState::Streaming,
                SessionState::Closed,
            ]
        );
    }

    #[test]
    fn status_reflects_progress() {
        let config = SessionConfig::default();
        let script = Script {
            cancel_after_writes: Some(2),
            ..Script::for_config(&config)
        };
        let (mut session, _journal, cancel) = session(config, script);
        let status = session.status();

        session.run(&cancel).unwrap();

        let snapshot = status.snapshot();
        assert_eq!(snapshot.state, SessionState::Closed);
        assert_eq!(snapshot.blocks, 2);
        assert_eq!(snapshot.bytes, 2 * 4096);
    }

    #[test]
    fn second_run_is_independent() {
        let config = SessionConfig::default();
        let script = Script {
            cancel_after_writes: Some(2),
            ..Script::for_config(&config)
        };
        let (mut session, journal, cancel) = session(config, script);

        let first = session.run(&cancel).unwrap();
        assert_eq!(first.blocks, 2);

        // The scripted counters keep running, so the second run stops on a
        // fresh cancel issued after its first block.
        let second_cancel = CancelToken::new();
        session.backend.cancel = second_cancel.clone();
        session.backend.script.cancel_after_writes = Some(3);
        let second = session.run(&second_cancel).unwrap();

        assert_eq!(second.blocks, 1);
        assert_eq!(second.frames, 1024);

        let j = journal.lock();
        assert_eq!(j.opened.len(), 4);
        assert_eq!(j.closed.len(), 4);
    }
}
