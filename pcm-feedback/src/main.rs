//! pcm-feedback
//!
//! Reads a capture PCM and writes every block unchanged to a playback PCM
//! until interrupted, to check that a hardware feedback path carries audio.
//! Card and device identify `/dev/snd/pcmC{CARD}D{DEVICE}{c|p}`. Channels,
//! rate and bit depth are the same on both sides.

mod args;
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod console;

use std::process::ExitCode;

use pcm_feedback_core::{CancelToken, FeedbackError, SessionConfig, TransferReport};

use crate::args::ArgsError;

/// `-EINVAL` as the shell sees it.
const EXIT_USAGE: u8 = 234;
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let mut argv = std::env::args();
    let program = argv.next().unwrap_or_else(|| "pcm-feedback".into());

    let parsed = match args::parse(argv) {
        Ok(parsed) => parsed,
        Err(ArgsError::Usage(_)) => {
            eprintln!("{}", args::usage(&program));
            return ExitCode::from(EXIT_USAGE);
        }
        Err(e @ ArgsError::UnsupportedBitDepth(_)) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    parsed.log_problems();

    let cancel = CancelToken::new();
    let frames = match run_session(parsed.config, &cancel) {
        Ok(report) => report.frames,
        // Already logged by the session.
        Err(_) => 0,
    };

    println!("R/W {} frames", frames);
    ExitCode::SUCCESS
}

#[cfg(target_os = "linux")]
fn run_session(
    config: SessionConfig,
    cancel: &CancelToken,
) -> Result<TransferReport, FeedbackError> {
    use std::sync::Arc;

    use pcm_feedback_alsa::AlsaBackend;
    use pcm_feedback_core::FeedbackSession;

    use crate::console::ConsoleObserver;

    let mut session = FeedbackSession::new(AlsaBackend::new(), config.clone());
    session.set_observer(Arc::new(ConsoleObserver::new(config)));
    install_interrupt_handler(cancel.clone(), session.status());
    session.run(cancel)
}

#[cfg(not(target_os = "linux"))]
fn run_session(
    _config: SessionConfig,
    _cancel: &CancelToken,
) -> Result<TransferReport, FeedbackError> {
    let err = FeedbackError::ConfigurationFailed("no PCM backend on this platform".into());
    log::error!("Feedback session failed: {}", err);
    Err(err)
}

/// Ctrl+C stops the copy loop after the current block. A second Ctrl+C exits.
#[cfg(target_os = "linux")]
fn install_interrupt_handler(cancel: CancelToken, status: pcm_feedback_core::SessionStatus) {
    let result = ctrlc::set_handler(move || {
        if cancel.cancel() {
            eprintln!("Interrupted again, exiting");
            std::process::exit(130);
        }
        let snapshot = status.snapshot();
        log::info!(
            "Interrupt received while {} after {} blocks, stopping",
            snapshot.state,
            snapshot.blocks
        );
    });
    if let Err(e) = result {
        log::warn!("Unable to install Ctrl+C handler: {}", e);
    }
}
