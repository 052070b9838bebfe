//! ALSA PCM endpoint.
//!
//! Opens a hardware PCM (`hw:CARD,DEVICE`) in blocking interleaved mode and
//! moves whole blocks of bytes in and out of it.
//!
//! ## Differences from a plain `snd_pcm_readi`/`snd_pcm_writei` loop
//! - Short transfers are continued until the block is complete
//! - Overruns and underruns are recovered and counted, a few times per block
//! - The sample rate must be granted exactly; period geometry may be adjusted

use alsa::pcm::{Access, Format, Frames, HwParams, State, PCM};
use alsa::ValueOr;

use pcm_feedback_core::models::audio_models::{DeviceAddress, Direction, PcmFormat};
use pcm_feedback_core::models::config::StreamConfig;
use pcm_feedback_core::models::error::FeedbackError;
use pcm_feedback_core::traits::pcm_backend::PcmEndpoint;

/// Xrun recoveries allowed while moving a single block.
const MAX_RECOVERIES_PER_BLOCK: u32 = 3;

pub(crate) fn alsa_format(format: PcmFormat) -> Format {
    match format {
        PcmFormat::S16Le => Format::S16LE,
        PcmFormat::S24Le => Format::S24LE,
        PcmFormat::S32Le => Format::S32LE,
    }
}

pub(crate) fn alsa_direction(direction: Direction) -> alsa::Direction {
    match direction {
        Direction::Capture => alsa::Direction::Capture,
        Direction::Playback => alsa::Direction::Playback,
    }
}

/// A blocking ALSA PCM stream.
///
/// The handle is closed when the endpoint is dropped.
pub struct AlsaEndpoint {
    address: DeviceAddress,
    pcm: PCM,
    buffer_frames: u64,
    frame_bytes: usize,
    xruns: u64,
}

impl AlsaEndpoint {
    /// Open `address` and apply `config`.
    ///
    /// Sequence:
    /// 1. Open `hw:CARD,DEVICE` in blocking mode
    /// 2. Set access, format, channels, rate, period size, period count
    /// 3. Apply non-zero start/stop thresholds
    /// 4. Prepare and confirm the stream is ready
    pub fn open(address: DeviceAddress, config: &StreamConfig) -> Result<Self, FeedbackError> {
        let open_err = move |e: alsa::Error| FeedbackError::OpenFailed {
            address,
            message: e.to_string(),
        };

        let pcm = PCM::new(&address.hw_name(), alsa_direction(address.direction), false)
            .map_err(open_err)?;

        {
            let hwp = HwParams::any(&pcm).map_err(open_err)?;
            hwp.set_access(Access::RWInterleaved).map_err(open_err)?;
            hwp.set_format(alsa_format(config.format)).map_err(open_err)?;
            hwp.set_channels(config.channels).map_err(open_err)?;
            hwp.set_rate(config.rate, ValueOr::Nearest).map_err(open_err)?;
            hwp.set_period_size(config.period_size as Frames, ValueOr::Nearest)
                .map_err(open_err)?;
            hwp.set_periods(config.period_count, ValueOr::Nearest)
                .map_err(open_err)?;
            pcm.hw_params(&hwp).map_err(open_err)?;
        }

        let (rate, period_size, periods, buffer_size) = {
            let current = pcm.hw_params_current().map_err(open_err)?;
            (
                current.get_rate().map_err(open_err)?,
                current.get_period_size().map_err(open_err)?,
                current.get_periods().map_err(open_err)?,
                current.get_buffer_size().map_err(open_err)?,
            )
        };

        if rate != config.rate {
            return Err(FeedbackError::OpenFailed {
                address,
                message: format!(
                    "rate {} Hz not supported (device offers {} Hz)",
                    config.rate, rate
                ),
            });
        }
        if period_size != config.period_size as Frames || periods != config.period_count {
            log::warn!(
                "{}: requested {}x{} frames, device granted {}x{}",
                address,
                config.period_count,
                config.period_size,
                periods,
                period_size
            );
        }

        if config.start_threshold > 0 || config.stop_threshold > 0 {
            let swp = pcm.sw_params_current().map_err(open_err)?;
            if config.start_threshold > 0 {
                swp.set_start_threshold(config.start_threshold as Frames)
                    .map_err(open_err)?;
            }
            if config.stop_threshold > 0 {
                swp.set_stop_threshold(config.stop_threshold as Frames)
                    .map_err(open_err)?;
            }
            pcm.sw_params(&swp).map_err(open_err)?;
        }

        pcm.prepare().map_err(open_err)?;
        let state = pcm.state();
        if state != State::Prepared {
            return Err(FeedbackError::OpenFailed {
                address,
                message: format!("device not ready (state {:?})", state),
            });
        }

        let frame_bytes = pcm.frames_to_bytes(1) as usize;
        log::debug!(
            "{}: {} ch, {} Hz, {}, buffer {} frames, {} bytes/frame",
            address,
            config.channels,
            rate,
            config.format,
            buffer_size,
            frame_bytes
        );

        Ok(Self {
            address,
            pcm,
            buffer_frames: buffer_size.max(0) as u64,
            frame_bytes,
            xruns: 0,
        })
    }

    fn device_error(&self, message: String) -> FeedbackError {
        FeedbackError::Device {
            address: self.address,
            message,
        }
    }

    /// Recover from a transfer error, or give up and return it.
    fn recover(&mut self, err: alsa::Error, recoveries: &mut u32) -> Result<(), FeedbackError> {
        let message = err.to_string();
        if *recoveries >= MAX_RECOVERIES_PER_BLOCK {
            return Err(self.device_error(message));
        }
        self.pcm
            .try_recover(err, true)
            .map_err(|_| self.device_error(message.clone()))?;
        *recoveries += 1;
        self.xruns += 1;
        log::warn!("{}: recovered from {} (xrun #{})", self.address, message, self.xruns);
        Ok(())
    }
}

impl PcmEndpoint for AlsaEndpoint {
    fn address(&self) -> DeviceAddress {
        self.address
    }

    fn buffer_size_frames(&self) -> u64 {
        self.buffer_frames
    }

    fn frames_to_bytes(&self, frames: u64) -> usize {
        frames as usize * self.frame_bytes
    }

    fn bytes_to_frames(&self, bytes: u64) -> u64 {
        match self.frame_bytes {
            0 => 0,
            n => bytes / n as u64,
        }
    }

    fn read_block(&mut self, buf: &mut [u8]) -> Result<(), FeedbackError> {
        let mut offset = 0;
        let mut recoveries = 0;
        while offset < buf.len() {
            let result = self.pcm.io_bytes().readi(&mut buf[offset..]);
            match result {
                Ok(0) => return Err(self.device_error("capture returned no frames".into())),
                Ok(frames) => offset += frames * self.frame_bytes,
                Err(e) => self.recover(e, &mut recoveries)?,
            }
        }
        Ok(())
    }

    fn write_block(&mut self, buf: &[u8]) -> Result<(), FeedbackError> {
        let mut offset = 0;
        let mut recoveries = 0;
        while offset < buf.len() {
            let result = self.pcm.io_bytes().writei(&buf[offset..]);
            match result {
                Ok(0) => return Err(self.device_error("playback accepted no frames".into())),
                Ok(frames) => offset += frames * self.frame_bytes,
                Err(e) => self.recover(e, &mut recoveries)?,
            }
        }
        Ok(())
    }
}

impl Drop for AlsaEndpoint {
    fn drop(&mut self) {
        log::debug!("Closing {} ({} xruns)", self.address, self.xruns);
    }
}
