use super::audio_models::{DeviceAddress, DeviceId, PcmFormat};

/// Configuration for one feedback session.
///
/// Built once at startup from the command line and consumed by
/// `FeedbackSession`. Channel count, rate and block geometry are passed
/// through to the device unchecked; the device decides what it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Capture card/device (default: 0/0).
    pub input: DeviceId,

    /// Playback card/device (default: 1/1).
    pub output: DeviceId,

    /// Interleaved channel count (default: 2).
    pub channels: u32,

    /// Sample rate in Hz (default: 48000).
    pub rate: u32,

    /// Sample format (default: S16_LE).
    pub format: PcmFormat,

    /// Frames per period (default: 1024).
    pub period_size: u32,

    /// Number of periods in the device buffer (default: 4).
    pub period_count: u32,
}

impl SessionConfig {
    pub fn capture_address(&self) -> DeviceAddress {
        DeviceAddress::capture(self.input)
    }

    pub fn playback_address(&self) -> DeviceAddress {
        DeviceAddress::playback(self.output)
    }

    /// The stream parameters shared by both endpoints.
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            channels: self.channels,
            rate: self.rate,
            format: self.format,
            period_size: self.period_size,
            period_count: self.period_count,
            start_threshold: 0,
            stop_threshold: 0,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input: DeviceId::new(0, 0),
            output: DeviceId::new(1, 1),
            channels: 2,
            rate: 48000,
            format: PcmFormat::S16Le,
            period_size: 1024,
            period_count: 4,
        }
    }
}

/// Hardware and software parameters applied to a PCM endpoint.
///
/// Threshold fields of 0 leave the device default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub channels: u32,
    pub rate: u32,
    pub format: PcmFormat,
    pub period_size: u32,
    pub period_count: u32,
    pub start_threshold: u32,
    pub stop_threshold: u32,
}

impl StreamConfig {
    /// Bytes in one interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.format.bytes_per_sample()
    }

    /// Total frames the device buffer holds when the requested geometry is granted.
    pub fn buffer_frames(&self) -> u64 {
        u64::from(self.period_size) * u64::from(self.period_count)
    }
}
