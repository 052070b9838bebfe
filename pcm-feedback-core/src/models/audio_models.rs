use std::fmt;

/// Stream direction of a PCM endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Capture,
    Playback,
}

impl Direction {
    /// Suffix used by the kernel for PCM device nodes (`c` or `p`).
    pub fn node_suffix(self) -> char {
        match self {
            Self::Capture => 'c',
            Self::Playback => 'p',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capture => f.write_str("capture"),
            Self::Playback => f.write_str("playback"),
        }
    }
}

/// Interleaved little-endian PCM sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcmFormat {
    S16Le,
    /// 24 significant bits stored in the low bytes of a 32-bit container.
    S24Le,
    S32Le,
}

impl PcmFormat {
    /// Maps a bit depth to a format. Only 16, 24 and 32 are supported.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(Self::S16Le),
            24 => Some(Self::S24Le),
            32 => Some(Self::S32Le),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::S16Le => 16,
            Self::S24Le => 24,
            Self::S32Le => 32,
        }
    }

    /// Bytes occupied by one sample in memory.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16Le => 2,
            Self::S24Le | Self::S32Le => 4,
        }
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S16Le => f.write_str("S16_LE"),
            Self::S24Le => f.write_str("S24_LE"),
            Self::S32Le => f.write_str("S32_LE"),
        }
    }
}

/// A sound card / device pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub card: u32,
    pub device: u32,
}

impl DeviceId {
    pub fn new(card: u32, device: u32) -> Self {
        Self { card, device }
    }
}

/// A PCM endpoint: a card/device pair opened in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    pub id: DeviceId,
    pub direction: Direction,
}

impl DeviceAddress {
    pub fn capture(id: DeviceId) -> Self {
        Self {
            id,
            direction: Direction::Capture,
        }
    }

    pub fn playback(id: DeviceId) -> Self {
        Self {
            id,
            direction: Direction::Playback,
        }
    }

    /// ALSA hardware PCM name, e.g. `hw:0,0`.
    pub fn hw_name(&self) -> String {
        format!("hw:{},{}", self.id.card, self.id.device)
    }

    /// Kernel device node, e.g. `/dev/snd/pcmC0D0c`.
    pub fn node_path(&self) -> String {
        format!(
            "/dev/snd/pcmC{}D{}{}",
            self.id.card,
            self.id.device,
            self.direction.node_suffix()
        )
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_path())
    }
}
