use std::fmt;

/// Feedback session state machine.
///
/// State transitions:
/// ```text
/// idle → opening capture → opening playback → streaming → closed
///              ↓                  ↓
///            closed             closed
/// ```
///
/// `Streaming` is the only looping state. Interrupt, read failure and write
/// failure all lead to `Closed` through the same cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    OpeningCapture,
    OpeningPlayback,
    Streaming,
    Closed,
}

impl SessionState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, OpeningCapture)
                | (OpeningCapture, OpeningPlayback)
                | (OpeningCapture, Closed)
                | (OpeningPlayback, Streaming)
                | (OpeningPlayback, Closed)
                | (Streaming, Closed)
                | (Closed, Idle)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::OpeningCapture => "opening capture",
            Self::OpeningPlayback => "opening playback",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
