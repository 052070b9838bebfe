use super::error::FeedbackError;

/// Why the streaming loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation token was set.
    Interrupted,

    /// Reading from the capture endpoint failed. A soft stop.
    ReadFailed(FeedbackError),

    /// Writing to the playback endpoint failed.
    WriteFailed(FeedbackError),
}

/// Result returned when a feedback session finishes streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Frames copied, measured in capture-endpoint frames.
    pub frames: u64,
    pub bytes: u64,
    pub blocks: u64,
    /// Size of the scratch buffer moved per read/write.
    pub block_bytes: usize,
    pub stop_reason: StopReason,
}
