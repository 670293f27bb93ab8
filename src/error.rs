use thiserror::Error;

/// Fatal decode errors. Recoverable anomalies (unknown event codes, unknown
/// inter-dive codes) are not represented here; they are encoded directly in
/// the output as described in the sample/event types.
#[derive(Debug, Error)]
pub enum CochranError {
    #[error("truncated input: needed at least {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    #[error("unknown file format byte 0x{0:02X}")]
    UnknownFormat(u8),

    #[error("unknown model id {0:?}")]
    UnknownModel([u8; 3]),

    #[error("corrupt dive at index {index}: {reason}")]
    CorruptDive { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, CochranError>;
