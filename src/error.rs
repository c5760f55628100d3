use std::fmt;

/// Errors raised by the block alignment core.
///
/// Every variant is scoped to a single example. The operations are
/// deterministic, so none of them is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    /// Malformed call, e.g. a negative block count.
    InvalidArgument(String),
    /// The primary stream has fewer blocks than the stream it must cover.
    InconsistentBlockCount { primary: usize, reference: usize },
    /// Word-level data and the block structure it is laid over disagree.
    BlockCountMismatch { expected: usize, found: usize },
    /// Reconciliation left nothing to feed the model.
    EmptyResult,
    /// The terminal marker cannot fit into `max_length`.
    LengthExceeded { length: usize, max_length: usize },
    /// Token ids could not be decoded back to text.
    DecodeFailure(String),
}

impl AlignError {
    /// True for anomalies the caller should skip and log rather than abort on.
    pub fn is_skippable(&self) -> bool {
        match self {
            AlignError::EmptyResult => true,
            AlignError::InvalidArgument(_)
            | AlignError::InconsistentBlockCount { .. }
            | AlignError::BlockCountMismatch { .. }
            | AlignError::LengthExceeded { .. }
            | AlignError::DecodeFailure(_) => false,
        }
    }
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            AlignError::InconsistentBlockCount { primary, reference } => write!(
                f,
                "primary stream has {primary} block(s) but reference has {reference}"
            ),
            AlignError::BlockCountMismatch { expected, found } => {
                write!(f, "expected {expected} block(s), found {found}")
            }
            AlignError::EmptyResult => write!(f, "reconciled sequence is empty"),
            AlignError::LengthExceeded { length, max_length } => {
                write!(f, "sequence length {length} exceeds max length {max_length}")
            }
            AlignError::DecodeFailure(msg) => write!(f, "decode failure: {msg}"),
        }
    }
}

impl std::error::Error for AlignError {}
