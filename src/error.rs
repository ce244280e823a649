use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A colouring operation was requested from a strategy that cannot perform it.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("unknown {kind} '{name}'")]
    UnknownStrategy { kind: &'static str, name: String },

    #[error("SCR data must be {expected} bytes, got {actual}")]
    ScrLength { expected: usize, actual: usize },

    #[error("malformed tape data: {0}")]
    MalformedTape(String),
}

pub type Result<T> = std::result::Result<T, Error>;
