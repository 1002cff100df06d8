//! Error types for the review engine.

use thiserror::Error;

/// All possible errors from the review engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("score out of range: {0} (expected 0..=100)")]
    ScoreOutOfRange(i64),

    #[error("unknown update status code: {0}")]
    UnknownStatus(i64),

    #[error("unknown delete replay policy: {0}")]
    UnknownDeleteReplay(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::ScoreOutOfRange(101);
        assert_eq!(err.to_string(), "score out of range: 101 (expected 0..=100)");

        let err = Error::UnknownStatus(7);
        assert_eq!(err.to_string(), "unknown update status code: 7");

        let err = Error::UnknownDeleteReplay("sometimes".into());
        assert_eq!(err.to_string(), "unknown delete replay policy: sometimes");
    }
}
