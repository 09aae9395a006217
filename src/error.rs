//! Error type shared by every fallible entry point.

use thiserror::Error;

/// Errors raised while building or running a simulation.
///
/// There are no transient failures here: every variant is a caller bug, surfaced
/// at call time rather than patched over mid-run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A precondition on the problem shape or configuration was violated
    /// (e.g. `K > N`, probability vector length mismatch, wrong list width).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A click probability is not a number in `[0, 1]`.
    #[error("invalid click model: arm {arm} has probability {p}")]
    InvalidModel {
        /// Offending arm index.
        arm: usize,
        /// The rejected value.
        p: f64,
    },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_arm_and_value() {
        let e = Error::InvalidModel { arm: 3, p: 1.5 };
        let s = e.to_string();
        assert!(s.contains("arm 3"), "{s}");
        assert!(s.contains("1.5"), "{s}");
    }
}
