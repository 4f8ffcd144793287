//! Value conversion errors

use thiserror::Error;

/// Errors raised while converting between literal text and values
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueError {
    /// Literal text could not be parsed as the requested kind
    #[error("Cannot parse {input:?} as {kind}")]
    Parse {
        /// Kind that was requested
        kind: String,
        /// Offending input
        input: String,
    },

    /// The kind has no literal form (objects, classifiers)
    #[error("Values of kind {kind} have no literal form")]
    NoLiteralForm {
        /// Kind that was requested
        kind: String,
    },
}
