//! Error types for BLK parsing and serialization.

use thiserror::Error;

/// Errors that can occur while parsing or serializing BLK text.
///
/// Path lookups never produce these: a path that does not resolve is a
/// `None`/`false` result, since callers routinely probe speculative paths.
#[derive(Error, Debug)]
pub enum BlkError {
    /// A character that the grammar does not allow in the current parser state.
    #[error("unexpected character {ch:?} at line {line}, column {column} (offset {offset}) while {state}")]
    Grammar {
        offset: usize,
        line: usize,
        column: usize,
        ch: char,
        state: &'static str,
    },

    /// Input ended in the middle of an entry.
    #[error("unexpected end of input at line {line}, column {column} while {state}")]
    UnexpectedEof {
        line: usize,
        column: usize,
        state: &'static str,
    },

    /// A quoted value was opened but never closed.
    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("unknown type {0:?}")]
    UnknownTypeTag(String),

    /// Only `yes`, `true`, `no` and `false` are accepted, case-sensitively.
    #[error("unknown boolean value {0:?}")]
    InvalidBooleanLiteral(String),

    /// A `p2`/`p3`/`p4` value carried the wrong number of components.
    #[error("expected {expected} values, got {actual}")]
    PointArityMismatch { expected: usize, actual: usize },

    /// A numeric lexeme that failed conversion for its declared type.
    #[error("invalid {tag} value {token:?}")]
    InvalidNumber { tag: &'static str, token: String },

    #[error("invalid matrix format {0:?}")]
    InvalidMatrix(String),

    /// Block nesting went past the configured `max_depth`.
    #[error("block nesting exceeds maximum depth of {limit} at line {line}")]
    DepthExceeded { limit: usize, line: usize },

    /// A standalone `<type>=<value>` literal that did not hold exactly one value.
    #[error("invalid value literal {0:?}")]
    InvalidLiteral(String),

    /// The serializer met a value or key the text format cannot express.
    #[error("cannot serialize {key:?}: {reason}")]
    UnsupportedValue { key: String, reason: String },

    /// JSON export failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A path in text form (`a/b/#0`) could not be parsed.
    #[error("invalid path {0:?}")]
    InvalidPath(String),
}

impl BlkError {
    /// True for errors caused by malformed source text. Callers should abort
    /// before applying any mutation when they see one of these.
    pub fn is_source_error(&self) -> bool {
        !matches!(
            self,
            BlkError::UnsupportedValue { .. } | BlkError::InvalidPath(_) | BlkError::Json(_)
        )
    }
}

/// Convenience alias used throughout blk-core.
pub type Result<T> = std::result::Result<T, BlkError>;
