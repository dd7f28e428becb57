//! Core error types for cspheader.

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Directive name not in the supported vocabulary
    #[error("unknown directive: {name}")]
    UnknownDirective {
        /// Name as supplied
        name: String,
    },

    /// Directive category name not recognized
    #[error("unknown directive category: {name}")]
    UnknownCategory {
        /// Name as supplied
        name: String,
    },
}
