//! Error taxonomy shared by every module.
//!
//! Each module has its own error enum; [`ErrorKind`] groups them by how a
//! caller is expected to react. Nothing in this crate retries on its own.

use std::fmt;

/// Broad classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Setup is wrong (duplicate registration, missing wiring). Abort startup.
    Configuration,
    /// A key, id, or category does not exist. Caller logic error.
    Lookup,
    /// A binding produced a value of a different type than requested.
    TypeMismatch,
    /// A lifecycle operation was called in a state that does not allow it.
    InvalidState,
    /// One or more scoped resources failed to release during teardown.
    ResourceRelease,
}

impl ErrorKind {
    /// Whether this kind should abort application startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Configuration)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Lookup => "lookup",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::ResourceRelease => "resource release",
        };
        f.write_str(name)
    }
}
