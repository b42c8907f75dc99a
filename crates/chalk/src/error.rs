use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

use crate::resource::ResourceError;

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// The closed set of failure kinds runtime operations report.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>`
/// implementations. Kinds serialize in kebab-case, so an `ErrorKind` renders as
/// its canonical name (e.g. `MutatedDuringIteration` -> "mutated-during-iteration").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// A constructor or growth operation could not acquire memory.
    AllocationFailure,
    /// An operation received an operand of an unsupported type.
    TypeError,
    /// A list index was outside the valid range for the operation.
    IndexOutOfRange,
    /// An aggregate was structurally mutated while an iterator was live.
    MutatedDuringIteration,
    /// A host function returned a non-zero status.
    HostError,
}

/// A runtime error: a kind, a human-readable message, and for host failures
/// the routine's status code, surfaced unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError {
    kind: ErrorKind,
    message: String,
    status: Option<i32>,
}

impl RunError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Creates a `type-error` with the given message.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Creates an `index-out-of-range` error with the given message.
    pub fn index_out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexOutOfRange, message)
    }

    /// Creates the `mutated-during-iteration` error.
    ///
    /// Also used when a stale dictionary l-value slot is written: both cases
    /// are a borrowed handle outliving a structural mutation.
    pub fn mutated_during_iteration() -> Self {
        Self::new(
            ErrorKind::MutatedDuringIteration,
            "aggregate changed during iteration",
        )
    }

    /// Creates a `host-error` carrying a host routine's non-zero status code.
    pub fn host(status: i32, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::HostError,
            message: message.into(),
            status: Some(status),
        }
    }

    /// Creates a `type-error` for a call with the wrong argument count.
    pub fn arg_count(name: &str, expected: usize, got: usize) -> Self {
        Self::type_error(format!("{name}() expects {expected} arguments, got {got}"))
    }

    /// Creates a `type-error` for a call with an argument count outside a range.
    pub fn arg_range(name: &str, min: usize, max: usize, got: usize) -> Self {
        Self::type_error(format!(
            "{name}() expects {min} to {max} arguments, got {got}"
        ))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The host routine's status code, if this is a `host-error`.
    pub fn status(&self) -> Option<i32> {
        self.status
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status {status})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        Self::new(ErrorKind::AllocationFailure, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_render_as_canonical_names() {
        assert_eq!(ErrorKind::AllocationFailure.to_string(), "allocation-failure");
        assert_eq!(ErrorKind::TypeError.to_string(), "type-error");
        assert_eq!(ErrorKind::IndexOutOfRange.to_string(), "index-out-of-range");
        assert_eq!(
            ErrorKind::MutatedDuringIteration.to_string(),
            "mutated-during-iteration"
        );
        assert_eq!(ErrorKind::HostError.to_string(), "host-error");
    }

    #[test]
    fn host_error_keeps_status() {
        let err = RunError::host(7, "script hook failed");
        assert_eq!(err.kind(), ErrorKind::HostError);
        assert_eq!(err.status(), Some(7));
        assert_eq!(err.to_string(), "host-error: script hook failed (status 7)");
    }
}
