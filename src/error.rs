//! Error types.
//!
//! Each failure domain has its own enum: [`FormatError`] for reading
//! FJSPLIB text, [`ModelError`] for compiling an instance into a CP model,
//! and [`GeneratorError`] for random instance generation. Write failures
//! are plain `std::io::Error`s and are not wrapped.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised while reading an FJSPLIB instance.
///
/// Line numbers are 1-based physical line numbers of the input, so they
/// count blank lines even though those are otherwise ignored.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("expected a header line and at least one job line, found {found} non-blank line(s)")]
    TooFewLines { found: usize },

    #[error("line {line}: invalid token {token:?}, expected a non-negative number")]
    InvalidToken { line: usize, token: String },

    #[error("line {line}: header is missing the {field}")]
    MissingHeaderField {
        line: usize,
        field: &'static str,
    },

    #[error("invalid dimensions: {num_jobs} job(s), {num_machines} machine(s)")]
    InvalidDimensions {
        num_jobs: usize,
        num_machines: usize,
    },

    #[error("header declares {declared} job(s) but {found} job line(s) follow")]
    JobCountMismatch { declared: usize, found: usize },

    #[error("line {line}: operation {operation} ends after {found} of {expected} machine/duration pair(s)")]
    TruncatedOperation {
        line: usize,
        operation: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {count} token(s) left after the declared operations")]
    TrailingTokens { line: usize, count: usize },

    #[error("line {line}: job declares {declared} operation(s) but the line holds {found}")]
    OperationCountMismatch {
        line: usize,
        declared: usize,
        found: usize,
    },

    #[error("line {line}: operation {operation} has no eligible machines")]
    EmptyOperation { line: usize, operation: usize },

    #[error("line {line}: machine {machine} is outside [1, {num_machines}]")]
    MachineOutOfRange {
        line: usize,
        machine: usize,
        num_machines: usize,
    },

    #[error("line {line}: machine {machine} listed twice for operation {operation}")]
    DuplicateMachine {
        line: usize,
        operation: usize,
        machine: usize,
    },
}

/// Errors raised while compiling an instance into a CP model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("operation {operation} has no eligible modes")]
    EmptyOperation { operation: usize },

    #[error("instance failed validation with {} error(s): {}", .0.len(), summarize(.0))]
    InvalidInstance(Vec<ValidationError>),

    #[error("horizon must be non-negative, got {horizon}")]
    InvalidHorizon { horizon: i64 },

    #[error("undefined {kind} {index}")]
    UndefinedReference { kind: &'static str, index: usize },
}

/// Errors raised by the random instance generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_format_error_messages() {
        let err = FormatError::MachineOutOfRange {
            line: 3,
            machine: 4,
            num_machines: 3,
        };
        assert_eq!(err.to_string(), "line 3: machine 4 is outside [1, 3]");

        let err = FormatError::TooFewLines { found: 1 };
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FormatError = io.into();
        assert!(matches!(err, FormatError::Io(_)));
    }

    #[test]
    fn test_invalid_instance_summary() {
        let err = ModelError::InvalidInstance(vec![
            ValidationError::new(ValidationErrorKind::MachineOutOfRange, "op 0 uses machine 7"),
            ValidationError::new(ValidationErrorKind::CyclicPrecedence, "cycle at op 1"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("op 0 uses machine 7; cycle at op 1"));
    }
}
