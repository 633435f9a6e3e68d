use crate::diagnostics::Feature;
use thiserror::Error;

/// Reasons a schema cannot be turned into a builder model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Schema violation on `{parameter}`: {reason}")]
    SchemaViolation { parameter: String, reason: String },

    #[error("Naming collision: method `{method}` is generated as both the {first} and the {second}")]
    NamingCollision {
        method: String,
        first: String,
        second: String,
    },

    #[error("Use of the {feature} feature on `{subject}` is forbidden by flag-usage policy")]
    FlagUsage { feature: Feature, subject: String },
}

impl SynthesisError {
    pub(crate) fn violation(parameter: &str, reason: impl Into<String>) -> Self {
        SynthesisError::SchemaViolation {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}

pub type SynthResult<T> = Result<T, SynthesisError>;

/// Reasons a builder method call is rejected. A rejected call leaves the
/// builder unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("No builder method named `{0}`")]
    UnknownMethod(String),

    #[error("`{method}` is a {actual}, not a {expected}")]
    WrongMethodKind {
        method: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Type mismatch for `{parameter}`: expected {expected}, got {found}")]
    TypeMismatch {
        parameter: String,
        expected: String,
        found: String,
    },
}

pub type CallResult<T> = Result<T, CallError>;

/// Reasons `build` fails. Construction errors are passed through unchanged.
#[derive(Error, Debug)]
pub enum BuildError<E> {
    #[error("{0}")]
    Construction(E),

    #[error("Default for `{parameter}` produced {found}, expected {expected}")]
    DefaultType {
        parameter: String,
        expected: String,
        found: String,
    },
}

impl<E> BuildError<E> {
    /// The construct capability's own error, if that is what failed.
    pub fn into_construction(self) -> Option<E> {
        match self {
            BuildError::Construction(e) => Some(e),
            BuildError::DefaultType { .. } => None,
        }
    }
}

pub type BuildResult<T, E> = Result<T, BuildError<E>>;
