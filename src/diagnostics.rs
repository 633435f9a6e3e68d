use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Builder features subject to flag-usage reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Builder,
    Singular,
    Default,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Builder => write!(f, "builder"),
            Feature::Singular => write!(f, "singular"),
            Feature::Default => write!(f, "default"),
        }
    }
}

/// A non-fatal finding recorded while synthesizing a builder model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The parameter the finding is about, or `None` for the whole schema.
    pub parameter: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(parameter: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            parameter: parameter.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(p) => write!(f, "{}: `{}`: {}", self.severity, p, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}
