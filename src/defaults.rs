//! Explicit-vs-unset tracking for defaulted parameters.
//!
//! Whether a parameter was ever touched is tracked apart from its stored
//! value: an explicit empty string or a cleared collection is a real value
//! and must win over the default.

use crate::schema::DefaultExpr;
use crate::value::Value;

/// Unset sentinel for one parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetState {
    is_set: bool,
}

impl SetState {
    pub fn unset() -> Self {
        Self { is_set: false }
    }

    /// Records an explicit assignment, add, or clear.
    pub fn mark(&mut self) {
        self.is_set = true;
    }

    pub fn is_set(self) -> bool {
        self.is_set
    }
}

/// Where a resolved argument came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The accumulated or assigned value, possibly the zero value.
    Current,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: Value,
    pub source: Source,
}

/// Picks the argument for one parameter at build time.
///
/// `current` is only called when the current value is used, and the default
/// is evaluated only when the parameter is unset, once per call.
pub fn resolve<F>(state: SetState, default: Option<&DefaultExpr>, current: F) -> Resolution
where
    F: FnOnce() -> Value,
{
    match default {
        Some(expr) if !state.is_set() => Resolution {
            value: expr.evaluate(),
            source: Source::Default,
        },
        _ => Resolution {
            value: current(),
            source: Source::Current,
        },
    }
}
