//! The capability set a poll target must provide

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::locator::Locator;

/// Errors reported by a [`Handle`] operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandleError {
    #[error("no element matches {0}")]
    NotFound(Locator),

    #[error("script error: {0}")]
    Script(String),

    #[error("driver error: {0}")]
    Driver(String),
}

/// A reference to live state owned by someone else.
///
/// Waiters only read through it. `execute` is the one exception: the script
/// may have side effects, and repeating it safely is the caller's concern.
pub trait Handle {
    /// Element reference. Equality must mean "same underlying node".
    type Element: Clone + PartialEq + fmt::Debug;

    /// Find the first element matching `locator`.
    fn locate(&self, locator: &Locator) -> Result<Self::Element, HandleError>;

    /// Read an attribute; `None` when the element does not carry it.
    fn attribute(&self, element: &Self::Element, name: &str)
        -> Result<Option<String>, HandleError>;

    /// Existence check that does not treat absence as an error.
    fn is_present(&self, locator: &Locator) -> Result<bool, HandleError>;

    /// Run a script and return its result.
    fn execute(&self, script: &str) -> Result<Value, HandleError>;
}

/// JavaScript truthiness of a script result.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
