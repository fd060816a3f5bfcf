use serde::{Deserialize, Serialize};
use serde_json::Value;

/// SQL text with positional placeholders and the values bound to them.
///
/// `values[i]` binds `$(i+1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub values: Vec<Value>,
}

impl Query {
    pub fn new(text: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            text: text.into(),
            values,
        }
    }

    /// A statement without parameters
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }
}
