//! Column expression overrides
//!
//! A column expression changes the SQL fragment emitted for one column on
//! insert or update. The builder hands it the placeholder the value would
//! occupy; the value is bound there only when the rendered expression says
//! it consumes one.

use std::fmt::Debug;
use std::sync::Arc;

use config::TimestampPolicy;

/// Write operation a column expression is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL fragment for one column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedExpression {
    pub sql: String,
    /// Whether the column value is bound at the offered placeholder
    pub consumes_value: bool,
}

impl RenderedExpression {
    /// The bare placeholder
    pub fn placeholder(placeholder: &str) -> Self {
        Self {
            sql: placeholder.to_string(),
            consumes_value: true,
        }
    }

    /// A fragment that binds nothing
    pub fn literal(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            consumes_value: false,
        }
    }
}

pub trait ColumnExpression: Debug + Send + Sync {
    fn render_expression(&self, operation: Operation, placeholder: &str) -> RenderedExpression;

    /// Managed columns are written on `operation` even when the caller
    /// supplies no value for them.
    fn is_managed(&self, _operation: Operation) -> bool {
        false
    }
}

/// Wraps the value in a function call, e.g. `to_tsvector($2)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    function: String,
}

impl FunctionCall {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
        }
    }
}

impl ColumnExpression for FunctionCall {
    fn render_expression(&self, _operation: Operation, placeholder: &str) -> RenderedExpression {
        RenderedExpression {
            sql: format!("{}({})", self.function, placeholder),
            consumes_value: true,
        }
    }
}

/// Column set to `now()` by the database on the operations its policy covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedTimestamp {
    pub policy: TimestampPolicy,
}

impl ManagedTimestamp {
    pub fn new(policy: TimestampPolicy) -> Self {
        Self { policy }
    }

    fn manages(&self, operation: Operation) -> bool {
        matches!(
            (self.policy, operation),
            (TimestampPolicy::Both, _)
                | (TimestampPolicy::Insert, Operation::Insert)
                | (TimestampPolicy::Update, Operation::Update)
        )
    }
}

impl ColumnExpression for ManagedTimestamp {
    fn render_expression(&self, operation: Operation, placeholder: &str) -> RenderedExpression {
        if self.manages(operation) {
            RenderedExpression::literal("now()")
        } else {
            RenderedExpression::placeholder(placeholder)
        }
    }

    fn is_managed(&self, operation: Operation) -> bool {
        self.manages(operation)
    }
}

/// Column expressions registered for one table, in registration order
#[derive(Debug, Clone, Default)]
pub struct ColumnExpressions {
    entries: Vec<(String, Arc<dyn ColumnExpression>)>,
}

impl ColumnExpressions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `expression` for `column`, replacing any previous one
    pub fn register<E>(&mut self, column: impl Into<String>, expression: E)
    where
        E: ColumnExpression + 'static,
    {
        self.register_shared(column, Arc::new(expression));
    }

    pub fn register_shared(&mut self, column: impl Into<String>, expression: Arc<dyn ColumnExpression>) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = expression,
            None => self.entries.push((column, expression)),
        }
    }

    pub fn with<E>(mut self, column: impl Into<String>, expression: E) -> Self
    where
        E: ColumnExpression + 'static,
    {
        self.register(column, expression);
        self
    }

    pub fn get(&self, column: &str) -> Option<&dyn ColumnExpression> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, expression)| expression.as_ref())
    }

    /// Columns written by the database on `operation`
    pub fn managed_columns(&self, operation: Operation) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, expression)| expression.is_managed(operation))
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
