//! Error types for the rules engine.

use gate_model::{Operator, ValidationError};
use thiserror::Error;

/// Operand shapes an operator cannot be applied to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandMismatch {
    /// Ordering requested between values that have no common order.
    #[error("cannot order {actual} against {expected}")]
    Unordered {
        /// JSON type of the resolved fact.
        actual: &'static str,
        /// JSON type of the literal.
        expected: &'static str,
    },
    /// Membership requested on a value that is not a collection.
    #[error("{operand} is not a list, string or object")]
    NotIterable {
        /// JSON type of the offending operand.
        operand: &'static str,
    },
    /// Substring search requested with a needle that is not a string.
    #[error("cannot search a string for a {needle}")]
    NotSubstring {
        /// JSON type of the needle.
        needle: &'static str,
    },
}

/// A condition could not be evaluated against the supplied facts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rule `{rule_id}`: `{field} {operator} ...` failed: {kind}")]
pub struct EvaluationError {
    rule_id: String,
    field: String,
    operator: Operator,
    #[source]
    kind: OperandMismatch,
}

impl EvaluationError {
    pub(crate) fn new(
        rule_id: impl Into<String>,
        field: impl Into<String>,
        operator: Operator,
        kind: OperandMismatch,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            field: field.into(),
            operator,
            kind,
        }
    }

    /// Identifier of the rule whose condition failed.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Fact path of the failing condition.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Operator of the failing condition.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Describes the operand mismatch.
    #[must_use]
    pub fn kind(&self) -> &OperandMismatch {
        &self.kind
    }
}

/// Errors surfaced through the [`crate::PolicyEngine`] seam.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A condition could not be evaluated.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    /// A replacement policy failed validation.
    #[error("invalid policy: {0}")]
    Validation(#[from] ValidationError),
    /// The fact context was malformed.
    #[error("invalid fact context: {0}")]
    InvalidContext(&'static str),
    /// The active policy lock was poisoned by a panicking writer.
    #[error("active policy lock poisoned")]
    Poisoned,
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
