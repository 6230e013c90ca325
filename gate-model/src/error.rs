//! Validation errors raised while constructing policies.

use thiserror::Error;

/// Result alias used throughout the policy model.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors that can occur while building or deserializing a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The operator symbol is not part of the supported set.
    #[error("unknown operator `{operator}`")]
    UnknownOperator {
        /// The offending operator symbol.
        operator: String,
    },

    /// The action type is not one of `grant`, `deny`, `alert` or `log`.
    #[error("unknown action type `{action_type}`")]
    UnknownActionType {
        /// The offending action type string.
        action_type: String,
    },

    /// A condition group declared neither `all` nor `any`.
    #[error("condition group must declare `all` or `any`")]
    MissingCombinator,

    /// A condition group declared both `all` and `any`.
    #[error("condition group must declare only one of `all` or `any`")]
    AmbiguousCombinator,

    /// Two rules in the same policy share an identifier.
    #[error("duplicate rule id `{id}`")]
    DuplicateRuleId {
        /// The repeated rule identifier.
        id: String,
    },

    /// A rule failed validation.
    #[error("invalid rule `{rule_id}`: {source}")]
    Rule {
        /// Identifier of the rule being validated.
        rule_id: String,
        /// Underlying validation failure.
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Wraps an error with the identifier of the rule it was raised for.
    #[must_use]
    pub fn in_rule(self, rule_id: impl Into<String>) -> Self {
        Self::Rule {
            rule_id: rule_id.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping rule context wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Rule { source, .. } => source.root(),
            other => other,
        }
    }
}
