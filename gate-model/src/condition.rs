//! Conditions and the combinators that group them.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{ConditionDocument, ConditionGroupDocument};
use crate::error::{Result, ValidationError};

/// Comparison operator applied between a resolved fact and a literal value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `in`: the fact is a member of the literal collection.
    In,
    /// `not_in`: if the fact is a list, the literal is absent from it;
    /// otherwise the fact is absent from the literal collection.
    NotIn,
    /// `contains`: the literal is a member of the fact collection.
    Contains,
}

impl Operator {
    /// Every supported operator, in symbol table order.
    pub const ALL: [Self; 9] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Ge,
        Self::Le,
        Self::In,
        Self::NotIn,
        Self::Contains,
    ];

    /// Returns the textual symbol used in policy documents.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Contains => "contains",
        }
    }

    /// Returns true for the ordering operators (`>`, `<`, `>=`, `<=`).
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Ge | Self::Le)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| ValidationError::UnknownOperator {
                operator: s.to_owned(),
            })
    }
}

/// A single `field <operator> value` comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConditionDocument", into = "ConditionDocument")]
pub struct Condition {
    field: String,
    operator: Operator,
    value: Value,
}

impl Condition {
    /// Creates a condition from an already resolved operator.
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Creates a condition from an operator symbol such as `">="`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownOperator`] when the symbol is not
    /// recognised.
    pub fn parse(
        field: impl Into<String>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<Self> {
        Ok(Self::new(field, operator.parse()?, value))
    }

    /// Dot-delimited path into the fact context.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Operator applied to the resolved fact.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Literal value the fact is compared against.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Boolean combinator over a rule's conditions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "ConditionGroupDocument",
    into = "ConditionGroupDocument"
)]
pub enum ConditionGroup {
    /// Matches when every condition matches. An empty list matches.
    All(Vec<Condition>),
    /// Matches when at least one condition matches. An empty list never matches.
    Any(Vec<Condition>),
}

impl ConditionGroup {
    /// Builds an `all` group.
    #[must_use]
    pub fn all<I>(conditions: I) -> Self
    where
        I: IntoIterator<Item = Condition>,
    {
        Self::All(conditions.into_iter().collect())
    }

    /// Builds an `any` group.
    #[must_use]
    pub fn any<I>(conditions: I) -> Self
    where
        I: IntoIterator<Item = Condition>,
    {
        Self::Any(conditions.into_iter().collect())
    }

    /// Returns the grouped conditions in declaration order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        match self {
            Self::All(conditions) | Self::Any(conditions) => conditions,
        }
    }
}
