//! Policy model for the vehicle gate decision engine.
//!
//! A [`Policy`] is an ordered set of [`Rule`]s. Each rule guards a list of
//! [`Action`]s with a [`ConditionGroup`] of field comparisons. Values are
//! validated when they are built or deserialized, so a constructed policy
//! never carries unknown operators or action types.

#![warn(missing_docs, clippy::pedantic)]

mod action;
mod condition;
mod document;
mod error;
mod policy;

/// Actions emitted by matching rules.
pub use action::{Action, ActionType};
/// Field comparisons and their combinators.
pub use condition::{Condition, ConditionGroup, Operator};
/// Serialized mirrors of the model, as found in rule files.
pub use document::{
    ActionDocument, ConditionDocument, ConditionGroupDocument, PolicyDocument, RuleDocument,
};
/// Error type and result alias for policy construction.
pub use error::{Result, ValidationError};
/// Policies, rules and the policy builder.
pub use policy::{Policy, PolicyBuilder, Rule};

/// Literal values and fact snapshots are plain JSON values.
pub use serde_json::Value as Fact;
