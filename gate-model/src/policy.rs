//! Rules and the policies that own them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::condition::ConditionGroup;
use crate::document::{PolicyDocument, RuleDocument};
use crate::error::{Result, ValidationError};

const DEFAULT_VERSION: &str = "v1";

/// A condition group plus the actions emitted when it matches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleDocument", into = "RuleDocument")]
pub struct Rule {
    id: String,
    description: Option<String>,
    conditions: ConditionGroup,
    actions: Vec<Action>,
    priority: i64,
}

impl Rule {
    /// Creates a rule with priority `0` and no description.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        conditions: ConditionGroup,
        actions: impl IntoIterator<Item = Action>,
    ) -> Self {
        Self {
            id: id.into(),
            description: None,
            conditions,
            actions: actions.into_iter().collect(),
            priority: 0,
        }
    }

    /// Sets the priority. Higher priorities are evaluated first.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Rule identifier, unique within its policy.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Conditions guarding the rule.
    #[must_use]
    pub fn conditions(&self) -> &ConditionGroup {
        &self.conditions
    }

    /// Actions emitted on match, in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Evaluation priority.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }
}

/// Named, versioned collection of rules.
///
/// A policy is immutable once built. Rule identifiers are guaranteed unique.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyDocument", into = "PolicyDocument")]
pub struct Policy {
    version: String,
    name: String,
    description: Option<String>,
    rules: Vec<Rule>,
}

impl Policy {
    /// Creates a policy with the default version.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateRuleId`] if two rules share an id.
    pub fn new(name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Result<Self> {
        Self::builder(name).rules(rules).build()
    }

    /// Starts building a [`Policy`].
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder {
            version: None,
            name: name.into(),
            description: None,
            rules: Vec::new(),
        }
    }

    /// Policy version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Looks up a rule by identifier.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }
}

/// Builder for [`Policy`].
#[derive(Debug)]
pub struct PolicyBuilder {
    version: Option<String>,
    name: String,
    description: Option<String>,
    rules: Vec<Rule>,
}

impl PolicyBuilder {
    /// Overrides the default `v1` version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets an optional description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends several rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Finalises the policy.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateRuleId`] if two rules share an id.
    pub fn build(self) -> Result<Policy> {
        let mut seen = HashSet::with_capacity(self.rules.len());
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(ValidationError::DuplicateRuleId {
                    id: rule.id.clone(),
                });
            }
        }

        Ok(Policy {
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
            name: self.name,
            description: self.description,
            rules: self.rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Operator};

    fn green_rule(id: &str) -> Rule {
        Rule::new(
            id,
            ConditionGroup::all([Condition::new("qa.status", Operator::Eq, "green")]),
            [Action::grant("start")],
        )
    }

    #[test]
    fn builder_applies_defaults() {
        let policy = Policy::builder("access_control")
            .description("start gating")
            .rule(green_rule("grant_on_green").with_priority(10))
            .build()
            .expect("policy");

        assert_eq!(policy.version(), "v1");
        assert_eq!(policy.name(), "access_control");
        assert_eq!(policy.description(), Some("start gating"));
        assert_eq!(policy.rules().len(), 1);
        assert_eq!(policy.rule("grant_on_green").map(Rule::priority), Some(10));
        assert!(policy.rule("missing").is_none());
    }

    #[test]
    fn duplicate_rule_ids_are_rejected() {
        let err = Policy::new("dupes", [green_rule("a"), green_rule("b"), green_rule("a")])
            .expect_err("duplicate");

        assert_eq!(err, ValidationError::DuplicateRuleId { id: "a".into() });
    }
}
