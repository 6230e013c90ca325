//! Serialized shape of policy documents.
//!
//! These mirror types carry operators and action types as plain strings, the
//! way they appear in JSON or YAML rule files. Converting a document into the
//! typed model runs the same validation as programmatic construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::{Action, ActionType};
use crate::condition::{Condition, ConditionGroup};
use crate::error::{Result, ValidationError};
use crate::policy::{Policy, Rule};

fn default_version() -> String {
    "v1".to_owned()
}

/// Serialized form of a [`Policy`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Policy version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Policy name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rule definitions.
    #[serde(default)]
    pub rules: Vec<RuleDocument>,
}

/// Serialized form of a [`Rule`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    /// Rule identifier.
    pub id: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object holding either an `all` or an `any` list.
    pub conditions: ConditionGroupDocument,
    /// Actions to emit on match.
    pub actions: Vec<ActionDocument>,
    /// Evaluation priority, higher first.
    #[serde(default)]
    pub priority: i64,
}

/// Serialized form of a [`ConditionGroup`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroupDocument {
    /// AND-combined conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<ConditionDocument>>,
    /// OR-combined conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<ConditionDocument>>,
}

/// Serialized form of a [`Condition`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionDocument {
    /// Dot-delimited fact path.
    pub field: String,
    /// Operator symbol such as `==` or `not_in`.
    pub operator: String,
    /// Literal compared against the fact.
    pub value: Value,
}

/// Serialized form of an [`Action`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDocument {
    /// One of `grant`, `deny`, `alert`, `log`.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Capability scope, e.g. `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Grant lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
    /// Reason attached to grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Message attached to denials and advisories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TryFrom<ConditionDocument> for Condition {
    type Error = ValidationError;

    fn try_from(doc: ConditionDocument) -> Result<Self> {
        Condition::parse(doc.field, &doc.operator, doc.value)
    }
}

impl From<Condition> for ConditionDocument {
    fn from(condition: Condition) -> Self {
        Self {
            field: condition.field().to_owned(),
            operator: condition.operator().symbol().to_owned(),
            value: condition.value().clone(),
        }
    }
}

fn parse_conditions(docs: Vec<ConditionDocument>) -> Result<Vec<Condition>> {
    docs.into_iter().map(Condition::try_from).collect()
}

impl TryFrom<ConditionGroupDocument> for ConditionGroup {
    type Error = ValidationError;

    fn try_from(doc: ConditionGroupDocument) -> Result<Self> {
        match (doc.all, doc.any) {
            (Some(all), None) => Ok(Self::All(parse_conditions(all)?)),
            (None, Some(any)) => Ok(Self::Any(parse_conditions(any)?)),
            (Some(_), Some(_)) => Err(ValidationError::AmbiguousCombinator),
            (None, None) => Err(ValidationError::MissingCombinator),
        }
    }
}

impl From<ConditionGroup> for ConditionGroupDocument {
    fn from(group: ConditionGroup) -> Self {
        match group {
            ConditionGroup::All(conditions) => Self {
                all: Some(conditions.into_iter().map(Into::into).collect()),
                any: None,
            },
            ConditionGroup::Any(conditions) => Self {
                all: None,
                any: Some(conditions.into_iter().map(Into::into).collect()),
            },
        }
    }
}

impl TryFrom<ActionDocument> for Action {
    type Error = ValidationError;

    fn try_from(doc: ActionDocument) -> Result<Self> {
        let action_type: ActionType = doc.action_type.parse()?;
        Ok(Action::from_parts(
            action_type,
            doc.scope,
            doc.ttl_seconds,
            doc.reason,
            doc.message,
        ))
    }
}

impl From<Action> for ActionDocument {
    fn from(action: Action) -> Self {
        Self {
            action_type: action.action_type().as_str().to_owned(),
            scope: action.scope().map(str::to_owned),
            ttl_seconds: action.ttl_seconds(),
            reason: action.reason().map(str::to_owned),
            message: action.message().map(str::to_owned),
        }
    }
}

impl TryFrom<RuleDocument> for Rule {
    type Error = ValidationError;

    fn try_from(doc: RuleDocument) -> Result<Self> {
        let RuleDocument {
            id,
            description,
            conditions,
            actions,
            priority,
        } = doc;

        let parsed = ConditionGroup::try_from(conditions).and_then(|conditions| {
            let actions = actions
                .into_iter()
                .map(Action::try_from)
                .collect::<Result<Vec<_>>>()?;
            Ok((conditions, actions))
        });
        let (conditions, actions) = parsed.map_err(|err| err.in_rule(id.as_str()))?;

        let rule = Rule::new(id, conditions, actions).with_priority(priority);
        Ok(match description {
            Some(description) => rule.with_description(description),
            None => rule,
        })
    }
}

impl From<Rule> for RuleDocument {
    fn from(rule: Rule) -> Self {
        Self {
            id: rule.id().to_owned(),
            description: rule.description().map(str::to_owned),
            conditions: rule.conditions().clone().into(),
            actions: rule.actions().iter().cloned().map(Into::into).collect(),
            priority: rule.priority(),
        }
    }
}

impl TryFrom<PolicyDocument> for Policy {
    type Error = ValidationError;

    fn try_from(doc: PolicyDocument) -> Result<Self> {
        let rules = doc
            .rules
            .into_iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>>>()?;

        let builder = Policy::builder(doc.name).version(doc.version).rules(rules);
        match doc.description {
            Some(description) => builder.description(description).build(),
            None => builder.build(),
        }
    }
}

impl From<Policy> for PolicyDocument {
    fn from(policy: Policy) -> Self {
        Self {
            version: policy.version().to_owned(),
            name: policy.name().to_owned(),
            description: policy.description().map(str::to_owned),
            rules: policy.rules().iter().cloned().map(Into::into).collect(),
        }
    }
}
