//! Actions attached to rules.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::ActionDocument;
use crate::error::{Result, ValidationError};

/// Kind of effect an action has on the final decision.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Authorizes the requested scope.
    Grant,
    /// Vetoes the requested scope. Always wins over grants.
    Deny,
    /// Advisory for operators; never authorizes anything.
    Alert,
    /// Advisory for audit trails; never authorizes anything.
    Log,
}

impl ActionType {
    /// Returns the textual name used in policy documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Deny => "deny",
            Self::Alert => "alert",
            Self::Log => "log",
        }
    }

    /// Returns true for `alert` and `log`.
    #[must_use]
    pub const fn is_advisory(self) -> bool {
        matches!(self, Self::Alert | Self::Log)
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grant" => Ok(Self::Grant),
            "deny" => Ok(Self::Deny),
            "alert" => Ok(Self::Alert),
            "log" => Ok(Self::Log),
            other => Err(ValidationError::UnknownActionType {
                action_type: other.to_owned(),
            }),
        }
    }
}

/// Effect emitted when a rule matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ActionDocument", into = "ActionDocument")]
pub struct Action {
    action_type: ActionType,
    scope: Option<String>,
    ttl_seconds: Option<u64>,
    reason: Option<String>,
    message: Option<String>,
}

impl Action {
    /// Creates an action of the given type with no optional fields set.
    #[must_use]
    pub const fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            scope: None,
            ttl_seconds: None,
            reason: None,
            message: None,
        }
    }

    /// Grant for the supplied scope, e.g. `start` or `unlock`.
    #[must_use]
    pub fn grant(scope: impl Into<String>) -> Self {
        Self::new(ActionType::Grant).with_scope(scope)
    }

    /// Deny carrying the message surfaced as the decision reason.
    #[must_use]
    pub fn deny(message: impl Into<String>) -> Self {
        Self::new(ActionType::Deny).with_message(message)
    }

    /// Alert advisory.
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(ActionType::Alert).with_message(message)
    }

    /// Log advisory.
    #[must_use]
    pub fn log(message: impl Into<String>) -> Self {
        Self::new(ActionType::Log).with_message(message)
    }

    /// Sets the capability scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the lifetime of the resulting grant.
    #[must_use]
    pub const fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    /// Sets the reason, used as the decision reason for grants.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the message, used as the decision reason for denials.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the action type.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        self.action_type
    }

    /// Returns the capability scope, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Returns the grant lifetime in seconds, if any.
    #[must_use]
    pub const fn ttl_seconds(&self) -> Option<u64> {
        self.ttl_seconds
    }

    /// Returns the reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn from_parts(
        action_type: ActionType,
        scope: Option<String>,
        ttl_seconds: Option<u64>,
        reason: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            action_type,
            scope,
            ttl_seconds,
            reason,
            message,
        }
    }
}
