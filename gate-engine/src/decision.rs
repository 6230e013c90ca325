//! Policy decision types returned by the engine.

use gate_model::Action;
use serde::{Deserialize, Serialize};

/// Reason used when a deny action carries no message.
pub const DEFAULT_DENY_REASON: &str = "Access denied by policy";
/// Reason used when a grant action carries no reason.
pub const DEFAULT_GRANT_REASON: &str = "Access granted by policy";
/// Reason used when no grant or deny action matched.
pub const NO_MATCH_REASON: &str = "No matching grant rules";

/// Describes the outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// The requested scope is authorized.
    Grant,
    /// The requested scope is refused.
    Deny,
}

/// Structured decision emitted by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    decision: DecisionKind,
    matched_rules: Vec<String>,
    actions: Vec<Action>,
    reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    advisories: Vec<Action>,
}

impl PolicyDecision {
    pub(crate) fn new(
        decision: DecisionKind,
        matched_rules: Vec<String>,
        actions: Vec<Action>,
        reason: impl Into<String>,
        advisories: Vec<Action>,
    ) -> Self {
        Self {
            decision,
            matched_rules,
            actions,
            reason: reason.into(),
            advisories,
        }
    }

    /// Returns the decision kind.
    #[must_use]
    pub const fn kind(&self) -> DecisionKind {
        self.decision
    }

    /// Returns true when the scope is granted.
    #[must_use]
    pub fn is_grant(&self) -> bool {
        self.decision == DecisionKind::Grant
    }

    /// Returns true when the scope is denied.
    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.decision == DecisionKind::Deny
    }

    /// Identifiers of every rule whose conditions matched, in evaluation order.
    #[must_use]
    pub fn matched_rules(&self) -> &[String] {
        &self.matched_rules
    }

    /// Actions on the winning side: all deny actions for a denial, all grant
    /// actions for a grant, and nothing for a default denial.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Human-readable reason for the decision.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// `alert` and `log` actions of matched rules, for forwarding to telemetry.
    #[must_use]
    pub fn advisories(&self) -> &[Action] {
        &self.advisories
    }
}
