//! Policy engine trait and the priority-ordered rules engine.

use std::sync::Arc;

use async_trait::async_trait;
use gate_model::{Action, ActionType, ConditionGroup, Policy, Rule};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decision::{
    DEFAULT_DENY_REASON, DEFAULT_GRANT_REASON, DecisionKind, NO_MATCH_REASON, PolicyDecision,
};
use crate::error::{EngineResult, EvaluationError};
use crate::facts::FactContext;
use crate::operators::{self, Comparator};

/// Trait implemented by policy engines.
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    /// Decides the supplied fact snapshot.
    async fn decide(&self, facts: &FactContext) -> EngineResult<PolicyDecision>;
}

/// How the engine reacts when a condition cannot be evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Return the [`EvaluationError`] to the caller.
    #[default]
    Propagate,
    /// Convert the error into a deny decision.
    FailClosed,
}

/// Engine behaviour knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    on_evaluation_error: ErrorMode,
}

impl EngineConfig {
    /// Creates a configuration with the supplied error mode.
    #[must_use]
    pub const fn new(on_evaluation_error: ErrorMode) -> Self {
        Self {
            on_evaluation_error,
        }
    }

    /// Configuration that turns evaluation errors into denials.
    #[must_use]
    pub const fn fail_closed() -> Self {
        Self::new(ErrorMode::FailClosed)
    }

    /// Returns the configured error mode.
    #[must_use]
    pub const fn on_evaluation_error(self) -> ErrorMode {
        self.on_evaluation_error
    }
}

/// Evaluation plan for one rule: its index in the policy and one bound
/// comparator per condition.
#[derive(Debug)]
struct CompiledRule {
    index: usize,
    comparators: Vec<Comparator>,
}

/// Rules engine evaluating one policy.
///
/// The engine never reorders the caller's policy. It keeps its own evaluation
/// plan, sorted by priority (highest first) with ties kept in declaration
/// order. The engine is immutable once built and can be shared across threads.
#[derive(Debug)]
pub struct RulesEngine {
    policy: Arc<Policy>,
    plan: Vec<CompiledRule>,
    config: EngineConfig,
}

impl RulesEngine {
    /// Builds an engine with the default configuration.
    #[must_use]
    pub fn new(policy: impl Into<Arc<Policy>>) -> Self {
        Self::with_config(policy, EngineConfig::default())
    }

    /// Builds an engine with an explicit configuration.
    #[must_use]
    pub fn with_config(policy: impl Into<Arc<Policy>>, config: EngineConfig) -> Self {
        let policy = policy.into();
        let mut plan: Vec<CompiledRule> = policy
            .rules()
            .iter()
            .enumerate()
            .map(|(index, rule)| CompiledRule {
                index,
                comparators: rule
                    .conditions()
                    .conditions()
                    .iter()
                    .map(|condition| operators::comparator(condition.operator()))
                    .collect(),
            })
            .collect();
        // stable: equal priorities keep declaration order
        plan.sort_by_key(|compiled| std::cmp::Reverse(policy.rules()[compiled.index].priority()));

        Self {
            policy,
            plan,
            config,
        }
    }

    /// Returns the policy as supplied, in declaration order.
    #[must_use]
    pub fn policy(&self) -> &Arc<Policy> {
        &self.policy
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> EngineConfig {
        self.config
    }

    /// Returns the rules in evaluation order.
    pub fn ordered_rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.plan
            .iter()
            .map(|compiled| &self.policy.rules()[compiled.index])
    }

    /// Evaluates every rule against `facts` and resolves the decision.
    ///
    /// Any matching deny action vetoes every grant. Without a matching grant
    /// or deny action the result is a denial.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError`] when a condition applies an operator to
    /// operands it cannot compare, unless the engine is configured with
    /// [`ErrorMode::FailClosed`].
    pub fn evaluate(&self, facts: &FactContext) -> Result<PolicyDecision, EvaluationError> {
        let mut matched_rules = Vec::new();
        let mut all_actions: Vec<&Action> = Vec::new();

        for compiled in &self.plan {
            let rule = &self.policy.rules()[compiled.index];
            let matched = match rule_matches(rule, compiled, facts) {
                Ok(matched) => matched,
                Err(err) => return self.on_error(err, matched_rules),
            };
            if matched {
                debug!(
                    policy = self.policy.name(),
                    rule = rule.id(),
                    priority = rule.priority(),
                    "policy rule matched"
                );
                matched_rules.push(rule.id().to_owned());
                all_actions.extend(rule.actions());
            }
        }

        let decision = resolve(matched_rules, &all_actions);
        debug!(
            policy = self.policy.name(),
            decision = ?decision.kind(),
            matched = decision.matched_rules().len(),
            "policy evaluated"
        );
        Ok(decision)
    }

    fn on_error(
        &self,
        err: EvaluationError,
        matched_rules: Vec<String>,
    ) -> Result<PolicyDecision, EvaluationError> {
        match self.config.on_evaluation_error {
            ErrorMode::Propagate => Err(err),
            ErrorMode::FailClosed => {
                warn!(
                    policy = self.policy.name(),
                    rule = err.rule_id(),
                    field = err.field(),
                    operator = %err.operator(),
                    error = %err.kind(),
                    "policy evaluation failed; denying"
                );
                Ok(PolicyDecision::new(
                    DecisionKind::Deny,
                    matched_rules,
                    Vec::new(),
                    format!("Policy evaluation failed: {err}"),
                    Vec::new(),
                ))
            }
        }
    }
}

/// Evaluates one rule's condition group, short-circuiting in list order.
fn rule_matches(
    rule: &Rule,
    compiled: &CompiledRule,
    facts: &FactContext,
) -> Result<bool, EvaluationError> {
    let group = rule.conditions();
    let outcomes = group
        .conditions()
        .iter()
        .zip(&compiled.comparators)
        .map(|(condition, compare)| {
            let actual = facts.resolve(condition.field());
            operators::apply(condition.operator(), *compare, actual, condition.value()).map_err(
                |kind| {
                    EvaluationError::new(
                        rule.id(),
                        condition.field(),
                        condition.operator(),
                        kind,
                    )
                },
            )
        });

    match group {
        ConditionGroup::All(_) => {
            for outcome in outcomes {
                if !outcome? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ConditionGroup::Any(_) => {
            for outcome in outcomes {
                if outcome? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Applies deny-overrides-grant and default-deny to the matched actions.
fn resolve(matched_rules: Vec<String>, all_actions: &[&Action]) -> PolicyDecision {
    let mut deny_actions = Vec::new();
    let mut grant_actions = Vec::new();
    let mut advisories = Vec::new();
    for &action in all_actions {
        match action.action_type() {
            ActionType::Deny => deny_actions.push(action.clone()),
            ActionType::Grant => grant_actions.push(action.clone()),
            ActionType::Alert | ActionType::Log => advisories.push(action.clone()),
        }
    }

    if let Some(first) = deny_actions.first() {
        let reason = first.message().unwrap_or(DEFAULT_DENY_REASON).to_owned();
        PolicyDecision::new(
            DecisionKind::Deny,
            matched_rules,
            deny_actions,
            reason,
            advisories,
        )
    } else if let Some(first) = grant_actions.first() {
        let reason = first.reason().unwrap_or(DEFAULT_GRANT_REASON).to_owned();
        PolicyDecision::new(
            DecisionKind::Grant,
            matched_rules,
            grant_actions,
            reason,
            advisories,
        )
    } else {
        PolicyDecision::new(
            DecisionKind::Deny,
            matched_rules,
            Vec::new(),
            NO_MATCH_REASON,
            advisories,
        )
    }
}

#[async_trait]
impl PolicyEngine for RulesEngine {
    async fn decide(&self, facts: &FactContext) -> EngineResult<PolicyDecision> {
        Ok(self.evaluate(facts)?)
    }
}

#[cfg(test)]
mod tests {
    use gate_model::{Condition, Operator};
    use serde_json::json;

    use super::*;
    use crate::error::OperandMismatch;

    fn facts(value: serde_json::Value) -> FactContext {
        FactContext::try_from(value).expect("object")
    }

    fn grant_on_green() -> Rule {
        Rule::new(
            "grant_on_green",
            ConditionGroup::all([Condition::new("qa.status", Operator::Eq, "green")]),
            [Action::grant("start")
                .with_ttl_seconds(1800)
                .with_reason("QA green")],
        )
    }

    fn deny_on_defects() -> Rule {
        Rule::new(
            "deny_on_defects",
            ConditionGroup::all([Condition::new("defects.count", Operator::Gt, 0)]),
            [Action::deny("Open defects present").with_scope("start")],
        )
    }

    #[test]
    fn grant_when_conditions_hold() {
        let policy = Policy::new("test_policy", [grant_on_green()]).unwrap();
        let engine = RulesEngine::new(policy);

        let decision = engine
            .evaluate(&facts(json!({
                "qa": {"status": "green"},
                "vehicle": {"status": "install_done"}
            })))
            .unwrap();

        assert!(decision.is_grant());
        assert_eq!(decision.actions().len(), 1);
        assert_eq!(decision.actions()[0].scope(), Some("start"));
        assert_eq!(decision.reason(), "QA green");
        assert_eq!(decision.matched_rules(), ["grant_on_green"]);
    }

    #[test]
    fn grant_without_reason_uses_default() {
        let rule = Rule::new(
            "grant_on_green",
            ConditionGroup::all([Condition::new("qa.status", Operator::Eq, "green")]),
            [Action::grant("start").with_ttl_seconds(1800)],
        );
        let engine = RulesEngine::new(Policy::new("p", [rule]).unwrap());

        let decision = engine.evaluate(&facts(json!({"qa": {"status": "green"}}))).unwrap();
        assert!(decision.is_grant());
        assert_eq!(decision.reason(), DEFAULT_GRANT_REASON);
    }

    #[test]
    fn deny_overrides_higher_priority_grants() {
        let policy = Policy::new(
            "p",
            [
                grant_on_green().with_priority(100),
                deny_on_defects().with_priority(1),
                Rule::new(
                    "grant_supervisor",
                    ConditionGroup::All(Vec::new()),
                    [Action::grant("start")],
                )
                .with_priority(50),
            ],
        )
        .unwrap();
        let engine = RulesEngine::new(policy);

        let decision = engine
            .evaluate(&facts(json!({"qa": {"status": "green"}, "defects": {"count": 1}})))
            .unwrap();

        assert!(decision.is_deny());
        assert_eq!(decision.reason(), "Open defects present");
        assert_eq!(decision.actions().len(), 1);
        assert_eq!(decision.actions()[0].action_type(), ActionType::Deny);
        assert_eq!(
            decision.matched_rules(),
            ["grant_on_green", "grant_supervisor", "deny_on_defects"]
        );
    }

    #[test]
    fn deny_without_message_uses_default() {
        let rule = Rule::new(
            "deny_all",
            ConditionGroup::All(Vec::new()),
            [Action::new(ActionType::Deny)],
        );
        let engine = RulesEngine::new(Policy::new("p", [rule]).unwrap());

        let decision = engine.evaluate(&FactContext::new()).unwrap();
        assert!(decision.is_deny());
        assert_eq!(decision.reason(), DEFAULT_DENY_REASON);
    }

    #[test]
    fn advisories_alone_do_not_authorize() {
        let policy = Policy::new(
            "p",
            [
                Rule::new(
                    "alert_on_hot",
                    ConditionGroup::all([Condition::new("vehicle.hot", Operator::Eq, true)]),
                    [Action::alert("hot unit on the line")],
                ),
                Rule::new(
                    "audit",
                    ConditionGroup::All(Vec::new()),
                    [Action::log("start requested")],
                ),
            ],
        )
        .unwrap();
        let engine = RulesEngine::new(policy);

        let decision = engine.evaluate(&facts(json!({"vehicle": {"hot": true}}))).unwrap();

        assert!(decision.is_deny());
        assert_eq!(decision.reason(), NO_MATCH_REASON);
        assert!(decision.actions().is_empty());
        assert_eq!(decision.matched_rules(), ["alert_on_hot", "audit"]);
        assert_eq!(decision.advisories().len(), 2);
        assert_eq!(decision.advisories()[0].action_type(), ActionType::Alert);
    }

    #[test]
    fn equal_priorities_keep_declaration_order() {
        let always = |id: &str| Rule::new(id, ConditionGroup::All(Vec::new()), [Action::log(id)]);
        let policy = Policy::new(
            "p",
            [
                always("first").with_priority(5),
                always("second"),
                always("third").with_priority(5),
                always("fourth"),
                always("fifth").with_priority(9),
            ],
        )
        .unwrap();
        let engine = RulesEngine::new(policy);

        let decision = engine.evaluate(&FactContext::new()).unwrap();
        assert_eq!(
            decision.matched_rules(),
            ["fifth", "first", "third", "second", "fourth"]
        );
    }

    #[test]
    fn construction_leaves_policy_order_untouched() {
        let policy = Arc::new(
            Policy::new(
                "p",
                [
                    grant_on_green().with_priority(1),
                    deny_on_defects().with_priority(10),
                ],
            )
            .unwrap(),
        );
        let engine = RulesEngine::new(Arc::clone(&policy));

        let declared: Vec<_> = policy.rules().iter().map(Rule::id).collect();
        assert_eq!(declared, ["grant_on_green", "deny_on_defects"]);
        let ordered: Vec<_> = engine.ordered_rules().map(Rule::id).collect();
        assert_eq!(ordered, ["deny_on_defects", "grant_on_green"]);
        assert!(Arc::ptr_eq(engine.policy(), &policy));
    }

    #[test]
    fn any_group_semantics() {
        let rule = Rule::new(
            "grant_on_any_green",
            ConditionGroup::any([
                Condition::new("qa.status", Operator::Eq, "green"),
                Condition::new("supervisor.override", Operator::Eq, true),
            ]),
            [Action::grant("start").with_reason("Approved")],
        );
        let empty_any = Rule::new(
            "never",
            ConditionGroup::Any(Vec::new()),
            [Action::deny("unreachable")],
        );
        let engine = RulesEngine::new(Policy::new("p", [rule, empty_any]).unwrap());

        let decision = engine
            .evaluate(&facts(json!({"qa": {"status": "red"}, "supervisor": {"override": true}})))
            .unwrap();
        assert!(decision.is_grant());
        assert_eq!(decision.matched_rules(), ["grant_on_any_green"]);

        let decision = engine.evaluate(&facts(json!({"qa": {"status": "red"}}))).unwrap();
        assert!(decision.is_deny());
        assert_eq!(decision.reason(), NO_MATCH_REASON);
    }

    #[test]
    fn any_group_short_circuits_before_a_bad_condition() {
        let rule = Rule::new(
            "grant",
            ConditionGroup::any([
                Condition::new("qa.status", Operator::Eq, "green"),
                Condition::new("qa.status", Operator::Gt, 3),
            ]),
            [Action::grant("start")],
        );
        let engine = RulesEngine::new(Policy::new("p", [rule]).unwrap());

        let decision = engine.evaluate(&facts(json!({"qa": {"status": "green"}}))).unwrap();
        assert!(decision.is_grant());
    }

    #[test]
    fn type_mismatch_propagates_with_context() {
        let rule = Rule::new(
            "deny_on_defects",
            ConditionGroup::all([Condition::new("defects.count", Operator::Gt, 0)]),
            [Action::deny("Open defects present")],
        );
        let engine = RulesEngine::new(Policy::new("p", [rule]).unwrap());

        let err = engine
            .evaluate(&facts(json!({"defects": {"count": "many"}})))
            .unwrap_err();

        assert_eq!(err.rule_id(), "deny_on_defects");
        assert_eq!(err.field(), "defects.count");
        assert_eq!(err.operator(), Operator::Gt);
        assert_eq!(
            err.kind(),
            &OperandMismatch::Unordered {
                actual: "string",
                expected: "number"
            }
        );
        assert!(err.to_string().contains("deny_on_defects"));
    }

    #[test]
    fn fail_closed_mode_denies_on_error() {
        let policy = Policy::new(
            "p",
            [
                grant_on_green().with_priority(10),
                deny_on_defects().with_priority(1),
            ],
        )
        .unwrap();
        let engine = RulesEngine::with_config(policy, EngineConfig::fail_closed());

        let decision = engine
            .evaluate(&facts(json!({"qa": {"status": "green"}, "defects": {"count": "many"}})))
            .unwrap();

        assert!(decision.is_deny());
        assert!(decision.actions().is_empty());
        assert_eq!(decision.matched_rules(), ["grant_on_green"]);
        assert!(decision.reason().starts_with("Policy evaluation failed"));
    }

    #[test]
    fn absent_fields_do_not_match_except_not_equal() {
        let policy = Policy::new(
            "p",
            [
                Rule::new(
                    "needs_green",
                    ConditionGroup::all([Condition::new("qa.status", Operator::Eq, "green")]),
                    [Action::grant("start")],
                ),
                Rule::new(
                    "not_red",
                    ConditionGroup::all([Condition::new("qa.status", Operator::Ne, "red")]),
                    [Action::log("qa not red")],
                ),
                Rule::new(
                    "low_progress",
                    ConditionGroup::all([Condition::new("progress.percent", Operator::Lt, 100)]),
                    [Action::deny("Installation in progress")],
                ),
            ],
        )
        .unwrap();
        let engine = RulesEngine::new(policy);

        let decision = engine.evaluate(&FactContext::new()).unwrap();
        assert_eq!(decision.matched_rules(), ["not_red"]);
        assert_eq!(decision.reason(), NO_MATCH_REASON);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let policy = Policy::new(
            "p",
            [grant_on_green().with_priority(10), deny_on_defects()],
        )
        .unwrap();
        let engine = RulesEngine::new(policy);
        let ctx = facts(json!({"qa": {"status": "green"}, "defects": {"count": 0}}));

        let first = engine.evaluate(&ctx).unwrap();
        let second = engine.evaluate(&ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EngineConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.on_evaluation_error(), ErrorMode::Propagate);

        let config: EngineConfig =
            serde_json::from_value(json!({"on_evaluation_error": "fail_closed"})).unwrap();
        assert_eq!(config, EngineConfig::fail_closed());
    }

    #[tokio::test]
    async fn engine_implements_policy_engine() {
        let engine: Arc<dyn PolicyEngine> =
            Arc::new(RulesEngine::new(Policy::new("p", [grant_on_green()]).unwrap()));

        let decision = engine
            .decide(&facts(json!({"qa": {"status": "green"}})))
            .await
            .unwrap();
        assert!(decision.is_grant());
    }
}
