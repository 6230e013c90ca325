//! Vehicle gate policy decision SDK facade.
//!
//! Bundles the policy model, the rules engine and the telemetry helpers behind
//! feature flags so downstream services can pull in only what they need.

#![warn(missing_docs, clippy::pedantic)]

/// Policy, rule, condition and action model.
pub use gate_model as model;

/// Rules engine and decisions (enabled by `engine` feature).
#[cfg(feature = "engine")]
pub use gate_engine as engine;

/// Tracing setup and advisory forwarding (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use gate_telemetry as telemetry;

/// Types most callers need to build a policy and evaluate it.
pub mod prelude {
    pub use gate_model::{Action, ActionType, Condition, ConditionGroup, Operator, Policy, Rule};

    #[cfg(feature = "engine")]
    pub use gate_engine::{
        DecisionKind, EngineConfig, FactContext, PolicyDecision, PolicyEngine, PolicyHandle,
        RulesEngine,
    };
}
