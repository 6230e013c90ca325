//! Rules engine deciding vehicle access requests.
//!
//! A [`RulesEngine`] evaluates every rule of a [`gate_model::Policy`] against
//! a [`FactContext`] in priority order and resolves the matched actions into a
//! [`PolicyDecision`]: any deny wins, otherwise any grant wins, otherwise the
//! request is denied.

#![warn(missing_docs, clippy::pedantic)]

pub mod decision;
pub mod engine;
pub mod error;
pub mod facts;
pub mod handle;
mod operators;

pub use decision::{DecisionKind, PolicyDecision};
pub use engine::{EngineConfig, ErrorMode, PolicyEngine, RulesEngine};
pub use error::{EngineError, EngineResult, EvaluationError, OperandMismatch};
pub use facts::{FactContext, Lookup};
pub use handle::PolicyHandle;
