//! Reloadable handle over the active rules engine.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use gate_model::{Policy, PolicyDocument};
use tracing::{info, warn};

use crate::decision::PolicyDecision;
use crate::engine::{EngineConfig, PolicyEngine, RulesEngine};
use crate::error::{EngineError, EngineResult};
use crate::facts::FactContext;

/// Shares one active [`RulesEngine`] and swaps it on reload.
///
/// Readers take an `Arc` snapshot and evaluate outside the lock, so a reload
/// never interrupts in-flight evaluations. A reload that fails validation
/// leaves the previous policy active.
#[derive(Debug)]
pub struct PolicyHandle {
    active: RwLock<Arc<RulesEngine>>,
    config: EngineConfig,
}

impl PolicyHandle {
    /// Creates a handle with the default engine configuration.
    #[must_use]
    pub fn new(policy: impl Into<Arc<Policy>>) -> Self {
        Self::with_config(policy, EngineConfig::default())
    }

    /// Creates a handle whose engines all use `config`.
    #[must_use]
    pub fn with_config(policy: impl Into<Arc<Policy>>, config: EngineConfig) -> Self {
        Self {
            active: RwLock::new(Arc::new(RulesEngine::with_config(policy, config))),
            config,
        }
    }

    /// Returns a snapshot of the active engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Poisoned`] if a writer panicked while holding
    /// the lock.
    pub fn current(&self) -> EngineResult<Arc<RulesEngine>> {
        let guard = self.active.read().map_err(|_| EngineError::Poisoned)?;
        Ok(Arc::clone(&guard))
    }

    /// Replaces the active policy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Poisoned`] if the lock is poisoned.
    pub fn reload(&self, policy: impl Into<Arc<Policy>>) -> EngineResult<()> {
        let engine = Arc::new(RulesEngine::with_config(policy, self.config));
        let policy = Arc::clone(engine.policy());
        *self.active.write().map_err(|_| EngineError::Poisoned)? = engine;

        info!(
            policy = policy.name(),
            version = policy.version(),
            rules = policy.rules().len(),
            "policy reloaded"
        );
        Ok(())
    }

    /// Validates a policy document and, if valid, makes it active.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when the document is malformed; the
    /// previously active policy stays in place.
    pub fn reload_document(&self, document: PolicyDocument) -> EngineResult<()> {
        let name = document.name.clone();
        match Policy::try_from(document) {
            Ok(policy) => self.reload(policy),
            Err(err) => {
                warn!(policy = %name, error = %err, "rejected policy reload");
                Err(err.into())
            }
        }
    }

    /// Evaluates `facts` against the active policy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Evaluation`] for operand mismatches and
    /// [`EngineError::Poisoned`] if the lock is poisoned.
    pub fn evaluate(&self, facts: &FactContext) -> EngineResult<PolicyDecision> {
        Ok(self.current()?.evaluate(facts)?)
    }
}

#[async_trait]
impl PolicyEngine for PolicyHandle {
    async fn decide(&self, facts: &FactContext) -> EngineResult<PolicyDecision> {
        self.evaluate(facts)
    }
}
