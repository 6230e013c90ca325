//! Observability utilities for the vehicle gate.
//!
//! Installs the process-wide tracing subscriber and forwards the `alert` and
//! `log` advisories carried by a [`PolicyDecision`] as tracing events.

#![warn(missing_docs, clippy::pedantic)]

use gate_engine::PolicyDecision;
use gate_model::ActionType;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Target under which advisories are emitted.
pub const ADVISORY_TARGET: &str = "vehicle_gate::advisory";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive could not be parsed.
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        reason: String,
    },
    /// A global subscriber was already installed.
    #[error("tracing subscriber already initialised: {0}")]
    AlreadyInitialised(String),
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    filter: String,
    with_target: bool,
}

impl TelemetryConfig {
    /// Creates a configuration with the given filter directive.
    #[must_use]
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }

    /// Toggles printing of event targets.
    #[must_use]
    pub const fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Resolves the effective filter, preferring `RUST_LOG` when it is set.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidFilter`] if `RUST_LOG` or the
    /// configured directive is malformed.
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        let from_env = std::env::var_os(EnvFilter::DEFAULT_ENV)
            .map(|value| value.to_string_lossy().into_owned());
        self.resolve_filter(from_env.as_deref())
    }

    fn resolve_filter(&self, from_env: Option<&str>) -> Result<EnvFilter, TelemetryError> {
        let directive = from_env.unwrap_or(&self.filter);
        EnvFilter::try_new(directive).map_err(|err| TelemetryError::InvalidFilter {
            filter: directive.to_owned(),
            reason: err.to_string(),
        })
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            with_target: false,
        }
    }
}

/// Installs a formatting subscriber for the current process.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.with_target)
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInitialised(err.to_string()))
}

/// Emits every advisory of `decision`: alerts at `WARN`, logs at `INFO`.
///
/// Returns the number of events emitted.
pub fn forward_advisories(decision: &PolicyDecision) -> usize {
    let rules = decision.matched_rules().join(",");
    let mut emitted = 0;
    for advisory in decision.advisories() {
        let message = advisory.message().or(advisory.reason()).unwrap_or_default();
        let scope = advisory.scope().unwrap_or_default();
        let kind = decision.kind();
        match advisory.action_type() {
            ActionType::Alert => {
                warn!(target: ADVISORY_TARGET, decision = ?kind, %rules, scope, "{message}");
            }
            ActionType::Log => {
                info!(target: ADVISORY_TARGET, decision = ?kind, %rules, scope, "{message}");
            }
            ActionType::Grant | ActionType::Deny => continue,
        }
        emitted += 1;
    }
    emitted
}
