//! Fact snapshots supplied to each evaluation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;

/// Outcome of resolving a dotted path against a [`FactContext`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// The path resolved to a value, which may itself be `null`.
    Found(&'a Value),
    /// Some segment of the path was missing or crossed a non-object value.
    Absent,
}

impl<'a> Lookup<'a> {
    /// Returns the resolved value, if any.
    #[must_use]
    pub const fn value(self) -> Option<&'a Value> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Returns true if the path did not resolve.
    #[must_use]
    pub const fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Nested, read-only snapshot of the state an access question is asked about,
/// e.g. `{"qa": {"status": "green"}, "defects": {"count": 0}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactContext {
    facts: Map<String, Value>,
}

impl FactContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a top-level fact, replacing any previous value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.facts.insert(key.into(), value.into());
    }

    /// Adds a top-level fact and returns the updated context.
    #[must_use]
    pub fn with_fact(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the top-level facts.
    #[must_use]
    pub fn facts(&self) -> &Map<String, Value> {
        &self.facts
    }

    /// Resolves a dot-delimited path such as `vehicle.install.progress.percent`.
    ///
    /// Each segment descends into a JSON object. A missing key, or a segment
    /// applied to a list or scalar, yields [`Lookup::Absent`] rather than an
    /// error.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Lookup<'_> {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Lookup::Absent;
        };
        let Some(mut current) = self.facts.get(first) else {
            return Lookup::Absent;
        };

        for segment in segments {
            match current {
                Value::Object(map) => match map.get(segment) {
                    Some(next) => current = next,
                    None => return Lookup::Absent,
                },
                _ => return Lookup::Absent,
            }
        }

        Lookup::Found(current)
    }
}

impl From<Map<String, Value>> for FactContext {
    fn from(facts: Map<String, Value>) -> Self {
        Self { facts }
    }
}

impl TryFrom<Value> for FactContext {
    type Error = EngineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(facts) => Ok(Self { facts }),
            _ => Err(EngineError::InvalidContext(
                "fact context root must be a JSON object",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn context() -> FactContext {
        FactContext::try_from(json!({
            "vehicle": {
                "status": "install",
                "install": {"progress": {"percent": 100}},
                "tags": ["hot", "export"]
            },
            "qa": {"inspector": null}
        }))
        .expect("object root")
    }

    #[test]
    fn resolves_nested_paths() {
        let ctx = context();
        assert_eq!(
            ctx.resolve("vehicle.install.progress.percent"),
            Lookup::Found(&json!(100))
        );
        assert_eq!(ctx.resolve("vehicle.status").value(), Some(&json!("install")));
    }

    #[test]
    fn missing_segments_are_absent() {
        let ctx = context();
        assert!(ctx.resolve("vehicle.color").is_absent());
        assert!(ctx.resolve("defects.count").is_absent());
        assert!(ctx.resolve("").is_absent());
    }

    #[test]
    fn descending_through_non_objects_is_absent() {
        let ctx = context();
        assert!(ctx.resolve("vehicle.status.code").is_absent());
        assert!(ctx.resolve("vehicle.tags.0").is_absent());
    }

    #[test]
    fn present_null_is_not_absent() {
        let ctx = context();
        assert_eq!(ctx.resolve("qa.inspector"), Lookup::Found(&Value::Null));
    }

    #[test]
    fn builder_and_root_validation() {
        let ctx = FactContext::new()
            .with_fact("qa", json!({"status": "green"}))
            .with_fact("override", true);
        assert_eq!(ctx.facts().len(), 2);
        assert_eq!(ctx.resolve("override").value(), Some(&json!(true)));

        let err = FactContext::try_from(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, EngineError::InvalidContext(_)));
    }
}
