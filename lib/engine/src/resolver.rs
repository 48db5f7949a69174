//! Collaborator contracts to the external tool/agent/condition registries.
//!
//! The engine never owns tool or agent implementations; it resolves a node's
//! `reference_id` through these narrow async traits and invokes whatever comes
//! back. In-memory implementations are provided for embedding and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Error produced by an invokable unit or condition evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeError {
    /// Human-readable failure description.
    pub message: String,
}

impl InvokeError {
    /// Creates a new invocation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InvokeError {}

/// An invocable unit of work backing a node.
///
/// For tool nodes this is the tool's executable; for agent nodes the invoke
/// wraps an LLM call, opaque to the engine.
#[async_trait]
pub trait Invokable: Send + Sync {
    /// Invokes the unit with the node's merged input.
    async fn invoke(&self, input: JsonValue) -> Result<JsonValue, InvokeError>;
}

/// Resolves tool reference ids to invocable units.
#[async_trait]
pub trait ToolResolver: Send + Sync {
    /// Returns the tool registered under `reference_id`, if any.
    async fn find_by_id(&self, reference_id: &str) -> Option<Arc<dyn Invokable>>;
}

/// Resolves agent reference ids to invocable units.
#[async_trait]
pub trait AgentResolver: Send + Sync {
    /// Returns the agent registered under `reference_id`, if any.
    async fn find_by_id(&self, reference_id: &str) -> Option<Arc<dyn Invokable>>;
}

/// Evaluates a condition node's named predicates against an input value.
#[async_trait]
pub trait ConditionEvaluator: Send + Sync {
    /// Returns the set of branch identifiers whose predicate matched.
    ///
    /// With `evaluate_all` false, at most the first matching branch is
    /// returned; true returns every match, enabling fan-out to multiple
    /// branches.
    async fn evaluate(
        &self,
        reference_id: &str,
        input: &JsonValue,
        evaluate_all: bool,
    ) -> Result<HashSet<String>, InvokeError>;
}

/// An invokable backed by a plain closure.
pub struct FnInvokable {
    f: Box<dyn Fn(JsonValue) -> Result<JsonValue, InvokeError> + Send + Sync>,
}

impl FnInvokable {
    /// Wraps a closure as an invokable.
    #[must_use]
    pub fn new(f: impl Fn(JsonValue) -> Result<JsonValue, InvokeError> + Send + Sync + 'static) -> Self {
        Self { f: Box::new(f) }
    }
}

#[async_trait]
impl Invokable for FnInvokable {
    async fn invoke(&self, input: JsonValue) -> Result<JsonValue, InvokeError> {
        (self.f)(input)
    }
}

/// In-memory resolver mapping reference ids to invokables.
///
/// Serves as both `ToolResolver` and `AgentResolver` for embedding the engine
/// without a registry service, and for tests.
#[derive(Default)]
pub struct StaticResolver {
    entries: HashMap<String, Arc<dyn Invokable>>,
}

impl StaticResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an invokable under a reference id.
    pub fn register(&mut self, reference_id: impl Into<String>, invokable: Arc<dyn Invokable>) {
        self.entries.insert(reference_id.into(), invokable);
    }

    /// Registers a closure under a reference id.
    pub fn register_fn(
        &mut self,
        reference_id: impl Into<String>,
        f: impl Fn(JsonValue) -> Result<JsonValue, InvokeError> + Send + Sync + 'static,
    ) {
        self.register(reference_id, Arc::new(FnInvokable::new(f)));
    }

    /// Number of registered invokables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ToolResolver for StaticResolver {
    async fn find_by_id(&self, reference_id: &str) -> Option<Arc<dyn Invokable>> {
        self.entries.get(reference_id).cloned()
    }
}

#[async_trait]
impl AgentResolver for StaticResolver {
    async fn find_by_id(&self, reference_id: &str) -> Option<Arc<dyn Invokable>> {
        self.entries.get(reference_id).cloned()
    }
}

type Predicate = Box<dyn Fn(&JsonValue) -> bool + Send + Sync>;

/// In-memory condition evaluator with named branch predicates.
///
/// Branches are evaluated in registration order, which makes first-match
/// semantics (`evaluate_all = false`) deterministic.
#[derive(Default)]
pub struct StaticConditionEvaluator {
    conditions: HashMap<String, Vec<(String, Predicate)>>,
}

impl StaticConditionEvaluator {
    /// Creates an empty evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a branch predicate for a condition reference id.
    pub fn register(
        &mut self,
        reference_id: impl Into<String>,
        branch: impl Into<String>,
        predicate: impl Fn(&JsonValue) -> bool + Send + Sync + 'static,
    ) {
        self.conditions
            .entry(reference_id.into())
            .or_default()
            .push((branch.into(), Box::new(predicate)));
    }
}

#[async_trait]
impl ConditionEvaluator for StaticConditionEvaluator {
    async fn evaluate(
        &self,
        reference_id: &str,
        input: &JsonValue,
        evaluate_all: bool,
    ) -> Result<HashSet<String>, InvokeError> {
        let branches = self
            .conditions
            .get(reference_id)
            .ok_or_else(|| InvokeError::new(format!("unknown condition: {reference_id}")))?;

        let mut matched = HashSet::new();
        for (branch, predicate) in branches {
            if predicate(input) {
                matched.insert(branch.clone());
                if !evaluate_all {
                    break;
                }
            }
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_resolver_finds_registered_tool() {
        let mut resolver = StaticResolver::new();
        resolver.register_fn("echo", Ok);

        let tool = ToolResolver::find_by_id(&resolver, "echo").await;
        assert!(tool.is_some());

        let output = tool
            .unwrap()
            .invoke(serde_json::json!({"data": 1}))
            .await
            .unwrap();
        assert_eq!(output, serde_json::json!({"data": 1}));
    }

    #[tokio::test]
    async fn static_resolver_misses_unregistered_id() {
        let resolver = StaticResolver::new();
        assert!(ToolResolver::find_by_id(&resolver, "ghost").await.is_none());
        assert!(resolver.is_empty());
    }

    #[tokio::test]
    async fn fn_invokable_propagates_errors() {
        let invokable = FnInvokable::new(|_| Err(InvokeError::new("boom")));
        let err = invokable.invoke(JsonValue::Null).await.unwrap_err();
        assert_eq!(err.message, "boom");
    }

    #[tokio::test]
    async fn condition_evaluator_matches_all_branches() {
        let mut evaluator = StaticConditionEvaluator::new();
        evaluator.register("router", "yes", |v| v["score"].as_i64() > Some(5));
        evaluator.register("router", "no", |v| v["score"].as_i64() <= Some(5));
        evaluator.register("router", "always", |_| true);

        let matched = evaluator
            .evaluate("router", &serde_json::json!({"score": 9}), true)
            .await
            .unwrap();
        assert_eq!(
            matched,
            HashSet::from(["yes".to_string(), "always".to_string()])
        );
    }

    #[tokio::test]
    async fn condition_evaluator_first_match_only() {
        let mut evaluator = StaticConditionEvaluator::new();
        evaluator.register("router", "first", |_| true);
        evaluator.register("router", "second", |_| true);

        let matched = evaluator
            .evaluate("router", &JsonValue::Null, false)
            .await
            .unwrap();
        assert_eq!(matched, HashSet::from(["first".to_string()]));
    }

    #[tokio::test]
    async fn condition_evaluator_unknown_reference_fails() {
        let evaluator = StaticConditionEvaluator::new();
        let err = evaluator
            .evaluate("ghost", &JsonValue::Null, true)
            .await
            .unwrap_err();
        assert!(err.message.contains("unknown condition"));
    }
}
