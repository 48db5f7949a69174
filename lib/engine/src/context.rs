//! Per-run execution context.
//!
//! The context is created fresh on every `Executor::execute` call and
//! discarded by the caller afterwards; there are no resume semantics. It
//! accumulates node outputs in execution order plus the per-node error map,
//! and owns the claimed-node set backing the loop guard.

use crate::error::NodeFault;
use crate::node::NodeId;
use chrono::{DateTime, Utc};
use flowdeck_core::{AutomationId, RunId};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};

/// Mutable run-scoped record of an automation execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    /// The automation this run belongs to.
    pub automation_id: AutomationId,
    /// Unique id for this run.
    pub run_id: RunId,
    /// Output of every node that executed successfully.
    #[serde(rename = "executed_nodes")]
    pub outputs: HashMap<NodeId, JsonValue>,
    /// Node ids in the order they finished executing.
    pub order: Vec<NodeId>,
    /// Per-node faults, isolated from sibling branches.
    pub errors: HashMap<NodeId, NodeFault>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished (success or fatal fault).
    pub finished_at: Option<DateTime<Utc>>,
    /// Nodes claimed for execution. Superset of outputs/errors keys; the
    /// test-and-set on this set is what makes a node run at most once.
    #[serde(skip)]
    claimed: HashSet<NodeId>,
}

impl ExecutionContext {
    pub(crate) fn new(automation_id: AutomationId) -> Self {
        Self {
            automation_id,
            run_id: RunId::new(),
            outputs: HashMap::new(),
            order: Vec::new(),
            errors: HashMap::new(),
            started_at: Utc::now(),
            finished_at: None,
            claimed: HashSet::new(),
        }
    }

    /// Claims a node for execution.
    ///
    /// Returns false if the node was already claimed in this run; the caller
    /// must then skip it. This is the loop guard: checking and reserving in
    /// one step means a node executes at most once per run no matter how many
    /// inbound edges reach it.
    pub(crate) fn try_claim(&mut self, node_id: &NodeId) -> bool {
        if self.claimed.contains(node_id) {
            return false;
        }
        self.claimed.insert(node_id.clone());
        true
    }

    pub(crate) fn record_output(&mut self, node_id: NodeId, output: JsonValue) {
        self.order.push(node_id.clone());
        self.outputs.insert(node_id, output);
    }

    pub(crate) fn record_error(&mut self, node_id: NodeId, fault: NodeFault) {
        self.errors.insert(node_id, fault);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Returns the recorded output for a node, if it executed successfully.
    #[must_use]
    pub fn output(&self, node_id: &NodeId) -> Option<&JsonValue> {
        self.outputs.get(node_id)
    }

    /// Returns the recorded fault for a node, if it failed.
    #[must_use]
    pub fn error(&self, node_id: &NodeId) -> Option<&NodeFault> {
        self.errors.get(node_id)
    }

    /// Returns true if the node executed successfully in this run.
    #[must_use]
    pub fn has_executed(&self, node_id: &NodeId) -> bool {
        self.outputs.contains_key(node_id)
    }

    /// Number of nodes that executed successfully.
    #[must_use]
    pub fn executed_count(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true if no node-level faults were recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
