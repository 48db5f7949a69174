//! Automation aggregate: the node/link collection and its status machine.
//!
//! The aggregate enforces exactly one structural invariant eagerly: node ids
//! are unique within the automation. Whether the graph is *executable* (has a
//! trigger, links resolve) is a run-time concern owned by the executor, so no
//! such validation happens here. Links may reference node ids that do not
//! exist until traversal reaches them, where that becomes fatal.

use crate::error::AutomationError;
use crate::link::Link;
use crate::node::{Node, NodeId};
use flowdeck_core::AutomationId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The lifecycle status of an automation.
///
/// Managed exclusively by the executor; the aggregate's own mutators never
/// touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationStatus {
    /// Created, never run (or awaiting the next run).
    Idle,
    /// A run is in progress.
    Running,
    /// The last run finished without a fatal fault (node-level faults allowed).
    Completed,
    /// The last run aborted on a structural fault.
    Error,
}

impl AutomationStatus {
    /// Returns true if this status reflects a finished run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// An automation definition: a named, directed graph of nodes and links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    id: AutomationId,
    name: String,
    nodes: Vec<Node>,
    links: Vec<Link>,
    status: AutomationStatus,
}

impl Automation {
    /// Creates a new automation in `Idle` status.
    ///
    /// # Errors
    ///
    /// Returns an error if two nodes share an id.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<Node>,
        links: Vec<Link>,
    ) -> Result<Self, AutomationError> {
        Self::with_id(AutomationId::new(), name, nodes, links)
    }

    /// Creates an automation with a specific id.
    ///
    /// # Errors
    ///
    /// Returns an error if two nodes share an id.
    pub fn with_id(
        id: AutomationId,
        name: impl Into<String>,
        nodes: Vec<Node>,
        links: Vec<Link>,
    ) -> Result<Self, AutomationError> {
        check_unique_node_ids(&nodes)?;
        Ok(Self {
            id,
            name: name.into(),
            nodes,
            links,
            status: AutomationStatus::Idle,
        })
    }

    /// Returns the automation id.
    #[must_use]
    pub fn id(&self) -> AutomationId {
        self.id
    }

    /// Returns the automation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the links in declaration order.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> AutomationStatus {
        self.status
    }

    /// Returns the node with the given id, if any.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Returns the trigger nodes in declaration order.
    pub fn trigger_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_trigger())
    }

    /// Replaces the node and link collections wholesale.
    ///
    /// This is a full replace, not a merge; the editor always submits the
    /// complete graph. Status is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if two nodes share an id; the automation is left
    /// unmodified in that case.
    pub fn update(&mut self, nodes: Vec<Node>, links: Vec<Link>) -> Result<(), AutomationError> {
        check_unique_node_ids(&nodes)?;
        self.nodes = nodes;
        self.links = links;
        Ok(())
    }

    /// Renames the automation.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn mark_running(&mut self) {
        self.status = AutomationStatus::Running;
    }

    pub(crate) fn mark_completed(&mut self) {
        self.status = AutomationStatus::Completed;
    }

    pub(crate) fn mark_error(&mut self) {
        self.status = AutomationStatus::Error;
    }
}

fn check_unique_node_ids(nodes: &[Node]) -> Result<(), AutomationError> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(&node.id) {
            return Err(AutomationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }
    Ok(())
}
