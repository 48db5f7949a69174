//! The automation executor.
//!
//! A run starts at the trigger nodes and follows data-flow links outward,
//! resolving each node's backing executable, merging fan-in inputs, pruning
//! unmatched condition branches, and recording per-node outcomes into the
//! execution context.
//!
//! Traversal uses an explicit work stack instead of call-stack recursion, so
//! deep or wide graphs cannot overflow the stack, and a single task drains it,
//! so for a fixed graph the context contents are deterministic. The loop
//! guard (`ExecutionContext::try_claim`) makes every node run at most once per
//! run, which is what terminates cyclic graphs.

use crate::automation::Automation;
use crate::context::ExecutionContext;
use crate::error::{ExecuteError, NodeFault};
use crate::link::Link;
use crate::listener::{ListenerRegistry, NodeEvent};
use crate::node::{Node, NodeId, NodeType};
use crate::resolver::{AgentResolver, ConditionEvaluator, ToolResolver};
use flowdeck_core::ListenerId;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of dispatching a single node.
enum DispatchOutcome {
    Completed(JsonValue),
    Faulted(NodeFault),
}

/// Walks an automation graph, invoking each reachable node exactly once.
///
/// The executor owns the listener registry and the resolver handles; the
/// automation's status field is mutated only here.
pub struct Executor {
    tools: Arc<dyn ToolResolver>,
    agents: Arc<dyn AgentResolver>,
    conditions: Arc<dyn ConditionEvaluator>,
    listeners: ListenerRegistry,
}

impl Executor {
    /// Creates an executor over the given resolver handles.
    pub fn new(
        tools: Arc<dyn ToolResolver>,
        agents: Arc<dyn AgentResolver>,
        conditions: Arc<dyn ConditionEvaluator>,
    ) -> Self {
        Self {
            tools,
            agents,
            conditions,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Registers a progress listener.
    pub fn add_listener(
        &mut self,
        listener: impl Fn(&NodeEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.listeners.add_listener(listener)
    }

    /// Removes a progress listener by handle.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove_listener(id)
    }

    /// Executes one run of the automation.
    ///
    /// The automation transitions to `Running` for the duration, then
    /// `Completed` if no structural fault occurred (node-level faults in the
    /// context's error map still count as completion) or `Error` otherwise.
    ///
    /// # Errors
    ///
    /// Returns a structural fault: no trigger on a non-empty graph, an
    /// unresolvable trigger tool, or a link targeting a nonexistent node.
    pub async fn execute(
        &self,
        automation: &mut Automation,
        initial_input: Option<JsonValue>,
    ) -> Result<ExecutionContext, ExecuteError> {
        automation.mark_running();
        let mut ctx = ExecutionContext::new(automation.id());
        tracing::debug!(
            automation_id = %automation.id(),
            run_id = %ctx.run_id,
            "run started"
        );

        match self.run(automation, &mut ctx, initial_input).await {
            Ok(()) => {
                ctx.finish();
                automation.mark_completed();
                tracing::info!(
                    run_id = %ctx.run_id,
                    executed = ctx.executed_count(),
                    faults = ctx.errors.len(),
                    "run completed"
                );
                Ok(ctx)
            }
            Err(e) => {
                ctx.finish();
                automation.mark_error();
                tracing::warn!(run_id = %ctx.run_id, error = %e, "run aborted on structural fault");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        automation: &Automation,
        ctx: &mut ExecutionContext,
        initial_input: Option<JsonValue>,
    ) -> Result<(), ExecuteError> {
        // A graph with no nodes at all is a degenerate no-op; only a
        // non-empty graph without triggers is a fault.
        if automation.nodes().is_empty() {
            return Ok(());
        }

        let triggers: Vec<&Node> = automation.trigger_nodes().collect();
        if triggers.is_empty() {
            return Err(ExecuteError::NoTriggerNode {
                automation_id: automation.id(),
            });
        }

        // Adjacency in link declaration order; the graph is validated lazily
        // here, not in the aggregate.
        let mut outgoing: HashMap<&NodeId, Vec<&Link>> = HashMap::new();
        let mut inbound: HashMap<&NodeId, Vec<&Link>> = HashMap::new();
        for link in automation.links() {
            outgoing.entry(&link.from_node).or_default().push(link);
            inbound.entry(&link.to_node).or_default().push(link);
        }

        let initial = initial_input.unwrap_or(JsonValue::Null);

        // Every trigger fires before propagation begins, so a fan-in node fed
        // by two triggers sees both outputs. An unresolvable trigger is a
        // structural fault; a trigger whose invocation fails only kills its
        // own branch.
        let mut roots: Vec<&NodeId> = Vec::new();
        for node in &triggers {
            let Some(tool) = self.tools.find_by_id(&node.reference_id).await else {
                return Err(ExecuteError::TriggerToolNotFound {
                    node_id: node.id.clone(),
                    reference_id: node.reference_id.clone(),
                });
            };
            // Triggers run before any propagation and node ids are unique, so
            // this claim cannot already be taken.
            let fresh = ctx.try_claim(&node.id);
            debug_assert!(fresh, "trigger {} claimed twice", node.id);
            tracing::debug!(node_id = %node.id, run_id = %ctx.run_id, "invoking trigger");
            match tool.invoke(initial.clone()).await {
                Ok(output) => {
                    self.listeners
                        .notify(&NodeEvent::success(node.id.clone(), output.clone()));
                    ctx.record_output(node.id.clone(), output);
                    roots.push(&node.id);
                }
                Err(e) => {
                    let fault = NodeFault::Invocation { message: e.message };
                    tracing::warn!(node_id = %node.id, error = %fault, "trigger invocation failed");
                    self.listeners
                        .notify(&NodeEvent::failed(node.id.clone(), &fault));
                    ctx.record_error(node.id.clone(), fault);
                }
            }
        }

        // Depth-first in link declaration order: reversing before pushing
        // makes the first-declared link expand first.
        let mut stack: Vec<&NodeId> = Vec::new();
        for id in roots.iter().rev() {
            stack.push(id);
        }

        let mut matched_branches: HashMap<NodeId, HashSet<String>> = HashMap::new();

        while let Some(current) = stack.pop() {
            let Some(links) = outgoing.get(current) else {
                continue;
            };

            let mut executed_here: Vec<&NodeId> = Vec::new();
            for link in links {
                // Unmatched condition branches are never traversed.
                if !link_live(automation, link, &matched_branches) {
                    continue;
                }

                // A dangling link means a corrupt graph: always fatal.
                let Some(target) = automation.node(&link.to_node) else {
                    return Err(ExecuteError::TargetNodeNotFound {
                        from_node: link.from_node.clone(),
                        to_node: link.to_node.clone(),
                    });
                };

                // Loop guard: at most once per run.
                if !ctx.try_claim(&target.id) {
                    tracing::debug!(node_id = %target.id, "already executed; skipping");
                    continue;
                }

                let inbound_links = inbound
                    .get(&target.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let input = merged_input(automation, inbound_links, ctx, &matched_branches);

                match self.dispatch(target, input, &mut matched_branches).await {
                    DispatchOutcome::Completed(output) => {
                        self.listeners
                            .notify(&NodeEvent::success(target.id.clone(), output.clone()));
                        ctx.record_output(target.id.clone(), output);
                        executed_here.push(&target.id);
                    }
                    DispatchOutcome::Faulted(fault) => {
                        tracing::warn!(node_id = %target.id, error = %fault, "node faulted; branch abandoned");
                        self.listeners
                            .notify(&NodeEvent::failed(target.id.clone(), &fault));
                        ctx.record_error(target.id.clone(), fault);
                    }
                }
            }

            for id in executed_here.iter().rev() {
                stack.push(id);
            }
        }

        Ok(())
    }

    async fn dispatch(
        &self,
        node: &Node,
        input: JsonValue,
        matched_branches: &mut HashMap<NodeId, HashSet<String>>,
    ) -> DispatchOutcome {
        tracing::debug!(node_id = %node.id, node_type = ?node.node_type, "dispatching node");
        match node.node_type {
            // A trigger reached mid-graph runs its tool like any tool node.
            NodeType::Trigger | NodeType::Tool => {
                match self.tools.find_by_id(&node.reference_id).await {
                    Some(tool) => match tool.invoke(input).await {
                        Ok(output) => DispatchOutcome::Completed(output),
                        Err(e) => DispatchOutcome::Faulted(NodeFault::Invocation {
                            message: e.message,
                        }),
                    },
                    None => DispatchOutcome::Faulted(NodeFault::ToolNotFound {
                        reference_id: node.reference_id.clone(),
                    }),
                }
            }
            NodeType::Agent => match self.agents.find_by_id(&node.reference_id).await {
                Some(agent) => match agent.invoke(input).await {
                    Ok(output) => DispatchOutcome::Completed(output),
                    Err(e) => DispatchOutcome::Faulted(NodeFault::Invocation {
                        message: e.message,
                    }),
                },
                None => DispatchOutcome::Faulted(NodeFault::AgentNotFound {
                    reference_id: node.reference_id.clone(),
                }),
            },
            NodeType::Condition => {
                let evaluate_all = node.config_bool("evaluate_all").unwrap_or(true);
                match self
                    .conditions
                    .evaluate(&node.reference_id, &input, evaluate_all)
                    .await
                {
                    Ok(matched) => {
                        matched_branches.insert(node.id.clone(), matched);
                        // Conditions pass their input through to matched branches.
                        DispatchOutcome::Completed(input)
                    }
                    Err(e) => DispatchOutcome::Faulted(NodeFault::Condition {
                        message: e.message,
                    }),
                }
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Returns true if data may flow over this link in the current run.
///
/// Links leaving a condition node are live only for matched branches; every
/// other link is always live.
fn link_live(
    automation: &Automation,
    link: &Link,
    matched_branches: &HashMap<NodeId, HashSet<String>>,
) -> bool {
    match automation.node(&link.from_node) {
        Some(source) if source.node_type == NodeType::Condition => matched_branches
            .get(&link.from_node)
            .is_some_and(|matched| matched.contains(&link.from_output)),
        _ => true,
    }
}

/// Builds the merged input for a node from all of its inbound links.
///
/// A single inbound link with default slot names passes the source output
/// through unwrapped (the generic UI-drawn edge); anything else produces an
/// object keyed by each link's input slot. Sources that have not published an
/// output contribute nothing.
fn merged_input(
    automation: &Automation,
    inbound: &[&Link],
    ctx: &ExecutionContext,
    matched_branches: &HashMap<NodeId, HashSet<String>>,
) -> JsonValue {
    if let [link] = inbound
        && link.is_default_slots()
    {
        return ctx
            .output(&link.from_node)
            .cloned()
            .unwrap_or(JsonValue::Null);
    }

    let mut map = serde_json::Map::new();
    for link in inbound {
        if !link_live(automation, link, matched_branches) {
            continue;
        }
        if let Some(value) = ctx.output(&link.from_node) {
            map.insert(link.to_input.clone(), value.clone());
        }
    }
    JsonValue::Object(map)
}
