//! Workflow execution engine for the flowdeck platform.
//!
//! This crate provides the core automation execution engine, including:
//!
//! - **Graph Model**: Nodes (trigger, tool, agent, condition) connected by
//!   keyed data-flow links
//! - **Automation**: The aggregate owning the node/link collection and its
//!   status state machine
//! - **Execution**: A deterministic work-queue executor with fan-in merging,
//!   condition branch pruning, and loop safety on cyclic graphs
//! - **Listeners**: Panic-isolated progress observers for SSE/telemetry layers
//! - **Resolvers**: Narrow async contracts to the external tool/agent/condition
//!   registries, plus in-memory implementations for embedding and tests

pub mod automation;
pub mod context;
pub mod error;
pub mod executor;
pub mod link;
pub mod listener;
pub mod node;
pub mod resolver;

pub use automation::{Automation, AutomationStatus};
pub use context::ExecutionContext;
pub use error::{AutomationError, ExecuteError, NodeFault};
pub use executor::Executor;
pub use link::Link;
pub use listener::{ListenerRegistry, NodeEvent, NodeEventStatus};
pub use node::{Node, NodeId, NodeType};
pub use resolver::{
    AgentResolver, ConditionEvaluator, FnInvokable, Invokable, InvokeError,
    StaticConditionEvaluator, StaticResolver, ToolResolver,
};
