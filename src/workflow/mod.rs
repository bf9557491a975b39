//! Workflow engine — a fixed graph of typed nodes with deterministic
//! and conditional transitions, run once per scheduler tick.

pub mod engine;
pub mod state;

pub use engine::{Node, WorkflowEngine, next_node};
pub use state::{RunState, RunStatus, StateDelta};
