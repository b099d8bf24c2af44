//! Task Execution Module
//!
//! The execution engine is the authority on task status. The coordination layer talks to
//! it only through the [`ExecutionEngine`] trait, so a node can run against any engine that
//! speaks typed statuses.
//!
//! ## Submodules
//! - **`engine`**: The `ExecutionEngine` boundary (submit, status lookup, revoke).
//! - **`executor`**: `LocalEngine`, the in-process reference engine. Status records live in
//!   the shared store; a worker pool drains an in-process queue (claim -> run -> complete).
//! - **`jobs`**: The built-in `ingest_csv` and `query` job kinds.
//! - **`registry`**: Maps job kinds (e.g. "ingest_csv") to executable async closures.
//! - **`types`**: Task identifiers, jobs and the typed `TaskState` lifecycle.

pub mod engine;
pub mod executor;
pub mod jobs;
pub mod registry;
pub mod types;

pub use engine::ExecutionEngine;
pub use executor::LocalEngine;
pub use registry::JobHandlerRegistry;
pub use types::{EngineStatus, Job, TaskId, TaskState};

#[cfg(test)]
mod tests;
