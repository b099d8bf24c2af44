//! Task Tracking Module
//!
//! The fleet-wide view of submitted jobs. Membership is a set of task ids in the shared
//! store; status always comes from the execution engine, merged into a [`TaskRecord`] at
//! read time.
//!
//! ## Submodules
//! - **`registry`**: `TaskRegistry` (submit / get_status / cancel / list).
//! - **`types`**: the client-facing `TaskRecord`.
//! - **`protocol`**: HTTP DTOs and endpoint paths.
//! - **`handlers`**: axum handlers for task queries and job submission.

pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod types;

pub use registry::TaskRegistry;
pub use types::TaskRecord;
