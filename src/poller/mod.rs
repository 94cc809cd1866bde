//! Background polling: reconcile ticks, their scheduler, and periodic maintenance.

mod maintenance;
mod pipeline;
mod scheduler;

pub use maintenance::{spawn_badge_refresh, spawn_retention_pruning};
pub use pipeline::{ReconcilePipeline, TickError, TickOutcome};
pub use scheduler::PollScheduler;
