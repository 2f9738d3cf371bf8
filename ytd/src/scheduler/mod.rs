//! Bounded-concurrency task scheduler.

pub mod events;
pub mod service;

pub use events::{FailureCause, TaskEvent};
pub use service::{TaskRequest, TaskScheduler};
