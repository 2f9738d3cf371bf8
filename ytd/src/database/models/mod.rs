//! Database models.

pub mod setting;
pub mod task;

pub use setting::*;
pub use task::*;
