//! Repository layer for database access.

pub mod settings;
pub mod task;

pub use settings::*;
pub use task::*;
