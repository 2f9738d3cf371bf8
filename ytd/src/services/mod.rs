//! Application services.

pub mod container;
pub mod history;

pub use container::ServiceContainer;
pub use history::HistoryService;
