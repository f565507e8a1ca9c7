//! Comparison log storage
//!
//! This module provides sortable comparison ids, the ordered in-memory log,
//! and the repository interface with in-memory and JSON file backends.

pub mod clock;
pub mod file;
pub mod id;
pub mod log;
pub mod repository;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use file::JsonFileComparisonRepository;
pub use id::ComparisonId;
pub use log::ComparisonLog;
pub use repository::{ComparisonRepository, InMemoryComparisonRepository, RepositoryLimits};
