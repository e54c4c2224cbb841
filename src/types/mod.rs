//! Data types for multi-source orchestration.

pub mod options;
pub mod outcome;
pub mod report;
pub mod schema;
pub mod source;
pub mod task;
