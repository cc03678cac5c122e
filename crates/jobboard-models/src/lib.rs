//! Shared data models for the job board backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job postings and their salary ranges
//! - Job applications and status updates
//! - Listing filters
//! - Write outcomes reported back to API clients

pub mod application;
pub mod filter;
pub mod job;
pub mod outcome;
pub mod validation;

// Re-export common types
pub use application::{ApplicationId, JobApplication, NewApplication, StatusUpdate};
pub use filter::{JobFilter, SalaryBounds};
pub use job::{Job, JobId, NewJob, SalaryRange};
pub use outcome::{DeleteResult, InsertResult, UpdateResult};
pub use validation::{ValidationError, ValidationResult};

/// A schema-flexible document body as exchanged with the document store.
pub type Fields = serde_json::Map<String, serde_json::Value>;
