//! Document store access for the job board.
//!
//! This crate provides:
//! - A `DocumentStore` seam with Firestore REST and in-memory implementations
//! - Service account authentication via gcp_auth
//! - Typed repositories for jobs and job applications

pub mod application_repo;
pub mod client;
pub mod error;
pub mod job_repo;
pub mod memory;
pub mod metrics;
pub mod query;
pub mod sorting;
pub mod store;
pub mod token_cache;
pub mod types;

pub use application_repo::{ApplicationRepository, APPLICATIONS_COLLECTION};
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use job_repo::{JobRepository, JOBS_COLLECTION};
pub use memory::MemoryStore;
pub use query::{FilterOp, Query};
pub use store::{DocumentStore, StoredDocument};
pub use types::{Document, Value};
