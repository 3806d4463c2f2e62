//! Service layer fronting the hosted backend.
//! - `remote` holds the two collaborator seams (row tables, file buckets),
//!   the REST client implementing them and in-memory doubles.
//! - `posts` is the facade the application talks to.
//! - Errors follow one contract: every facade call returns `Result<_, ServiceError>`.

pub mod errors;
pub mod remote;
pub mod posts;

pub use errors::ServiceError;
pub use posts::{DeleteOutcome, RecordService, StoreTargets};
