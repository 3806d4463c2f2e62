//! Wire-level records exchanged with the hosted backend.
//!
//! Field names follow the remote platform's JSON (`$id`, `featuredImage`,
//! `userId`); Rust-side names stay snake_case.

pub mod errors;
pub mod id;
pub mod post;
pub mod file;
pub mod list;

pub use errors::ModelError;
pub use file::{FileUpload, StoredFile};
pub use list::RowList;
pub use post::{NewPost, Post, PostPatch, PostStatus};
