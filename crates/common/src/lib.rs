//! Shared building blocks for the workspace: tracing setup and small
//! payload types reused by the HTTP shell.

pub mod types;
pub mod utils;
