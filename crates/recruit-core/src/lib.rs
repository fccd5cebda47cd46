//! Core types and trait definitions for the HR↔Admin mapping workflow.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The pieces, leaf first:
//!
//! - [`identity`]: users and the HR record the workflow reads and writes.
//! - [`request`]: the `MappingRequest` entity and its closed status set.
//! - [`engine`]: pure transition rules; the only code that decides a status.
//! - [`store`]: the storage abstraction and the read-view queries.
//! - [`agent`]: role-scoped operations for HR and Admin callers.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod agent;
pub mod engine;
pub mod error;
pub mod identity;
pub mod request;
pub mod store;

pub use error::{Error, ErrorKind, Result};
