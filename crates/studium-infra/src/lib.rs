//! Infrastructure layer for Studium.
//!
//! Contains implementations of the traits defined in `studium-core`:
//! SQLite session storage, the local-filesystem attachment store, and the
//! HTTP relay client for the external answering service.

pub mod config;
pub mod relay;
pub mod sqlite;
pub mod storage;
