//! Business logic and repository trait definitions for Studium.
//!
//! This crate defines the "ports" (repository, relay, and attachment-store
//! traits) that the infrastructure layer implements. It depends only on
//! `studium-types` -- never on `studium-infra` or any database/IO crate.

pub mod chat;
pub mod relay;
pub mod storage;
