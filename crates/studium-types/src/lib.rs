//! Shared domain types for Studium.
//!
//! This crate contains the core domain types used across the Studium chat
//! backend: sessions, messages, attachments, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod relay;
pub mod upload;
