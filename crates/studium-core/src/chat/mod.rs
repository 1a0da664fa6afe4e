//! Chat session and message persistence abstractions for Studium.
//!
//! This module defines the `SessionRepository` trait that the infrastructure
//! layer implements, and the `ChatService` that orchestrates sessions, the
//! answering relay, and attachment cleanup.

pub mod repository;
pub mod service;
