//! Typed request extractors.

pub mod auth;
