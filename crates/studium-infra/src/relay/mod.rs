//! HTTP relay to the external answering service.

pub mod client;

pub use client::HttpAnsweringRelay;
