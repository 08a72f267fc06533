//! Confluent schema registry access.
//!
//! The registry is reached through an [`HttpFetch`] capability so the HTTP stack
//! can be swapped out. [`ReqwestFetcher`] is the default.

mod client;
mod fetch;

pub use client::SchemaRegistryClient;
pub use fetch::{HttpFetch, HttpResponse, ReqwestFetcher};
