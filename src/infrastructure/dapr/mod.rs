//! Dapr sidecar adapter over its HTTP API.

pub mod client;

pub use client::DaprClient;
