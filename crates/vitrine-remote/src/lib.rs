//! Vitrine Remote — implementations of the `vitrine-core` repository traits.
//!
//! This crate provides:
//! - A REST/JSON client over `reqwest` ([`HttpRemote`], [`RemoteConfig`])
//! - An in-process store with failure injection and call counters
//!   ([`MemoryRemote`]), used by tests and offline tooling
//! - Error types ([`RemoteError`])

mod config;
mod error;
mod http;
mod memory;

pub use config::RemoteConfig;
pub use error::RemoteError;
pub use http::HttpRemote;
pub use memory::{MemoryRemote, RemoteOp};
