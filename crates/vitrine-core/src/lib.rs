//! Vitrine Core — shared types for the storefront client core.
//!
//! This crate provides:
//! - Error types ([`VitrineError`], [`VitrineResult`])
//! - Domain models (tenants, session users, chat messages, subscriptions)
//! - Remote repository traits consumed by the tenant, chat and billing layers
//! - The local key/value storage capability ([`KeyValueStore`])
//! - A [`Clock`] so time-driven logic can be tested deterministically

pub mod clock;
pub mod error;
pub mod location;
pub mod models;
pub mod repository;
pub mod storage;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{VitrineError, VitrineResult};
pub use location::Location;
pub use models::tenant::TenantScope;
pub use storage::{FileStore, KeyValueStore, MemoryStore, SharedStore, StorageError};
