//! Vitrine Tenant — decides whose data the running client is looking at.
//!
//! Resolution runs synchronously from the hostname, query and local storage
//! ([`TenantResolver`]), is finalized once the authoritative tenant list
//! arrives ([`TenantService`]), and scopes every locally cached document to
//! the resolved tenant ([`ScopedCache`]).

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod resolver;
pub mod service;

pub use cache::ScopedCache;
pub use config::TenantConfig;
pub use domain::{HostKind, SubdomainSlug};
pub use error::TenantError;
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use resolver::{Reconciliation, TenantResolver};
pub use service::TenantService;
