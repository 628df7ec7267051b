//! Vitrine Chat — keeps a tenant's chat log in step with the remote store.
//!
//! Local edits are applied first and persisted afterwards. A poller fetches
//! the remote log on an interval and replaces the local copy when the two
//! differ. [`SyncGate`] keeps persists and polls from overlapping.

pub mod config;
pub mod diff;
pub mod engine;
pub mod gate;
pub mod poller;

pub use config::ChatConfig;
pub use engine::{ChatSyncEngine, PollOutcome};
pub use gate::{GateGuard, SyncGate, SyncPhase};
pub use poller::spawn_poller;
