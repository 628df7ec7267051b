//! Vitrine Nav — keeps the view state and the browser URL in step.
//!
//! [`Navigator`] maps the current path, query, host class and session to a
//! single [`ViewState`], and writes canonical URLs back through a
//! [`History`] implementation.

pub mod history;
pub mod navigator;
pub mod routes;
pub mod view;

pub use history::{History, MemoryHistory};
pub use navigator::{Navigator, SyncOutcome, initial_view};
pub use routes::Route;
pub use view::ViewState;
