//! Domain models for Vitrine.
//!
//! These are the core types shared across all crates. Only the fields the
//! client core reasons about are modelled; catalog and page content stays
//! opaque to it.

pub mod catalog;
pub mod chat;
pub mod session;
pub mod subscription;
pub mod tenant;
