//! Read-only catalog index entries consumed by the navigation layer.

use serde::{Deserialize, Serialize};

/// A product as far as routing is concerned: numeric id plus optional slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub id: u64,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LandingPageStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingPageRef {
    pub id: String,
    pub url_slug: String,
    #[serde(default)]
    pub status: LandingPageStatus,
}

impl LandingPageRef {
    pub fn is_published(&self) -> bool {
        self.status == LandingPageStatus::Published
    }
}
