//! The closed set of top-level views.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewState {
    Storefront,
    ProductDetail,
    Checkout,
    OrderSuccess,
    Profile,
    Admin,
    AdminLogin,
    SuperAdmin,
    LandingPreview,
    OfferPreview,
    StaticPage,
    Registration,
    VisualSearch,
}

impl ViewState {
    /// The admin shell and its login screen. These survive unrecognized
    /// paths so an admin is not kicked out mid-session.
    pub fn is_admin_family(self) -> bool {
        matches!(self, ViewState::Admin | ViewState::AdminLogin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewState::Storefront => "storefront",
            ViewState::ProductDetail => "product-detail",
            ViewState::Checkout => "checkout",
            ViewState::OrderSuccess => "order-success",
            ViewState::Profile => "profile",
            ViewState::Admin => "admin",
            ViewState::AdminLogin => "admin-login",
            ViewState::SuperAdmin => "super-admin",
            ViewState::LandingPreview => "landing-preview",
            ViewState::OfferPreview => "offer-preview",
            ViewState::StaticPage => "static-page",
            ViewState::Registration => "registration",
            ViewState::VisualSearch => "visual-search",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
