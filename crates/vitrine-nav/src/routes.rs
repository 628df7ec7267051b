//! Path classification.
//!
//! [`Route::classify`] only looks at the trimmed path. Lookups against the
//! product and landing-page indexes happen in the navigator, which may fall
//! through to later routes when a lookup misses.

/// Content pages rendered from the website configuration.
pub const STATIC_CONTENT_PAGES: &[&str] = &[
    "privacy",
    "privacy-policy",
    "about",
    "about-us",
    "terms",
    "terms-and-conditions",
    "termsnconditions",
    "returnpolicy",
    "return-policy",
    "refund",
    "refund-policy",
];

/// Storefront paths that must never be taken for a landing-page slug.
pub const STATIC_ROUTES: &[&str] = &[
    "privacy",
    "privacy-policy",
    "about",
    "about-us",
    "terms",
    "terms-and-conditions",
    "contact",
    "contact-us",
    "profile",
    "categories",
    "track",
    "track-order",
    "faq",
    "help",
    "support",
    "blog",
    "cart",
    "wishlist",
    "orders",
    "my-orders",
    "account",
    "login",
    "signup",
    "sign-up",
    "signin",
    "sign-in",
    "forgot-password",
    "reset-password",
    "returns",
    "return-policy",
    "refund",
    "refund-policy",
    "shipping",
    "shipping-policy",
    "delivery",
    "delivery-policy",
];

/// Single-segment paths that are not kept in the URL while on the storefront.
pub const NON_SLUG_SEGMENTS: &[&str] = &[
    "admin", "register", "checkout", "cart", "wishlist", "profile", "orders", "tracking",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Register,
    AdminLogin,
    Checkout,
    VisualSearch,
    OrderSuccess,
    AllProducts,
    /// `product-details/<slug-or-id>`
    ProductDetails(String),
    /// `p/<slug>`
    LandingPage(String),
    /// `offer/<slug>`
    Offer(String),
    StaticContent(String),
    StaticRoute(String),
    /// Any other `[A-Za-z0-9-]+` segment: maybe a landing page, `products`,
    /// `admin` or a product slug.
    Segment(String),
    /// `landingpage` and below, served outside the client.
    LandingPageAsset,
    Empty,
    Unknown(String),
}

impl Route {
    /// Classify a path with leading and trailing slashes already removed.
    pub fn classify(path: &str) -> Self {
        match path {
            "register" => return Route::Register,
            "admin/login" => return Route::AdminLogin,
            "checkout" => return Route::Checkout,
            "visual-search" | "search" => return Route::VisualSearch,
            "success-order" => return Route::OrderSuccess,
            "all-products" => return Route::AllProducts,
            "" => return Route::Empty,
            _ => {}
        }
        if let Some(rest) = path.strip_prefix("product-details/") {
            return Route::ProductDetails(rest.to_string());
        }
        if let Some(rest) = path.strip_prefix("p/") {
            return Route::LandingPage(rest.to_string());
        }
        if let Some(rest) = path.strip_prefix("offer/") {
            return Route::Offer(rest.to_string());
        }
        let lowered = path.to_ascii_lowercase();
        if STATIC_CONTENT_PAGES.contains(&lowered.as_str()) {
            return Route::StaticContent(lowered);
        }
        if is_landingpage_asset(path) {
            return Route::LandingPageAsset;
        }
        if is_slug_segment(path) {
            if STATIC_ROUTES.contains(&lowered.as_str()) {
                return Route::StaticRoute(lowered);
            }
            return Route::Segment(path.to_string());
        }
        Route::Unknown(path.to_string())
    }
}

/// A non-empty `[A-Za-z0-9-]+` path.
pub fn is_slug_segment(path: &str) -> bool {
    !path.is_empty() && path.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub fn is_landingpage_asset(path: &str) -> bool {
    path == "landingpage" || path.starts_with("landingpage/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_routes_win_over_segments() {
        assert_eq!(Route::classify("register"), Route::Register);
        assert_eq!(Route::classify("checkout"), Route::Checkout);
        assert_eq!(Route::classify("search"), Route::VisualSearch);
        assert_eq!(Route::classify("admin/login"), Route::AdminLogin);
        assert_eq!(Route::classify(""), Route::Empty);
    }

    #[test]
    fn prefixed_routes_keep_their_remainder() {
        assert_eq!(
            Route::classify("product-details/red-sneaker-42"),
            Route::ProductDetails("red-sneaker-42".into())
        );
        assert_eq!(Route::classify("p/summer"), Route::LandingPage("summer".into()));
        assert_eq!(Route::classify("offer/bogo"), Route::Offer("bogo".into()));
    }

    #[test]
    fn static_pages_are_case_insensitive() {
        assert_eq!(Route::classify("About-Us"), Route::StaticContent("about-us".into()));
        assert_eq!(Route::classify("cart"), Route::StaticRoute("cart".into()));
    }

    #[test]
    fn other_segments_are_candidates() {
        assert_eq!(Route::classify("summer-sale-x1"), Route::Segment("summer-sale-x1".into()));
        assert_eq!(Route::classify("admin"), Route::Segment("admin".into()));
        assert_eq!(Route::classify("products"), Route::Segment("products".into()));
        assert_eq!(Route::classify("landingpage"), Route::LandingPageAsset);
        assert_eq!(Route::classify("a/b"), Route::Unknown("a/b".into()));
        assert_eq!(Route::classify("snake_case"), Route::Unknown("snake_case".into()));
    }
}
