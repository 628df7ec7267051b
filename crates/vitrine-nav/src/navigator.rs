//! Navigation state machine.
//!
//! Two directions are kept in step:
//! - URL to view: [`Navigator::sync`] runs on mount, on back/forward and
//!   whenever the product or landing-page index changes, because some routes
//!   can only be decided once an index has loaded.
//! - View to URL: after every state change the URL is rewritten (replace,
//!   never push) to `/` when the storefront is showing under a path that does
//!   not belong to it.

use tracing::debug;
use url::form_urlencoded;
use vitrine_core::location::Location;
use vitrine_core::models::catalog::{LandingPageRef, ProductRef};
use vitrine_core::models::session::{SessionUser, UserRole};
use vitrine_core::storage::{KeyValueStore, SharedStore, keys};
use vitrine_tenant::HostKind;

use crate::history::History;
use crate::routes::{NON_SLUG_SEGMENTS, Route, is_landingpage_asset, is_slug_segment};
use crate::view::ViewState;

const DEFAULT_ADMIN_SECTION: &str = "dashboard";

/// Result of one [`Navigator::sync`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Changed(ViewState),
    Unchanged,
    /// The path names an index entry that is not loaded yet. The view is left
    /// alone until the index changes.
    Waiting,
}

fn role_of(user: Option<&SessionUser>) -> Option<UserRole> {
    user.and_then(|u| u.role)
}

fn is_admin(user: Option<&SessionUser>) -> bool {
    role_of(user).is_some_and(UserRole::is_admin)
}

fn is_super_admin(user: Option<&SessionUser>) -> bool {
    role_of(user).is_some_and(UserRole::is_super_admin)
}

/// View to show before any routing has run.
pub fn initial_view(location: &Location, host_kind: HostKind, user: Option<&SessionUser>) -> ViewState {
    let path = location.trimmed_path();
    if path.starts_with("register") {
        return ViewState::Registration;
    }

    let role = role_of(user);
    match host_kind {
        HostKind::TenantLoginPortal => {
            // Platform operators sign in on their own host.
            let tenant_staff = matches!(
                role,
                Some(UserRole::Admin | UserRole::TenantAdmin | UserRole::Staff)
            );
            return if tenant_staff {
                ViewState::Admin
            } else {
                ViewState::AdminLogin
            };
        }
        HostKind::SuperAdminSubdomain => {
            return if role.is_some_and(UserRole::is_super_admin) {
                ViewState::SuperAdmin
            } else {
                ViewState::AdminLogin
            };
        }
        HostKind::AdminSubdomain | HostKind::Tenant => {}
    }

    let admin_path = path == "admin" || path.starts_with("admin/");
    if host_kind == HostKind::AdminSubdomain || admin_path {
        return if role.is_some_and(UserRole::is_back_office) {
            ViewState::Admin
        } else {
            ViewState::AdminLogin
        };
    }

    if path.starts_with("offer/") {
        return ViewState::OfferPreview;
    }
    if path.starts_with("p/") {
        return ViewState::LandingPreview;
    }
    ViewState::Storefront
}

pub struct Navigator<H: History> {
    history: H,
    host_kind: HostKind,
    session_store: SharedStore,
    user: Option<SessionUser>,
    products: Vec<ProductRef>,
    landing_pages: Vec<LandingPageRef>,

    view: ViewState,
    admin_section: String,
    category_filter: Option<String>,
    search_query: String,
    selected_product: Option<ProductRef>,
    selected_landing_page: Option<LandingPageRef>,
    selected_offer_slug: Option<String>,
    static_page: Option<String>,
    waiting_on: Option<String>,
    deferred_url: Option<String>,
}

impl<H: History> Navigator<H> {
    /// Build the navigator and run the mount-time sync.
    ///
    /// `session_store` is session-scoped storage (survives reloads of the
    /// same tab only); it holds the admin section and the order highlight.
    pub fn new(history: H, host_kind: HostKind, session_store: SharedStore, user: Option<SessionUser>) -> Self {
        let view = initial_view(history.location(), host_kind, user.as_ref());
        let admin_section = session_store
            .get_item(keys::ADMIN_SECTION)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_SECTION.to_string());
        let mut navigator = Self {
            history,
            host_kind,
            session_store,
            user,
            products: Vec::new(),
            landing_pages: Vec::new(),
            view,
            admin_section,
            category_filter: None,
            search_query: String::new(),
            selected_product: None,
            selected_landing_page: None,
            selected_offer_slug: None,
            static_page: None,
            waiting_on: None,
            deferred_url: None,
        };
        navigator.sync();
        navigator
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn location(&self) -> &Location {
        self.history.location()
    }

    pub fn admin_section(&self) -> &str {
        &self.admin_section
    }

    pub fn category_filter(&self) -> Option<&str> {
        self.category_filter.as_deref()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn selected_product(&self) -> Option<&ProductRef> {
        self.selected_product.as_ref()
    }

    pub fn selected_landing_page(&self) -> Option<&LandingPageRef> {
        self.selected_landing_page.as_ref()
    }

    pub fn selected_offer_slug(&self) -> Option<&str> {
        self.selected_offer_slug.as_deref()
    }

    pub fn static_page(&self) -> Option<&str> {
        self.static_page.as_deref()
    }

    /// Path the router is waiting on, if an index lookup missed.
    pub fn waiting_on(&self) -> Option<&str> {
        self.waiting_on.as_deref()
    }

    /// `orderId` from the current query, for the order-success view.
    pub fn order_id(&self) -> Option<String> {
        self.history.location().query_param("orderId")
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    pub fn set_user(&mut self, user: Option<SessionUser>) {
        self.user = user;
    }

    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
        self.reconcile_url();
    }

    pub fn set_products(&mut self, products: Vec<ProductRef>) -> SyncOutcome {
        self.products = products;
        self.sync()
    }

    pub fn set_landing_pages(&mut self, pages: Vec<LandingPageRef>) -> SyncOutcome {
        self.landing_pages = pages;
        self.sync()
    }

    /// Browser back/forward.
    pub fn on_pop_state(&mut self) -> SyncOutcome {
        self.sync()
    }

    // -----------------------------------------------------------------------
    // URL -> view
    // -----------------------------------------------------------------------

    pub fn sync(&mut self) -> SyncOutcome {
        let before = self.view;
        let location = self.history.location().clone();
        let path = location.trimmed_path().to_string();
        let was_waiting = self.waiting_on.take().is_some();

        let waiting = self.route(&location, &path);
        if waiting {
            debug!(path = %path, "Route waiting for index");
            self.waiting_on = Some(path);
        }
        self.reconcile_url();

        if waiting {
            SyncOutcome::Waiting
        } else if self.view != before || was_waiting {
            debug!(from = %before, to = %self.view, "View changed");
            SyncOutcome::Changed(self.view)
        } else {
            SyncOutcome::Unchanged
        }
    }

    /// Apply the route for `path`. Returns `true` when the route must wait
    /// for an index to load.
    fn route(&mut self, location: &Location, path: &str) -> bool {
        match Route::classify(path) {
            Route::Register => self.view = ViewState::Registration,
            Route::AdminLogin => self.view = ViewState::AdminLogin,
            Route::Checkout => self.view = ViewState::Checkout,
            Route::VisualSearch => self.view = ViewState::VisualSearch,
            Route::OrderSuccess => self.view = ViewState::OrderSuccess,
            Route::AllProducts => {
                self.category_filter = Some(
                    match (location.query_param("category"), location.query_param("brand")) {
                        (Some(category), _) if !category.is_empty() => category,
                        (_, Some(brand)) if !brand.is_empty() => format!("brand:{brand}"),
                        _ => "all".to_string(),
                    },
                );
                self.show_storefront();
            }
            Route::ProductDetails(slug_or_id) => {
                if let Some(product) = self.find_product(&slug_or_id) {
                    self.selected_product = Some(product);
                    self.view = ViewState::ProductDetail;
                    return false;
                }
                return self.route_unrecognized(path);
            }
            Route::LandingPage(slug) => {
                // Unpublished or not yet loaded: wait instead of bouncing home.
                let Some(page) = self.find_published_page(&slug) else {
                    return true;
                };
                self.selected_landing_page = Some(page);
                self.view = ViewState::LandingPreview;
            }
            Route::Offer(slug) => {
                self.selected_offer_slug = Some(slug);
                self.view = ViewState::OfferPreview;
            }
            Route::StaticContent(page) => {
                if !self.view.is_admin_family() {
                    self.static_page = Some(page);
                    self.view = ViewState::StaticPage;
                }
            }
            Route::StaticRoute(_) => self.show_storefront(),
            Route::Segment(segment) => self.route_segment(location, &segment),
            Route::LandingPageAsset => {}
            Route::Empty => self.route_empty(),
            Route::Unknown(_) => return self.route_unrecognized(path),
        }
        false
    }

    /// Candidate landing-page slug, then `products`, then `admin`, then a
    /// bare product slug. Anything else shows the storefront in place.
    fn route_segment(&mut self, location: &Location, segment: &str) {
        if let Some(page) = self.find_published_page(segment) {
            self.selected_landing_page = Some(page);
            self.view = ViewState::LandingPreview;
            return;
        }
        match segment {
            "products" => {
                match location.query_param("categories").filter(|c| !c.is_empty()) {
                    Some(category) => self.category_filter = Some(category),
                    None => {
                        self.history.replace_state("/");
                        self.category_filter = None;
                    }
                }
                self.show_storefront();
            }
            "admin" => {
                self.view = if is_admin(self.user.as_ref()) {
                    ViewState::Admin
                } else {
                    ViewState::AdminLogin
                };
            }
            _ => match self.find_product_by_slug(segment) {
                Some(product) => {
                    self.selected_product = Some(product);
                    self.view = ViewState::ProductDetail;
                }
                None => self.show_storefront(),
            },
        }
    }

    fn route_empty(&mut self) {
        self.category_filter = None;
        let user = self.user.as_ref();
        match self.host_kind {
            HostKind::TenantLoginPortal => {
                self.view = if is_admin(user) {
                    ViewState::Admin
                } else {
                    ViewState::AdminLogin
                };
            }
            HostKind::SuperAdminSubdomain => {
                self.view = if is_super_admin(user) {
                    ViewState::SuperAdmin
                } else {
                    ViewState::AdminLogin
                };
            }
            HostKind::AdminSubdomain => {
                if !self.view.is_admin_family() {
                    self.view = ViewState::AdminLogin;
                }
            }
            HostKind::Tenant => self.show_storefront(),
        }
    }

    /// Paths no route claimed. Privileged hosts keep their context, pending
    /// product lookups wait, everything else resets to `/`.
    fn route_unrecognized(&mut self, path: &str) -> bool {
        if self.view == ViewState::AdminLogin {
            return false;
        }
        let user = self.user.as_ref();
        match self.host_kind {
            HostKind::SuperAdminSubdomain => {
                self.view = if is_super_admin(user) {
                    ViewState::SuperAdmin
                } else {
                    ViewState::AdminLogin
                };
                return false;
            }
            HostKind::TenantLoginPortal => {
                self.view = if is_admin(user) {
                    ViewState::Admin
                } else {
                    ViewState::AdminLogin
                };
                return false;
            }
            HostKind::AdminSubdomain | HostKind::Tenant => {}
        }
        if path.starts_with("product-details/") {
            return true;
        }
        if is_landingpage_asset(path) {
            return false;
        }
        debug!(path, "Unknown path, resetting to root");
        self.history.replace_state("/");
        self.show_storefront();
        false
    }

    fn show_storefront(&mut self) {
        if !self.view.is_admin_family() {
            self.selected_product = None;
            self.view = ViewState::Storefront;
        }
    }

    fn find_product_by_slug(&self, slug: &str) -> Option<ProductRef> {
        self.products
            .iter()
            .find(|p| p.slug.as_deref() == Some(slug))
            .cloned()
    }

    /// By slug first, then by numeric id.
    fn find_product(&self, slug_or_id: &str) -> Option<ProductRef> {
        self.find_product_by_slug(slug_or_id).or_else(|| {
            let id: u64 = slug_or_id.parse().ok()?;
            self.products.iter().find(|p| p.id == id).cloned()
        })
    }

    fn find_published_page(&self, slug: &str) -> Option<LandingPageRef> {
        self.landing_pages
            .iter()
            .find(|lp| lp.url_slug == slug && lp.is_published())
            .cloned()
    }

    // -----------------------------------------------------------------------
    // View -> URL
    // -----------------------------------------------------------------------

    /// Replace the URL with `/` when the storefront is showing under a path
    /// that does not belong to it.
    fn reconcile_url(&mut self) {
        if self.view != ViewState::Storefront || self.host_kind == HostKind::TenantLoginPortal {
            return;
        }
        let location = self.history.location();
        let path = location.trimmed_path();
        let legitimate = matches!(
            path,
            "admin/login" | "register" | "visual-search" | "search" | "all-products" | "products"
        ) || path.starts_with("p/")
            || path.starts_with("offer/")
            || path.starts_with("product-details/")
            || is_landingpage_asset(path)
            || (is_slug_segment(path) && !NON_SLUG_SEGMENTS.contains(&path))
            || self.find_product_by_slug(path).is_some();
        if legitimate {
            return;
        }
        let pathname = location.pathname();
        if pathname != "/"
            && !pathname.contains("checkout")
            && !pathname.contains("success-order")
            && !pathname.contains("register")
        {
            debug!(pathname, "Resetting storefront URL");
            self.history.replace_state("/");
        }
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    /// Show the product immediately, then record the URL.
    pub fn handle_product_click(&mut self, product: ProductRef) {
        self.view = ViewState::ProductDetail;
        let slug = product.slug.clone();
        self.selected_product = Some(product);
        if let Some(slug) = slug.filter(|s| !s.is_empty()) {
            self.history.push_state(&format!("/product-details/{slug}"));
        }
    }

    /// Apply the filter now; the URL is written on the next
    /// [`on_animation_frame`](Self::on_animation_frame).
    pub fn handle_category_filter_change(&mut self, category: Option<&str>) {
        self.category_filter = category.map(str::to_string);
        let target = match category {
            None => "/".to_string(),
            Some("all") => "/all-products".to_string(),
            Some(filter) => match filter.strip_prefix("brand:") {
                Some(brand) => format!("/all-products?brand={}", encode(brand)),
                None => format!("/all-products?category={}", encode(filter)),
            },
        };
        self.deferred_url = Some(target);
    }

    /// Flush a deferred URL write. Returns whether one was pending.
    pub fn on_animation_frame(&mut self) -> bool {
        match self.deferred_url.take() {
            Some(target) => {
                self.history.push_state(&target);
                true
            }
            None => false,
        }
    }

    pub fn handle_store_search_change(&mut self, query: &str) {
        self.search_query = query.to_string();
        if self.view != ViewState::Storefront {
            self.selected_product = None;
            self.view = ViewState::Storefront;
            self.reconcile_url();
        }
    }

    /// Persist the admin panel section for this browser session.
    pub fn set_admin_section(&mut self, section: &str) {
        self.admin_section = section.to_string();
        self.session_store.persist(keys::ADMIN_SECTION, section);
    }

    /// Open the admin orders section with `order_id` highlighted.
    pub fn navigate_to_order(&mut self, order_id: &str) {
        debug!(order_id, "Navigating to order");
        self.view = ViewState::Admin;
        self.set_admin_section("orders");
        self.session_store.persist(keys::HIGHLIGHT_ORDER_ID, order_id);
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
