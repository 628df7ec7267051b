//! Integration tests for the navigation state machine.

use pretty_assertions::assert_eq;
use vitrine_core::location::Location;
use vitrine_core::models::catalog::{LandingPageRef, LandingPageStatus, ProductRef};
use vitrine_core::models::session::{SessionUser, UserRole};
use vitrine_core::storage::{KeyValueStore, MemoryStore, SharedStore, keys};
use vitrine_nav::{History, MemoryHistory, Navigator, SyncOutcome, ViewState, initial_view};
use vitrine_tenant::HostKind;

fn setup(href: &str, host_kind: HostKind, user: Option<SessionUser>) -> (Navigator<MemoryHistory>, SharedStore) {
    let session = MemoryStore::shared();
    let history = MemoryHistory::open(href).unwrap();
    let nav = Navigator::new(history, host_kind, session.clone(), user);
    (nav, session)
}

fn user(role: UserRole) -> Option<SessionUser> {
    Some(SessionUser {
        name: "Dana".into(),
        role: Some(role),
        ..Default::default()
    })
}

fn product(id: u64, slug: &str) -> ProductRef {
    ProductRef {
        id,
        slug: Some(slug.into()),
        name: slug.replace('-', " "),
    }
}

fn landing_page(slug: &str, status: LandingPageStatus) -> LandingPageRef {
    LandingPageRef {
        id: format!("lp-{slug}"),
        url_slug: slug.into(),
        status,
    }
}

#[test]
fn product_details_wait_for_the_index() {
    let (mut nav, _) = setup(
        "https://shoes.example.com/product-details/red-sneaker-42",
        HostKind::Tenant,
        None,
    );
    assert_eq!(nav.view(), ViewState::Storefront);
    assert_eq!(nav.waiting_on(), Some("product-details/red-sneaker-42"));
    assert_eq!(nav.history().replace_count(), 0);
    assert_eq!(nav.location().pathname(), "/product-details/red-sneaker-42");

    let outcome = nav.set_products(vec![product(7, "blue-boot"), product(42, "red-sneaker-42")]);
    assert_eq!(outcome, SyncOutcome::Changed(ViewState::ProductDetail));
    assert_eq!(nav.selected_product().map(|p| p.id), Some(42));
    assert_eq!(nav.waiting_on(), None);
}

#[test]
fn product_details_match_numeric_id() {
    let (mut nav, _) = setup("https://shoes.example.com/product-details/42", HostKind::Tenant, None);
    nav.set_products(vec![product(42, "red-sneaker-42")]);
    assert_eq!(nav.view(), ViewState::ProductDetail);
    assert_eq!(nav.selected_product().map(|p| p.id), Some(42));
}

#[test]
fn landing_page_waits_until_published() {
    let (mut nav, _) = setup("https://shoes.example.com/p/summer-sale", HostKind::Tenant, None);
    assert_eq!(nav.view(), ViewState::LandingPreview);
    assert_eq!(nav.waiting_on(), Some("p/summer-sale"));

    let outcome = nav.set_landing_pages(vec![landing_page("summer-sale", LandingPageStatus::Draft)]);
    assert_eq!(outcome, SyncOutcome::Waiting);
    assert!(nav.selected_landing_page().is_none());

    let outcome = nav.set_landing_pages(vec![landing_page("summer-sale", LandingPageStatus::Published)]);
    assert_eq!(outcome, SyncOutcome::Changed(ViewState::LandingPreview));
    assert_eq!(
        nav.selected_landing_page().map(|lp| lp.url_slug.as_str()),
        Some("summer-sale")
    );
    assert_eq!(nav.history().replace_count(), 0);
}

#[test]
fn bare_slug_resolves_published_landing_page() {
    let (mut nav, _) = setup("https://shoes.example.com/summer-sale", HostKind::Tenant, None);
    assert_eq!(nav.view(), ViewState::Storefront);

    nav.set_landing_pages(vec![landing_page("summer-sale", LandingPageStatus::Published)]);
    assert_eq!(nav.view(), ViewState::LandingPreview);
}

#[test]
fn bare_slug_resolves_product() {
    let (mut nav, _) = setup("https://shoes.example.com/red-sneaker-42", HostKind::Tenant, None);
    nav.set_products(vec![product(42, "red-sneaker-42")]);
    assert_eq!(nav.view(), ViewState::ProductDetail);
    assert_eq!(nav.location().pathname(), "/red-sneaker-42");
}

#[test]
fn unmatched_slug_keeps_url_on_storefront() {
    let (nav, _) = setup("https://shoes.example.com/mystery-drop", HostKind::Tenant, None);
    assert_eq!(nav.view(), ViewState::Storefront);
    assert_eq!(nav.location().pathname(), "/mystery-drop");
    assert_eq!(nav.history().replace_count(), 0);
}

#[test]
fn unknown_path_resets_to_root() {
    let (nav, _) = setup("https://shoes.example.com/some/deep/path", HostKind::Tenant, None);
    assert_eq!(nav.view(), ViewState::Storefront);
    assert_eq!(nav.location().pathname(), "/");
    assert_eq!(nav.history().replace_count(), 1);
    assert_eq!(nav.history().push_count(), 0);
}

#[test]
fn storefront_drops_non_slug_segments_from_url() {
    let (nav, _) = setup("https://shoes.example.com/cart", HostKind::Tenant, None);
    assert_eq!(nav.view(), ViewState::Storefront);
    assert_eq!(nav.location().pathname(), "/");
}

#[test]
fn fixed_routes_set_their_views() {
    let cases = [
        ("/checkout", ViewState::Checkout),
        ("/register", ViewState::Registration),
        ("/visual-search", ViewState::VisualSearch),
        ("/admin/login", ViewState::AdminLogin),
        ("/offer/bogo", ViewState::OfferPreview),
        ("/About-Us", ViewState::StaticPage),
    ];
    for (path, expected) in cases {
        let (nav, _) = setup(&format!("https://shoes.example.com{path}"), HostKind::Tenant, None);
        assert_eq!(nav.view(), expected, "{path}");
        assert_eq!(nav.location().pathname(), path, "{path}");
    }
}

#[test]
fn success_order_exposes_order_id() {
    let (nav, _) = setup("https://shoes.example.com/success-order?orderId=A-17", HostKind::Tenant, None);
    assert_eq!(nav.view(), ViewState::OrderSuccess);
    assert_eq!(nav.order_id().as_deref(), Some("A-17"));
}

#[test]
fn all_products_reads_category_then_brand() {
    let (nav, _) = setup("https://shoes.example.com/all-products?category=boots", HostKind::Tenant, None);
    assert_eq!(nav.category_filter(), Some("boots"));

    let (nav, _) = setup("https://shoes.example.com/all-products?brand=Acme", HostKind::Tenant, None);
    assert_eq!(nav.category_filter(), Some("brand:Acme"));

    let (nav, _) = setup("https://shoes.example.com/all-products", HostKind::Tenant, None);
    assert_eq!(nav.category_filter(), Some("all"));
    assert_eq!(nav.view(), ViewState::Storefront);
    assert_eq!(nav.location().pathname(), "/all-products");
}

#[test]
fn products_without_categories_resets_url() {
    let (nav, _) = setup("https://shoes.example.com/products", HostKind::Tenant, None);
    assert_eq!(nav.location().pathname(), "/");
    assert_eq!(nav.category_filter(), None);

    let (nav, _) = setup("https://shoes.example.com/products?categories=bags", HostKind::Tenant, None);
    assert_eq!(nav.location().pathname(), "/products");
    assert_eq!(nav.category_filter(), Some("bags"));
}

#[test]
fn admin_family_survives_storefront_routes() {
    let (mut nav, _) = setup("https://shoes.example.com/admin", HostKind::Tenant, user(UserRole::Admin));
    assert_eq!(nav.view(), ViewState::Admin);

    nav.history_mut().push_state("/cart");
    nav.on_pop_state();
    assert_eq!(nav.view(), ViewState::Admin);

    nav.history_mut().push_state("/privacy");
    nav.on_pop_state();
    assert_eq!(nav.view(), ViewState::Admin);
    assert_eq!(nav.static_page(), None);
}

#[test]
fn admin_segment_without_role_shows_login() {
    let (nav, _) = setup("https://shoes.example.com/admin", HostKind::Tenant, user(UserRole::Customer));
    assert_eq!(nav.view(), ViewState::AdminLogin);
}

#[test]
fn super_admin_host_keeps_context_on_unknown_paths() {
    let (nav, _) = setup(
        "https://superadmin.example.com/tenants/list",
        HostKind::SuperAdminSubdomain,
        user(UserRole::SuperAdmin),
    );
    assert_eq!(nav.view(), ViewState::SuperAdmin);
    assert_eq!(nav.location().pathname(), "/tenants/list");
    assert_eq!(nav.history().replace_count(), 0);

    let (nav, _) = setup("https://superadmin.example.com/", HostKind::SuperAdminSubdomain, user(UserRole::Admin));
    assert_eq!(nav.view(), ViewState::AdminLogin);
}

#[test]
fn login_portal_routes_by_role() {
    let (nav, _) = setup("https://login.example.com/", HostKind::TenantLoginPortal, None);
    assert_eq!(nav.view(), ViewState::AdminLogin);

    let (nav, _) = setup(
        "https://login.example.com/",
        HostKind::TenantLoginPortal,
        user(UserRole::TenantAdmin),
    );
    assert_eq!(nav.view(), ViewState::Admin);
}

#[test]
fn admin_subdomain_root_shows_login() {
    let (nav, _) = setup("https://admin.example.com/", HostKind::AdminSubdomain, None);
    assert_eq!(nav.view(), ViewState::AdminLogin);

    let (nav, _) = setup("https://admin.example.com/", HostKind::AdminSubdomain, user(UserRole::Staff));
    assert_eq!(nav.view(), ViewState::Admin);
}

#[test]
fn category_filter_url_is_deferred_to_next_frame() {
    let (mut nav, _) = setup("https://shoes.example.com/", HostKind::Tenant, None);

    nav.handle_category_filter_change(Some("brand:Acme Co"));
    assert_eq!(nav.category_filter(), Some("brand:Acme Co"));
    assert_eq!(nav.history().push_count(), 0);
    assert_eq!(nav.location().pathname(), "/");

    assert!(nav.on_animation_frame());
    assert_eq!(nav.location().path_and_query(), "/all-products?brand=Acme+Co");
    assert!(!nav.on_animation_frame());

    nav.handle_category_filter_change(Some("all"));
    nav.on_animation_frame();
    assert_eq!(nav.location().path_and_query(), "/all-products");

    nav.handle_category_filter_change(Some("boots"));
    nav.on_animation_frame();
    assert_eq!(nav.location().path_and_query(), "/all-products?category=boots");

    nav.handle_category_filter_change(None);
    nav.on_animation_frame();
    assert_eq!(nav.location().pathname(), "/");
    assert_eq!(nav.history().push_count(), 4);
}

#[test]
fn back_navigation_restores_filter_from_url() {
    let (mut nav, _) = setup("https://shoes.example.com/", HostKind::Tenant, None);
    nav.handle_category_filter_change(Some("brand:Acme Co"));
    nav.on_animation_frame();
    nav.handle_category_filter_change(None);
    nav.on_animation_frame();

    assert!(nav.history_mut().back());
    nav.on_pop_state();
    assert_eq!(nav.category_filter(), Some("brand:Acme Co"));
}

#[test]
fn product_click_switches_view_before_pushing() {
    let (mut nav, _) = setup("https://shoes.example.com/", HostKind::Tenant, None);
    nav.handle_product_click(product(42, "red-sneaker-42"));

    assert_eq!(nav.view(), ViewState::ProductDetail);
    assert_eq!(nav.location().pathname(), "/product-details/red-sneaker-42");
    assert_eq!(nav.history().push_count(), 1);
}

#[test]
fn search_returns_to_storefront() {
    let (mut nav, _) = setup("https://shoes.example.com/", HostKind::Tenant, None);
    nav.handle_product_click(product(42, "red-sneaker-42"));
    nav.handle_store_search_change("boots");

    assert_eq!(nav.view(), ViewState::Storefront);
    assert_eq!(nav.search_query(), "boots");
    assert!(nav.selected_product().is_none());
}

#[test]
fn navigate_to_order_persists_section_and_highlight() {
    let (mut nav, session) = setup("https://shoes.example.com/admin", HostKind::Tenant, user(UserRole::Admin));
    nav.navigate_to_order("ord-9");

    assert_eq!(nav.view(), ViewState::Admin);
    assert_eq!(nav.admin_section(), "orders");
    assert_eq!(session.get_item(keys::ADMIN_SECTION).as_deref(), Some("orders"));
    assert_eq!(session.get_item(keys::HIGHLIGHT_ORDER_ID).as_deref(), Some("ord-9"));
}

#[test]
fn admin_section_restored_from_session() {
    let session = MemoryStore::shared();
    session.persist(keys::ADMIN_SECTION, "products");
    let history = MemoryHistory::open("https://shoes.example.com/admin").unwrap();
    let nav = Navigator::new(history, HostKind::Tenant, session, user(UserRole::Admin));
    assert_eq!(nav.admin_section(), "products");

    let (nav, _) = setup("https://shoes.example.com/admin", HostKind::Tenant, user(UserRole::Admin));
    assert_eq!(nav.admin_section(), "dashboard");
}

#[test]
fn initial_view_precedence() {
    let at = |href: &str| Location::parse(href).unwrap();
    let staff = user(UserRole::Staff);
    let super_admin = user(UserRole::SuperAdmin);

    assert_eq!(
        initial_view(&at("https://login.example.com/register"), HostKind::TenantLoginPortal, None),
        ViewState::Registration
    );
    assert_eq!(
        initial_view(&at("https://login.example.com/"), HostKind::TenantLoginPortal, staff.as_ref()),
        ViewState::Admin
    );
    assert_eq!(
        initial_view(&at("https://superadmin.example.com/"), HostKind::SuperAdminSubdomain, staff.as_ref()),
        ViewState::AdminLogin
    );
    assert_eq!(
        initial_view(
            &at("https://superadmin.example.com/"),
            HostKind::SuperAdminSubdomain,
            super_admin.as_ref()
        ),
        ViewState::SuperAdmin
    );
    assert_eq!(
        initial_view(&at("https://shoes.example.com/admin/orders"), HostKind::Tenant, staff.as_ref()),
        ViewState::Admin
    );
    assert_eq!(
        initial_view(&at("https://shoes.example.com/offer/bogo"), HostKind::Tenant, None),
        ViewState::OfferPreview
    );
    assert_eq!(
        initial_view(&at("https://shoes.example.com/p/x"), HostKind::Tenant, None),
        ViewState::LandingPreview
    );
    assert_eq!(
        initial_view(&at("https://shoes.example.com/cart"), HostKind::Tenant, None),
        ViewState::Storefront
    );
}
