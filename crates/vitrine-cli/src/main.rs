//! Vitrine CLI: inspect tenant resolution, routing and billing from a shell.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use vitrine_billing::{
    BillingConfig, calculate_with, expiry_message, format_days_remaining, notification_severity,
};
use vitrine_core::error::{VitrineError, VitrineResult};
use vitrine_core::location::Location;
use vitrine_core::models::session::SessionUser;
use vitrine_core::models::subscription::SubscriptionRecord;
use vitrine_core::storage::{FileStore, KeyValueStore, MemoryStore, SharedStore, keys};
use vitrine_nav::initial_view;
use vitrine_remote::{HttpRemote, RemoteConfig};
use vitrine_tenant::{TenantConfig, TenantResolver, TenantService};

const STATE_FILE: &str = "local-storage.json";

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(about = "Storefront client core: tenant resolution, routing and billing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the tenant and initial view for a storefront URL.
    Inspect {
        url: String,
        /// JSON session record to treat as the signed-in user.
        #[arg(long)]
        session_file: Option<PathBuf>,
        #[command(flatten)]
        state: StateArgs,
        #[command(flatten)]
        tenant: TenantArgs,
    },
    /// Evaluate a subscription record.
    Billing {
        /// Package start, RFC 3339 or YYYY-MM-DD.
        #[arg(long)]
        start: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value_t = 7)]
        grace: u32,
        #[arg(long, default_value_t = false)]
        blocked: bool,
        /// Evaluation instant (RFC 3339). Defaults to now in the local zone.
        #[arg(long)]
        at: Option<String>,
    },
    /// Load the tenant list from a remote and reconcile it with a URL.
    Tenants {
        url: String,
        #[arg(long, env = "VITRINE_REMOTE_URL", default_value = "http://127.0.0.1:5001")]
        remote: String,
        #[arg(long, env = "VITRINE_API_TOKEN", hide_env_values = true)]
        token: Option<String>,
        #[arg(long, env = "VITRINE_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,
        #[command(flatten)]
        state: StateArgs,
        #[command(flatten)]
        tenant: TenantArgs,
    },
}

#[derive(Args)]
struct StateArgs {
    /// Directory holding the persisted local storage. In-memory when absent.
    #[arg(long, env = "VITRINE_STATE_DIR")]
    state_dir: Option<PathBuf>,
}

#[derive(Args)]
struct TenantArgs {
    #[arg(long, env = "VITRINE_PRIMARY_DOMAIN")]
    primary_domain: Option<String>,
    #[arg(long, env = "VITRINE_DEFAULT_TENANT_SLUG")]
    default_tenant_slug: Option<String>,
    #[arg(long, env = "VITRINE_DEFAULT_TENANT_ID")]
    default_tenant_id: Option<String>,
    /// Tenant login portal host; repeatable.
    #[arg(long = "login-portal")]
    login_portals: Vec<String>,
}

impl TenantArgs {
    fn config(&self) -> TenantConfig {
        let mut config = TenantConfig::default();
        if let Some(domain) = &self.primary_domain {
            config = config.with_primary_domain(domain);
        }
        if let Some(slug) = &self.default_tenant_slug {
            config = config.with_default_tenant_slug(slug);
        }
        if let Some(id) = &self.default_tenant_id {
            config = config.with_default_tenant_id(id);
        }
        for portal in &self.login_portals {
            config = config.with_tenant_login_portal(portal);
        }
        config
    }
}

impl StateArgs {
    fn open(&self) -> VitrineResult<SharedStore> {
        match &self.state_dir {
            Some(dir) => Ok(Arc::new(FileStore::open(dir.join(STATE_FILE))?)),
            None => Ok(MemoryStore::shared()),
        }
    }
}

fn load_session(store: &SharedStore, path: &Path) -> VitrineResult<()> {
    let raw = std::fs::read_to_string(path).map_err(|e| VitrineError::Validation {
        message: format!("cannot read session file {}: {e}", path.display()),
    })?;
    serde_json::from_str::<SessionUser>(&raw)?;
    store.persist(keys::SESSION_USER, &raw);
    Ok(())
}

fn parse_instant(raw: &str) -> VitrineResult<DateTime<FixedOffset>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at);
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| VitrineError::Validation {
        message: format!("invalid date {raw}: {e}"),
    })?;
    let midnight = day.and_hms_opt(0, 0, 0).ok_or_else(|| VitrineError::Validation {
        message: format!("invalid date {raw}"),
    })?;
    Ok(midnight.and_utc().fixed_offset())
}

fn print(value: &serde_json::Value) -> VitrineResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn inspect(
    url: &str,
    session_file: Option<&Path>,
    state: &StateArgs,
    tenant: &TenantArgs,
) -> VitrineResult<()> {
    let store = state.open()?;
    if let Some(path) = session_file {
        load_session(&store, path)?;
    }
    let location = Location::parse(url)?;
    let resolver =
        TenantResolver::builder(tenant.config(), location.clone(), Arc::clone(&store)).build();
    let user = SessionUser::load(store.as_ref());
    let view = initial_view(&location, resolver.host_kind(), user.as_ref());

    print(&json!({
        "host": location.hostname(),
        "hostKind": format!("{:?}", resolver.host_kind()),
        "hostSlug": resolver.host_slug().map(|s| s.as_str()),
        "subdomainLocked": resolver.is_subdomain_locked(),
        "customDomain": resolver.is_custom_domain(),
        "initialTenant": resolver.active_tenant(),
        "initialView": view,
    }))
}

fn billing(start: &str, days: u32, grace: u32, blocked: bool, at: Option<&str>) -> VitrineResult<()> {
    let record = SubscriptionRecord {
        package_start_date: Some(parse_instant(start)?.with_timezone(&Utc)),
        package_days: days,
        grace_period_days: grace,
        is_blocked: blocked,
        ..Default::default()
    };
    let now = match at {
        Some(raw) => parse_instant(raw)?,
        None => Local::now().fixed_offset(),
    };
    let status = calculate_with(Some(&record), &now, &BillingConfig::default());

    print(&json!({
        "evaluatedAt": now.to_rfc3339(),
        "status": status,
        "remaining": format_days_remaining(status.days_remaining),
        "severity": notification_severity(&status),
        "message": expiry_message(&status),
    }))
}

async fn tenants(
    url: &str,
    remote: RemoteConfig,
    state: &StateArgs,
    tenant: &TenantArgs,
) -> VitrineResult<()> {
    let store = state.open()?;
    let location = Location::parse(url)?;
    let resolver = Arc::new(TenantResolver::builder(tenant.config(), location, store).build());
    let service = TenantService::new(HttpRemote::new(&remote)?, Arc::clone(&resolver));

    let active = service.resolve_host().await?;
    // A subdomain resolved on the fast path has not loaded the list yet.
    let rows: Vec<_> = service
        .refresh_tenants(false)
        .await?
        .into_iter()
        .map(|t| json!({ "id": t.id, "name": t.name, "subdomain": t.subdomain, "plan": t.plan }))
        .collect();

    print(&json!({
        "tenants": rows,
        "activeTenant": active,
        "hostLockedTenant": resolver.host_locked_tenant(),
    }))
}

async fn run(cli: Cli) -> VitrineResult<()> {
    match cli.command {
        Commands::Inspect {
            url,
            session_file,
            state,
            tenant,
        } => inspect(&url, session_file.as_deref(), &state, &tenant),
        Commands::Billing {
            start,
            days,
            grace,
            blocked,
            at,
        } => billing(&start, days, grace, blocked, at.as_deref()),
        Commands::Tenants {
            url,
            remote,
            token,
            timeout_secs,
            state,
            tenant,
        } => {
            let remote = RemoteConfig {
                base_url: remote,
                timeout: timeout_secs.map(Duration::from_secs),
                bearer_token: token,
            };
            tenants(&url, remote, &state, &tenant).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let directive: Directive = match "vitrine=info".parse() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("invalid log directive: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .json()
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instants_accept_dates_and_rfc3339() {
        let day = parse_instant("2026-01-31").unwrap();
        assert_eq!(day.to_rfc3339(), "2026-01-31T00:00:00+00:00");

        let at = parse_instant("2026-01-31T10:30:00+05:00").unwrap();
        assert_eq!(at.offset().local_minus_utc(), 5 * 3600);

        assert!(parse_instant("last tuesday").is_err());
    }

    #[test]
    fn tenant_args_feed_config() {
        let cli = Cli::try_parse_from([
            "vitrine",
            "inspect",
            "https://acme.example.com/",
            "--primary-domain",
            "example.com",
            "--login-portal",
            "login.example.com",
        ])
        .unwrap();
        let Commands::Inspect { url, tenant, .. } = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(url, "https://acme.example.com/");
        assert_eq!(tenant.primary_domain.as_deref(), Some("example.com"));
        assert_eq!(tenant.login_portals, vec!["login.example.com".to_string()]);
    }

    #[test]
    fn billing_defaults() {
        let cli = Cli::try_parse_from(["vitrine", "billing", "--start", "2026-01-01"]).unwrap();
        let Commands::Billing { days, grace, blocked, at, .. } = cli.command else {
            panic!("expected billing");
        };
        assert_eq!((days, grace, blocked), (30, 7, false));
        assert!(at.is_none());
    }
}
