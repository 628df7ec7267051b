//! Chat sync engine.
//!
//! The local log is the user-visible truth. Local mutations bump a revision
//! and are persisted as a whole; remote snapshots replace the log only when
//! they differ and never trigger a persist of their own.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use tracing::{debug, warn};
use vitrine_core::clock::{SharedClock, SystemClock};
use vitrine_core::models::chat::{ChatMessage, ChatSender};
use vitrine_core::models::session::SessionUser;
use vitrine_core::models::tenant::TenantScope;
use vitrine_core::repository::ChatRepository;

use crate::config::ChatConfig;
use crate::diff;
use crate::gate::{SyncGate, SyncPhase};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// What a [`ChatSyncEngine::poll`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not polling right now, or a persist or another poll held the gate.
    Skipped,
    Unchanged,
    Replaced,
    /// The local log or the tenant changed while the fetch was in flight.
    Discarded,
    /// Local changes had not reached the remote yet; they were merged with
    /// the fetched log and saved again.
    Flushed,
    /// The fetch failed; the next tick retries.
    Failed,
}

#[derive(Debug, Default)]
struct ChatState {
    tenant: Option<TenantScope>,
    user: Option<SessionUser>,
    messages: Vec<ChatMessage>,
    revision: u64,
    /// A local mutation has not been acknowledged by the remote.
    unsaved: bool,
    /// Ids deleted locally since the last acknowledged save.
    pending_deletes: HashSet<String>,
    loaded: bool,
    switching: bool,
    chat_open: bool,
    admin_chat_open: bool,
    unread: bool,
    greeting: Option<String>,
    greeting_seeded_for: Option<TenantScope>,
    /// Id of a seeded greeting that has not reached the remote log.
    local_greeting: Option<String>,
}

impl ChatState {
    fn viewer_is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(SessionUser::is_admin)
    }

    fn seed_greeting(&mut self, now_ms: i64) {
        let (Some(tenant), Some(text)) = (&self.tenant, &self.greeting) else {
            return;
        };
        if !self.messages.is_empty() || self.greeting_seeded_for.as_ref() == Some(tenant) {
            return;
        }
        let id = format!("greeting-{now_ms}");
        self.messages.push(ChatMessage {
            id: id.clone(),
            sender: ChatSender::Admin,
            text: text.clone(),
            timestamp: now_ms,
            edited_at: None,
            customer_name: None,
            customer_email: None,
            author_name: None,
            author_email: None,
            author_role: None,
        });
        self.greeting_seeded_for = Some(tenant.clone());
        self.local_greeting = Some(id);
    }

    /// The local log as it should compare against `remote`: a greeting the
    /// remote has never seen is left out.
    fn comparable(&self, remote: &[ChatMessage]) -> Vec<ChatMessage> {
        let skip = self
            .local_greeting
            .as_deref()
            .filter(|id| !remote.iter().any(|m| m.id == *id));
        self.messages
            .iter()
            .filter(|m| Some(m.id.as_str()) != skip)
            .cloned()
            .collect()
    }
}

fn new_message_id(now_ms: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..5)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("chat-{now_ms}-{suffix}")
}

/// Chat log for the active tenant plus the panel state that decides when to
/// poll and when to flag unread customer messages.
pub struct ChatSyncEngine<R: ChatRepository> {
    repo: R,
    config: ChatConfig,
    clock: SharedClock,
    gate: SyncGate,
    state: Mutex<ChatState>,
}

impl<R: ChatRepository> ChatSyncEngine<R> {
    pub fn new(repo: R, config: ChatConfig) -> Self {
        Self {
            repo,
            config,
            clock: Arc::new(SystemClock),
            gate: SyncGate::new(),
            state: Mutex::new(ChatState::default()),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn phase(&self) -> SyncPhase {
        self.gate.phase()
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_state().messages.clone()
    }

    pub fn active_tenant(&self) -> Option<TenantScope> {
        self.lock_state().tenant.clone()
    }

    pub fn has_unread(&self) -> bool {
        self.lock_state().unread
    }

    pub fn is_loaded(&self) -> bool {
        self.lock_state().loaded
    }

    pub fn is_chat_open(&self) -> bool {
        self.lock_state().chat_open
    }

    pub fn is_admin_chat_open(&self) -> bool {
        self.lock_state().admin_chat_open
    }

    /// Polling runs while either chat panel is open or the viewer is an admin.
    pub fn should_poll(&self) -> bool {
        let state = self.lock_state();
        state.tenant.is_some() && (state.chat_open || state.admin_chat_open || state.viewer_is_admin())
    }

    pub fn set_user(&self, user: Option<SessionUser>) {
        self.lock_state().user = user;
    }

    /// Point the engine at another tenant. The previous log is dropped and
    /// must be hydrated again with [`load_messages`](Self::load_messages).
    pub fn set_tenant(&self, tenant: Option<TenantScope>) {
        let now_ms = self.clock.now_millis();
        let mut state = self.lock_state();
        if state.tenant == tenant {
            return;
        }
        debug!(tenant_id = ?tenant, "Chat tenant changed");
        state.tenant = tenant;
        state.messages.clear();
        state.loaded = false;
        state.unsaved = false;
        state.pending_deletes.clear();
        state.unread = false;
        state.greeting_seeded_for = None;
        state.local_greeting = None;
        state.revision += 1;
        state.seed_greeting(now_ms);
    }

    /// Persistence is suppressed while a tenant switch is in progress.
    pub fn set_switching(&self, switching: bool) {
        self.lock_state().switching = switching;
    }

    pub fn set_greeting(&self, greeting: Option<String>) {
        let now_ms = self.clock.now_millis();
        let mut state = self.lock_state();
        state.greeting = greeting.filter(|g| !g.trim().is_empty());
        state.seed_greeting(now_ms);
    }

    /// Hydrate the log from a bulk data load. Never written back.
    pub fn load_messages(&self, messages: Vec<ChatMessage>) {
        let now_ms = self.clock.now_millis();
        let mut state = self.lock_state();
        let seeded_for = if messages.is_empty() {
            None
        } else {
            state.tenant.clone()
        };
        state.greeting_seeded_for = seeded_for;
        state.local_greeting = None;
        state.messages = messages;
        state.loaded = true;
        state.unsaved = false;
        state.pending_deletes.clear();
        state.unread = false;
        state.admin_chat_open = false;
        state.revision += 1;
        state.seed_greeting(now_ms);
    }

    /// Stop persisting until the next [`load_messages`](Self::load_messages).
    pub fn reset_loaded(&self) {
        self.lock_state().loaded = false;
    }

    // -----------------------------------------------------------------------
    // Panels
    // -----------------------------------------------------------------------

    pub fn open_chat(&self) {
        let mut state = self.lock_state();
        state.admin_chat_open = false;
        state.chat_open = true;
    }

    pub fn close_chat(&self) {
        self.lock_state().chat_open = false;
    }

    /// Opening the admin panel is the only thing that clears the unread flag.
    pub fn open_admin_chat(&self) {
        let mut state = self.lock_state();
        state.admin_chat_open = true;
        state.chat_open = false;
        state.unread = false;
    }

    pub fn close_admin_chat(&self) {
        self.lock_state().admin_chat_open = false;
    }

    // -----------------------------------------------------------------------
    // Local mutations
    // -----------------------------------------------------------------------

    pub async fn send_customer_message(&self, text: &str) -> Option<ChatMessage> {
        let message = self.append(ChatSender::Customer, text)?;
        self.persist().await;
        Some(message)
    }

    pub async fn send_admin_message(&self, text: &str) -> Option<ChatMessage> {
        let message = self.append(ChatSender::Admin, text)?;
        self.persist().await;
        Some(message)
    }

    /// Replace the text of message `id`. Returns `false` when nothing changed.
    pub async fn edit_message(&self, id: &str, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        let now_ms = self.clock.now_millis();
        {
            let mut state = self.lock_state();
            let Some(message) = state.messages.iter_mut().find(|m| m.id == id) else {
                return false;
            };
            if message.text == trimmed {
                return false;
            }
            message.text = trimmed.to_string();
            message.edited_at = Some(now_ms);
            state.revision += 1;
            state.unsaved = true;
        }
        self.persist().await;
        true
    }

    pub async fn delete_message(&self, id: &str) -> bool {
        {
            let mut state = self.lock_state();
            let before = state.messages.len();
            state.messages.retain(|m| m.id != id);
            if state.messages.len() == before {
                return false;
            }
            state.pending_deletes.insert(id.to_string());
            state.revision += 1;
            state.unsaved = true;
        }
        self.persist().await;
        true
    }

    fn append(&self, sender: ChatSender, text: &str) -> Option<ChatMessage> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let now_ms = self.clock.now_millis();
        let mut state = self.lock_state();
        let user = state.user.as_ref();
        let visitor_name = self.config.visitor_name.as_str();
        let fallback_name = match sender {
            ChatSender::Customer => visitor_name,
            ChatSender::Admin => self.config.agent_name.as_str(),
        };
        let user_name = user.map(|u| u.name.as_str()).filter(|n| !n.is_empty());
        let user_email = user.and_then(|u| u.email.clone());
        let customer = sender == ChatSender::Customer;
        let message = ChatMessage {
            id: new_message_id(now_ms),
            sender,
            text: trimmed.to_string(),
            timestamp: now_ms,
            edited_at: None,
            customer_name: customer.then(|| user_name.unwrap_or(visitor_name).to_string()),
            customer_email: if customer { user_email.clone() } else { None },
            author_name: Some(user_name.unwrap_or(fallback_name).to_string()),
            author_email: user_email,
            author_role: user.and_then(|u| u.role),
        };
        state.messages.push(message.clone());
        state.revision += 1;
        state.unsaved = true;
        if customer && !state.admin_chat_open {
            state.unread = true;
        }
        Some(message)
    }

    /// Write the whole local log to the remote store. Failures are logged and
    /// the local log is kept as is.
    async fn persist(&self) {
        let _guard = self.gate.begin_persist().await;
        let (tenant, snapshot, revision) = {
            let state = self.lock_state();
            let Some(tenant) = state.tenant.clone() else {
                return;
            };
            if !state.loaded || state.switching {
                debug!(tenant_id = %tenant, "Chat persist suppressed");
                return;
            }
            (tenant, state.messages.clone(), state.revision)
        };
        match self.repo.save_chat_messages(&tenant, &snapshot).await {
            Ok(()) => {
                let mut state = self.lock_state();
                if state.revision == revision {
                    state.unsaved = false;
                    state.pending_deletes.clear();
                }
                if state
                    .local_greeting
                    .as_deref()
                    .is_some_and(|id| snapshot.iter().any(|m| m.id == id))
                {
                    state.local_greeting = None;
                }
            }
            Err(e) => warn!(tenant_id = %tenant, error = %e, "Unable to save chat messages"),
        }
    }

    // -----------------------------------------------------------------------
    // Remote reconciliation
    // -----------------------------------------------------------------------

    /// Fetch the remote log and adopt it if it differs from the local one.
    ///
    /// While a local change is still unsaved the fetched log is merged into
    /// the local one by id instead of replacing it, and the merge is saved.
    pub async fn poll(&self) -> PollOutcome {
        if !self.should_poll() {
            return PollOutcome::Skipped;
        }
        let Some(guard) = self.gate.try_begin_poll() else {
            return PollOutcome::Skipped;
        };
        let (tenant, revision) = {
            let state = self.lock_state();
            let Some(tenant) = state.tenant.clone() else {
                return PollOutcome::Skipped;
            };
            (tenant, state.revision)
        };

        let mut remote = match self.repo.get_chat_messages(&tenant).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(tenant_id = %tenant, error = %e, "Unable to sync chat messages");
                return PollOutcome::Failed;
            }
        };
        diff::sort_by_timestamp(&mut remote);

        {
            let mut state = self.lock_state();
            if state.revision != revision || state.tenant.as_ref() != Some(&tenant) {
                debug!(tenant_id = %tenant, "Discarding stale chat poll");
                return PollOutcome::Discarded;
            }

            if diff::has_unseen_customer_message(&state.messages, &remote)
                && state.viewer_is_admin()
                && !state.admin_chat_open
            {
                state.unread = true;
            }

            if !state.unsaved {
                return adopt(&mut state, &tenant, remote);
            }

            let merged = diff::merge_unsaved(&state.messages, remote, &state.pending_deletes);
            if diff::has_difference(&state.messages, &merged) {
                debug!(
                    tenant_id = %tenant,
                    local = state.messages.len(),
                    merged = merged.len(),
                    "Merging remote chat log into unsaved local log"
                );
                state.messages = merged;
                state.revision += 1;
            }
        }

        // The save needs the gate this poll is holding.
        drop(guard);
        self.persist().await;
        PollOutcome::Flushed
    }
}

/// Replace the local log with `remote` when they differ.
fn adopt(state: &mut ChatState, tenant: &TenantScope, remote: Vec<ChatMessage>) -> PollOutcome {
    let local = state.comparable(&remote);
    if !diff::has_difference(&local, &remote) {
        return PollOutcome::Unchanged;
    }
    debug!(
        tenant_id = %tenant,
        local = local.len(),
        remote = remote.len(),
        "Adopting remote chat log"
    );
    if state
        .local_greeting
        .as_deref()
        .is_some_and(|id| !remote.iter().any(|m| m.id == id))
    {
        state.local_greeting = None;
    }
    state.messages = remote;
    state.revision += 1;
    PollOutcome::Replaced
}
