//! Chat message model.

use serde::{Deserialize, Serialize};

use super::session::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    Customer,
    Admin,
}

/// One message in a tenant's chat log.
///
/// `id` is the dedupe key between local and remote copies; timestamps are
/// Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: ChatSender,
    pub text: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_role: Option<UserRole>,
}

impl ChatMessage {
    /// Equality on the fields that matter for reconciliation.
    ///
    /// A missing `edited_at` compares equal to zero.
    pub fn sync_eq(&self, other: &ChatMessage) -> bool {
        self.id == other.id
            && self.text == other.text
            && self.timestamp == other.timestamp
            && self.sender == other.sender
            && self.edited_at.unwrap_or(0) == other.edited_at.unwrap_or(0)
    }
}
