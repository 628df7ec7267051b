//! Chat sync configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Interval between remote polls (default: 5 s).
    pub poll_interval: Duration,
    /// Author name for customer messages sent without a session.
    pub visitor_name: String,
    /// Author name for admin messages sent without a session.
    pub agent_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            visitor_name: "Visitor".into(),
            agent_name: "Support Agent".into(),
        }
    }
}
