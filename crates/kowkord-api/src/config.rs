use std::time::Duration;

use kowkord_types::api::PAGE_SIZE;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v9";

/// Fixed client identification sent on every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without a trailing slash.
    pub api_base: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub page_size: u32,
}

impl ClientConfig {
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            request_timeout: DEFAULT_TIMEOUT,
            page_size: PAGE_SIZE,
        }
    }
}
