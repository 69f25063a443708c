use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{MessageReference, Snowflake};

/// Messages requested per history page.
pub const PAGE_SIZE: u32 = 50;

// -- Auth --

/// Raw user token, sent verbatim in `Authorization`. Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for empty or whitespace-only input. Anything else is
    /// kept exactly as given.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self(raw))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// -- Messages --

/// Body of `POST /channels/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    /// Omitted from the payload entirely when not replying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
}

impl SendMessageRequest {
    pub fn new(content: impl Into<String>, reply_to: Option<Snowflake>) -> Self {
        Self {
            content: content.into(),
            message_reference: reply_to.map(MessageReference::to_message),
        }
    }
}

/// Query for `GET /channels/{id}/messages`. `before` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePage {
    pub limit: u32,
    pub before: Option<Snowflake>,
}

impl MessagePage {
    pub fn latest(limit: u32) -> Self {
        Self { limit, before: None }
    }

    pub fn older_than(cursor: Snowflake, limit: u32) -> Self {
        Self {
            limit,
            before: Some(cursor),
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = vec![("limit", self.limit.to_string())];
        if let Some(before) = self.before {
            q.push(("before", before.to_string()));
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_rejects_blank_and_hides_debug() {
        assert!(Credential::new("   ").is_none());
        let c = Credential::new(" mfa.secret ").unwrap();
        assert_eq!(c.expose(), " mfa.secret ");
        assert!(!format!("{c:?}").contains("secret"));
    }

    #[test]
    fn reply_reference_is_omitted_without_target() {
        let plain = serde_json::to_value(SendMessageRequest::new("hello", None)).unwrap();
        assert_eq!(plain, serde_json::json!({ "content": "hello" }));

        let reply = serde_json::to_value(SendMessageRequest::new("yo", Some(Snowflake(42)))).unwrap();
        assert_eq!(
            reply,
            serde_json::json!({ "content": "yo", "message_reference": { "message_id": "42" } })
        );
    }

    #[test]
    fn page_query_includes_cursor_only_when_set() {
        assert_eq!(MessagePage::latest(50).query(), vec![("limit", "50".to_string())]);
        assert_eq!(
            MessagePage::older_than(Snowflake(9), 50).query(),
            vec![("limit", "50".to_string()), ("before", "9".to_string())]
        );
    }
}
