use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Milliseconds between the Unix epoch and the platform epoch (2015-01-01).
pub const PLATFORM_EPOCH_MS: u64 = 1_420_070_400_000;

/// Number of ids minted per millisecond (`2^22`); dividing by it drops the
/// worker/process/increment bits and leaves the millisecond offset.
const IDS_PER_MS: u64 = 4_194_304;

const CDN_BASE: &str = "https://cdn.discordapp.com";

// -- Snowflake --

/// Platform id. Sent as a decimal string on the wire, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(pub u64);

impl Snowflake {
    pub fn get(self) -> u64 {
        self.0
    }

    /// Creation time in Unix milliseconds: `(id / 4194304) + epoch`.
    pub fn timestamp_ms(self) -> u64 {
        self.0 / IDS_PER_MS + PLATFORM_EPOCH_MS
    }

    pub fn created_at(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms() as i64).single()
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a decimal string or unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::custom(format!("negative snowflake {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                v.parse()
                    .map_err(|e| E::custom(format!("invalid snowflake '{v}': {e}")))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

// -- Users --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{CDN_BASE}/avatars/{}/{hash}.png", self.id))
    }

    /// Single uppercase glyph shown when there is no avatar.
    pub fn fallback_initial(&self) -> String {
        initial(&self.username).unwrap_or_else(|| "U".into())
    }
}

// -- Guilds --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Guild {
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_ref()
            .map(|hash| format!("{CDN_BASE}/icons/{}/{hash}.png", self.id))
    }

    pub fn fallback_initial(&self) -> String {
        self.name.chars().next().map(String::from).unwrap_or_default()
    }
}

// -- Channels --

/// Channel type code. Unknown codes are kept so they round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    Text,
    Dm,
    Voice,
    GroupDm,
    Other(u8),
}

impl ChannelKind {
    /// Kinds listed under a server.
    pub fn is_guild_listed(self) -> bool {
        matches!(self, Self::Text | Self::Voice)
    }

    /// Kinds listed as direct threads.
    pub fn is_direct(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }
}

impl From<u8> for ChannelKind {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Text,
            1 => Self::Dm,
            2 => Self::Voice,
            3 => Self::GroupDm,
            other => Self::Other(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => 0,
            ChannelKind::Dm => 1,
            ChannelKind::Voice => 2,
            ChannelKind::GroupDm => 3,
            ChannelKind::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Name, image and fallback glyph for a channel row or header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDisplay {
    pub name: String,
    pub avatar_url: Option<String>,
    pub fallback: String,
}

impl Channel {
    /// Recency key for direct threads; threads without messages sort last.
    pub fn last_activity_ms(&self) -> Option<u64> {
        self.last_message_id
            .filter(|id| id.get() != 0)
            .map(Snowflake::timestamp_ms)
    }

    pub fn display(&self) -> ChannelDisplay {
        match self.kind {
            ChannelKind::Dm => {
                let recipient = self.recipients.first();
                ChannelDisplay {
                    name: recipient
                        .map(|r| r.username.clone())
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| "User".into()),
                    avatar_url: recipient.and_then(User::avatar_url),
                    fallback: recipient
                        .map(User::fallback_initial)
                        .unwrap_or_else(|| "U".into()),
                }
            }
            ChannelKind::GroupDm => {
                let joined = self
                    .recipients
                    .iter()
                    .map(|r| r.username.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let name = self
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .or_else(|| (!joined.is_empty()).then_some(joined))
                    .unwrap_or_else(|| "Group Chat".into());
                ChannelDisplay {
                    name,
                    avatar_url: self
                        .icon
                        .as_ref()
                        .map(|hash| format!("{CDN_BASE}/channel-icons/{}/{hash}.png", self.id)),
                    fallback: self
                        .name
                        .as_deref()
                        .and_then(initial)
                        .unwrap_or_else(|| "G".into()),
                }
            }
            ChannelKind::Text | ChannelKind::Voice => ChannelDisplay {
                name: self.name.clone().unwrap_or_else(|| "Channel".into()),
                avatar_url: None,
                fallback: self
                    .name
                    .as_deref()
                    .and_then(initial)
                    .unwrap_or_else(|| "#".into()),
            },
            ChannelKind::Other(_) => ChannelDisplay {
                name: "Unknown".into(),
                avatar_url: None,
                fallback: "U".into(),
            },
        }
    }
}

// -- Messages --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Pointer to the message being replied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
}

impl MessageReference {
    pub fn to_message(message_id: Snowflake) -> Self {
        Self {
            message_id: Some(message_id),
            channel_id: None,
            guild_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
}

impl Message {
    /// Id of the message this one replies to, if any.
    pub fn reply_to(&self) -> Option<Snowflake> {
        self.message_reference.as_ref().and_then(|r| r.message_id)
    }

    pub fn mentions_user(&self, user_id: Snowflake) -> bool {
        self.mentions.iter().any(|m| m.id == user_id)
    }

    /// Server timestamp, falling back to the one encoded in the id.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or_else(|| self.id.created_at())
    }
}

fn initial(name: &str) -> Option<String> {
    name.chars().next().map(|c| c.to_uppercase().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, name: &str) -> User {
        User {
            id: Snowflake(id),
            username: name.into(),
            global_name: None,
            avatar: None,
        }
    }

    #[test]
    fn snowflake_timestamp_uses_platform_epoch() {
        assert_eq!(Snowflake(0).timestamp_ms(), PLATFORM_EPOCH_MS);
        assert_eq!(Snowflake(4_194_304_000_000).timestamp_ms(), PLATFORM_EPOCH_MS + 1_000_000);
        // Low 22 bits are not time.
        assert_eq!(Snowflake(4_194_303).timestamp_ms(), PLATFORM_EPOCH_MS);
    }

    #[test]
    fn snowflake_accepts_string_and_number() {
        let a: Snowflake = serde_json::from_str("\"175928847299117063\"").unwrap();
        let b: Snowflake = serde_json::from_str("175928847299117063").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"175928847299117063\"");
        assert!(serde_json::from_str::<Snowflake>("\"abc\"").is_err());
    }

    #[test]
    fn snowflakes_order_numerically() {
        let short: Snowflake = "99".parse().unwrap();
        let long: Snowflake = "100".parse().unwrap();
        assert!(short < long);
    }

    #[test]
    fn channel_kind_keeps_unknown_codes() {
        let ch: Channel = serde_json::from_str(r#"{"id":"1","type":15,"name":"forum"}"#).unwrap();
        assert_eq!(ch.kind, ChannelKind::Other(15));
        assert!(!ch.kind.is_guild_listed());
        let json = serde_json::to_value(&ch).unwrap();
        assert_eq!(json["type"], 15);
    }

    #[test]
    fn dm_display_uses_first_recipient() {
        let mut alice = user(7, "alice");
        alice.avatar = Some("abc".into());
        let ch = Channel {
            id: Snowflake(1),
            kind: ChannelKind::Dm,
            name: None,
            position: 0,
            guild_id: None,
            last_message_id: None,
            recipients: vec![alice],
            icon: None,
        };
        let d = ch.display();
        assert_eq!(d.name, "alice");
        assert_eq!(d.fallback, "A");
        assert_eq!(
            d.avatar_url.as_deref(),
            Some("https://cdn.discordapp.com/avatars/7/abc.png")
        );
    }

    #[test]
    fn group_display_falls_back_to_recipients_then_default() {
        let mut ch = Channel {
            id: Snowflake(9),
            kind: ChannelKind::GroupDm,
            name: None,
            position: 0,
            guild_id: None,
            last_message_id: None,
            recipients: vec![user(1, "bo"), user(2, "cy")],
            icon: Some("ic".into()),
        };
        let d = ch.display();
        assert_eq!(d.name, "bo, cy");
        assert_eq!(d.fallback, "G");
        assert_eq!(
            d.avatar_url.as_deref(),
            Some("https://cdn.discordapp.com/channel-icons/9/ic.png")
        );

        ch.recipients.clear();
        assert_eq!(ch.display().name, "Group Chat");

        ch.name = Some("raid night".into());
        assert_eq!(ch.display().name, "raid night");
        assert_eq!(ch.display().fallback, "R");
    }

    #[test]
    fn message_decodes_reply_and_mentions() {
        let raw = r#"{
            "id": "300",
            "channel_id": "5",
            "author": {"id": "1", "username": "alice", "avatar": null},
            "content": "hi <@2>",
            "timestamp": "2024-01-01T00:00:00+00:00",
            "mentions": [{"id": "2", "username": "bob"}],
            "message_reference": {"message_id": "200", "channel_id": "5"},
            "embeds": [{"title": "t", "url": "https://example.com"}]
        }"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.reply_to(), Some(Snowflake(200)));
        assert!(msg.mentions_user(Snowflake(2)));
        assert!(!msg.mentions_user(Snowflake(1)));
        assert_eq!(msg.embeds[0].description, None);
        assert!(msg.sent_at().is_some());
    }
}
