use kowkord_api::ApiError;
use kowkord_types::api::{Credential, MessagePage, SendMessageRequest};
use kowkord_types::events::Intent;
use kowkord_types::models::{Channel, Guild, Message, Snowflake, User};

use crate::state::Ticket;

/// Result of the three login calls, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginBundle {
    pub identity: User,
    pub guilds: Vec<Guild>,
    pub direct_threads: Vec<Channel>,
}

/// Input to the reducer: a user intent or a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Intent(Intent),

    LoggedIn {
        ticket: Ticket,
        result: Result<LoginBundle, ApiError>,
    },

    ChannelsLoaded {
        ticket: Ticket,
        guild_id: Snowflake,
        result: Result<Vec<Channel>, ApiError>,
    },

    /// Newest page for a freshly selected channel.
    LatestLoaded {
        ticket: Ticket,
        channel_id: Snowflake,
        result: Result<Vec<Message>, ApiError>,
    },

    /// Page older than the cursor.
    OlderLoaded {
        ticket: Ticket,
        channel_id: Snowflake,
        result: Result<Vec<Message>, ApiError>,
    },

    MessageSent {
        ticket: Ticket,
        channel_id: Snowflake,
        /// Compose text at the time of sending.
        content: String,
        result: Result<Message, ApiError>,
    },
}

impl From<Intent> for Action {
    fn from(intent: Intent) -> Self {
        Self::Intent(intent)
    }
}

/// Request the reducer wants performed. Each carries the credential and
/// ticket it was issued with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Authenticate {
        ticket: Ticket,
        credential: Credential,
    },

    FetchChannels {
        ticket: Ticket,
        credential: Credential,
        guild_id: Snowflake,
    },

    FetchLatest {
        ticket: Ticket,
        credential: Credential,
        channel_id: Snowflake,
        page: MessagePage,
    },

    FetchOlder {
        ticket: Ticket,
        credential: Credential,
        channel_id: Snowflake,
        page: MessagePage,
    },

    PostMessage {
        ticket: Ticket,
        credential: Credential,
        channel_id: Snowflake,
        request: SendMessageRequest,
    },
}

impl Effect {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Authenticate { ticket, .. }
            | Self::FetchChannels { ticket, .. }
            | Self::FetchLatest { ticket, .. }
            | Self::FetchOlder { ticket, .. }
            | Self::PostMessage { ticket, .. } => *ticket,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "authenticate",
            Self::FetchChannels { .. } => "fetch_channels",
            Self::FetchLatest { .. } => "fetch_latest",
            Self::FetchOlder { .. } => "fetch_older",
            Self::PostMessage { .. } => "post_message",
        }
    }
}
