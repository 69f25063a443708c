//! Client for the messaging platform's REST API.
//!
//! [`Gateway`] is the seam the state store talks to; [`HttpGateway`] is the
//! real implementation. Every call carries the credential it was issued
//! with, so a request started before logout can never pick up a newer token.

pub mod auth;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod messages;

use async_trait::async_trait;

use kowkord_types::api::{Credential, MessagePage, SendMessageRequest};
use kowkord_types::models::{Channel, Guild, Message, Snowflake, User};

pub use client::HttpGateway;
pub use config::ClientConfig;
pub use error::ApiError;

/// The six endpoints the client consumes.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    async fn current_user(&self, auth: &Credential) -> Result<User, ApiError>;

    async fn guilds(&self, auth: &Credential) -> Result<Vec<Guild>, ApiError>;

    async fn direct_threads(&self, auth: &Credential) -> Result<Vec<Channel>, ApiError>;

    async fn guild_channels(
        &self,
        auth: &Credential,
        guild_id: Snowflake,
    ) -> Result<Vec<Channel>, ApiError>;

    /// Newest first.
    async fn messages(
        &self,
        auth: &Credential,
        channel_id: Snowflake,
        page: MessagePage,
    ) -> Result<Vec<Message>, ApiError>;

    async fn send_message(
        &self,
        auth: &Credential,
        channel_id: Snowflake,
        req: &SendMessageRequest,
    ) -> Result<Message, ApiError>;
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn current_user(&self, auth: &Credential) -> Result<User, ApiError> {
        self.fetch_current_user(auth).await
    }

    async fn guilds(&self, auth: &Credential) -> Result<Vec<Guild>, ApiError> {
        self.fetch_guilds(auth).await
    }

    async fn direct_threads(&self, auth: &Credential) -> Result<Vec<Channel>, ApiError> {
        self.fetch_direct_threads(auth).await
    }

    async fn guild_channels(
        &self,
        auth: &Credential,
        guild_id: Snowflake,
    ) -> Result<Vec<Channel>, ApiError> {
        self.fetch_guild_channels(auth, guild_id).await
    }

    async fn messages(
        &self,
        auth: &Credential,
        channel_id: Snowflake,
        page: MessagePage,
    ) -> Result<Vec<Message>, ApiError> {
        self.fetch_messages(auth, channel_id, page).await
    }

    async fn send_message(
        &self,
        auth: &Credential,
        channel_id: Snowflake,
        req: &SendMessageRequest,
    ) -> Result<Message, ApiError> {
        self.post_message(auth, channel_id, req).await
    }
}
