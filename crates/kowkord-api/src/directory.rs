use kowkord_types::api::Credential;
use kowkord_types::models::{Channel, Guild, Snowflake};

use crate::client::HttpGateway;
use crate::error::ApiError;

impl HttpGateway {
    /// `GET /users/@me/guilds`
    pub async fn fetch_guilds(&self, auth: &Credential) -> Result<Vec<Guild>, ApiError> {
        self.get(auth, "/users/@me/guilds", &[]).await
    }

    /// `GET /users/@me/channels`, unfiltered and unsorted.
    pub async fn fetch_direct_threads(&self, auth: &Credential) -> Result<Vec<Channel>, ApiError> {
        self.get(auth, "/users/@me/channels", &[]).await
    }

    /// `GET /guilds/{id}/channels`, unfiltered and unsorted.
    pub async fn fetch_guild_channels(
        &self,
        auth: &Credential,
        guild_id: Snowflake,
    ) -> Result<Vec<Channel>, ApiError> {
        self.get(auth, &format!("/guilds/{guild_id}/channels"), &[])
            .await
    }
}
