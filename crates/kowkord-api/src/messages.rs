use reqwest::Method;

use kowkord_types::api::{Credential, MessagePage, SendMessageRequest};
use kowkord_types::models::{Message, Snowflake};

use crate::client::HttpGateway;
use crate::error::ApiError;

impl HttpGateway {
    /// `GET /channels/{id}/messages?limit=N[&before=id]`, newest first as the API returns it.
    pub async fn fetch_messages(
        &self,
        auth: &Credential,
        channel_id: Snowflake,
        page: MessagePage,
    ) -> Result<Vec<Message>, ApiError> {
        self.get(auth, &format!("/channels/{channel_id}/messages"), &page.query())
            .await
    }

    /// `POST /channels/{id}/messages`, returns the created message.
    pub async fn post_message(
        &self,
        auth: &Credential,
        channel_id: Snowflake,
        req: &SendMessageRequest,
    ) -> Result<Message, ApiError> {
        self.request(
            auth,
            Method::POST,
            &format!("/channels/{channel_id}/messages"),
            &[],
            Some(req),
        )
        .await
    }
}
