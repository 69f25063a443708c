use kowkord_types::api::Credential;
use kowkord_types::models::User;

use crate::client::HttpGateway;
use crate::error::ApiError;

impl HttpGateway {
    /// `GET /users/@me`. Doubles as the credential check at login.
    pub async fn fetch_current_user(&self, auth: &Credential) -> Result<User, ApiError> {
        self.get(auth, "/users/@me", &[]).await
    }
}
