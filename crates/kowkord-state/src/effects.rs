use std::future::Future;
use std::time::Duration;

use tracing::debug;

use kowkord_api::{ApiError, Gateway};

use crate::action::{Action, Effect, LoginBundle};

/// Perform one request and turn its outcome into the completion action.
/// Each gateway call is bounded by `limit`.
pub async fn execute<G: Gateway + ?Sized>(gateway: &G, effect: Effect, limit: Duration) -> Action {
    debug!(effect = effect.label(), "running effect");
    match effect {
        Effect::Authenticate { ticket, credential } => {
            let result = async {
                let identity = bounded(limit, gateway.current_user(&credential)).await?;
                let guilds = bounded(limit, gateway.guilds(&credential)).await?;
                let direct_threads = bounded(limit, gateway.direct_threads(&credential)).await?;
                Ok::<_, ApiError>(LoginBundle {
                    identity,
                    guilds,
                    direct_threads,
                })
            }
            .await;
            Action::LoggedIn { ticket, result }
        }
        Effect::FetchChannels {
            ticket,
            credential,
            guild_id,
        } => Action::ChannelsLoaded {
            ticket,
            guild_id,
            result: bounded(limit, gateway.guild_channels(&credential, guild_id)).await,
        },
        Effect::FetchLatest {
            ticket,
            credential,
            channel_id,
            page,
        } => Action::LatestLoaded {
            ticket,
            channel_id,
            result: bounded(limit, gateway.messages(&credential, channel_id, page)).await,
        },
        Effect::FetchOlder {
            ticket,
            credential,
            channel_id,
            page,
        } => Action::OlderLoaded {
            ticket,
            channel_id,
            result: bounded(limit, gateway.messages(&credential, channel_id, page)).await,
        },
        Effect::PostMessage {
            ticket,
            credential,
            channel_id,
            request,
        } => {
            let result = bounded(limit, gateway.send_message(&credential, channel_id, &request)).await;
            Action::MessageSent {
                ticket,
                channel_id,
                content: request.content,
                result,
            }
        }
    }
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(ApiError::Timeout))
}
