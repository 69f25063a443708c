use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use kowkord_api::{ClientConfig, Gateway};
use kowkord_types::events::Intent;

use crate::action::Action;
use crate::effects::execute;
use crate::reducer::reduce;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub page_size: u32,
    /// Bound on each individual gateway call.
    pub request_timeout: Duration,
}

impl From<&ClientConfig> for StoreConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size,
            request_timeout: config.request_timeout,
        }
    }
}

/// Handle to the state store. Intents go in, snapshots come out.
///
/// The store task owns the [`AppState`] and is the only place it changes.
/// Requests run on their own tasks and report back through a completion
/// channel, so the store never blocks on the network. The task exits once
/// every handle has been dropped.
#[derive(Clone)]
pub struct Dispatcher {
    intents: mpsc::UnboundedSender<Intent>,
    snapshots: watch::Receiver<AppState>,
}

impl Dispatcher {
    pub fn spawn(gateway: Arc<dyn Gateway>, config: StoreConfig) -> (Self, JoinHandle<()>) {
        let state = AppState::new(config.page_size);
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(state.clone());

        let task = tokio::spawn(run_store(gateway, config, state, intent_rx, snapshot_tx));
        (
            Self {
                intents: intent_tx,
                snapshots: snapshot_rx,
            },
            task,
        )
    }

    /// Queue an intent. Returns false if the store has stopped.
    pub fn dispatch(&self, intent: Intent) -> bool {
        self.intents.send(intent).is_ok()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> AppState {
        self.snapshots.borrow().clone()
    }
}

async fn run_store(
    gateway: Arc<dyn Gateway>,
    config: StoreConfig,
    mut state: AppState,
    mut intents: mpsc::UnboundedReceiver<Intent>,
    snapshots: watch::Sender<AppState>,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Action>();
    info!(page_size = config.page_size, "state store started");

    loop {
        let action = tokio::select! {
            intent = intents.recv() => match intent {
                Some(intent) => Action::Intent(intent),
                None => break,
            },
            Some(action) = done_rx.recv() => action,
        };

        if let Some(effect) = reduce(&mut state, action) {
            let gateway = gateway.clone();
            let done = done_tx.clone();
            let limit = config.request_timeout;
            tokio::spawn(async move {
                let completion = execute(gateway.as_ref(), effect, limit).await;
                // Store gone: nobody left to tell.
                let _ = done.send(completion);
            });
        }
        snapshots.send_replace(state.clone());
    }

    debug!("all handles dropped");
    info!("state store stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kowkord_api::ApiError;
    use kowkord_types::api::{Credential, MessagePage, SendMessageRequest};
    use kowkord_types::events::ServerSelection;
    use kowkord_types::models::{Channel, ChannelKind, Guild, Message, Snowflake, User};

    use crate::state::{BannerKind, SessionPhase};
    use crate::timeline::TimelinePhase;

    const GUILD: Snowflake = Snowflake(7);
    const FIRST: Snowflake = Snowflake(1);
    const SECOND: Snowflake = Snowflake(2);

    /// Serves two text channels. Channel `n` holds ids up to `n * 10_000`.
    #[derive(Default)]
    struct FakeGateway {
        reject_token: bool,
        older_delay: Duration,
        latest_delay: Duration,
        send_fails: bool,
    }

    fn user(id: u64) -> User {
        User {
            id: Snowflake(id),
            username: format!("user{id}"),
            global_name: None,
            avatar: None,
        }
    }

    fn message(channel: Snowflake, id: u64, content: &str) -> Message {
        Message {
            id: Snowflake(id),
            channel_id: Some(channel),
            author: user(9),
            content: content.into(),
            timestamp: None,
            embeds: vec![],
            mentions: vec![],
            message_reference: None,
        }
    }

    impl FakeGateway {
        fn check(&self) -> Result<(), ApiError> {
            if self.reject_token {
                return Err(ApiError::Status {
                    status: 401,
                    status_text: "Unauthorized".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Gateway for FakeGateway {
        async fn current_user(&self, _auth: &Credential) -> Result<User, ApiError> {
            self.check()?;
            Ok(user(1))
        }

        async fn guilds(&self, _auth: &Credential) -> Result<Vec<Guild>, ApiError> {
            Ok(vec![Guild {
                id: GUILD,
                name: "guild".into(),
                icon: None,
            }])
        }

        async fn direct_threads(&self, _auth: &Credential) -> Result<Vec<Channel>, ApiError> {
            Ok(vec![])
        }

        async fn guild_channels(
            &self,
            _auth: &Credential,
            guild_id: Snowflake,
        ) -> Result<Vec<Channel>, ApiError> {
            Ok([FIRST, SECOND]
                .into_iter()
                .map(|id| Channel {
                    id,
                    kind: ChannelKind::Text,
                    name: Some(format!("c{id}")),
                    position: id.get() as i32,
                    guild_id: Some(guild_id),
                    last_message_id: None,
                    recipients: vec![],
                    icon: None,
                })
                .collect())
        }

        async fn messages(
            &self,
            _auth: &Credential,
            channel_id: Snowflake,
            page: MessagePage,
        ) -> Result<Vec<Message>, ApiError> {
            let top = match page.before {
                Some(cursor) => {
                    tokio::time::sleep(self.older_delay).await;
                    cursor.get() - 1
                }
                None => {
                    tokio::time::sleep(self.latest_delay).await;
                    channel_id.get() * 10_000
                }
            };
            Ok((0..page.limit as u64)
                .map(|i| message(channel_id, top - i, "history"))
                .collect())
        }

        async fn send_message(
            &self,
            _auth: &Credential,
            channel_id: Snowflake,
            req: &SendMessageRequest,
        ) -> Result<Message, ApiError> {
            if self.send_fails {
                return Err(ApiError::Status {
                    status: 500,
                    status_text: "Internal Server Error".into(),
                });
            }
            Ok(message(channel_id, channel_id.get() * 10_000 + 1, &req.content))
        }
    }

    fn start(gateway: FakeGateway) -> Dispatcher {
        let (store, _task) = Dispatcher::spawn(
            Arc::new(gateway),
            StoreConfig {
                page_size: 50,
                request_timeout: Duration::from_millis(200),
            },
        );
        store
    }

    async fn wait_until(store: &Dispatcher, pred: impl FnMut(&AppState) -> bool) -> AppState {
        let mut rx = store.subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("condition not reached in time")
            .expect("store stopped");
        snapshot.clone()
    }

    async fn open_channel(store: &Dispatcher, channel: Snowflake) {
        store.dispatch(Intent::SelectChannel(channel));
        wait_until(store, |s| {
            s.timeline.channel == Some(channel) && s.timeline.phase == TimelinePhase::Ready
        })
        .await;
    }

    async fn enter_guild(store: &Dispatcher) {
        store.dispatch(Intent::Login {
            credential: Credential::new("token").unwrap(),
        });
        wait_until(store, |s| s.session.is_active()).await;
        store.dispatch(Intent::SelectServer(ServerSelection::Guild(GUILD)));
        wait_until(store, |s| s.directory.channels.len() == 2).await;
    }

    #[tokio::test]
    async fn login_and_browse() {
        let store = start(FakeGateway::default());
        enter_guild(&store).await;
        open_channel(&store, FIRST).await;

        let state = store.snapshot();
        assert_eq!(state.identity().map(|u| u.id), Some(Snowflake(1)));
        assert_eq!(state.timeline.messages().len(), 50);
        assert_eq!(state.timeline.messages().last().map(|m| m.id), Some(Snowflake(10_000)));
        assert!(state.timeline.has_more());
    }

    #[tokio::test]
    async fn rejected_token_leaves_store_signed_out() {
        let store = start(FakeGateway {
            reject_token: true,
            ..Default::default()
        });
        store.dispatch(Intent::Login {
            credential: Credential::new("bad").unwrap(),
        });
        let state = wait_until(&store, |s| s.banner.is_some()).await;
        assert_eq!(state.session.phase, SessionPhase::SignedOut);
        assert_eq!(state.banner.map(|b| b.kind), Some(BannerKind::Auth));
    }

    #[tokio::test]
    async fn older_page_for_previous_channel_is_dropped() {
        let store = start(FakeGateway {
            older_delay: Duration::from_millis(100),
            ..Default::default()
        });
        enter_guild(&store).await;
        open_channel(&store, FIRST).await;

        store.dispatch(Intent::LoadOlder);
        wait_until(&store, |s| s.timeline.phase == TimelinePhase::LoadingOlder).await;
        open_channel(&store, SECOND).await;

        // Give the first channel's older page time to land.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let state = store.snapshot();
        assert_eq!(state.timeline.channel, Some(SECOND));
        assert_eq!(state.timeline.messages().len(), 50);
        assert!(state.timeline.messages().iter().all(|m| m.channel_id == Some(SECOND)));
    }

    #[tokio::test]
    async fn slow_request_times_out_with_fetch_banner() {
        let store = start(FakeGateway {
            latest_delay: Duration::from_millis(400),
            ..Default::default()
        });
        enter_guild(&store).await;
        store.dispatch(Intent::SelectChannel(FIRST));

        let state = wait_until(&store, |s| s.banner.is_some()).await;
        assert_eq!(state.banner.map(|b| b.kind), Some(BannerKind::Fetch));
        assert_eq!(state.timeline.phase, TimelinePhase::Ready);
        assert!(state.timeline.messages().is_empty());
        assert!(state.session.is_active());
    }

    #[tokio::test]
    async fn send_appends_and_clears_compose() {
        let store = start(FakeGateway::default());
        enter_guild(&store).await;
        open_channel(&store, FIRST).await;

        store.dispatch(Intent::SetComposeText("hello".into()));
        store.dispatch(Intent::Send);
        let state = wait_until(&store, |s| s.timeline.messages().len() == 51).await;
        assert_eq!(state.timeline.messages().last().map(|m| m.content.as_str()), Some("hello"));
        assert!(state.compose.text.is_empty());
        assert!(!state.compose.sending);
    }

    #[tokio::test]
    async fn failed_send_keeps_draft() {
        let store = start(FakeGateway {
            send_fails: true,
            ..Default::default()
        });
        enter_guild(&store).await;
        open_channel(&store, FIRST).await;

        store.dispatch(Intent::SetComposeText("draft".into()));
        store.dispatch(Intent::Send);
        let state = wait_until(&store, |s| s.banner.is_some()).await;
        assert_eq!(state.banner.map(|b| b.kind), Some(BannerKind::Send));
        assert_eq!(state.compose.text, "draft");
        assert!(!state.compose.sending);
        assert_eq!(state.timeline.messages().len(), 50);
    }

    #[tokio::test]
    async fn logout_resets_snapshot() {
        let store = start(FakeGateway::default());
        enter_guild(&store).await;
        open_channel(&store, FIRST).await;

        store.dispatch(Intent::Logout);
        let state = wait_until(&store, |s| s.session.phase == SessionPhase::SignedOut).await;
        assert!(state.directory.guilds.is_empty());
        assert!(state.timeline.messages().is_empty());
        assert!(state.session.credential.is_none());
    }

    #[tokio::test]
    async fn store_stops_when_handles_drop() {
        let (store, task) = Dispatcher::spawn(
            Arc::new(FakeGateway::default()),
            StoreConfig {
                page_size: 50,
                request_timeout: Duration::from_secs(1),
            },
        );
        let mut rx = store.subscribe();
        drop(store);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("store did not stop")
            .expect("store panicked");
        assert!(rx.changed().await.is_err());
    }
}
