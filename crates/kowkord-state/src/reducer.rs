//! State transitions. `reduce` is the only code that mutates [`AppState`];
//! it never awaits, and it returns the request (if any) that the runtime
//! should perform next.

use tracing::{debug, info, warn};

use kowkord_api::ApiError;
use kowkord_types::api::{MessagePage, SendMessageRequest};
use kowkord_types::events::{Intent, ServerSelection};
use kowkord_types::models::{Message, Snowflake};

use crate::action::{Action, Effect, LoginBundle};
use crate::directory::sort_direct_threads;
use crate::state::{AppState, BannerKind, SessionPhase, Ticket};
use crate::timeline::TimelinePhase;

const LOGIN_FAILED: &str = "Login failed. Please check your token and try again.";
const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
const CHANNELS_FAILED: &str = "Failed to load channels for this server.";
const MESSAGES_FAILED: &str = "Failed to load messages for this channel.";
const OLDER_FAILED: &str = "Failed to load older messages.";
const SEND_FAILED: &str = "Failed to send message. Please try again.";
const STILL_SENDING: &str = "A message is still sending. Try again in a moment.";
const CHANNEL_LOADING: &str = "Channel is still loading. Try again in a moment.";
const NO_CHANNEL: &str = "Select a channel before sending.";

pub fn reduce(state: &mut AppState, action: Action) -> Option<Effect> {
    match action {
        Action::Intent(intent) => on_intent(state, intent),
        Action::LoggedIn { ticket, result } => {
            on_logged_in(state, ticket, result);
            None
        }
        Action::ChannelsLoaded {
            ticket,
            guild_id,
            result,
        } => {
            if !state.is_current_server(ticket) {
                warn!(%guild_id, "discarding stale channel list");
                return None;
            }
            match result {
                Ok(channels) => {
                    state.directory.replace_channels(channels);
                    state.clear_banner(BannerKind::Fetch);
                }
                Err(e) => {
                    state.directory.clear_channels();
                    fail(state, &e, BannerKind::Fetch, CHANNELS_FAILED);
                }
            }
            None
        }
        Action::LatestLoaded {
            ticket,
            channel_id,
            result,
        } => {
            if !is_live_timeline(state, ticket, channel_id) {
                warn!(%channel_id, "discarding stale message page");
                return None;
            }
            match result {
                Ok(page) => {
                    state.timeline.apply_latest(page, state.page_size);
                    state.clear_banner(BannerKind::Fetch);
                }
                Err(e) => {
                    state.timeline.finish_failed();
                    fail(state, &e, BannerKind::Fetch, MESSAGES_FAILED);
                }
            }
            None
        }
        Action::OlderLoaded {
            ticket,
            channel_id,
            result,
        } => {
            if !is_live_timeline(state, ticket, channel_id)
                || state.timeline.phase != TimelinePhase::LoadingOlder
            {
                warn!(%channel_id, "discarding stale older page");
                return None;
            }
            match result {
                Ok(page) => {
                    state.timeline.apply_older(page, state.page_size);
                    state.clear_banner(BannerKind::Fetch);
                }
                Err(e) => {
                    state.timeline.finish_failed();
                    fail(state, &e, BannerKind::Fetch, OLDER_FAILED);
                }
            }
            None
        }
        Action::MessageSent {
            ticket,
            channel_id,
            content,
            result,
        } => {
            on_message_sent(state, ticket, channel_id, content, result);
            None
        }
    }
}

fn on_intent(state: &mut AppState, intent: Intent) -> Option<Effect> {
    debug!(intent = intent.label(), "intent");
    let always_allowed = matches!(
        intent,
        Intent::Login { .. } | Intent::Logout | Intent::DismissBanner
    );
    if !always_allowed && !state.session.is_active() {
        debug!(intent = intent.label(), "ignored while signed out");
        return None;
    }

    match intent {
        Intent::Login { credential } => {
            if state.session.phase != SessionPhase::SignedOut {
                debug!("login already in progress or active");
                return None;
            }
            state.bump_session();
            state.session.phase = SessionPhase::Authenticating;
            state.session.credential = Some(credential.clone());
            state.banner = None;
            info!("authenticating");
            Some(Effect::Authenticate {
                ticket: state.session_ticket(),
                credential,
            })
        }
        Intent::Logout => {
            state.end_session();
            None
        }
        Intent::SelectServer(selection) => select_server(state, selection),
        Intent::SelectChannel(channel_id) => select_channel(state, channel_id),
        Intent::LoadOlder => {
            if !state.timeline.can_load_older() {
                return None;
            }
            let (channel_id, cursor) = (state.timeline.channel?, state.timeline.cursor()?);
            state.timeline.phase = TimelinePhase::LoadingOlder;
            Some(Effect::FetchOlder {
                ticket: state.channel_ticket(),
                credential: state.session.credential.clone()?,
                channel_id,
                page: MessagePage::older_than(cursor, state.page_size),
            })
        }
        Intent::SetComposeText(text) => {
            state.compose.text = text;
            None
        }
        Intent::ReplyTo(message_id) => {
            match state.timeline.find(message_id) {
                Some(message) => state.compose.reply_target = Some(message.clone()),
                None => warn!(%message_id, "reply target not in loaded timeline"),
            }
            None
        }
        Intent::CancelReply => {
            state.compose.reply_target = None;
            None
        }
        Intent::Send => send(state),
        Intent::DismissBanner => {
            state.banner = None;
            None
        }
    }
}

fn on_logged_in(state: &mut AppState, ticket: Ticket, result: Result<LoginBundle, ApiError>) {
    if !state.is_current_session(ticket) || state.session.phase != SessionPhase::Authenticating {
        warn!("discarding stale login result");
        return;
    }
    match result {
        Ok(bundle) => {
            info!(user = %bundle.identity.username, guilds = bundle.guilds.len(), "logged in");
            state.session.phase = SessionPhase::Active;
            state.session.identity = Some(bundle.identity);
            state.directory.guilds = bundle.guilds;
            state.directory.direct_threads = sort_direct_threads(bundle.direct_threads);
            state.banner = None;
        }
        Err(e) => {
            warn!("login failed: {}", e);
            state.end_session();
            state.show(BannerKind::Auth, LOGIN_FAILED);
        }
    }
}

fn select_server(state: &mut AppState, selection: ServerSelection) -> Option<Effect> {
    state.bump_server();
    state.directory.select_server(selection);
    state.timeline.reset(None);
    state.compose.reply_target = None;

    match selection {
        ServerSelection::Direct => None,
        ServerSelection::Guild(guild_id) => Some(Effect::FetchChannels {
            ticket: state.server_ticket(),
            credential: state.session.credential.clone()?,
            guild_id,
        }),
    }
}

fn select_channel(state: &mut AppState, channel_id: Snowflake) -> Option<Effect> {
    if state.directory.visible_channel(channel_id).is_none() {
        warn!(%channel_id, "channel not in the visible list");
        return None;
    }
    state.bump_channel();
    state.directory.selected_channel = Some(channel_id);
    state.timeline.reset(Some(channel_id));
    state.compose.reply_target = None;

    Some(Effect::FetchLatest {
        ticket: state.channel_ticket(),
        credential: state.session.credential.clone()?,
        channel_id,
        page: MessagePage::latest(state.page_size),
    })
}

fn send(state: &mut AppState) -> Option<Effect> {
    if state.compose.text.trim().is_empty() {
        return None;
    }
    let refused = match state.timeline.phase {
        _ if state.compose.sending => Some(STILL_SENDING),
        TimelinePhase::Idle => Some(NO_CHANNEL),
        TimelinePhase::Loading => Some(CHANNEL_LOADING),
        TimelinePhase::Ready | TimelinePhase::LoadingOlder => None,
    };
    if let Some(reason) = refused {
        warn!(reason, "send refused");
        state.show(BannerKind::Send, reason);
        return None;
    }
    let channel_id = state.timeline.channel?;
    let reply_to = state.compose.reply_target.as_ref().map(|m| m.id);
    state.compose.sending = true;

    Some(Effect::PostMessage {
        ticket: state.channel_ticket(),
        credential: state.session.credential.clone()?,
        channel_id,
        request: SendMessageRequest::new(state.compose.text.clone(), reply_to),
    })
}

fn on_message_sent(
    state: &mut AppState,
    ticket: Ticket,
    channel_id: Snowflake,
    content: String,
    result: Result<Message, ApiError>,
) {
    if !state.is_current_session(ticket) {
        warn!(%channel_id, "discarding send result from a previous session");
        return;
    }
    state.compose.sending = false;

    match result {
        Ok(message) => {
            if is_live_timeline(state, ticket, channel_id) {
                state.timeline.append(message);
                state.compose.reply_target = None;
            } else {
                debug!(%channel_id, "sent message belongs to a channel no longer shown");
            }
            if state.compose.text == content {
                state.compose.text.clear();
            }
            state.clear_banner(BannerKind::Send);
        }
        Err(e) => fail(state, &e, BannerKind::Send, SEND_FAILED),
    }
}

fn is_live_timeline(state: &AppState, ticket: Ticket, channel_id: Snowflake) -> bool {
    state.is_current_channel(ticket) && state.timeline.channel == Some(channel_id)
}

/// Report a failed request. A rejected credential ends the session.
fn fail(state: &mut AppState, err: &ApiError, kind: BannerKind, text: &str) {
    if err.is_unauthorized() {
        warn!("credential rejected: {}", err);
        state.end_session();
        state.show(BannerKind::Auth, SESSION_EXPIRED);
        return;
    }
    warn!(?kind, "request failed: {}", err);
    state.show(kind, text);
}
