//! Read-only projections of a snapshot for the presentation layer.

use chrono::{DateTime, Local};

use kowkord_types::models::{Embed, Message, Snowflake};

use crate::markup::{Token, display_text, tokenize};
use crate::state::AppState;
use crate::timeline::{Timeline, TimelinePhase};

/// The replied-to message, found in the loaded window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPreview {
    pub id: Snowflake,
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: Snowflake,
    pub author: String,
    pub avatar_url: Option<String>,
    pub initial: String,
    pub sent_at: Option<DateTime<Local>>,
    pub tokens: Vec<Token>,
    pub embeds: Vec<Embed>,
    /// `None` when the message is not a reply or the target is not loaded.
    pub reply: Option<ReplyPreview>,
    pub mentions_me: bool,
}

impl MessageView {
    pub fn text(&self) -> String {
        display_text(&self.tokens)
    }
}

pub fn message_view(message: &Message, timeline: &Timeline, me: Option<Snowflake>) -> MessageView {
    let reply = message
        .reply_to()
        .and_then(|id| timeline.find(id))
        .map(|target| ReplyPreview {
            id: target.id,
            author: target.author.username.clone(),
            text: display_text(&tokenize(&target.content)),
        });

    MessageView {
        id: message.id,
        author: message.author.username.clone(),
        avatar_url: message.author.avatar_url(),
        initial: message.author.fallback_initial(),
        sent_at: message.sent_at().map(|t| t.with_timezone(&Local)),
        tokens: tokenize(&message.content),
        embeds: message.embeds.clone(),
        reply,
        mentions_me: me.is_some_and(|id| message.mentions_user(id)),
    }
}

/// Every loaded message of the selected channel, oldest first.
pub fn timeline_view(state: &AppState) -> Vec<MessageView> {
    let me = state.identity().map(|u| u.id);
    state
        .timeline
        .messages()
        .iter()
        .map(|m| message_view(m, &state.timeline, me))
        .collect()
}

/// Placeholder of the compose box for the selected channel.
pub fn compose_placeholder(state: &AppState) -> String {
    let name = state
        .directory
        .selected_channel()
        .map(|c| c.display().name)
        .unwrap_or_else(|| "channel".into());
    format!("Message {name}")
}

/// "Replying to <author>" line shown above the compose box.
pub fn reply_banner(state: &AppState) -> Option<ReplyPreview> {
    state.compose.reply_target.as_ref().map(|m| ReplyPreview {
        id: m.id,
        author: m.author.username.clone(),
        text: display_text(&tokenize(&m.content)),
    })
}

pub fn status_line(state: &AppState) -> Option<&'static str> {
    if state.directory.loading_channels {
        return Some("Loading channels...");
    }
    match state.timeline.phase {
        TimelinePhase::Loading => Some("Loading messages..."),
        TimelinePhase::LoadingOlder => Some("Loading more messages..."),
        TimelinePhase::Idle | TimelinePhase::Ready => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kowkord_types::models::{MessageReference, User};

    fn author(id: u64, name: &str) -> User {
        User {
            id: Snowflake(id),
            username: name.into(),
            global_name: None,
            avatar: Some("abc".into()),
        }
    }

    fn msg(id: u64, content: &str) -> Message {
        Message {
            id: Snowflake(id),
            channel_id: None,
            author: author(100 + id, "bob"),
            content: content.into(),
            timestamp: None,
            embeds: vec![],
            mentions: vec![],
            message_reference: None,
        }
    }

    fn loaded(messages: Vec<Message>) -> Timeline {
        let mut t = Timeline::default();
        t.reset(Some(Snowflake(1)));
        t.apply_latest(messages, 50);
        t
    }

    #[test]
    fn reply_resolves_only_inside_loaded_window() {
        let mut reply = msg(20, "agreed");
        reply.message_reference = Some(MessageReference::to_message(Snowflake(10)));
        let mut dangling = msg(30, "late");
        dangling.message_reference = Some(MessageReference::to_message(Snowflake(5)));
        let timeline = loaded(vec![msg(10, "ping <@7>"), reply.clone(), dangling.clone()]);

        let view = message_view(&reply, &timeline, None);
        let preview = view.reply.unwrap();
        assert_eq!(preview.id, Snowflake(10));
        assert_eq!(preview.text, "ping @user");

        assert!(message_view(&dangling, &timeline, None).reply.is_none());
    }

    #[test]
    fn mention_flag_tracks_identity() {
        let mut m = msg(1, "hey <@42>");
        m.mentions = vec![author(42, "me")];
        let timeline = loaded(vec![m.clone()]);

        assert!(message_view(&m, &timeline, Some(Snowflake(42))).mentions_me);
        assert!(!message_view(&m, &timeline, Some(Snowflake(43))).mentions_me);
        assert!(!message_view(&m, &timeline, None).mentions_me);
    }

    #[test]
    fn view_does_not_touch_message() {
        let m = msg(1, "<#9> and <@&3>");
        let before = m.clone();
        let timeline = loaded(vec![m.clone()]);
        let view = message_view(&m, &timeline, None);
        assert_eq!(view.text(), "#channel and @role");
        assert_eq!(view.initial, "B");
        assert_eq!(
            view.avatar_url.as_deref(),
            Some("https://cdn.discordapp.com/avatars/101/abc.png")
        );
        assert!(view.sent_at.is_some());
        assert_eq!(m, before);
    }

    #[test]
    fn placeholder_falls_back_to_channel() {
        let state = AppState::default();
        assert_eq!(compose_placeholder(&state), "Message channel");
        assert_eq!(status_line(&state), None);
    }
}
