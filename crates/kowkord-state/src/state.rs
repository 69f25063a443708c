use tracing::info;

use kowkord_types::api::{Credential, PAGE_SIZE};
use kowkord_types::models::{Message, User};

use crate::directory::Directory;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    SignedOut,
    Authenticating,
    Active,
}

/// Credential and identity for one login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub phase: SessionPhase,
    pub credential: Option<Credential>,
    /// Set once at login, never changed afterwards.
    pub identity: Option<User>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }
}

/// Contents of the compose box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compose {
    pub text: String,
    pub reply_target: Option<Message>,
    /// A post is in flight.
    pub sending: bool,
}

impl Compose {
    pub fn can_send(&self) -> bool {
        !self.sending && !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// Credential rejected or expired. Stays until dismissed or the next login.
    Auth,
    /// Directory or timeline fetch failed.
    Fetch,
    /// Posting a message failed; the compose box is untouched.
    Send,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    pub fn new(kind: BannerKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.kind == BannerKind::Auth
    }
}

/// Tag carried by every in-flight request. A completion is applied only if
/// its tag still matches the state it was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub session: u64,
    pub selection: u64,
}

/// Counters bumped whenever a newer selection makes older results irrelevant.
/// They survive `end_session` so tickets from a previous login never match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Epochs {
    pub session: u64,
    pub server: u64,
    pub channel: u64,
}

/// Everything the presentation layer renders. Mutated only by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub page_size: u32,
    pub session: Session,
    pub directory: Directory,
    pub timeline: Timeline,
    pub compose: Compose,
    pub banner: Option<Banner>,
    pub(crate) epochs: Epochs,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl AppState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            session: Session::default(),
            directory: Directory::default(),
            timeline: Timeline::default(),
            compose: Compose::default(),
            banner: None,
            epochs: Epochs::default(),
        }
    }

    pub fn identity(&self) -> Option<&User> {
        self.session.identity.as_ref()
    }

    pub(crate) fn session_ticket(&self) -> Ticket {
        Ticket {
            session: self.epochs.session,
            selection: 0,
        }
    }

    pub(crate) fn server_ticket(&self) -> Ticket {
        Ticket {
            session: self.epochs.session,
            selection: self.epochs.server,
        }
    }

    pub(crate) fn channel_ticket(&self) -> Ticket {
        Ticket {
            session: self.epochs.session,
            selection: self.epochs.channel,
        }
    }

    pub(crate) fn is_current_session(&self, ticket: Ticket) -> bool {
        ticket.session == self.epochs.session
    }

    pub(crate) fn is_current_server(&self, ticket: Ticket) -> bool {
        self.is_current_session(ticket) && ticket.selection == self.epochs.server
    }

    pub(crate) fn is_current_channel(&self, ticket: Ticket) -> bool {
        self.is_current_session(ticket) && ticket.selection == self.epochs.channel
    }

    pub(crate) fn bump_session(&mut self) {
        self.epochs.session += 1;
    }

    pub(crate) fn bump_server(&mut self) {
        self.epochs.server += 1;
        self.epochs.channel += 1;
    }

    pub(crate) fn bump_channel(&mut self) {
        self.epochs.channel += 1;
    }

    /// Drop credential, identity, directory, timeline and all transient UI
    /// state in one step. In-flight results from before this call are
    /// discarded when they arrive.
    pub(crate) fn end_session(&mut self) {
        let mut epochs = self.epochs;
        epochs.session += 1;
        epochs.server += 1;
        epochs.channel += 1;

        *self = Self {
            epochs,
            ..Self::new(self.page_size)
        };
        info!("session ended");
    }

    pub(crate) fn show(&mut self, kind: BannerKind, text: impl Into<String>) {
        self.banner = Some(Banner::new(kind, text));
    }

    /// Clear the banner if it reports a failure of `kind`.
    pub(crate) fn clear_banner(&mut self, kind: BannerKind) {
        if self.banner.as_ref().is_some_and(|b| b.kind == kind) {
            self.banner = None;
        }
    }
}
