use crate::api::Credential;
use crate::models::Snowflake;

/// Left-rail selection: the direct-message list or one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerSelection {
    Direct,
    Guild(Snowflake),
}

/// Commands sent FROM the presentation layer TO the state store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Log in with a user token
    Login { credential: Credential },

    /// Drop the session and every piece of state derived from it
    Logout,

    /// Pick the DM list or a server; clears the channel selection
    SelectServer(ServerSelection),

    /// Open a channel or direct thread and load its latest page
    SelectChannel(Snowflake),

    /// The timeline was scrolled to the top
    LoadOlder,

    /// Replace the compose box contents
    SetComposeText(String),

    /// Mark a loaded message as the reply target
    ReplyTo(Snowflake),

    /// Clear the reply target
    CancelReply,

    /// Post the compose text to the selected channel
    Send,

    /// Hide the current banner
    DismissBanner,
}

impl Intent {
    /// Short label for logs. Never includes the credential.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::SelectServer(_) => "select_server",
            Self::SelectChannel(_) => "select_channel",
            Self::LoadOlder => "load_older",
            Self::SetComposeText(_) => "set_compose_text",
            Self::ReplyTo(_) => "reply_to",
            Self::CancelReply => "cancel_reply",
            Self::Send => "send",
            Self::DismissBanner => "dismiss_banner",
        }
    }
}
