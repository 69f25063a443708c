use tracing::debug;

use kowkord_types::events::ServerSelection;
use kowkord_types::models::{Channel, Guild, Snowflake};

/// Servers, direct threads and the channel list of the selected server.
/// Read-only between fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    pub guilds: Vec<Guild>,
    /// Most recently active first.
    pub direct_threads: Vec<Channel>,
    /// Channels of the selected server, by position. Empty in DM mode.
    pub channels: Vec<Channel>,
    pub selected_server: Option<ServerSelection>,
    pub selected_channel: Option<Snowflake>,
    pub loading_channels: bool,
}

impl Directory {
    pub fn guild(&self, id: Snowflake) -> Option<&Guild> {
        self.guilds.iter().find(|g| g.id == id)
    }

    /// Rows shown in the channel column for the current server selection.
    pub fn visible_channels(&self) -> &[Channel] {
        match self.selected_server {
            Some(ServerSelection::Direct) => &self.direct_threads,
            Some(ServerSelection::Guild(_)) => &self.channels,
            None => &[],
        }
    }

    pub fn visible_channel(&self, id: Snowflake) -> Option<&Channel> {
        self.visible_channels().iter().find(|c| c.id == id)
    }

    pub fn selected_channel(&self) -> Option<&Channel> {
        self.selected_channel.and_then(|id| self.visible_channel(id))
    }

    /// Heading of the channel column.
    pub fn server_title(&self) -> String {
        match self.selected_server {
            Some(ServerSelection::Direct) => "Direct Messages".into(),
            Some(ServerSelection::Guild(id)) => self
                .guild(id)
                .map(|g| g.name.clone())
                .unwrap_or_else(|| "Select Server".into()),
            None => "Select Server".into(),
        }
    }

    /// Heading of the timeline; falls back to "Channel".
    pub fn channel_title(&self) -> String {
        self.selected_channel()
            .map(|c| c.display().name)
            .unwrap_or_else(|| "Channel".into())
    }

    /// Enter DM mode or start loading a server. Always drops the channel selection.
    pub(crate) fn select_server(&mut self, selection: ServerSelection) {
        self.selected_server = Some(selection);
        self.selected_channel = None;
        self.channels.clear();
        self.loading_channels = matches!(selection, ServerSelection::Guild(_));
    }

    pub(crate) fn replace_channels(&mut self, raw: Vec<Channel>) {
        self.channels = guild_channel_list(raw);
        self.loading_channels = false;
        debug!(count = self.channels.len(), "channel list replaced");
    }

    pub(crate) fn clear_channels(&mut self) {
        self.channels.clear();
        self.loading_channels = false;
    }
}

/// Keep text and voice channels, ordered by ascending position.
pub fn guild_channel_list(raw: Vec<Channel>) -> Vec<Channel> {
    let mut channels: Vec<Channel> = raw
        .into_iter()
        .filter(|c| c.kind.is_guild_listed())
        .collect();
    channels.sort_by_key(|c| c.position);
    channels
}

/// Keep 1:1 and group threads, newest activity first; threads without a
/// last message go to the end.
pub fn sort_direct_threads(raw: Vec<Channel>) -> Vec<Channel> {
    let mut threads: Vec<Channel> = raw.into_iter().filter(|c| c.kind.is_direct()).collect();
    threads.sort_by(|a, b| b.last_activity_ms().cmp(&a.last_activity_ms()));
    threads
}
