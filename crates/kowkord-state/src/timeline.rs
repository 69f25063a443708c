use tracing::{debug, warn};

use kowkord_types::models::{Message, Snowflake};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelinePhase {
    /// No channel selected.
    #[default]
    Idle,
    /// Waiting for the newest page.
    Loading,
    Ready,
    /// Waiting for a page older than the cursor.
    LoadingOlder,
}

/// Loaded history of the selected channel, ascending by id with no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub channel: Option<Snowflake>,
    pub phase: TimelinePhase,
    messages: Vec<Message>,
    has_more: bool,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            channel: None,
            phase: TimelinePhase::Idle,
            messages: Vec::new(),
            has_more: true,
        }
    }
}

impl Timeline {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// More history may exist before the cursor.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Oldest loaded id: the exclusive upper bound of the next older fetch.
    pub fn cursor(&self) -> Option<Snowflake> {
        self.messages.first().map(|m| m.id)
    }

    pub fn find(&self, id: Snowflake) -> Option<&Message> {
        self.messages
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|i| &self.messages[i])
    }

    pub fn can_load_older(&self) -> bool {
        self.channel.is_some()
            && self.phase == TimelinePhase::Ready
            && self.has_more
            && !self.messages.is_empty()
    }

    /// Start over for `channel`; `None` returns to idle.
    pub(crate) fn reset(&mut self, channel: Option<Snowflake>) {
        self.channel = channel;
        self.messages.clear();
        self.has_more = true;
        self.phase = if channel.is_some() {
            TimelinePhase::Loading
        } else {
            TimelinePhase::Idle
        };
    }

    /// Install the newest page (API order: newest first).
    pub(crate) fn apply_latest(&mut self, page: Vec<Message>, page_size: u32) {
        let full = page.len() == page_size as usize;
        self.messages.clear();
        self.merge(page);
        self.has_more = full;
        self.phase = TimelinePhase::Ready;
        debug!(count = self.messages.len(), has_more = self.has_more, "timeline loaded");
    }

    /// Prepend a page older than the cursor. An empty page only ends pagination.
    pub(crate) fn apply_older(&mut self, page: Vec<Message>, page_size: u32) {
        self.phase = TimelinePhase::Ready;
        if page.is_empty() {
            self.has_more = false;
            return;
        }
        let full = page.len() == page_size as usize;
        if let Some(cursor) = self.cursor() {
            if page.iter().any(|m| m.id >= cursor) {
                warn!(%cursor, "older page overlaps loaded window");
            }
        }
        self.merge(page);
        self.has_more = self.has_more && full;
        debug!(count = self.messages.len(), has_more = self.has_more, "older history prepended");
    }

    /// Add a message we just posted.
    pub(crate) fn append(&mut self, message: Message) {
        match self.messages.last() {
            Some(last) if last.id >= message.id => self.merge(vec![message]),
            _ => self.messages.push(message),
        }
    }

    pub(crate) fn finish_failed(&mut self) {
        if self.phase != TimelinePhase::Idle {
            self.phase = TimelinePhase::Ready;
        }
    }

    fn merge(&mut self, incoming: Vec<Message>) {
        self.messages.extend(incoming);
        self.messages.sort_by_key(|m| m.id);
        self.messages.dedup_by_key(|m| m.id);
    }
}
