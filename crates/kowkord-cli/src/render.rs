use std::io::{self, Write};

use kowkord_state::view::{self, MessageView};
use kowkord_state::{AppState, SessionPhase};
use kowkord_types::models::ChannelKind;

use crate::commands::{HELP, Listing};

/// Prints what changed between consecutive snapshots.
#[derive(Default)]
pub struct Renderer {
    last: Option<AppState>,
}

impl Renderer {
    pub fn render(&mut self, state: &AppState, out: &mut impl Write) -> io::Result<()> {
        let prev = self.last.take().unwrap_or_default();

        if state.session.phase != prev.session.phase {
            match state.session.phase {
                SessionPhase::SignedOut => writeln!(out, "-- signed out (/login <token>)")?,
                SessionPhase::Authenticating => writeln!(out, "-- logging in...")?,
                SessionPhase::Active => {
                    let name = state.identity().map(|u| u.username.as_str()).unwrap_or("?");
                    writeln!(out, "-- logged in as {name}")?;
                    write_servers(state, out)?;
                }
            }
        }

        if state.banner != prev.banner {
            if let Some(banner) = &state.banner {
                writeln!(out, "[!] {}", banner.text)?;
            }
        }

        let server_changed = state.directory.selected_server != prev.directory.selected_server;
        if server_changed || state.directory.channels != prev.directory.channels {
            if state.directory.selected_server.is_some() && !state.directory.loading_channels {
                write_channels(state, out)?;
            }
        }

        let status = view::status_line(state);
        if status != view::status_line(&prev) {
            if let Some(status) = status {
                writeln!(out, "   {status}")?;
            }
        }

        self.render_timeline(&prev, state, out)?;

        if state.compose.reply_target != prev.compose.reply_target {
            match view::reply_banner(state) {
                Some(reply) => writeln!(out, "-> Replying to {}: {}", reply.author, reply.text)?,
                None if prev.compose.reply_target.is_some() => writeln!(out, "-> reply cancelled")?,
                None => {}
            }
        }

        self.last = Some(state.clone());
        Ok(())
    }

    fn render_timeline(&self, prev: &AppState, state: &AppState, out: &mut impl Write) -> io::Result<()> {
        let (old, new) = (prev.timeline.messages(), state.timeline.messages());
        let reopened = state.timeline.channel != prev.timeline.channel
            || new.first().map(|m| m.id) != old.first().map(|m| m.id);

        if reopened {
            if new.is_empty() {
                return Ok(());
            }
            writeln!(out, "== {} ==", state.directory.channel_title())?;
            write_messages(state, 0, out)?;
            writeln!(out, "> {}", view::compose_placeholder(state))
        } else if new.len() > old.len() {
            write_messages(state, old.len(), out)
        } else {
            Ok(())
        }
    }
}

/// Print one of the on-demand lists.
pub fn listing(kind: Listing, state: &AppState, out: &mut impl Write) -> io::Result<()> {
    match kind {
        Listing::Help => writeln!(out, "{HELP}"),
        Listing::Servers => write_servers(state, out),
        Listing::Channels => write_channels(state, out),
        Listing::Message(index) => write_message_info(state, index, out),
    }
}

fn write_message_info(state: &AppState, index: usize, out: &mut impl Write) -> io::Result<()> {
    let Some(message) = state.timeline.messages().get(index) else {
        return writeln!(out, "no message numbered {}", index + 1);
    };
    let me = state.identity().map(|u| u.id);
    let view = view::message_view(message, &state.timeline, me);
    writeln!(out, "message {} ({})", index + 1, view.id)?;
    writeln!(out, "  author: {} [{}]", view.author, view.initial)?;
    writeln!(out, "  avatar: {}", view.avatar_url.as_deref().unwrap_or("none"))?;
    if let Some(sent_at) = view.sent_at {
        writeln!(out, "  sent:   {}", sent_at.format("%Y-%m-%d %H:%M:%S"))?;
    }
    match (&view.reply, message.reply_to()) {
        (Some(reply), _) => writeln!(out, "  reply to: {} ({})", reply.author, reply.id)?,
        (None, Some(id)) => writeln!(out, "  reply to: {id} (not loaded)")?,
        (None, None) => {}
    }
    Ok(())
}

fn write_servers(state: &AppState, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Servers:")?;
    writeln!(out, "  dm  Direct Messages ({})", state.directory.direct_threads.len())?;
    for (i, guild) in state.directory.guilds.iter().enumerate() {
        write!(out, "  {:>2}  [{}] {}", i + 1, guild.fallback_initial(), guild.name)?;
        match guild.icon_url() {
            Some(url) => writeln!(out, "  {url}")?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

fn write_channels(state: &AppState, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}:", state.directory.server_title())?;
    let channels = state.directory.visible_channels();
    if channels.is_empty() {
        return writeln!(out, "  (none)");
    }
    for (i, channel) in channels.iter().enumerate() {
        let glyph = match channel.kind {
            ChannelKind::Text => "#",
            ChannelKind::Voice => "~",
            _ => "@",
        };
        let marker = if Some(channel.id) == state.directory.selected_channel {
            '*'
        } else {
            ' '
        };
        writeln!(out, " {marker}{:>2}  {glyph} {}", i + 1, channel.display().name)?;
    }
    Ok(())
}

fn write_messages(state: &AppState, from: usize, out: &mut impl Write) -> io::Result<()> {
    let views = view::timeline_view(state);
    for (i, message) in views.iter().enumerate().skip(from) {
        write_message(i + 1, message, out)?;
    }
    if from == 0 && state.timeline.has_more() {
        writeln!(out, "   (/older for more)")?;
    }
    Ok(())
}

fn write_message(number: usize, message: &MessageView, out: &mut impl Write) -> io::Result<()> {
    if let Some(reply) = &message.reply {
        writeln!(out, "        ╭ {}: {}", reply.author, first_line(&reply.text))?;
    }
    let time = message
        .sent_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();
    let badge = if message.mentions_me { " [Mention]" } else { "" };
    writeln!(
        out,
        "[{number:>3}] {time} ({}) {}{badge}: {}",
        message.initial,
        message.author,
        message.text()
    )?;
    for embed in &message.embeds {
        if let Some(title) = &embed.title {
            writeln!(out, "        | {title}")?;
        }
        if let Some(description) = &embed.description {
            writeln!(out, "        | {description}")?;
        }
        if let Some(url) = &embed.url {
            writeln!(out, "        | {url}")?;
        }
    }
    Ok(())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
