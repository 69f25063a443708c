use thiserror::Error;

use kowkord_state::AppState;
use kowkord_types::api::Credential;
use kowkord_types::events::{Intent, ServerSelection};

pub const HELP: &str = "\
/servers            list servers
/server <n|dm>      open server n, or direct messages
/channels           list channels of the open server
/channel <n>        open channel n
/older              load older messages
/reply <n>          reply to message n
/info <n>           show details of message n
/cancel             stop replying
/dismiss            hide the current error
/login <token>      log in again after /logout
/logout             log out and clear everything
/quit               exit
anything else is sent to the open channel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerArg {
    Direct,
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Servers,
    Server(ServerArg),
    Channels,
    Channel(usize),
    Older,
    Reply(usize),
    Info(usize),
    Cancel,
    Dismiss,
    Login(String),
    Logout,
    Quit,
    Say(String),
}

/// Lists printed from the current snapshot without touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Help,
    Servers,
    Channels,
    /// Details of the loaded message at this 0-based index.
    Message(usize),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Dispatch(Vec<Intent>),
    Show(Listing),
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command /{0}, try /help")]
    Unknown(String),

    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),

    #[error("expected a number, got {0:?}")]
    NotANumber(String),

    #[error("no {what} numbered {index}")]
    OutOfRange { what: &'static str, index: usize },

    #[error("token is empty")]
    EmptyToken,

    #[error("a message is still sending, try again in a moment")]
    StillSending,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "help" | "h" => Command::Help,
        "servers" => Command::Servers,
        "server" => match arg {
            "" => return Err(CommandError::MissingArgument("server")),
            "dm" | "DM" => Command::Server(ServerArg::Direct),
            n => Command::Server(ServerArg::Index(index(n)?)),
        },
        "channels" => Command::Channels,
        "channel" => Command::Channel(required_index("channel", arg)?),
        "older" => Command::Older,
        "reply" => Command::Reply(required_index("reply", arg)?),
        "info" => Command::Info(required_index("info", arg)?),
        "cancel" => Command::Cancel,
        "dismiss" => Command::Dismiss,
        "login" if arg.is_empty() => return Err(CommandError::MissingArgument("login")),
        "login" => Command::Login(arg.to_string()),
        "logout" => Command::Logout,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required_index(name: &'static str, arg: &str) -> Result<usize, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument(name));
    }
    index(arg)
}

/// 1-based as printed, 0-based as returned.
fn index(raw: &str) -> Result<usize, CommandError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::NotANumber(raw.to_string())),
    }
}

fn pick<'a, T>(items: &'a [T], index: usize, what: &'static str) -> Result<&'a T, CommandError> {
    items.get(index).ok_or(CommandError::OutOfRange {
        what,
        index: index + 1,
    })
}

/// Turn a command into intents, resolving list numbers against `state`.
pub fn resolve(command: Command, state: &AppState) -> Result<Outcome, CommandError> {
    let intents = match command {
        Command::Help => return Ok(Outcome::Show(Listing::Help)),
        Command::Servers => return Ok(Outcome::Show(Listing::Servers)),
        Command::Channels => return Ok(Outcome::Show(Listing::Channels)),
        Command::Quit => return Ok(Outcome::Quit),
        Command::Server(ServerArg::Direct) => vec![Intent::SelectServer(ServerSelection::Direct)],
        Command::Server(ServerArg::Index(i)) => {
            let guild = pick(&state.directory.guilds, i, "server")?;
            vec![Intent::SelectServer(ServerSelection::Guild(guild.id))]
        }
        Command::Channel(i) => {
            let channel = pick(state.directory.visible_channels(), i, "channel")?;
            vec![Intent::SelectChannel(channel.id)]
        }
        Command::Older => vec![Intent::LoadOlder],
        Command::Reply(i) => {
            let message = pick(state.timeline.messages(), i, "message")?;
            vec![Intent::ReplyTo(message.id)]
        }
        Command::Info(i) => {
            pick(state.timeline.messages(), i, "message")?;
            return Ok(Outcome::Show(Listing::Message(i)));
        }
        Command::Cancel => vec![Intent::CancelReply],
        Command::Dismiss => vec![Intent::DismissBanner],
        Command::Login(token) => {
            let credential = Credential::new(token).ok_or(CommandError::EmptyToken)?;
            vec![Intent::Login { credential }]
        }
        Command::Logout => vec![Intent::Logout],
        Command::Say(_) if state.compose.sending => return Err(CommandError::StillSending),
        Command::Say(text) => vec![Intent::SetComposeText(text), Intent::Send],
    };
    Ok(Outcome::Dispatch(intents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kowkord_types::models::{Guild, Snowflake};

    #[test]
    fn plain_lines_are_messages() {
        assert_eq!(parse("hello there").unwrap(), Some(Command::Say("hello there".into())));
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("").unwrap(), None);
    }

    #[test]
    fn commands_take_one_based_numbers() {
        assert_eq!(parse("/channel 3").unwrap(), Some(Command::Channel(2)));
        assert_eq!(parse("/reply 1").unwrap(), Some(Command::Reply(0)));
        assert_eq!(parse("/server dm").unwrap(), Some(Command::Server(ServerArg::Direct)));
        assert_eq!(parse("/server 2").unwrap(), Some(Command::Server(ServerArg::Index(1))));
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert_eq!(parse("/channel"), Err(CommandError::MissingArgument("channel")));
        assert_eq!(parse("/channel 0"), Err(CommandError::NotANumber("0".into())));
        assert_eq!(parse("/reply x"), Err(CommandError::NotANumber("x".into())));
        assert_eq!(parse("/frobnicate"), Err(CommandError::Unknown("frobnicate".into())));
        assert_eq!(parse("/login   "), Err(CommandError::MissingArgument("login")));
    }

    #[test]
    fn say_becomes_compose_then_send() {
        let outcome = resolve(Command::Say("hi".into()), &AppState::default()).unwrap();
        assert_eq!(
            outcome,
            Outcome::Dispatch(vec![Intent::SetComposeText("hi".into()), Intent::Send])
        );
    }

    #[test]
    fn server_numbers_resolve_against_snapshot() {
        let mut state = AppState::default();
        state.directory.guilds = vec![Guild {
            id: Snowflake(77),
            name: "rust".into(),
            icon: None,
        }];
        assert_eq!(
            resolve(Command::Server(ServerArg::Index(0)), &state).unwrap(),
            Outcome::Dispatch(vec![Intent::SelectServer(ServerSelection::Guild(Snowflake(77)))])
        );
        assert_eq!(
            resolve(Command::Server(ServerArg::Index(4)), &state),
            Err(CommandError::OutOfRange {
                what: "server",
                index: 5
            })
        );
    }

    #[test]
    fn say_is_refused_while_a_post_is_in_flight() {
        let mut state = AppState::default();
        state.compose.text = "first".into();
        state.compose.sending = true;
        assert_eq!(
            resolve(Command::Say("second".into()), &state),
            Err(CommandError::StillSending)
        );
    }

    #[test]
    fn channel_and_reply_numbers_resolve_against_snapshot() {
        let state = AppState::default();
        assert_eq!(
            resolve(Command::Channel(0), &state),
            Err(CommandError::OutOfRange {
                what: "channel",
                index: 1
            })
        );
        assert_eq!(
            resolve(Command::Reply(2), &state),
            Err(CommandError::OutOfRange {
                what: "message",
                index: 3
            })
        );
    }

    #[test]
    fn blank_login_token_is_rejected_locally() {
        assert_eq!(
            resolve(Command::Login(" \t".into()), &AppState::default()),
            Err(CommandError::EmptyToken)
        );
    }
}
