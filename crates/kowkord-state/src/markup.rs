//! Message markup as a token stream.
//!
//! Content is split into plain text and typed references. Nothing here
//! produces markup for a renderer to interpret; the presentation layer
//! decides how each token looks.

use std::sync::LazyLock;

use regex::Regex;

use kowkord_types::models::Snowflake;

/// `<@id>` / `<@!id>` user, `<#id>` channel, `<@&id>` role.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<@!?(\d+)>|<#(\d+)>|<@&(\d+)>").expect("markup pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    UserMention(Snowflake),
    ChannelRef(Snowflake),
    RoleRef(Snowflake),
}

impl Token {
    /// Display form. Contains no markup.
    pub fn display(&self) -> &str {
        match self {
            Self::Text(text) => text.as_str(),
            Self::UserMention(_) => "@user",
            Self::ChannelRef(_) => "#channel",
            Self::RoleRef(_) => "@role",
        }
    }
}

/// Split message content into tokens. Ids too large for a snowflake stay text.
pub fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut last = 0;

    for caps in MARKUP.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        let token = if let Some(id) = caps.get(1) {
            id.as_str().parse().ok().map(Token::UserMention)
        } else if let Some(id) = caps.get(2) {
            id.as_str().parse().ok().map(Token::ChannelRef)
        } else {
            caps.get(3)
                .and_then(|id| id.as_str().parse().ok())
                .map(Token::RoleRef)
        };

        text.push_str(&content[last..whole.start()]);
        match token {
            Some(token) => {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                tokens.push(token);
            }
            None => text.push_str(whole.as_str()),
        }
        last = whole.end();
    }

    text.push_str(&content[last..]);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

pub fn display_text(tokens: &[Token]) -> String {
    tokens.iter().map(Token::display).collect()
}

/// Content with every reference replaced by its display form.
pub fn to_display(content: &str) -> String {
    display_text(&tokenize(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_all_reference_kinds() {
        let tokens = tokenize("hey <@1> and <@!2>, see <#3> with <@&4>!");
        assert_eq!(
            tokens,
            vec![
                Token::Text("hey ".into()),
                Token::UserMention(Snowflake(1)),
                Token::Text(" and ".into()),
                Token::UserMention(Snowflake(2)),
                Token::Text(", see ".into()),
                Token::ChannelRef(Snowflake(3)),
                Token::Text(" with ".into()),
                Token::RoleRef(Snowflake(4)),
                Token::Text("!".into()),
            ]
        );
        assert_eq!(
            display_text(&tokens),
            "hey @user and @user, see #channel with @role!"
        );
    }

    #[test]
    fn plain_text_is_one_token() {
        assert_eq!(tokenize("just text"), vec![Token::Text("just text".into())]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn html_is_left_as_text() {
        let tokens = tokenize("<b>bold</b> <script>x</script>");
        assert_eq!(tokens.len(), 1);
        assert_eq!(display_text(&tokens), "<b>bold</b> <script>x</script>");
    }

    #[test]
    fn oversized_ids_stay_text() {
        let raw = "<@99999999999999999999999>";
        assert_eq!(tokenize(raw), vec![Token::Text(raw.into())]);
    }

    #[test]
    fn display_transform_is_idempotent() {
        let samples = [
            "hi <@1>",
            "<<@1>@2>",
            "<@<@1>>",
            "<#5><@&6><@!7>",
            "no markup at all",
            "<@&> <#> <@!>",
            "<@99999999999999999999999> tail",
        ];
        for raw in samples {
            let once = to_display(raw);
            assert_eq!(to_display(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn tokenizing_does_not_touch_source() {
        let raw = String::from("ping <@42>");
        let _ = tokenize(&raw);
        assert_eq!(raw, "ping <@42>");
    }
}
