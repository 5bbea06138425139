//! Bot command parsing.

/// A recognised bot command extracted from an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/img <prompt>`; the prompt is everything after the command token.
    Img { prompt: String },
}

impl Command {
    /// Parse message text. `bot_username` filters out commands addressed to other
    /// bots (`/img@other_bot`); when unknown, any `@` suffix is accepted.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim_start();
        let rest = text.strip_prefix('/')?;

        let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (token, args) = rest.split_at(token_end);

        let name = match token.split_once('@') {
            Some((name, target)) => {
                if let Some(username) = bot_username {
                    if !target.eq_ignore_ascii_case(username) {
                        return None;
                    }
                }
                name
            }
            None => token,
        };

        let args = args.trim_start();
        match name {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "img" => Some(Command::Img {
                prompt: args.to_string(),
            }),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Img { .. } => "img",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_and_help() {
        assert_eq!(Command::parse("/start", None), Some(Command::Start));
        assert_eq!(Command::parse("/help extra words", None), Some(Command::Help));
    }

    #[test]
    fn test_parse_img_keeps_argument_text() {
        assert_eq!(
            Command::parse("/img a cat   on the moon ", None),
            Some(Command::Img {
                prompt: "a cat   on the moon ".to_string()
            })
        );
        assert_eq!(
            Command::parse("/img\nmultiline\nprompt", None),
            Some(Command::Img {
                prompt: "multiline\nprompt".to_string()
            })
        );
    }

    #[test]
    fn test_parse_img_without_arguments() {
        assert_eq!(
            Command::parse("/img", None),
            Some(Command::Img {
                prompt: String::new()
            })
        );
    }

    #[test]
    fn test_parse_bot_suffix() {
        assert_eq!(
            Command::parse("/img@imagine_bot fox", Some("imagine_bot")),
            Some(Command::Img {
                prompt: "fox".to_string()
            })
        );
        assert_eq!(Command::parse("/img@other_bot fox", Some("imagine_bot")), None);
        assert_eq!(Command::parse("/start@any_bot", None), Some(Command::Start));
    }

    #[test]
    fn test_parse_ignores_non_commands() {
        assert_eq!(Command::parse("hello", None), None);
        assert_eq!(Command::parse("/unknown", None), None);
        assert_eq!(Command::parse("/images of cats", None), None);
        assert_eq!(Command::parse("/IMG cat", None), None);
        assert_eq!(Command::parse("", None), None);
    }
}
