//! Interpretation and rendering of lines received from the server

use shared::{strip_line_ending, HISTORY_PREFIX};
use std::fmt;

const GREETING_PREFIX: &str = "Hello, ";
const NAME_TAKEN_PREFIX: &str = "Логин \"";
const NAME_TAKEN_SUFFIX: &str = "\" занят, попробуйте другой";

/// A frame from the server, classified by its wire format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    Greeting { name: String },
    NameTaken { name: String },
    History { sender: String, text: String },
    Message { sender: String, text: String },
    Other(String),
}

impl ServerLine {
    /// Classifies one decoded frame; returns `None` for blank frames
    ///
    /// Line framing splits a replay line at its leading `\n`, leaving a
    /// blank frame followed by one starting with `\r`. Both shapes are
    /// recognised as history.
    pub fn parse(frame: &str) -> Option<Self> {
        let replay = frame
            .strip_prefix(HISTORY_PREFIX)
            .or_else(|| frame.strip_prefix('\r'));
        if let Some((sender, text)) = replay.and_then(split_chat) {
            return Some(ServerLine::History { sender, text });
        }

        let frame = strip_line_ending(frame.trim_start_matches(['\r', '\n']));
        if frame.is_empty() {
            return None;
        }

        if let Some(name) = frame.strip_prefix(GREETING_PREFIX) {
            return Some(ServerLine::Greeting {
                name: name.to_string(),
            });
        }

        if let Some(name) = frame
            .strip_prefix(NAME_TAKEN_PREFIX)
            .and_then(|rest| rest.strip_suffix(NAME_TAKEN_SUFFIX))
        {
            return Some(ServerLine::NameTaken {
                name: name.to_string(),
            });
        }

        match split_chat(frame) {
            Some((sender, text)) => Some(ServerLine::Message { sender, text }),
            None => Some(ServerLine::Other(frame.to_string())),
        }
    }
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerLine::Greeting { name } => write!(f, "Hello, {}", name),
            ServerLine::NameTaken { name } => {
                write!(f, "Name \"{}\" is taken, try another one", name)
            }
            ServerLine::History { sender, text } | ServerLine::Message { sender, text } => {
                write!(f, "<{}>: {}", sender, text)
            }
            ServerLine::Other(text) => write!(f, "{}", text),
        }
    }
}

/// Splits `<sender>: text` into its parts
fn split_chat(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix('<')?;
    let (sender, text) = rest.split_once(">: ")?;
    Some((sender.to_string(), text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_greeting() {
        assert_eq!(
            ServerLine::parse("Hello, alice"),
            Some(ServerLine::Greeting {
                name: "alice".to_string()
            })
        );
    }

    #[test]
    fn test_parse_name_taken() {
        let line = ServerLine::parse("Логин \"alice\" занят, попробуйте другой").unwrap();
        assert_eq!(
            line,
            ServerLine::NameTaken {
                name: "alice".to_string()
            }
        );
        assert_eq!(line.to_string(), "Name \"alice\" is taken, try another one");
    }

    #[test]
    fn test_parse_history_line() {
        let line = ServerLine::parse("\n\r<bob>: hi: there").unwrap();
        assert_eq!(
            line,
            ServerLine::History {
                sender: "bob".to_string(),
                text: "hi: there".to_string()
            }
        );
        assert_eq!(line.to_string(), "<bob>: hi: there");
    }

    #[test]
    fn test_parse_framed_history_remainder() {
        assert_eq!(
            ServerLine::parse("\r<bob>: yo"),
            Some(ServerLine::History {
                sender: "bob".to_string(),
                text: "yo".to_string()
            })
        );
    }

    #[test]
    fn test_parse_broadcast_line() {
        assert_eq!(
            ServerLine::parse("<alice>: hi"),
            Some(ServerLine::Message {
                sender: "alice".to_string(),
                text: "hi".to_string()
            })
        );
    }

    #[test]
    fn test_parse_blank_and_unknown_frames() {
        assert_eq!(ServerLine::parse(""), None);
        assert_eq!(ServerLine::parse("\r"), None);
        assert_eq!(
            ServerLine::parse("something else"),
            Some(ServerLine::Other("something else".to_string()))
        );
    }
}
