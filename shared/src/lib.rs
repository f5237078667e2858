//! Wire protocol shared by the chat server and the terminal client.
//!
//! The protocol is plain text, one command per line. Before logging in a
//! client sends `login:<name>`; afterwards every line is a chat message.
//! Framing lives in [`LineCodec`], the string formats in the functions below.

mod codec;

pub use codec::{LineCodec, ProtocolError};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Prefix of the only command accepted before authentication.
pub const LOGIN_PREFIX: &str = "login:";
/// Appended to every outgoing frame by [`LineCodec`].
pub const LINE_TERMINATOR: &str = "\r\n";
/// Leading bytes of every history replay line.
pub const HISTORY_PREFIX: &str = "\n\r";

/// Strips trailing carriage returns and line feeds.
pub fn strip_line_ending(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n'])
}

/// Extracts the candidate display name from a `login:<name>` command.
///
/// Returns `None` when the line is not a login command. The name is
/// everything after the prefix, minus trailing line-ending characters.
/// Leading whitespace is kept: names are compared exactly.
pub fn parse_login(line: &str) -> Option<&str> {
    line.strip_prefix(LOGIN_PREFIX).map(strip_line_ending)
}

pub fn login_command(name: &str) -> String {
    format!("{}{}", LOGIN_PREFIX, name)
}

pub fn greeting(name: &str) -> String {
    format!("Hello, {}", name)
}

pub fn name_taken_notice(name: &str) -> String {
    format!("Логин \"{}\" занят, попробуйте другой", name)
}

/// Live broadcast line sent to every other participant.
pub fn broadcast_line(sender: &str, text: &str) -> String {
    format!("<{}>: {}", sender.trim(), text)
}

/// Replay line sent once to a newly joined participant.
pub fn history_line(sender: &str, text: &str) -> String {
    format!("{}<{}>: {}", HISTORY_PREFIX, sender.trim(), text)
}
