use shared::ProtocolError;

/// Failures a single chat connection can run into
///
/// None of these are fatal to the server: each one tears down at most the
/// session that caused it.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("display name {0:?} is already taken")]
    NameTaken(String),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
