//! Shared chat state: the message log and the client registry
//!
//! Every session holds an `Arc<ChatHub>` handed to it at construction.
//! The hub owns the only shared mutable state in the server, each piece
//! behind its own lock. When both are needed the log is always locked
//! first, then the registry.
//!
//! Broadcast keeps the log locked from append until every recipient has the
//! line queued, and login keeps it locked from registration until the
//! replay is queued. A message is therefore either part of a newcomer's
//! replay or delivered to them live, never both and never neither.

use crate::client_registry::{ClientRegistry, RegisteredClient};
use crate::error::ChatError;
use crate::message_log::{LogEntry, MessageLog};
use log::{debug, warn};
use shared::{broadcast_line, greeting, history_line, DEFAULT_HISTORY_LIMIT};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;

pub struct ChatHub {
    log: Mutex<MessageLog>,
    registry: Mutex<ClientRegistry>,
    next_session_id: AtomicU32,
    history_limit: usize,
}

impl ChatHub {
    pub fn new(history_limit: usize) -> Self {
        Self {
            log: Mutex::new(MessageLog::new()),
            registry: Mutex::new(ClientRegistry::new()),
            next_session_id: AtomicU32::new(1),
            history_limit,
        }
    }

    /// Allocates a fresh session ID, starting from 1
    pub fn next_session_id(&self) -> u32 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Logs a client in and queues its greeting and history replay
    ///
    /// Registration and the history snapshot happen while the log is
    /// locked, and the greeting plus replay lines are queued on the
    /// client's own channel before the lock is released. Returns the
    /// number of replayed messages, or `ChatError::NameTaken` if the name
    /// is already held (in which case nothing is queued).
    pub async fn join(&self, client: RegisteredClient) -> Result<usize, ChatError> {
        let log = self.log.lock().await;
        let welcome = client.clone();

        {
            let mut registry = self.registry.lock().await;
            registry.try_register(client)?;
        }

        let history = log.recent(self.history_limit);
        welcome.deliver(&greeting(&welcome.name));
        send_history(&welcome, &history);
        debug!(
            "Session {} joined as {:?}, live from message {}",
            welcome.id,
            welcome.name,
            log.last_sequence().map_or(1, |last| last + 1)
        );

        Ok(history.len())
    }

    /// Records a chat message and fans it out to everyone but the sender
    ///
    /// Returns the number of recipients the line was queued for. A recipient
    /// whose connection already closed is skipped without affecting the rest.
    pub async fn publish(&self, sender: &str, text: &str) -> usize {
        let mut log = self.log.lock().await;
        let sequence = log.append(sender, text);
        let line = broadcast_line(sender, text);

        let registry = self.registry.lock().await;
        let mut delivered = 0;
        for client in registry.recipients(sender) {
            if client.deliver(&line) {
                delivered += 1;
            } else {
                warn!(
                    "Message {} not delivered to {:?}: connection already closed",
                    sequence, client.name
                );
            }
        }

        debug!(
            "Message {} from {:?} delivered to {} client(s)",
            sequence, sender, delivered
        );
        delivered
    }

    /// Unregisters `name` if session `id` holds it
    pub async fn leave(&self, name: &str, id: u32) -> bool {
        let mut registry = self.registry.lock().await;
        registry.remove_client(name, id)
    }

    // Read-only snapshots for code embedding the hub through `Server::hub`,
    // such as the integration tests waiting for a disconnect to land. The
    // server itself never needs them.

    pub async fn is_online(&self, name: &str) -> bool {
        self.registry.lock().await.contains(name)
    }

    pub async fn online_names(&self) -> Vec<String> {
        self.registry.lock().await.names()
    }

    pub async fn online_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Same entries a client logging in now would have replayed, up to `limit`
    pub async fn recent_messages(&self, limit: usize) -> Vec<LogEntry> {
        self.log.lock().await.recent(limit)
    }

    pub async fn message_count(&self) -> usize {
        self.log.lock().await.len()
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

/// Queues one replay line per entry, oldest first, for `client` only
fn send_history(client: &RegisteredClient, history: &[LogEntry]) {
    for entry in history {
        client.deliver(&history_line(&entry.sender, &entry.text));
    }
}
