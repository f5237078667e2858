//! Registry of authenticated chat participants
//!
//! This module tracks which sessions currently hold a display name:
//! - Insert-if-absent registration so a name can only be claimed once
//! - Owner-checked removal so a rejected duplicate never evicts the holder
//! - Enumeration of recipients for broadcast fan-out
//!
//! The registry only keeps clones of each session's outbound sender. Sockets
//! stay with the connection task that owns them.

use crate::error::ChatError;
use log::info;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// A session that has successfully logged in
///
/// Holds everything needed to reach the participant:
/// - Session ID, used to verify ownership on removal
/// - Display name, the registry key
/// - Outbound queue feeding the connection writer
#[derive(Debug, Clone)]
pub struct RegisteredClient {
    /// Server-assigned session identifier
    pub id: u32,
    /// Display name claimed at login, exactly as sent
    pub name: String,
    /// Remote address of the connection
    pub addr: SocketAddr,
    /// When the login succeeded
    pub joined_at: Instant,
    /// Queue of lines waiting to be written to this client
    pub sender: mpsc::UnboundedSender<String>,
}

impl RegisteredClient {
    pub fn new(
        id: u32,
        name: String,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            id,
            name,
            addr,
            joined_at: Instant::now(),
            sender,
        }
    }

    /// Queues a line for this client
    ///
    /// Returns false when the connection task has already gone away. The
    /// caller decides whether that matters; a broadcast just moves on.
    pub fn deliver(&self, line: &str) -> bool {
        self.sender.send(line.to_string()).is_ok()
    }
}

/// The set of currently authenticated sessions, keyed by display name
///
/// Names are compared exactly (case-sensitive). At most one session holds a
/// given name at any time.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, RegisteredClient>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// Registers a client unless its name is already held
    ///
    /// The membership check and the insertion happen in one step, so two
    /// callers holding the registry lock in turn can never both succeed
    /// with the same name.
    pub fn try_register(&mut self, client: RegisteredClient) -> Result<(), ChatError> {
        match self.clients.entry(client.name.clone()) {
            Entry::Occupied(_) => Err(ChatError::NameTaken(client.name)),
            Entry::Vacant(slot) => {
                info!(
                    "Session {} registered as {:?} from {}",
                    client.id, client.name, client.addr
                );
                slot.insert(client);
                Ok(())
            }
        }
    }

    /// Removes the entry for `name` if it belongs to session `id`
    ///
    /// Returns true if an entry was removed. Removing an absent name, or a
    /// name held by another session, is a no-op.
    pub fn remove_client(&mut self, name: &str, id: u32) -> bool {
        match self.holder_of(name) {
            Some(holder) if holder == id => {
                self.clients.remove(name);
                info!("Session {} unregistered {:?}", id, name);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    /// Returns the ID of the session holding `name`
    pub fn holder_of(&self, name: &str) -> Option<u32> {
        self.clients.get(name).map(|client| client.id)
    }

    /// Iterates over every registered client except the one named `exclude`
    pub fn recipients<'a>(
        &'a self,
        exclude: &'a str,
    ) -> impl Iterator<Item = &'a RegisteredClient> + 'a {
        self.clients
            .values()
            .filter(move |client| client.name != exclude)
    }

    /// Returns all registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if nobody is logged in
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
