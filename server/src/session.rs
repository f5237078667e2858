//! Per-connection login and chat state machine
//!
//! A session starts unauthenticated and only accepts `login:<name>`. Once a
//! name is granted every line becomes a chat message. The session never goes
//! back to unauthenticated; it ends in `Closed` either after a rejected login
//! or when the connection drops.

use crate::client_registry::RegisteredClient;
use crate::error::ChatError;
use crate::hub::ChatHub;
use log::{debug, error, info, warn};
use shared::{name_taken_notice, parse_login};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Closed,
}

/// What the connection task should do after a line was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Continue,
    /// Flush whatever is queued and close the connection
    Close,
}

pub struct Session {
    id: u32,
    addr: SocketAddr,
    display_name: Option<String>,
    state: SessionState,
    outbound: Option<mpsc::UnboundedSender<String>>,
    hub: Arc<ChatHub>,
}

impl Session {
    /// Creates the session for a freshly accepted connection
    ///
    /// `outbound` is the queue drained by the connection writer. The session
    /// is not registered anywhere until a login succeeds.
    pub fn new(hub: Arc<ChatHub>, addr: SocketAddr, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: hub.next_session_id(),
            addr,
            display_name: None,
            state: SessionState::Unauthenticated,
            outbound: Some(outbound),
            hub,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handles one framed line received from the client
    pub async fn on_line(&mut self, line: &str) -> SessionAction {
        match self.state {
            SessionState::Unauthenticated => self.handle_login(line).await,
            SessionState::Authenticated => {
                self.broadcast_message(line).await;
                SessionAction::Continue
            }
            SessionState::Closed => SessionAction::Close,
        }
    }

    async fn handle_login(&mut self, line: &str) -> SessionAction {
        let name = match parse_login(line) {
            Some(name) => name,
            None => {
                debug!("Session {} ignoring input before login", self.id);
                return SessionAction::Continue;
            }
        };

        let outbound = match &self.outbound {
            Some(outbound) => outbound.clone(),
            None => return SessionAction::Close,
        };

        let client = RegisteredClient::new(self.id, name.to_string(), self.addr, outbound);
        match self.hub.join(client).await {
            Ok(replayed) => {
                info!(
                    "Session {} logged in as {:?} ({} history line(s) replayed)",
                    self.id, name, replayed
                );
                self.display_name = Some(name.to_string());
                self.state = SessionState::Authenticated;
                SessionAction::Continue
            }
            Err(ChatError::NameTaken(name)) => {
                warn!(
                    "Session {} from {} tried taken name {:?}",
                    self.id, self.addr, name
                );
                self.send(&name_taken_notice(&name));
                self.hub.leave(&name, self.id).await;
                self.state = SessionState::Closed;
                SessionAction::Close
            }
            Err(e) => {
                error!("Session {} login failed: {}", self.id, e);
                self.state = SessionState::Closed;
                SessionAction::Close
            }
        }
    }

    /// Records `text` and delivers it to every other logged-in client
    async fn broadcast_message(&self, text: &str) {
        if let Some(name) = &self.display_name {
            self.hub.publish(name, text).await;
        }
    }

    /// Tears the session down after the connection closed
    ///
    /// Safe to call more than once; later calls find nothing to remove.
    pub async fn on_connection_lost(&mut self) {
        if let Some(name) = &self.display_name {
            self.hub.leave(name, self.id).await;
        }

        if self.state != SessionState::Closed {
            info!("Session {} from {} closed", self.id, self.addr);
        }
        self.state = SessionState::Closed;
        self.outbound = None;
    }

    fn send(&self, line: &str) -> bool {
        match &self.outbound {
            Some(outbound) => outbound.send(line.to_string()).is_ok(),
            None => false,
        }
    }
}
