//! # Chat Server Library
//!
//! This library implements a line-oriented, multi-client chat server. Clients
//! connect over TCP, claim a unique display name with `login:<name>`, and from
//! then on every line they send is relayed to all other logged-in clients.
//! Newcomers get a short replay of recent history right after the greeting.
//!
//! ## Core Responsibilities
//!
//! ### Authentication
//! A connection stays anonymous until it sends a valid login command. Anything
//! else it sends before that is ignored. A name already held by another client
//! is refused with a notice and the connection is closed; the holder is not
//! affected.
//!
//! ### Broadcast
//! Each chat message is recorded in the message log, then queued for every
//! other logged-in client. The sender never receives its own message back, and
//! a client whose connection died is skipped without disturbing the others.
//!
//! ### History Replay
//! On login the most recent messages (10 by default) are sent to the new client
//! only, oldest first, before any live message can reach it.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! The listener spawns one tokio task per accepted socket. The task frames the
//! byte stream into lines, feeds them to that connection's [`session::Session`],
//! and writes out whatever lands in the session's outbound queue.
//!
//! ### Shared State
//! All sessions share one [`hub::ChatHub`], injected at construction. It owns
//! the [`message_log::MessageLog`] and the [`client_registry::ClientRegistry`],
//! each behind its own mutex. Registration is insert-if-absent, and login holds
//! the log lock while registering and snapshotting history, so a message is
//! either replayed to a newcomer or delivered live, exactly once.
//!
//! ## Module Organization
//!
//! ### Message Log Module (`message_log`)
//! Append-only record of `(sender, text)` pairs with increasing sequence numbers.
//!
//! ### Client Registry Module (`client_registry`)
//! Logged-in clients keyed by display name, with owner-checked removal.
//!
//! ### Hub Module (`hub`)
//! Atomic join, publish and leave operations over the log and registry.
//!
//! ### Session Module (`session`)
//! The per-connection login and chat state machine.
//!
//! ### Network Module (`network`)
//! TCP listener, line framing and the connection read/write loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("127.0.0.1:8888", ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_registry;
pub mod error;
pub mod hub;
pub mod message_log;
pub mod network;
pub mod session;

pub use error::ChatError;
pub use network::{Server, ServerConfig};
