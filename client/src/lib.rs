//! # Chat Client Library
//!
//! A line-mode terminal client for the chat server. It logs in with the
//! chosen display name, forwards every line typed on stdin as a chat message
//! and prints what the server sends back.
//!
//! ## Module Organization
//!
//! ### Display Module (`display`)
//! Classifies server frames (greeting, name-taken notice, history replay,
//! live message) and renders them for the terminal. Replay lines arrive with
//! a leading `\n\r`, which is stripped before printing.
//!
//! ### Network Module (`network`)
//! Owns the TCP connection and the read/write loop:
//! - Sends `login:<name>` as soon as the connection is up
//! - Relays input lines, skipping blank ones
//! - Stops when the server closes, refuses the name, or input ends
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:8888", "alice").await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod display;
pub mod network;
