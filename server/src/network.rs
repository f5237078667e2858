//! Server network layer: TCP listener and per-connection tasks

use crate::error::ChatError;
use crate::hub::ChatHub;
use crate::session::{Session, SessionAction};
use futures::{SinkExt, StreamExt};
use log::{error, info, warn};
use shared::{LineCodec, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_LINE_LENGTH};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

/// Tunables for a running server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Number of past messages replayed to a client on login
    pub history_limit: usize,
    /// Longest accepted input line in bytes, excluding the terminator
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Accepts connections and runs one session task per client
pub struct Server {
    listener: TcpListener,
    hub: Arc<ChatHub>,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(addr: &str, config: ServerConfig) -> Result<Self, ChatError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            hub: Arc::new(ChatHub::new(config.history_limit)),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ChatError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn hub(&self) -> Arc<ChatHub> {
        Arc::clone(&self.hub)
    }

    pub fn config(&self) -> ServerConfig {
        self.config
    }

    /// Accept loop; runs until the task is dropped
    pub async fn run(self) -> Result<(), ChatError> {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let hub = Arc::clone(&self.hub);
                    let max_line_length = self.config.max_line_length;

                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, addr, hub, max_line_length).await
                        {
                            warn!("Connection {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Runs one chat session over `io` until either side closes it
///
/// The session is always torn down on return, whether the peer hung up,
/// the login was rejected or the stream failed.
pub async fn serve_connection<T>(
    io: T,
    addr: SocketAddr,
    hub: Arc<ChatHub>,
    max_line_length: usize,
) -> Result<(), ChatError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    info!("Connection accepted from {}", addr);

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let mut session = Session::new(hub, addr, outbound_tx);
    let framed = Framed::new(io, LineCodec::with_max_length(max_line_length));

    let result = pump(&mut session, framed, &mut outbound_rx).await;
    session.on_connection_lost().await;

    info!("Connection from {} closed", addr);
    result
}

async fn pump<T>(
    session: &mut Session,
    framed: Framed<T, LineCodec>,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ChatError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = framed.split::<String>();

    loop {
        tokio::select! {
            biased;

            // Lines queued by other sessions' broadcasts
            Some(line) = outbound_rx.recv() => {
                sink.send(line).await?;
            },

            frame = stream.next() => match frame {
                Some(Ok(line)) => {
                    let action = session.on_line(&line).await;

                    // Replies to this line go out before the next read
                    while let Ok(queued) = outbound_rx.try_recv() {
                        sink.feed(queued).await?;
                    }
                    sink.flush().await?;

                    if action == SessionAction::Close {
                        break;
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use shared::ProtocolError;
    use tokio_test::io::Builder;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
    }

    #[tokio::test]
    async fn test_serve_connection_login_and_hangup() {
        let hub = Arc::new(ChatHub::default());
        let mock = Builder::new()
            .read(b"login:alice\r\n")
            .write(b"Hello, alice\r\n")
            .build();

        serve_connection(mock, test_addr(), Arc::clone(&hub), 64)
            .await
            .unwrap();

        assert!(!hub.is_online("alice").await);
    }

    #[tokio::test]
    async fn test_serve_connection_ignores_chatter_before_login() {
        let hub = Arc::new(ChatHub::default());
        let mock = Builder::new()
            .read(b"hello?\r\nlogin:bob\r\n")
            .write(b"Hello, bob\r\n")
            .build();

        serve_connection(mock, test_addr(), Arc::clone(&hub), 64)
            .await
            .unwrap();

        assert_eq!(hub.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_serve_connection_replays_history() {
        let hub = Arc::new(ChatHub::default());
        hub.publish("alice", "first").await;
        hub.publish("alice", "second").await;

        let mock = Builder::new()
            .read(b"login:bob\n")
            .write(b"Hello, bob\r\n")
            .write(b"\n\r<alice>: first\r\n")
            .write(b"\n\r<alice>: second\r\n")
            .read(b"thanks\n")
            .build();

        serve_connection(mock, test_addr(), Arc::clone(&hub), 64)
            .await
            .unwrap();

        let recent = hub.recent_messages(10).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[2].sender, "bob");
        assert_eq!(recent[2].text, "thanks");
    }

    #[tokio::test]
    async fn test_serve_connection_rejects_taken_name() {
        let hub = Arc::new(ChatHub::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut holder = Session::new(Arc::clone(&hub), test_addr(), tx);
        holder.on_line("login:alice").await;

        let mock = Builder::new()
            .read(b"login:alice\r\n")
            .write("Логин \"alice\" занят, попробуйте другой\r\n".as_bytes())
            .build();

        serve_connection(mock, test_addr(), Arc::clone(&hub), 64)
            .await
            .unwrap();

        assert!(hub.is_online("alice").await);
        assert_eq!(holder.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_serve_connection_line_too_long() {
        let hub = Arc::new(ChatHub::default());
        let mock = Builder::new().read(b"login:a-very-long-name").build();

        let result = serve_connection(mock, test_addr(), Arc::clone(&hub), 8).await;

        assert!(matches!(
            result,
            Err(ChatError::Protocol(ProtocolError::LineTooLong { max: 8 }))
        ));
        assert_eq!(hub.online_count().await, 0);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = Server::bind("127.0.0.1:0", ServerConfig::default())
            .await
            .unwrap();

        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(server.config().history_limit, 10);
        assert_eq!(server.hub().online_count().await, 0);
    }
}
