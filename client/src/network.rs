use crate::display::ServerLine;
use futures::{SinkExt, StreamExt};
use log::{info, warn};
use shared::{login_command, LineCodec};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, FramedRead};

/// Why a chat session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    ServerClosed,
    InputClosed,
    NameTaken,
}

pub struct Client {
    framed: Framed<TcpStream, LineCodec>,
    name: String,
}

impl Client {
    pub async fn connect(server_addr: &str, name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to {}", stream.peer_addr()?);

        Ok(Client {
            framed: Framed::new(stream, LineCodec::new()),
            name: name.to_string(),
        })
    }

    /// Chats using the terminal: stdin lines out, server lines to stdout
    pub async fn run(self) -> Result<ExitReason, Box<dyn std::error::Error>> {
        self.run_with(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Logs in, then relays `input` lines to the server and writes rendered
    /// server lines to `output` until either side closes
    pub async fn run_with<I, O>(
        self,
        input: I,
        mut output: O,
    ) -> Result<ExitReason, Box<dyn std::error::Error>>
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let (mut sink, mut stream) = self.framed.split::<String>();
        let mut input = FramedRead::new(input, LineCodec::new());

        sink.send(login_command(&self.name)).await?;

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(frame)) => {
                        let Some(line) = ServerLine::parse(&frame) else {
                            continue;
                        };

                        output.write_all(format!("{}\n", line).as_bytes()).await?;
                        output.flush().await?;

                        if let ServerLine::NameTaken { name } = line {
                            warn!("Login as {:?} refused", name);
                            return Ok(ExitReason::NameTaken);
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("Server closed the connection");
                        return Ok(ExitReason::ServerClosed);
                    }
                },

                text = input.next() => match text {
                    Some(Ok(text)) if text.is_empty() => {}
                    Some(Ok(text)) => sink.send(text).await?,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("Input closed, leaving chat");
                        return Ok(ExitReason::InputClosed);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_client_logs_in_and_renders_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let fake_server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(socket, LineCodec::new());
            let login = framed.next().await.unwrap().unwrap();
            framed.send("Hello, alice").await.unwrap();
            framed.send("\n\r<bob>: earlier").await.unwrap();
            framed.send("<bob>: now").await.unwrap();
            login
        });

        let client = Client::connect(&addr, "alice").await.unwrap();
        let (_input_tx, input_rx) = tokio::io::duplex(64);
        let mut output = Vec::new();

        let reason = client.run_with(input_rx, &mut output).await.unwrap();

        assert_eq!(reason, ExitReason::ServerClosed);
        assert_eq!(fake_server.await.unwrap(), "login:alice");
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Hello, alice\n<bob>: earlier\n<bob>: now\n"
        );
    }

    #[tokio::test]
    async fn test_client_stops_when_name_taken() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(socket, LineCodec::new());
            let _ = framed.next().await;
            framed
                .send("Логин \"alice\" занят, попробуйте другой")
                .await
                .unwrap();
            // Keep the socket open so only the notice can end the session
            let _ = framed.next().await;
        });

        let client = Client::connect(&addr, "alice").await.unwrap();
        let (_input_tx, input_rx) = tokio::io::duplex(64);
        let mut output = Vec::new();

        let reason = client.run_with(input_rx, &mut output).await.unwrap();

        assert_eq!(reason, ExitReason::NameTaken);
    }

    #[tokio::test]
    async fn test_client_forwards_input_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let fake_server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(socket, LineCodec::new());
            let mut received = Vec::new();
            while let Some(Ok(line)) = framed.next().await {
                received.push(line);
            }
            received
        });

        let client = Client::connect(&addr, "carol").await.unwrap();
        let input = tokio_test::io::Builder::new()
            .read(b"hello\n\nsecond line\r\n")
            .build();

        let reason = client.run_with(input, Vec::new()).await.unwrap();

        assert_eq!(reason, ExitReason::InputClosed);
        assert_eq!(
            fake_server.await.unwrap(),
            vec!["login:carol", "hello", "second line"]
        );
    }
}
