use std::io;
use std::sync::Arc;

use channelio::{Error, Scope, run_transmitter};
use log::*;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::codec::line_transmitter;
use crate::config::{RelayConfig, Target};

pub struct RelayServer {
    target: Target,
    config: RelayConfig,
}

impl RelayServer {
    pub fn new(target: Target, config: RelayConfig) -> Self {
        Self { target, config }
    }

    /// Accepts connections until `scope` is done, one echo session each.
    ///
    /// Returns once every session has ended.
    pub async fn run(&self, scope: &Scope) -> io::Result<()> {
        let mut sessions = JoinSet::new();

        let accepted = match &self.target {
            Target::Unix(path) => {
                if path.exists() {
                    let _ = std::fs::remove_file(path);
                }
                let listener = UnixListener::bind(path)?;
                info!("Server listening on Unix Socket {:?}", path);
                loop {
                    tokio::select! {
                        _ = scope.done() => break Ok(()),
                        accepted = listener.accept() => match accepted {
                            Ok((stream, _)) => {
                                info!("Accepted Unix connection");
                                self.spawn_session(&mut sessions, scope, stream);
                            }
                            Err(err) => break Err(err),
                        }
                    }
                }
            }
            Target::Tcp(addr) => {
                let listener = TcpListener::bind(addr).await?;
                info!("Server listening on TCP {:?}", addr);
                loop {
                    tokio::select! {
                        _ = scope.done() => break Ok(()),
                        accepted = listener.accept() => match accepted {
                            Ok((stream, peer)) => {
                                info!("Accepted TCP connection from {:?}", peer);
                                self.spawn_session(&mut sessions, scope, stream);
                            }
                            Err(err) => break Err(err),
                        }
                    }
                }
            }
        };

        info!("Server stopped accepting connections");
        if !sessions.is_empty() {
            info!("Waiting for {} session(s) to end", sessions.len());
        }
        while let Some(joined) = sessions.join_next().await {
            if let Err(err) = joined {
                error!("Session task failed: {}", err);
            }
        }

        accepted
    }

    fn spawn_session<S>(&self, sessions: &mut JoinSet<()>, scope: &Scope, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let scope = self.config.session_scope(scope);
        let config = self.config.clone();

        sessions.spawn(async move {
            match Self::handle_connection(&scope, stream, &config).await {
                Error::Capability(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    info!("Session closed by remote");
                }
                Error::Capability(err) => warn!("Session failed: {}", err),
                Error::Scope(cause) => info!("Session ended: {}", cause),
            }
        });
    }

    /// Runs one echo session: every line received is emitted back.
    pub async fn handle_connection<S>(
        scope: &Scope,
        stream: S,
        config: &RelayConfig,
    ) -> Error<io::Error>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let transmitter = Arc::new(line_transmitter(stream, scope, config.max_line_length));

        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(config.buffer);
        let (inbound_tx, mut inbound_rx) = mpsc::channel::<String>(config.buffer);

        // Ends once the receive pump closes the inbound channel.
        let echo = tokio::spawn(async move {
            while let Some(line) = inbound_rx.recv().await {
                trace!("Echoing {} bytes", line.len());
                if outbound_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        let err = run_transmitter(scope, transmitter, outbound_rx, inbound_tx).await;
        let _ = echo.await;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channelio::ScopeError;
    use futures::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio::net::UnixStream;
    use tokio_util::codec::{Framed, LinesCodec};

    #[tokio::test]
    async fn test_echo_session() {
        let (local, remote) = tokio::io::duplex(1024);
        let scope = Scope::new();
        let config = RelayConfig::new();

        let session = tokio::spawn({
            let scope = scope.clone();
            async move { RelayServer::handle_connection(&scope, local, &config).await }
        });

        let mut peer = Framed::new(remote, LinesCodec::new());
        peer.send("ping").await.unwrap();
        peer.send("pong").await.unwrap();
        assert_eq!(peer.next().await.unwrap().unwrap(), "ping");
        assert_eq!(peer.next().await.unwrap().unwrap(), "pong");
        drop(peer);

        let err = session.await.unwrap();
        assert_eq!(
            err.into_capability().map(|err| err.kind()),
            Some(io::ErrorKind::UnexpectedEof)
        );
        assert!(!scope.is_done());
    }

    #[tokio::test]
    async fn test_session_ends_with_scope() {
        let (local, _remote) = tokio::io::duplex(1024);
        let scope = Scope::new();
        let config = RelayConfig::new();

        let session = tokio::spawn({
            let scope = scope.clone();
            async move { RelayServer::handle_connection(&scope, local, &config).await }
        });

        scope.cancel();

        // Either side may notice first: the pumps through their scope, the
        // line receiver by giving up on its read.
        match session.await.unwrap() {
            Error::Scope(cause) => assert_eq!(cause, ScopeError::Canceled),
            Error::Capability(err) => assert_eq!(err.kind(), io::ErrorKind::Interrupted),
        }
    }

    #[tokio::test]
    async fn test_run_waits_for_sessions() {
        let path = std::env::temp_dir().join(format!("relay-{}.sock", std::process::id()));
        let scope = Scope::new();
        let server = RelayServer::new(Target::Unix(path.clone()), RelayConfig::new());

        let running = tokio::spawn({
            let scope = scope.clone();
            async move { server.run(&scope).await }
        });

        let stream = loop {
            match UnixStream::connect(&path).await {
                Ok(stream) => break stream,
                Err(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        };
        let mut peer = Framed::new(stream, LinesCodec::new());
        peer.send("ping").await.unwrap();
        assert_eq!(peer.next().await.unwrap().unwrap(), "ping");

        scope.cancel();
        running.await.unwrap().unwrap();

        // The session was joined before `run` returned, so its end of the
        // connection is already closed.
        let closed = tokio::time::timeout(Duration::from_secs(5), peer.next())
            .await
            .expect("session must be closed once the server returns");
        assert!(closed.is_none());

        let _ = std::fs::remove_file(&path);
    }
}
