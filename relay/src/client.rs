use std::io;
use std::sync::Arc;

use channelio::{Scope, run_transmitter};
use futures::{SinkExt, StreamExt};
use log::*;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

use crate::codec::line_transmitter;
use crate::config::{RelayConfig, Target};

pub struct RelayClient {
    target: Target,
    config: RelayConfig,
}

impl RelayClient {
    pub fn new(target: Target, config: RelayConfig) -> Self {
        Self { target, config }
    }

    /// Sends stdin lines to the target and prints every line it sends back.
    ///
    /// Closing stdin does not end the session: it lasts until the peer
    /// closes the connection or `scope` is done.
    pub async fn run(&self, scope: &Scope) -> io::Result<()> {
        info!("Connecting to target: {:?}", self.target);
        match &self.target {
            Target::Unix(path) => {
                let stream = UnixStream::connect(path).await?;
                info!("Unix socket connected.");
                self.process_stream(scope, stream, tokio::io::stdin(), tokio::io::stdout())
                    .await
            }
            Target::Tcp(addr) => {
                let stream = TcpStream::connect(addr).await?;
                info!("TCP socket connected.");
                self.process_stream(scope, stream, tokio::io::stdin(), tokio::io::stdout())
                    .await
            }
        }
    }

    async fn process_stream<S, I, O>(
        &self,
        scope: &Scope,
        stream: S,
        input: I,
        output: O,
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
        I: AsyncRead + Unpin + Send + 'static,
        O: AsyncWrite + Unpin + Send + 'static,
    {
        let transmitter = Arc::new(line_transmitter(stream, scope, self.config.max_line_length));

        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(self.config.buffer);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(self.config.buffer);

        let feeder = tokio::spawn(feed_lines(input, outbound_tx));
        let printer = tokio::spawn(print_lines(inbound_rx, output));

        let err = run_transmitter(scope, transmitter, outbound_rx, inbound_tx).await;

        // Reading input may block forever; nothing is lost by dropping it.
        feeder.abort();
        if let Ok(Err(err)) = printer.await {
            warn!("Failed to write output: {}", err);
        }

        // The line receiver reports a done scope as Interrupted or TimedOut.
        let err = io::Error::from(err);
        match err.kind() {
            io::ErrorKind::UnexpectedEof => {
                info!("Connection closed by remote");
                Ok(())
            }
            io::ErrorKind::Interrupted | io::ErrorKind::TimedOut => {
                info!("Session ended: {}", err);
                Ok(())
            }
            _ => Err(err),
        }
    }
}

/// Forwards input lines to `values` until input ends.
async fn feed_lines<I>(input: I, values: mpsc::Sender<String>) -> io::Result<()>
where
    I: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(input, LinesCodec::new());
    while let Some(line) = lines.next().await {
        let line = line.map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        if values.send(line).await.is_err() {
            break;
        }
    }
    debug!("Input closed");
    Ok(())
}

/// Writes every value to `output`, one per line, until `values` closes.
async fn print_lines<O>(mut values: mpsc::Receiver<String>, output: O) -> io::Result<()>
where
    O: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(output, LinesCodec::new());
    while let Some(line) = values.recv().await {
        sink.send(line).await.map_err(io::Error::other)?;
    }
    Ok(())
}
