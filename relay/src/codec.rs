//! Newline-delimited text as `channelio` capabilities.

use std::io;

use channelio::{Composed, Emitter, Error, Receiver, Scope, compose};
use futures::{SinkExt, StreamExt};
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

fn into_io(err: LinesCodecError) -> io::Error {
    match err {
        LinesCodecError::Io(err) => err,
        err @ LinesCodecError::MaxLineLengthExceeded => {
            io::Error::new(io::ErrorKind::InvalidData, err)
        }
    }
}

/// Writes each emitted value as one line.
///
/// A failed write cancels `connection`, so a [`LineReceiver`] reading the
/// other half of the same connection stops too.
pub struct LineEmitter<W> {
    sink: Mutex<FramedWrite<W, LinesCodec>>,
    connection: Scope,
}

impl<W: AsyncWrite> LineEmitter<W> {
    pub fn new(writer: W, connection: Scope) -> Self {
        Self {
            sink: Mutex::new(FramedWrite::new(writer, LinesCodec::new())),
            connection,
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> Emitter<String> for LineEmitter<W> {
    type Error = io::Error;

    async fn emit(&self, line: String) -> io::Result<()> {
        let mut sink = self.sink.lock().await;
        let sent = sink.send(line).await.map_err(into_io);
        if let Err(err) = &sent {
            debug!("Write failed, closing connection: {}", err);
            self.connection.cancel();
        }
        sent
    }
}

/// Splits `stream` into a line emitter and a line receiver sharing one
/// connection scope derived from `scope`.
pub fn line_transmitter<S>(
    stream: S,
    scope: &Scope,
    max_line_length: usize,
) -> Composed<LineEmitter<WriteHalf<S>>, LineReceiver<ReadHalf<S>>>
where
    S: AsyncRead + AsyncWrite,
{
    let connection = scope.child();
    let (reader, writer) = tokio::io::split(stream);
    compose(
        LineEmitter::new(writer, connection.clone()),
        LineReceiver::new(reader, connection, max_line_length),
    )
}

/// Reads one line per `receive`.
///
/// Gives up as soon as its scope is done, with `Interrupted` or `TimedOut`
/// depending on the cause, which is what the pumps expect from a receiver.
pub struct LineReceiver<R> {
    stream: Mutex<FramedRead<R, LinesCodec>>,
    scope: Scope,
}

impl<R: AsyncRead> LineReceiver<R> {
    pub fn new(reader: R, scope: Scope, max_line_length: usize) -> Self {
        Self {
            stream: Mutex::new(FramedRead::new(
                reader,
                LinesCodec::new_with_max_length(max_line_length),
            )),
            scope,
        }
    }
}

impl<R: AsyncRead + Unpin + Send> Receiver<String> for LineReceiver<R> {
    type Error = io::Error;

    async fn receive(&self) -> io::Result<String> {
        let mut stream = self.stream.lock().await;

        // FramedRead keeps partial lines buffered, so dropping `next` is fine.
        tokio::select! {
            cause = self.scope.done_err() => Err(Error::<io::Error>::Scope(cause).into()),
            line = stream.next() => match line {
                Some(line) => line.map_err(into_io),
                None => Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection",
                )),
            },
        }
    }
}
