use bytes::{Buf, BytesMut};
use std::{
    collections::VecDeque,
    future::poll_fn,
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::Socket;
use crate::{
    Error, Result,
    connection::Config,
    postgres::{
        BackendMessage, BackendMessageDecoder, FrontendProtocol,
        frontend::{self, Startup},
    },
};

const DEFAULT_BUF_CAPACITY: usize = 1024;

/// Buffered connection to postgres.
#[derive(Debug)]
pub struct PgStream {
    socket: Socket,
    read_buf: BytesMut,
    write_buf: BytesMut,
    decoder: BackendMessageDecoder,
    queue: VecDeque<BackendMessage>,
}

impl PgStream {
    pub async fn connect(config: &Config) -> Result<Self> {
        let socket = match config.socket.as_deref() {
            Some(path) => Socket::connect_socket(path)
                .await
                .map_err(|err| Error::from(err).context(format!("failed to connect to {path}")))?,
            None => Socket::connect_tcp(&config.host, config.port).await.map_err(|err| {
                let (host, port) = (&config.host, config.port);
                Error::from(err).context(format!("failed to connect to {host}:{port}"))
            })?,
        };
        Ok(Self::new(socket))
    }

    pub fn new(socket: impl Into<Socket>) -> Self {
        Self {
            socket: socket.into(),
            read_buf: BytesMut::with_capacity(DEFAULT_BUF_CAPACITY),
            write_buf: BytesMut::with_capacity(DEFAULT_BUF_CAPACITY),
            decoder: BackendMessageDecoder::new(),
            queue: VecDeque::new(),
        }
    }

    /// Buffer a message, it is written on the next flush.
    pub fn send<F: FrontendProtocol>(&mut self, msg: F) {
        frontend::write(msg, &mut self.write_buf);
    }

    pub fn send_startup(&mut self, msg: Startup) {
        msg.write(&mut self.write_buf);
    }

    /// Buffer already encoded messages.
    pub fn send_encoded(&mut self, messages: &[u8]) {
        self.write_buf.extend_from_slice(messages);
    }

    pub fn has_pending_write(&self) -> bool {
        !self.write_buf.is_empty()
    }

    pub fn poll_flush(&mut self, cx: &mut Context) -> Poll<io::Result<()>> {
        while !self.write_buf.is_empty() {
            let n = ready!(Pin::new(&mut self.socket).poll_write(cx, &self.write_buf))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.write_buf.advance(n);
        }
        Pin::new(&mut self.socket).poll_flush(cx)
    }

    /// Read one chunk from the socket into `read_buf`, zero means end of stream.
    fn poll_read_chunk(&mut self, cx: &mut Context) -> Poll<io::Result<usize>> {
        let start = self.read_buf.len();
        self.read_buf.resize(start + DEFAULT_BUF_CAPACITY, 0);

        let mut buf = ReadBuf::new(&mut self.read_buf[start..]);
        let result = Pin::new(&mut self.socket).poll_read(cx, &mut buf);
        let n = buf.filled().len();

        self.read_buf.truncate(start + n);
        ready!(result)?;
        Poll::Ready(Ok(n))
    }

    pub fn poll_shutdown(&mut self, cx: &mut Context) -> Poll<io::Result<()>> {
        Pin::new(&mut self.socket).poll_shutdown(cx)
    }

    /// Poll the next backend message, reading the socket when none is buffered.
    pub fn poll_recv(&mut self, cx: &mut Context) -> Poll<Result<BackendMessage>> {
        loop {
            if let Some(message) = self.queue.pop_front() {
                return Poll::Ready(Ok(message));
            }

            let n = ready!(self.poll_read_chunk(cx))?;
            if n == 0 {
                return Poll::Ready(Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()));
            }

            // messages are slices of the chunk, the buffer is not reused
            let chunk = self.read_buf.split().freeze();
            for message in self.decoder.decode(chunk) {
                self.queue.push_back(message?);
            }
        }
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        poll_fn(|cx| self.poll_flush(cx)).await
    }

    pub async fn recv(&mut self) -> Result<BackendMessage> {
        poll_fn(|cx| self.poll_recv(cx)).await
    }
}
