//! Lazy byte streams and the producer/consumer bridge
//!
//! Backends whose underlying read call is blocking wrap it in a producer
//! task that pushes chunks through a bounded channel; the bounded capacity
//! is the backpressure mechanism. The consumer side is a single-use,
//! forward-only [`ByteStream`]:
//!
//! - the producer suspends in [`BridgeSender::send`] while the buffer is
//!   full;
//! - a producer error is delivered to the consumer's next read instead of
//!   silently truncating the stream;
//! - dropping the consumer closes the channel, which the producer observes
//!   through the `send` return value and stops.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result};

/// Chunk size used by producers reading from files or readers
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Default bridge capacity, in chunks
pub const BRIDGE_CAPACITY: usize = 16;

enum Inner {
    Channel(mpsc::Receiver<Result<Bytes>>),
    Boxed(Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>),
}

/// A single-use, forward-only stream of byte chunks.
///
/// Yields `Bytes` chunks lazily; the whole object is never materialized in
/// memory by the core. Not restartable.
pub struct ByteStream {
    inner: Inner,
}

impl ByteStream {
    /// Stream over an in-memory buffer (one chunk)
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            inner: Inner::Boxed(Box::pin(futures::stream::iter([Ok(data)]))),
        }
    }

    /// Wrap an existing chunk stream, e.g. a remote client's response body
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Inner::Boxed(Box::pin(stream)),
        }
    }

    /// Wrap an async reader, chunking it lazily
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        let stream = ReaderStream::with_capacity(reader, CHUNK_SIZE).map(|r| r.map_err(Error::Io));
        Self {
            inner: Inner::Boxed(Box::pin(stream)),
        }
    }

    /// Create a bounded bridge: the producer half feeds chunks, the
    /// returned stream consumes them.
    pub fn channel(capacity: usize) -> (BridgeSender, ByteStream) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            BridgeSender { tx },
            ByteStream {
                inner: Inner::Channel(rx),
            },
        )
    }

    /// Drain the stream into a contiguous buffer.
    ///
    /// Defeats the laziness on purpose; for callers that need the whole
    /// object, such as sized upload bodies and tests.
    pub async fn collect(mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Copy the stream into a writer, returning the number of bytes written
    pub async fn write_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match &mut self.get_mut().inner {
            Inner::Channel(rx) => rx.poll_recv(cx),
            Inner::Boxed(stream) => stream.as_mut().poll_next(cx),
        }
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.inner {
            Inner::Channel(_) => "channel",
            Inner::Boxed(_) => "boxed",
        };
        f.debug_struct("ByteStream").field("kind", &kind).finish()
    }
}

/// Producer half of the streaming bridge
pub struct BridgeSender {
    tx: mpsc::Sender<Result<Bytes>>,
}

impl BridgeSender {
    /// Push one chunk, suspending while the buffer is full.
    ///
    /// Returns `false` when the consumer has gone away; the producer must
    /// stop instead of reading further.
    pub async fn send(&self, chunk: Bytes) -> bool {
        self.tx.send(Ok(chunk)).await.is_ok()
    }

    /// Deliver an error to the consumer's next read and end the stream
    pub async fn fail(self, err: Error) {
        let _ = self.tx.send(Err(err)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_from_bytes_collect() {
        let stream = ByteStream::from_bytes(&b"hello"[..]);
        assert_eq!(stream.collect().await.unwrap().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_bridge_delivers_chunks_in_order() {
        let (tx, stream) = ByteStream::channel(4);
        tokio::spawn(async move {
            assert!(tx.send(Bytes::from_static(b"he")).await);
            assert!(tx.send(Bytes::from_static(b"llo")).await);
        });
        assert_eq!(stream.collect().await.unwrap().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_bridge_propagates_error_after_partial_data() {
        let (tx, mut stream) = ByteStream::channel(4);
        tokio::spawn(async move {
            tx.send(Bytes::from_static(b"part")).await;
            tx.fail(Error::Remote("connection reset".into())).await;
        });

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.as_ref(), b"part");

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_bridge_backpressure_bounds_producer() {
        let (tx, mut stream) = ByteStream::channel(2);

        assert!(tx.send(Bytes::from_static(b"1")).await);
        assert!(tx.send(Bytes::from_static(b"2")).await);

        // Buffer full: the third send must suspend until the consumer reads.
        let mut blocked = Box::pin(tx.send(Bytes::from_static(b"3")));
        assert!(blocked.as_mut().now_or_never().is_none());

        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"1");
        assert!(blocked.await);
    }

    #[tokio::test]
    async fn test_dropping_consumer_stops_producer() {
        let (tx, stream) = ByteStream::channel(2);
        drop(stream);
        assert!(!tx.send(Bytes::from_static(b"orphan")).await);
    }

    #[tokio::test]
    async fn test_write_to() {
        let stream = ByteStream::from_bytes(&b"abcdef"[..]);
        let mut out = Vec::new();
        let written = stream.write_to(&mut out).await.unwrap();
        assert_eq!(written, 6);
        assert_eq!(out, b"abcdef");
    }

    #[tokio::test]
    async fn test_from_reader_chunks() {
        let data = vec![7u8; CHUNK_SIZE + 10];
        let stream = ByteStream::from_reader(std::io::Cursor::new(data.clone()));
        assert_eq!(stream.collect().await.unwrap().as_ref(), &data[..]);
    }
}
