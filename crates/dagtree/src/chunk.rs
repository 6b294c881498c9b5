//! Chunk sources
//!
//! A [`Splitter`] cuts a byte stream into chunks. [`ChunkStream`] runs a
//! splitter on its own blocking task and hands the chunks to the DAG
//! builder as a single lazy sequence of `Result<chunk, ChunkError>`.
//! The producer stops after the first error.

use std::io::{ErrorKind, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use tokio::sync::mpsc;

/// Chunks buffered between the splitter task and the builder
pub const CHUNK_CHANNEL_CAPACITY: usize = 8;

/// Chunk source error type
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Chunk source error: {0}")]
    Other(String),
}

/// Cuts a byte stream into chunks
///
/// Implementations block while reading. Chunk boundaries are up to the
/// implementation, but returned chunks are never empty.
pub trait Splitter: Send + 'static {
    /// Next chunk in stream order, `Ok(None)` at end of stream
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ChunkError>;
}

/// Fixed-size splitter. The final chunk may be shorter.
pub struct SizeSplitter<R> {
    reader: R,
    size: usize,
}

impl<R: Read + Send + 'static> SizeSplitter<R> {
    pub fn new(reader: R, size: usize) -> Self {
        // a zero size would never make progress
        Self {
            reader,
            size: size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.size
    }
}

impl<R: Read + Send + 'static> Splitter for SizeSplitter<R> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ChunkError> {
        let mut buf = vec![0u8; self.size];
        let mut filled = 0;

        // Read until we have a full chunk or EOF
        while filled < self.size {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ChunkError::Io(e)),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf))
    }
}

/// Anything the builder can pull chunks from
pub trait ChunkSource: Stream<Item = Result<Vec<u8>, ChunkError>> + Unpin + Send {}

impl<T> ChunkSource for T where T: Stream<Item = Result<Vec<u8>, ChunkError>> + Unpin + Send {}

/// Chunk sequence fed by a producer running on its own task
pub struct ChunkStream {
    rx: mpsc::Receiver<Result<Vec<u8>, ChunkError>>,
}

impl ChunkStream {
    /// Run `splitter` on a blocking worker. Must be called within a tokio runtime.
    pub fn spawn<P: Splitter>(mut splitter: P) -> Self {
        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);

        tokio::task::spawn_blocking(move || loop {
            match splitter.next_chunk() {
                Ok(Some(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    // Receiver dropped: the build was abandoned
                    if tx.blocking_send(Ok(chunk)).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.blocking_send(Err(e));
                    break;
                }
            }
        });

        Self { rx }
    }

    /// Fixed-size chunks of `reader`, produced on a blocking worker
    pub fn from_reader<R: Read + Send + 'static>(reader: R, chunk_size: usize) -> Self {
        Self::spawn(SizeSplitter::new(reader, chunk_size))
    }

    /// Source over chunks already in memory
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<u8>, ChunkError>>,
    {
        let items: Vec<_> = chunks.into_iter().collect();
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // capacity covers every item
            let _ = tx.try_send(item);
        }
        Self { rx }
    }
}

impl Stream for ChunkStream {
    type Item = Result<Vec<u8>, ChunkError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
