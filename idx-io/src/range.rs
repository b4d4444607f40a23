use std::fmt::{Debug, Formatter};
use std::io;
use std::num::NonZeroU64;
use std::ops::Range;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::LocalBoxFuture;
use futures::task::AtomicWaker;
use futures::{FutureExt, Stream};

use crate::IdxReadAt;

/// The default number of bytes requested per read, matching the usual high-water mark of a
/// buffered file stream.
pub const DEFAULT_CHUNK_SIZE: NonZeroU64 = match NonZeroU64::new(64 * 1024) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Default)]
struct CloseSignal {
    closed: AtomicBool,
    waker: AtomicWaker,
}

/// A handle that closes the [`RangeStream`] it was taken from.
///
/// Closing is idempotent. A consumer suspended on an in-flight read is woken and observes the
/// end of the stream.
#[derive(Clone)]
pub struct CloseHandle(Arc<CloseSignal>);

impl CloseHandle {
    pub fn close(&self) {
        if !self.0.closed.swap(true, Ordering::AcqRel) {
            self.0.waker.wake();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.0.closed.load(Ordering::Acquire)
    }
}

impl Debug for CloseHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A stream of the bytes in `range`, read from `R` in chunks of at most `chunk_size` bytes.
///
/// The stream owns its clone of the reader and releases it as soon as the range is fully
/// consumed, the stream is closed, or a read fails. Chunk boundaries carry no meaning; callers
/// wanting fixed-size records must resegment the stream.
pub struct RangeStream<R> {
    read: Option<R>,
    remaining: Range<u64>,
    chunk_size: NonZeroU64,
    in_flight: Option<(u64, LocalBoxFuture<'static, io::Result<Bytes>>)>,
    signal: Arc<CloseSignal>,
}

// The reader is never pinned, only cloned into boxed futures.
impl<R> Unpin for RangeStream<R> {}

impl<R: IdxReadAt> RangeStream<R> {
    pub fn new(read: R, range: Range<u64>, chunk_size: NonZeroU64) -> Self {
        Self {
            read: Some(read),
            remaining: range,
            chunk_size,
            in_flight: None,
            signal: Arc::default(),
        }
    }

    /// Returns a handle that can close this stream from elsewhere.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle(self.signal.clone())
    }

    /// Stop the stream, releasing the reader. Subsequent polls return `None`.
    pub fn close(&mut self) {
        self.close_handle().close();
        self.release();
    }

    /// Whether the stream still holds its reader.
    pub fn is_open(&self) -> bool {
        self.read.is_some()
    }

    /// The byte range that has not yet been read.
    pub fn remaining(&self) -> Range<u64> {
        self.remaining.clone()
    }

    fn release(&mut self) {
        self.in_flight = None;
        if self.read.take().is_some() {
            log::trace!(
                "released range reader with {} bytes unread",
                self.remaining.end - self.remaining.start
            );
        }
    }
}

impl<R: IdxReadAt> Stream for RangeStream<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        this.signal.waker.register(cx.waker());
        if this.signal.closed.load(Ordering::Acquire) {
            this.release();
            return Poll::Ready(None);
        }

        if this.in_flight.is_none() {
            if this.remaining.is_empty() {
                this.release();
                return Poll::Ready(None);
            }
            let Some(read) = this.read.clone() else {
                return Poll::Ready(None);
            };

            let start = this.remaining.start;
            let end = this
                .remaining
                .end
                .min(start.saturating_add(this.chunk_size.get()));
            this.in_flight = Some((
                end - start,
                async move { read.read_byte_range(start..end).await }.boxed_local(),
            ));
        }

        let result = match this.in_flight.as_mut() {
            Some((_, fut)) => match fut.poll_unpin(cx) {
                Poll::Ready(result) => result,
                Poll::Pending => return Poll::Pending,
            },
            None => return Poll::Ready(None),
        };
        let requested = this.in_flight.take().map(|(len, _)| len).unwrap_or(0);

        match result {
            Ok(bytes) => {
                this.remaining.start += requested;
                if this.remaining.is_empty() {
                    this.release();
                }
                Poll::Ready(Some(Ok(bytes)))
            }
            Err(e) => {
                this.release();
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}
