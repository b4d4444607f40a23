use std::future::Future;
use std::io;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;

/// A trait for types that support asynchronous positional reads.
///
/// Readers must be cheaply cloneable: every open byte range holds its own clone for as long as
/// the range is being read, and drops it once the range is exhausted or closed.
pub trait IdxReadAt: Clone + 'static {
    /// Request an asynchronous positional read. Results will be returned as a [`Bytes`].
    ///
    /// If the reader does not have the requested number of bytes, the returned Future will complete
    /// with an [`UnexpectedEof`][std::io::ErrorKind::UnexpectedEof].
    ///
    /// ## Thread Safety
    ///
    /// The resultant Future need not be [`Send`], allowing implementations that use thread-per-core
    /// executors.
    fn read_byte_range(&self, range: Range<u64>) -> impl Future<Output = io::Result<Bytes>>;

    /// Asynchronously get the number of bytes of data readable.
    ///
    /// For a file it will be the size in bytes.
    fn size(&self) -> impl Future<Output = io::Result<u64>>;
}

impl<T: IdxReadAt> IdxReadAt for Arc<T> {
    async fn read_byte_range(&self, range: Range<u64>) -> io::Result<Bytes> {
        T::read_byte_range(self, range).await
    }

    async fn size(&self) -> io::Result<u64> {
        T::size(self).await
    }
}

impl IdxReadAt for Bytes {
    async fn read_byte_range(&self, range: Range<u64>) -> io::Result<Bytes> {
        let start = usize::try_from(range.start)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let end = usize::try_from(range.end)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        if end > self.len() || start > end {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "unexpected eof reading {start}..{end} from {} bytes",
                    self.len()
                ),
            ));
        }
        Ok(self.slice(start..end))
    }

    async fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}
