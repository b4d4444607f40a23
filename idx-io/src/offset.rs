use std::future::Future;
use std::io;
use std::ops::Range;

use bytes::Bytes;
use futures::FutureExt;

use crate::IdxReadAt;

/// An adapter that offsets all reads by a fixed amount.
///
/// Used to address a file body by its own offsets, skipping a fixed-size header.
pub struct OffsetReadAt<R> {
    read: R,
    offset: u64,
}

impl<R> Clone for OffsetReadAt<R>
where
    R: Clone,
{
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
            offset: self.offset,
        }
    }
}

impl<R: IdxReadAt> OffsetReadAt<R> {
    pub fn new(read: R, offset: u64) -> Self {
        Self { read, offset }
    }
}

impl<R: IdxReadAt> IdxReadAt for OffsetReadAt<R> {
    fn read_byte_range(&self, range: Range<u64>) -> impl Future<Output = io::Result<Bytes>> {
        self.read
            .read_byte_range(range.start + self.offset..range.end + self.offset)
    }

    fn size(&self) -> impl Future<Output = io::Result<u64>> {
        let offset = self.offset;
        self.read
            .size()
            .map(move |len| len.map(|len| len.saturating_sub(offset)))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::IdxReadAt;
    use crate::offset::OffsetReadAt;

    #[tokio::test]
    async fn reads_are_shifted() {
        let read = OffsetReadAt::new(Bytes::from_static(b"HDRbody"), 3);
        assert_eq!(read.read_byte_range(0..4).await.unwrap().as_ref(), b"body");
        assert_eq!(read.size().await.unwrap(), 4);
    }
}
