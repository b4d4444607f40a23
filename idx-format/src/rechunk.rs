use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use futures::Stream;
use idx_error::{IdxError, IdxResult, idx_bail, idx_err};
use idx_io::CloseHandle;
use pin_project_lite::pin_project;

/// One element of a record stream.
///
/// A record holds exactly `expected` bytes, except for the last record of a source that ended
/// part-way through an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    bytes: Bytes,
    expected: usize,
}

impl Record {
    pub fn new(bytes: Bytes, expected: usize) -> Self {
        Self { bytes, expected }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the source ended before this record was complete.
    pub fn is_truncated(&self) -> bool {
        self.bytes.len() < self.expected
    }

    /// Reject a truncated record with [`IdxError::TruncatedRecord`].
    pub fn check(self) -> IdxResult<Self> {
        if self.is_truncated() {
            return Err(idx_err!(TruncatedRecord: self.expected, self.bytes.len()));
        }
        Ok(self)
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

pin_project! {
    /// Resegments a stream of arbitrarily sized byte chunks into one [`Record`] per element.
    ///
    /// Chunks that hold whole elements are sliced without copying; only elements that straddle a
    /// chunk boundary are assembled in the carry-over buffer. The total number of bytes emitted
    /// equals the number of bytes consumed from the source.
    pub struct Rechunk<S> {
        #[pin]
        source: S,
        element_size: usize,
        carry: BytesMut,
        pending: Bytes,
        finished: bool,
        close: Option<CloseHandle>,
    }
}

impl<S> Rechunk<S> {
    pub fn try_new(source: S, element_size: usize) -> IdxResult<Self> {
        if element_size == 0 {
            idx_bail!(InvalidArgument: "element size must be positive, got 0");
        }
        Ok(Self {
            source,
            element_size,
            carry: BytesMut::with_capacity(element_size),
            pending: Bytes::new(),
            finished: false,
            close: None,
        })
    }

    /// End the stream as soon as `handle` is closed, discarding any buffered bytes.
    pub fn with_close_handle(mut self, handle: CloseHandle) -> Self {
        self.close = Some(handle);
        self
    }
}

impl<S, E> Stream for Rechunk<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<IdxError>,
{
    type Item = IdxResult<Record>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let element_size = *this.element_size;

        if this.close.as_ref().is_some_and(CloseHandle::is_closed) {
            *this.finished = true;
            this.pending.clear();
            this.carry.clear();
            return Poll::Ready(None);
        }

        loop {
            if !this.pending.is_empty() {
                if this.carry.is_empty() {
                    if this.pending.len() >= element_size {
                        let bytes = this.pending.split_to(element_size);
                        return Poll::Ready(Some(Ok(Record::new(bytes, element_size))));
                    }
                    this.carry.extend_from_slice(&this.pending[..]);
                    this.pending.clear();
                } else {
                    let needed = element_size - this.carry.len();
                    let take = needed.min(this.pending.len());
                    this.carry.extend_from_slice(&this.pending.split_to(take));
                    if this.carry.len() == element_size {
                        let bytes = this.carry.split().freeze();
                        return Poll::Ready(Some(Ok(Record::new(bytes, element_size))));
                    }
                }
                continue;
            }

            if *this.finished {
                if this.carry.is_empty() {
                    return Poll::Ready(None);
                }
                let bytes = this.carry.split().freeze();
                log::debug!(
                    "source ended {} bytes into a {element_size} byte element",
                    bytes.len()
                );
                return Poll::Ready(Some(Ok(Record::new(bytes, element_size))));
            }

            match ready!(this.source.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => *this.pending = chunk,
                Some(Err(e)) => {
                    *this.finished = true;
                    this.carry.clear();
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => *this.finished = true,
            }
        }
    }
}

/// Adapts a byte stream into a [`Rechunk`] record stream.
pub trait RechunkExt: Stream + Sized {
    fn rechunk(self, element_size: usize) -> IdxResult<Rechunk<Self>> {
        Rechunk::try_new(self, element_size)
    }
}

impl<S: Stream> RechunkExt for S {}

#[cfg(test)]
mod tests {
    use std::io;
    use std::num::NonZeroU64;

    use bytes::Bytes;
    use futures::{StreamExt, TryStreamExt, stream};
    use idx_error::IdxError;
    use idx_io::RangeStream;
    use rstest::rstest;

    use crate::{Rechunk, RechunkExt, Record};

    fn source(chunks: &[&[u8]]) -> impl futures::Stream<Item = io::Result<Bytes>> + use<> {
        let chunks: Vec<io::Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(chunks)
    }

    /// Split `data` at the given cut points.
    fn split(data: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        let mut start = 0;
        for &cut in cuts.iter().chain(std::iter::once(&data.len())) {
            chunks.push(data[start..cut].to_vec());
            start = cut;
        }
        chunks
    }

    #[rstest]
    #[case(3, vec![])]
    #[case(3, vec![1])]
    #[case(3, vec![3, 6])]
    #[case(3, vec![2, 4, 5, 11])]
    #[case(4, vec![0, 0, 7])]
    #[case(1, vec![5])]
    #[tokio::test]
    async fn exact_across_splits(#[case] element_size: usize, #[case] cuts: Vec<usize>) {
        let data: Vec<u8> = (0..12).collect();
        let chunks = split(&data, &cuts);
        let chunks: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();

        let records: Vec<Record> = source(&chunks)
            .rechunk(element_size)
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(records.len(), data.len() / element_size);
        assert!(records.iter().all(|r| r.len() == element_size));
        assert!(records.iter().all(|r| !r.is_truncated()));
        let joined: Vec<u8> = records.iter().flat_map(|r| r.bytes().to_vec()).collect();
        assert_eq!(joined, data);
    }

    #[rstest]
    #[case(vec![&b"abcde"[..]])]
    #[case(vec![&b"ab"[..], &b"cd"[..], &b"e"[..]])]
    #[case(vec![&b"abcd"[..], &b""[..], &b"e"[..]])]
    #[tokio::test]
    async fn short_tail_is_truncated(#[case] chunks: Vec<&[u8]>) {
        let records: Vec<Record> = source(&chunks)
            .rechunk(2)
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let lens: Vec<usize> = records.iter().map(Record::len).collect();
        assert_eq!(lens, vec![2, 2, 1]);
        assert!(records[2].is_truncated());
        assert_eq!(records[2].bytes().as_ref(), b"e");
        assert!(matches!(
            records[2].clone().check(),
            Err(IdxError::TruncatedRecord {
                expected: 2,
                actual: 1
            })
        ));
        assert!(records[0].clone().check().is_ok());
    }

    #[tokio::test]
    async fn empty_source() {
        let mut records = source(&[]).rechunk(4).unwrap();
        assert!(records.next().await.is_none());
    }

    #[test]
    fn zero_element_size() {
        assert!(matches!(
            Rechunk::try_new(source(&[]), 0),
            Err(IdxError::InvalidArgument(..))
        ));
    }

    #[tokio::test]
    async fn source_error_ends_stream() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(io::Error::other("disk on fire")),
            Ok(Bytes::from_static(b"def")),
        ];
        let mut records = stream::iter(chunks).rechunk(2).unwrap();

        assert_eq!(records.next().await.unwrap().unwrap().bytes().as_ref(), b"ab");
        assert!(matches!(records.next().await, Some(Err(IdxError::Io(_)))));
        assert!(records.next().await.is_none());
    }

    #[tokio::test]
    async fn close_discards_buffered_records() {
        let range = RangeStream::new(
            Bytes::from_static(b"aabbcc"),
            0..6,
            NonZeroU64::new(6).unwrap(),
        );
        let handle = range.close_handle();
        let mut records = range.rechunk(2).unwrap().with_close_handle(handle.clone());

        assert_eq!(records.next().await.unwrap().unwrap().bytes().as_ref(), b"aa");
        handle.close();
        assert!(records.next().await.is_none());
    }

    #[tokio::test]
    async fn whole_elements_are_not_copied() {
        let chunk = Bytes::from_static(b"aabbcc");
        let mut records = stream::iter([Ok::<_, io::Error>(chunk.clone())])
            .rechunk(2)
            .unwrap();
        let first = records.next().await.unwrap().unwrap();
        assert_eq!(first.bytes().as_ptr(), chunk.as_ptr());
    }
}
