use std::num::NonZeroU64;
use std::path::Path;

use idx_error::{IdxResult, idx_err};
use idx_io::{CloseHandle, DEFAULT_CHUNK_SIZE, IdxReadAt, OffsetReadAt, RangeStream, TokioFile};

use crate::{Geometry, Rechunk, Window};

/// Streams windows of records from one IDX file.
///
/// A reader has at most one active range: opening a new range, or calling [`close`], closes the
/// range opened before it.
///
/// [`close`]: RangeReader::close
pub struct RangeReader<R> {
    read: R,
    geometry: Geometry,
    chunk_size: NonZeroU64,
    active: Option<CloseHandle>,
}

impl RangeReader<TokioFile> {
    /// Open the file at `path` and decode its header.
    pub async fn open_path(path: impl AsRef<Path>) -> IdxResult<Self> {
        let path = path.as_ref();
        let file = TokioFile::open(path)
            .map_err(|e| idx_err!(Io: e).with_context(format!("opening {}", path.display())))?;
        let geometry = Geometry::read(&file)
            .await
            .map_err(|e| e.with_context(format!("decoding {}", path.display())))?;
        log::debug!("opened {} with geometry {geometry}", path.display());
        Ok(Self::new(file, geometry))
    }
}

impl<R: IdxReadAt> RangeReader<R> {
    /// Wrap a source whose header has already been decoded into `geometry`.
    pub fn new(read: R, geometry: Geometry) -> Self {
        Self {
            read,
            geometry,
            chunk_size: DEFAULT_CHUNK_SIZE,
            active: None,
        }
    }

    /// Set the number of bytes requested from the source per read.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> IdxResult<Self> {
        self.chunk_size = NonZeroU64::new(chunk_size)
            .ok_or_else(|| idx_err!(InvalidArgument: "chunk size must be positive, got 0"))?;
        Ok(self)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Stream the body bytes of records `[begin, begin + count)`.
    ///
    /// `count = None` reads to the end of the file. The window is validated before the previously
    /// active range is closed, so a rejected request leaves it untouched.
    ///
    /// The replaced range is closed immediately and any task waiting on it is woken. Its clone of
    /// the reader is dropped when that stream is next polled, which then yields `None`, or when
    /// the stream itself is dropped.
    pub fn open(
        &mut self,
        begin: u64,
        count: Option<u64>,
    ) -> IdxResult<RangeStream<OffsetReadAt<R>>> {
        let window = Window::try_new(self.geometry.len(), begin, count)?;
        let range = window.byte_range(self.geometry.element_size())?;

        self.close();
        log::debug!(
            "opening records {}..{} at body bytes {}..{}",
            window.begin(),
            window.end(),
            range.start,
            range.end
        );

        let body = OffsetReadAt::new(self.read.clone(), self.geometry.header_size());
        let stream = RangeStream::new(body, range, self.chunk_size);
        self.active = Some(stream.close_handle());
        Ok(stream)
    }

    /// Like [`open`](Self::open), resegmented into one record per element.
    ///
    /// Closing the range also drops records already buffered by the resegmenter.
    pub fn open_records(
        &mut self,
        begin: u64,
        count: Option<u64>,
    ) -> IdxResult<Rechunk<RangeStream<OffsetReadAt<R>>>> {
        let element_size = usize::try_from(self.geometry.element_size()).map_err(|_| {
            idx_err!(
                InvalidArgument: "element size {} exceeds the address space",
                self.geometry.element_size()
            )
        })?;
        let stream = self.open(begin, count)?;
        let handle = stream.close_handle();
        Ok(Rechunk::try_new(stream, element_size)?.with_close_handle(handle))
    }

    /// Close the active range, if any.
    pub fn close(&mut self) {
        if let Some(handle) = self.active.take() {
            if !handle.is_closed() {
                log::trace!("closing active range");
            }
            handle.close();
        }
    }
}
