use std::fs::File;
use std::future::Future;
use std::io;
use std::ops::{Deref, Range};
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::IdxReadAt;

/// A read-only dataset file whose positional reads run on the tokio blocking pool.
///
/// Clones share one descriptor, so every open range can hold its own handle without reopening the
/// file. The descriptor is closed when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct TokioFile(Arc<File>);

impl TokioFile {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self(Arc::new(File::open(path)?)))
    }
}

impl Deref for TokioFile {
    type Target = File;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IdxReadAt for TokioFile {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    fn read_byte_range(
        &self,
        range: Range<u64>,
    ) -> impl Future<Output = io::Result<Bytes>> {
        let this = self.clone();

        async move {
            let len = usize::try_from(range.end.saturating_sub(range.start))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            tokio::task::spawn_blocking(move || -> io::Result<Bytes> {
                let mut buffer = BytesMut::zeroed(len);
                this.read_exact_at(&mut buffer, range.start)?;
                Ok(buffer.freeze())
            })
            .await
            .map_err(io::Error::other)?
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    fn size(&self) -> impl Future<Output = io::Result<u64>> {
        let this = self.clone();

        async move { this.metadata().map(|metadata| metadata.len()) }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::io::Write;
    use std::os::unix::fs::FileExt;

    use tempfile::NamedTempFile;

    use crate::{IdxReadAt, TokioFile};

    fn labels_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0, 0, 8, 1, 0, 0, 0, 4, 7, 1, 2, 9]).unwrap();
        file
    }

    #[tokio::test]
    async fn positional_reads() {
        let tmp = labels_file();
        let file = TokioFile::open(tmp.path()).unwrap();

        let header = file.read_byte_range(0..8).await.unwrap();
        let body = file.clone().read_byte_range(8..12).await.unwrap();
        assert_eq!(header.as_ref(), &[0, 0, 8, 1, 0, 0, 0, 4]);
        assert_eq!(body.as_ref(), &[7, 1, 2, 9]);
        assert_eq!(file.size().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn read_past_end() {
        let tmp = labels_file();
        let file = TokioFile::open(tmp.path()).unwrap();
        let err = file.read_byte_range(8..13).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn clones_share_one_descriptor() {
        let tmp = labels_file();
        let file = TokioFile::open(tmp.path()).unwrap();
        std::fs::remove_file(tmp.path()).unwrap();

        let clone = file.clone();
        drop(file);

        let mut body = [0; 4];
        clone.read_exact_at(&mut body, 8).unwrap();
        assert_eq!(body, [7, 1, 2, 9]);
    }
}
