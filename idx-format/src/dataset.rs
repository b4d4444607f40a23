use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use idx_error::{IdxError, IdxResult, idx_bail, idx_err};
use idx_io::{DEFAULT_CHUNK_SIZE, OffsetReadAt, RangeStream, TokioFile};

use crate::{Collate, Geometry, RangeReader, Rechunk, Window, collate};

/// The directory the dataset files are read from when no root is configured.
pub const DEFAULT_ROOT: &str = "MNIST";

/// A named pair of image and label files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetBinding {
    Training,
    Testing,
}

impl DatasetBinding {
    pub const ALL: [DatasetBinding; 2] = [DatasetBinding::Training, DatasetBinding::Testing];

    /// The file names of the images and labels, in slot order.
    pub const fn files(self) -> [&'static str; 2] {
        match self {
            DatasetBinding::Training => ["train-images-idx3-ubyte", "train-labels-idx1-ubyte"],
            DatasetBinding::Testing => ["t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DatasetBinding::Training => "training",
            DatasetBinding::Testing => "testing",
        }
    }
}

impl Display for DatasetBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DatasetBinding {
    type Err = IdxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetBinding::ALL
            .into_iter()
            .find(|binding| binding.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = DatasetBinding::ALL.iter().map(|b| b.name()).collect();
                idx_err!(
                    InvalidArgument: "unknown dataset \"{s}\", try one of [{}]",
                    names.join(", ")
                )
            })
    }
}

/// Open options for a [`Database`].
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    root: PathBuf,
    chunk_size: u64,
    bindings: Vec<DatasetBinding>,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl DatabaseOptions {
    /// Options reading every binding from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE.get(),
            bindings: DatasetBinding::ALL.to_vec(),
        }
    }

    /// Configure the number of bytes requested per read.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> IdxResult<Self> {
        if chunk_size == 0 {
            idx_bail!(InvalidArgument: "chunk size must be positive, got 0");
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Only open the files of the given bindings.
    pub fn with_bindings(mut self, bindings: impl IntoIterator<Item = DatasetBinding>) -> Self {
        self.bindings = bindings.into_iter().collect();
        self
    }
}

/// The stream of `(image, label)` record slots returned by [`Database::open_window`].
pub type WindowStream = Collate<Rechunk<RangeStream<OffsetReadAt<TokioFile>>>>;

struct Table {
    binding: DatasetBinding,
    readers: Vec<RangeReader<TokioFile>>,
}

/// The dataset files of every configured binding, opened and decoded once.
pub struct Database {
    tables: Vec<Table>,
}

/// Summary of a binding's image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetInfo {
    pub count: u32,
    pub height: u32,
    pub width: u32,
}

impl Database {
    /// Open and decode the header of every bound file. Any malformed header fails the whole open.
    pub async fn open(options: DatabaseOptions) -> IdxResult<Self> {
        let mut tables = Vec::with_capacity(options.bindings.len());
        for binding in options.bindings {
            let mut readers = Vec::with_capacity(2);
            for file in binding.files() {
                let reader = RangeReader::open_path(options.root.join(file))
                    .await?
                    .with_chunk_size(options.chunk_size)?;
                readers.push(reader);
            }
            log::debug!("opened {binding} dataset from {}", options.root.display());
            tables.push(Table { binding, readers });
        }
        Ok(Self { tables })
    }

    /// The bindings this database was opened with.
    pub fn bindings(&self) -> impl Iterator<Item = DatasetBinding> + '_ {
        self.tables.iter().map(|t| t.binding)
    }

    /// The geometries of the `[images, labels]` files of `binding`.
    pub fn geometries(&self, binding: DatasetBinding) -> IdxResult<Vec<&Geometry>> {
        Ok(self.table(binding)?.readers.iter().map(|r| r.geometry()).collect())
    }

    /// The record count and image shape of `binding`.
    pub fn info(&self, binding: DatasetBinding) -> IdxResult<DatasetInfo> {
        let table = self.table(binding)?;
        let Some(images) = table.readers.first() else {
            idx_bail!(InvalidArgument: "dataset {binding} has no image file");
        };
        let dims = images.geometry().dims();
        Ok(DatasetInfo {
            count: dims[0],
            height: dims.get(1).copied().unwrap_or(1),
            width: dims.get(2).copied().unwrap_or(1),
        })
    }

    /// Stream records `[begin, begin + count)` of every file of `binding` as collated slots,
    /// images first.
    ///
    /// Every window is validated before any range is opened. Opening a window closes the window
    /// previously opened on the same binding.
    pub fn open_window(
        &mut self,
        binding: DatasetBinding,
        begin: u64,
        count: Option<u64>,
    ) -> IdxResult<WindowStream> {
        let table = self.table_mut(binding)?;
        for reader in &table.readers {
            Window::try_new(reader.geometry().len(), begin, count)?;
        }

        let sources = table
            .readers
            .iter_mut()
            .map(|reader| reader.open_records(begin, count))
            .collect::<IdxResult<Vec<_>>>()?;
        log::debug!(
            "opened {binding} window at {begin} over {} files",
            sources.len()
        );
        Ok(collate(sources))
    }

    /// Close any window open on `binding`.
    pub fn close(&mut self, binding: DatasetBinding) -> IdxResult<()> {
        self.table_mut(binding)?
            .readers
            .iter_mut()
            .for_each(RangeReader::close);
        Ok(())
    }

    fn table(&self, binding: DatasetBinding) -> IdxResult<&Table> {
        self.tables
            .iter()
            .find(|t| t.binding == binding)
            .ok_or_else(|| unbound(binding))
    }

    fn table_mut(&mut self, binding: DatasetBinding) -> IdxResult<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.binding == binding)
            .ok_or_else(|| unbound(binding))
    }
}

fn unbound(binding: DatasetBinding) -> IdxError {
    idx_err!(InvalidArgument: "dataset {binding} was not opened")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use futures::{StreamExt, TryStreamExt};
    use idx_error::IdxError;
    use rstest::rstest;

    use crate::test_util::{idx_bytes, write_idx_file};
    use crate::{DType, Database, DatabaseOptions, DatasetBinding, DatasetInfo, Record};

    /// Writes a testing binding of four 2x2 images and their labels.
    fn write_testing(dir: &Path) {
        let [images, labels] = DatasetBinding::Testing.files();
        let pixels: Vec<u8> = (0..16).collect();
        write_idx_file(dir, images, &idx_bytes(DType::U8, &[4, 2, 2], &pixels));
        write_idx_file(dir, labels, &idx_bytes(DType::U8, &[4], &[7, 1, 2, 9]));
    }

    async fn testing_db(dir: &Path) -> Database {
        write_testing(dir);
        let options = DatabaseOptions::new(dir)
            .with_bindings([DatasetBinding::Testing])
            .with_chunk_size(3)
            .unwrap();
        Database::open(options).await.unwrap()
    }

    #[rstest]
    #[case("training", DatasetBinding::Training)]
    #[case("Testing", DatasetBinding::Testing)]
    #[case("TRAINING", DatasetBinding::Training)]
    fn parses_binding(#[case] name: &str, #[case] binding: DatasetBinding) {
        assert_eq!(name.parse::<DatasetBinding>().unwrap(), binding);
    }

    #[test]
    fn unknown_binding_lists_names() {
        let err = "validation".parse::<DatasetBinding>().unwrap_err();
        assert!(matches!(err, IdxError::InvalidArgument(..)));
        assert!(err.to_string().contains("[training, testing]"));
    }

    #[test]
    fn binding_display() {
        assert_eq!(DatasetBinding::Training.to_string(), "training");
        assert_eq!(DatasetBinding::Testing.to_string(), "testing");
    }

    #[tokio::test]
    async fn info_and_geometries() {
        let dir = tempfile::tempdir().unwrap();
        let db = testing_db(dir.path()).await;

        assert_eq!(
            db.info(DatasetBinding::Testing).unwrap(),
            DatasetInfo {
                count: 4,
                height: 2,
                width: 2
            }
        );
        let geometries = db.geometries(DatasetBinding::Testing).unwrap();
        assert_eq!(geometries.len(), 2);
        assert_eq!(geometries[0].element_size(), 4);
        assert_eq!(geometries[1].element_size(), 1);
        assert_eq!(db.bindings().collect::<Vec<_>>(), vec![DatasetBinding::Testing]);
    }

    #[tokio::test]
    async fn unopened_binding() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = testing_db(dir.path()).await;
        assert!(matches!(
            db.info(DatasetBinding::Training),
            Err(IdxError::InvalidArgument(..))
        ));
        assert!(db.open_window(DatasetBinding::Training, 0, None).is_err());
    }

    #[tokio::test]
    async fn missing_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        write_testing(dir.path());
        let err = Database::open(DatabaseOptions::new(dir.path()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err.root(), IdxError::Io(_)));
    }

    #[tokio::test]
    async fn malformed_header_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        write_testing(dir.path());
        let [_, labels] = DatasetBinding::Testing.files();
        write_idx_file(dir.path(), labels, &idx_bytes(DType::U8, &[4], &[7, 1, 2]));

        let options = DatabaseOptions::new(dir.path()).with_bindings([DatasetBinding::Testing]);
        let err = Database::open(options).await.err().unwrap();
        assert!(matches!(err.root(), IdxError::MalformedHeader(..)));
    }

    #[tokio::test]
    async fn window_pairs_images_with_labels() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = testing_db(dir.path()).await;

        let steps: Vec<Vec<Option<Record>>> = db
            .open_window(DatasetBinding::Testing, 1, Some(2))
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let steps: Vec<Vec<Option<Vec<u8>>>> = steps
            .iter()
            .map(|step| {
                step.iter()
                    .map(|slot| slot.as_ref().map(|r| r.bytes().to_vec()))
                    .collect()
            })
            .collect();
        assert_eq!(
            steps,
            vec![
                vec![Some(vec![4, 5, 6, 7]), Some(vec![1])],
                vec![Some(vec![8, 9, 10, 11]), Some(vec![2])],
            ]
        );
    }

    #[tokio::test]
    async fn invalid_window_keeps_open_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = testing_db(dir.path()).await;

        let window = db.open_window(DatasetBinding::Testing, 0, None).unwrap();
        assert!(matches!(
            db.open_window(DatasetBinding::Testing, 4, None),
            Err(IdxError::Range(..))
        ));
        assert_eq!(window.try_collect::<Vec<_>>().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn second_window_ends_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = testing_db(dir.path()).await;

        let mut first = db.open_window(DatasetBinding::Testing, 0, None).unwrap();
        assert!(first.next().await.unwrap().is_ok());

        let second = db.open_window(DatasetBinding::Testing, 2, None).unwrap();
        assert!(first.next().await.is_none());
        assert_eq!(second.try_collect::<Vec<_>>().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn close_ends_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = testing_db(dir.path()).await;

        let mut window = db.open_window(DatasetBinding::Testing, 0, None).unwrap();
        db.close(DatasetBinding::Testing).unwrap();
        assert!(window.next().await.is_none());
    }
}
