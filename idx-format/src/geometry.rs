use std::fmt::{Display, Formatter};

use bytes::Buf;
use idx_error::{IdxResult, idx_bail, idx_err};
use idx_io::{IdxBufReader, IdxReadAt};

use crate::{DIM_SIZE, DType, MAGIC_SIZE};

/// The record geometry of an IDX file, decoded from its header.
///
/// A `Geometry` is only ever constructed for a header whose declared size matches the size of the
/// file it was read from, so every derived size can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    dtype: DType,
    dims: Vec<u32>,
    header_size: u64,
    element_size: u64,
    body_size: u64,
}

impl Geometry {
    /// Decode the header at the front of `header` for a file of `file_size` bytes.
    ///
    /// Only the magic field and the dimension table are consumed; any body bytes that follow in
    /// `header` are left untouched.
    pub fn try_new(mut header: impl Buf, file_size: u64) -> IdxResult<Self> {
        if header.remaining() < MAGIC_SIZE {
            idx_bail!(
                MalformedHeader: "expected {MAGIC_SIZE} magic bytes, got {}",
                header.remaining()
            );
        }
        let _reserved = header.get_u16();
        let type_code = header.get_u8();
        let axis_count = header.get_u8();

        if axis_count == 0 {
            idx_bail!(MalformedHeader: "expected a positive number of dimensions, got 0");
        }
        let dtype = DType::try_from(type_code)?;

        let table_size = DIM_SIZE * usize::from(axis_count);
        if header.remaining() < table_size {
            idx_bail!(
                MalformedHeader: "expected {table_size} bytes of dimensions for {axis_count} axes, got {}",
                header.remaining()
            );
        }
        let dims: Vec<u32> = (0..axis_count).map(|_| header.get_u32()).collect();

        let header_size = (MAGIC_SIZE + table_size) as u64;
        let dim_string = join_dims(&dims);
        let element_size = dims[1..]
            .iter()
            .try_fold(dtype.byte_width() as u64, |acc, &dim| {
                acc.checked_mul(u64::from(dim))
            })
            .ok_or_else(|| idx_err!(MalformedHeader: "element size overflows for dims {dim_string}"))?;
        let body_size = u64::from(dims[0])
            .checked_mul(element_size)
            .and_then(|body| body.checked_add(header_size).map(|_| body))
            .ok_or_else(|| idx_err!(MalformedHeader: "body size overflows for dims {dim_string}"))?;

        let total_size = header_size + body_size;
        if total_size != file_size {
            idx_bail!(
                MalformedHeader: "expected {file_size} bytes, header declares {total_size}"
            );
        }

        Ok(Self {
            dtype,
            dims,
            header_size,
            element_size,
            body_size,
        })
    }

    /// Read and decode the header of `read`, checking it against the size of the source.
    ///
    /// Two reads are issued: the magic field, then exactly the dimension table it announces.
    pub async fn read<R: IdxReadAt>(read: &R) -> IdxResult<Self> {
        let file_size = read.size().await?;
        if file_size < MAGIC_SIZE as u64 {
            idx_bail!(MalformedHeader: "expected {MAGIC_SIZE} magic bytes, got {file_size}");
        }

        let mut reader = IdxBufReader::new(read.clone());
        let magic = reader.read_bytes(MAGIC_SIZE as u64).await?;
        let table_size = (DIM_SIZE * usize::from(magic[MAGIC_SIZE - 1])) as u64;
        if file_size < MAGIC_SIZE as u64 + table_size {
            // Let `try_new` report the short dimension table with the right message.
            return Self::try_new(magic, file_size);
        }
        let table = reader.read_bytes(table_size).await?;

        Self::try_new(magic.chain(table), file_size)
    }

    /// The declared element data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// All dimension sizes, record count first.
    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    /// The inner shape of one record, `dims[1..]`. Empty for a 1-axis file.
    pub fn element_shape(&self) -> &[u32] {
        &self.dims[1..]
    }

    /// The number of records in the file.
    pub fn len(&self) -> u64 {
        u64::from(self.dims[0])
    }

    pub fn is_empty(&self) -> bool {
        self.dims[0] == 0
    }

    /// The size of the magic field plus the dimension table.
    pub fn header_size(&self) -> u64 {
        self.header_size
    }

    /// The size of one record in bytes.
    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    pub fn body_size(&self) -> u64 {
        self.body_size
    }

    pub fn file_size(&self) -> u64 {
        self.header_size + self.body_size
    }

    /// The dimensions joined with `" x "`, e.g. `"60000 x 28 x 28"`.
    pub fn dim_string(&self) -> String {
        join_dims(&self.dims)
    }
}

fn join_dims(dims: &[u32]) -> String {
    dims.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" x ")
}

impl Display for Geometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.dtype, self.dim_string())
    }
}
