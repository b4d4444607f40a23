use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};

use crate::DType;

/// Builds the bytes of an IDX file with the given header fields and body.
pub(crate) fn idx_bytes(dtype: DType, dims: &[u32], body: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u16(0);
    buf.put_u8(dtype.code());
    buf.put_u8(u8::try_from(dims.len()).unwrap());
    for dim in dims {
        buf.put_u32(*dim);
    }
    buf.extend_from_slice(body);
    buf.freeze()
}

pub(crate) fn write_idx_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
