use bytes::Buf;
use idx_error::{IdxResult, idx_bail};

use crate::DType;

/// The typed contents of one record, decoded from big-endian body bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    U8(Vec<u8>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    /// Both `0x0D` and `0x0E` data decode to `f32`. The 8-byte `0x0E` values are narrowed.
    F32(Vec<f32>),
}

impl Values {
    /// Decode `bytes` as a run of `dtype` values.
    ///
    /// Fails if `bytes` does not hold a whole number of values.
    pub fn decode(dtype: DType, mut bytes: &[u8]) -> IdxResult<Self> {
        let width = dtype.byte_width();
        if bytes.len() % width != 0 {
            idx_bail!(
                InvalidArgument: "{} bytes is not a whole number of {dtype} values",
                bytes.len()
            );
        }
        let n = bytes.len() / width;

        Ok(match dtype {
            DType::U8 => Values::U8(bytes.to_vec()),
            DType::I8 => Values::I8((0..n).map(|_| bytes.get_i8()).collect()),
            DType::I16 => Values::I16((0..n).map(|_| bytes.get_i16()).collect()),
            DType::I32 => Values::I32((0..n).map(|_| bytes.get_i32()).collect()),
            DType::F32 => Values::F32((0..n).map(|_| bytes.get_f32()).collect()),
            #[allow(clippy::cast_possible_truncation)]
            DType::F64 => Values::F32((0..n).map(|_| bytes.get_f64() as f32).collect()),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            Values::U8(v) => v.len(),
            Values::I8(v) => v.len(),
            Values::I16(v) => v.len(),
            Values::I32(v) => v.len(),
            Values::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the value at `index`, if any.
    pub fn display_at(&self, index: usize) -> Option<String> {
        match self {
            Values::U8(v) => v.get(index).map(ToString::to_string),
            Values::I8(v) => v.get(index).map(ToString::to_string),
            Values::I16(v) => v.get(index).map(ToString::to_string),
            Values::I32(v) => v.get(index).map(ToString::to_string),
            Values::F32(v) => v.get(index).map(ToString::to_string),
        }
    }
}
