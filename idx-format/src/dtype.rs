use std::fmt::{Display, Formatter};

use idx_error::{IdxError, idx_bail};

/// The element data type declared by the third header byte.
///
/// Only the six codes of the IDX format are recognized; anything else is rejected when the
/// header is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DType {
    /// `0x08`, unsigned byte.
    U8 = 0x08,
    /// `0x09`, signed byte.
    I8 = 0x09,
    /// `0x0B`, 16-bit signed integer.
    I16 = 0x0B,
    /// `0x0C`, 32-bit signed integer.
    I32 = 0x0C,
    /// `0x0D`, 32-bit float.
    F32 = 0x0D,
    /// `0x0E`, 64-bit float on disk. Values are narrowed to `f32` when decoded.
    F64 = 0x0E,
}

impl DType {
    pub const ALL: [DType; 6] = [
        DType::U8,
        DType::I8,
        DType::I16,
        DType::I32,
        DType::F32,
        DType::F64,
    ];

    /// The header code for this type.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The number of bytes one datum occupies in the file body.
    pub const fn byte_width(self) -> usize {
        match self {
            DType::U8 | DType::I8 => 1,
            DType::I16 => 2,
            DType::I32 | DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Whether decoding loses precision relative to the stored width.
    pub const fn is_narrowed(self) -> bool {
        matches!(self, DType::F64)
    }
}

impl TryFrom<u8> for DType {
    type Error = IdxError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0x08 => DType::U8,
            0x09 => DType::I8,
            0x0B => DType::I16,
            0x0C => DType::I32,
            0x0D => DType::F32,
            0x0E => DType::F64,
            _ => idx_bail!(UnknownTypeCode: code),
        })
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DType::U8 => "u8",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        write!(f, "{name}")
    }
}
