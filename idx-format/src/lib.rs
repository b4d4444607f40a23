//! Read IDX dataset files as element-aligned, collated record streams.
//!
//! IDX is the fixed-record binary format of the MNIST corpora. A file is a short big-endian
//! header followed by `dims[0]` equally sized records:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ 2 reserved bytes             │
//! │ 1 byte data type code        │
//! │ 1 byte axis count (N > 0)    │
//! ├──────────────────────────────┤
//! │ N × u32 dimension sizes      │
//! │ dims[0] is the record count  │
//! ├──────────────────────────────┤
//! │ body: dims[0] records of     │
//! │ product(dims[1..]) × width   │
//! │ bytes each                   │
//! └──────────────────────────────┘
//! ```
//!
//! # Reading
//!
//! The pipeline has four stages, each usable on its own:
//!
//! 1. [`Geometry`] decodes the header into record geometry without touching the body.
//! 2. [`RangeReader`] validates a [`Window`] of records and streams exactly the bytes of that
//!    window, in chunks whose size has nothing to do with record boundaries.
//! 3. [`Rechunk`] resegments any byte stream into one [`Record`] per element. A short final
//!    record is reported as truncated rather than dropped.
//! 4. [`Collate`] advances several record streams in lock-step and yields one slot per source,
//!    `None` once that source is exhausted.
//!
//! [`Database`] wires the stages together for the fixed [`DatasetBinding`]s, so that
//! [`Database::open_window`] yields `(image, label)` pairs.

pub use collate::*;
pub use dataset::*;
pub use dtype::*;
pub use geometry::*;
pub use reader::*;
pub use rechunk::*;
pub use values::*;
pub use window::*;

mod collate;
mod dataset;
mod dtype;
mod geometry;
mod reader;
mod rechunk;
#[cfg(test)]
mod test_util;
mod values;
mod window;

/// The size in bytes of the magic field that opens every header.
pub const MAGIC_SIZE: usize = 4;

/// The size in bytes of one entry of the dimension table.
pub const DIM_SIZE: usize = 4;
