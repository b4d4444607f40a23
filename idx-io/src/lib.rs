//! Core traits and implementations for asynchronous reads of dataset files.
//!
//! IDX dataset files are read by position: a fixed header first, then arbitrary windows of the
//! body. This crate provides the positional read trait, a cursor over it, and a cancellable
//! stream of the bytes in one range. The tokio feature adds a file implementation that reads on
//! the tokio blocking pool.

pub use buf::*;
pub use offset::*;
pub use range::*;
pub use read::*;
#[cfg(feature = "tokio")]
pub use file::*;

mod buf;
#[cfg(feature = "tokio")]
mod file;
mod offset;
mod range;
mod read;
