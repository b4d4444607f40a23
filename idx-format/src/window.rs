use std::ops::Range;

use idx_error::{IdxResult, idx_bail, idx_err};

/// A validated, non-empty window of records `[begin, begin + count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    begin: u64,
    count: u64,
}

impl Window {
    /// Validate a window against a file of `len` records.
    ///
    /// `count = None` selects every record from `begin` to the end of the file.
    pub fn try_new(len: u64, begin: u64, count: Option<u64>) -> IdxResult<Self> {
        if begin >= len {
            idx_bail!(Range: "begin index {begin} out of bounds, expected [0, {len})");
        }
        let max = len - begin;
        let count = count.unwrap_or(max);
        if count == 0 || count > max {
            idx_bail!(Range: "count {count} out of bounds for begin {begin}, expected [1, {max}]");
        }
        Ok(Self { begin, count })
    }

    pub fn begin(&self) -> u64 {
        self.begin
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// One past the last record of the window.
    pub fn end(&self) -> u64 {
        self.begin + self.count
    }

    pub fn records(&self) -> Range<u64> {
        self.begin..self.end()
    }

    /// The byte range of the window within the body, for records of `element_size` bytes.
    pub fn byte_range(&self, element_size: u64) -> IdxResult<Range<u64>> {
        let start = self.begin.checked_mul(element_size);
        let end = self.end().checked_mul(element_size);
        match (start, end) {
            (Some(start), Some(end)) => Ok(start..end),
            _ => Err(idx_err!(
                Range: "records {}..{} of {element_size} bytes overflow the addressable range",
                self.begin,
                self.end()
            )),
        }
    }
}
