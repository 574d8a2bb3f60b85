//! Single-range `Range` header parsing.
//!
//! Only the `bytes=<start>-[<end>]` form is accepted. Suffix ranges
//! (`bytes=-N`) and multi-range lists are rejected as unsatisfiable.

use crate::error::{Result, ShareError};

/// Inclusive byte interval inside a file of known size.
///
/// Always satisfies `start <= end < file_size` for the size it was parsed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: u64,
}

impl RangeSpec {
    /// Parse an optional header value against `file_size`.
    ///
    /// `Ok(None)` means no range was requested and the whole file should be sent.
    pub fn parse(header: Option<&str>, file_size: u64) -> Result<Option<RangeSpec>> {
        let Some(raw) = header else {
            return Ok(None);
        };
        let unsatisfiable = || ShareError::RangeNotSatisfiable { size: file_size };

        let spec = raw.trim().strip_prefix("bytes=").ok_or_else(unsatisfiable)?;
        let (start, end) = spec.split_once('-').ok_or_else(unsatisfiable)?;

        let start = parse_offset(start).ok_or_else(unsatisfiable)?;
        let end = if end.is_empty() {
            // open-ended; an empty file has no last byte
            file_size.checked_sub(1).ok_or_else(unsatisfiable)?
        } else {
            parse_offset(end).ok_or_else(unsatisfiable)?
        };

        if start >= file_size || end >= file_size || start > end {
            tracing::debug!("Range {}-{} outside of {} bytes", start, end, file_size);
            return Err(unsatisfiable());
        }

        Ok(Some(RangeSpec { start, end }))
    }

    /// number of bytes covered, `end - start + 1`; never zero
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

// digits only; rejects signs, whitespace and empty strings
fn parse_offset(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
