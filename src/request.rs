//! Allocation request parsing.
//!
//! Each input line is whitespace-separated: a label followed by a size in
//! KiB. Blank lines and lines with fewer than two tokens carry no request;
//! anything after the size token is ignored.

use core::num::ParseIntError;

use alloc::string::{String, ToString};
use thiserror::Error;

use crate::buddy::KB;

/// Errors raised while reading request lines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The size token is not a non-negative integer.
    #[error("line {line}: invalid size '{token}': {source}")]
    InvalidSize {
        line: usize,
        token: String,
        #[source]
        source: ParseIntError,
    },
    /// The size in KiB does not fit in bytes.
    #[error("line {line}: size of {size_kib} KB overflows")]
    SizeOverflow { line: usize, size_kib: u64 },
}

/// One labelled allocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub label: &'a str,
    pub size_bytes: u64,
}

/// Parse a single line numbered `line` (1-based, used for errors only).
///
/// Returns `Ok(None)` for lines without a request.
pub fn parse_line(line: usize, text: &str) -> Result<Option<Request<'_>>, RequestError> {
    let mut tokens = text.split_whitespace();
    let (Some(label), Some(size_token)) = (tokens.next(), tokens.next()) else {
        return Ok(None);
    };

    let size_kib: u64 = size_token
        .parse()
        .map_err(|source| RequestError::InvalidSize {
            line,
            token: size_token.to_string(),
            source,
        })?;
    let size_bytes = size_kib
        .checked_mul(KB)
        .ok_or(RequestError::SizeOverflow { line, size_kib })?;

    Ok(Some(Request { label, size_bytes }))
}

/// Parse every request in `input`, skipping lines that carry none.
pub fn parse_requests(input: &str) -> impl Iterator<Item = Result<Request<'_>, RequestError>> {
    input
        .lines()
        .enumerate()
        .filter_map(|(number, text)| parse_line(number + 1, text).transpose())
}
