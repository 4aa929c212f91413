//! Overlapping word-window text chunker.
//!
//! Splits text into windows of `size` whitespace tokens. Consecutive
//! windows share `overlap` tokens, so a 7-token text with `size = 3` and
//! `overlap = 1` produces `a b c`, `c d e`, `e f g`.
//!
//! # Algorithm
//!
//! 1. If `size == 0`, return the whole text as a single chunk.
//! 2. Split the text on whitespace.
//! 3. Emit `tokens[start..min(start + size, len)]` joined by single spaces.
//! 4. Advance `start` to `end - overlap` (or `end` when there is no usable
//!    overlap) until every token has been emitted.
//! 5. Guarantee at least one chunk (even for empty text).
//!
//! # Example
//!
//! ```rust
//! use archivist_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("a b c d e f g", 3, 1);
//! assert_eq!(chunks, vec!["a b c", "c d e", "e f g"]);
//! ```

use crate::error::{CoreError, Result};

/// Window size and overlap, in whitespace tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    /// Tokens per window. `0` disables chunking.
    pub size: usize,
    /// Tokens shared between consecutive windows. Ignored unless `< size`.
    pub overlap: usize,
}

impl ChunkingParams {
    pub fn new(size: usize, overlap: usize) -> Self {
        Self { size, overlap }
    }

    /// Reject an overlap that would stall the window (`overlap >= size`).
    ///
    /// Used for engine-wide defaults. Per-request overrides are not
    /// validated; [`chunk_text`] lays such windows out back to back.
    pub fn validate(&self) -> Result<()> {
        if self.size > 0 && self.overlap >= self.size {
            return Err(CoreError::invalid_configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            size: 800,
            overlap: 100,
        }
    }
}

/// Split `text` into overlapping windows of `size` tokens.
///
/// # Guarantees
///
/// - At least one chunk is always returned (an empty string for empty or
///   whitespace-only text).
/// - Every token appears in at least one window, in order.
/// - The last window may be shorter than `size`.
/// - Terminates for every input: an `overlap >= size` is ignored and the
///   windows are laid out back to back.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if size == 0 {
        return vec![text.to_string()];
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return vec![String::new()];
    }

    let step_back = if overlap < size { overlap } else { 0 };
    let mut chunks = Vec::with_capacity(tokens.len() / (size - step_back) + 1);
    let mut start = 0;

    while start < tokens.len() {
        let end = (start + size).min(tokens.len());
        chunks.push(tokens[start..end].join(" "));
        if end == tokens.len() {
            break;
        }
        start = end - step_back;
    }

    chunks
}
