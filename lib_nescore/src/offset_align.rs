//! Whitespace-tolerant offset reconciliation. Spec §6. Grounded on `ne-scoring-gen.cc`'s
//! `align_and_reposition()`.
//!
//! The hypothesis file is extracted and tokenized independently of the reference file, so its
//! extracted text may differ from the reference's extracted text in whitespace only (different
//! line wrapping, trailing spaces, and so on). Before hypothesis tag offsets can be compared
//! against reference tag offsets they must be rebased onto the reference text's coordinate space.
//! This module walks both texts in lock step, skipping whitespace on either side independently,
//! and requires every non-whitespace character to match exactly.

use crate::error::{Error, Result};
use crate::tokenize::escape;

const CONTEXT_RADIUS: usize = 16;

/// Maps every byte offset in the hypothesis text (`0..=hypothesis_text.len()`) to the
/// corresponding byte offset in the reference text.
pub struct OffsetMap {
    map: Vec<usize>,
}

impl OffsetMap {
    /// Rebases a hypothesis-text byte offset onto the reference text's coordinate space.
    pub fn reposition(&self, hypothesis_offset: usize) -> usize {
        self.map[hypothesis_offset]
    }
}

/// Builds the offset map, failing if the two texts diverge on a non-whitespace character.
pub fn align_and_reposition(
    reference_text: &str,
    hypothesis_text: &str,
    file_name: &str,
) -> Result<OffsetMap> {
    let reference_bytes = reference_text.as_bytes();
    let hypothesis_bytes = hypothesis_text.as_bytes();
    let mut map = vec![0usize; hypothesis_bytes.len() + 1];

    let mut reference_cursor = 0usize;
    let mut hypothesis_cursor = 0usize;

    loop {
        while reference_cursor < reference_bytes.len()
            && reference_bytes[reference_cursor].is_ascii_whitespace()
        {
            reference_cursor += 1;
        }
        while hypothesis_cursor < hypothesis_bytes.len()
            && hypothesis_bytes[hypothesis_cursor].is_ascii_whitespace()
        {
            map[hypothesis_cursor] = reference_cursor;
            hypothesis_cursor += 1;
        }

        if hypothesis_cursor >= hypothesis_bytes.len() {
            break;
        }

        if reference_cursor >= reference_bytes.len()
            || reference_bytes[reference_cursor] != hypothesis_bytes[hypothesis_cursor]
        {
            return Err(mismatch_error(
                reference_text,
                hypothesis_text,
                reference_cursor,
                hypothesis_cursor,
                file_name,
            ));
        }

        map[hypothesis_cursor] = reference_cursor;
        hypothesis_cursor += 1;
        reference_cursor += 1;
    }

    while reference_cursor < reference_bytes.len()
        && reference_bytes[reference_cursor].is_ascii_whitespace()
    {
        reference_cursor += 1;
    }
    map[hypothesis_bytes.len()] = reference_cursor;

    Ok(OffsetMap { map })
}

fn mismatch_error(
    reference_text: &str,
    hypothesis_text: &str,
    reference_offset: usize,
    hypothesis_offset: usize,
    file_name: &str,
) -> Error {
    let _ = file_name;
    Error::OffsetAlignmentMismatch {
        reference_offset,
        reference_context: context_window(reference_text, reference_offset),
        hypothesis_context: context_window(hypothesis_text, hypothesis_offset),
    }
}

fn context_window(text: &str, offset: usize) -> String {
    let start = offset.saturating_sub(CONTEXT_RADIUS);
    let end = (offset + CONTEXT_RADIUS).min(text.len());
    let start = find_char_boundary(text, start, false);
    let end = find_char_boundary(text, end, true);
    escape(&text[start..end])
}

fn find_char_boundary(text: &str, mut offset: usize, forward: bool) -> usize {
    while offset < text.len() && offset > 0 && !text.is_char_boundary(offset) {
        if forward {
            offset += 1;
        } else {
            offset -= 1;
        }
    }
    offset.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_identical_texts_one_to_one() {
        let map = align_and_reposition("Alice met Bob", "Alice met Bob", "ref").unwrap();
        assert_eq!(map.reposition(0), 0);
        assert_eq!(map.reposition(6), 6);
        assert_eq!(map.reposition(13), 13);
    }

    #[test]
    fn tolerates_differing_whitespace() {
        let map = align_and_reposition("Alice  met\nBob", "Alice met Bob", "ref").unwrap();
        assert_eq!(map.reposition(0), 0);
        // "met" starts right after "Alice  " (7 chars) in the reference, after "Alice " (6) in hyp.
        assert_eq!(map.reposition(6), 7);
        assert_eq!(map.reposition(10), 11);
    }

    #[test]
    fn rejects_non_whitespace_divergence() {
        let result = align_and_reposition("Alice met Bob", "Alice met Bill", "ref");
        assert!(matches!(result, Err(Error::OffsetAlignmentMismatch { .. })));
    }

    #[test]
    fn maps_end_of_text_offset() {
        let map = align_and_reposition("Alice ", "Alice", "ref").unwrap();
        assert_eq!(map.reposition(5), 6);
    }
}
