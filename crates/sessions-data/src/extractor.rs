//! Tolerant object extraction from a raw text stream.
//!
//! Objects are found by brace depth alone, so JSON Lines, comma separated
//! objects and arrays of objects all yield the same chunks. Braces inside
//! string literals are counted too; this is a lexical scan, not a parser.

use std::iter::FusedIterator;
use std::str::CharIndices;

use sessions_core::models::RawChunk;

/// Single-pass iterator over the top-level `{...}` objects in a text.
///
/// A trailing object whose braces never balance yields nothing. A `}` seen
/// outside any object is ignored.
#[derive(Debug, Clone)]
pub struct ChunkExtractor<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
    depth: usize,
    start: Option<usize>,
    emitted: usize,
}

impl<'a> ChunkExtractor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices(),
            depth: 0,
            start: None,
            emitted: 0,
        }
    }
}

impl<'a> Iterator for ChunkExtractor<'a> {
    type Item = RawChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (offset, c) = self.chars.next()?;
            match c {
                '{' => {
                    if self.depth == 0 {
                        self.start = Some(offset);
                    }
                    self.depth += 1;
                }
                '}' if self.depth > 0 => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        if let Some(start) = self.start.take() {
                            self.emitted += 1;
                            return Some(RawChunk {
                                ordinal: self.emitted,
                                text: &self.text[start..=offset],
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

impl FusedIterator for ChunkExtractor<'_> {}

/// Convenience constructor for [`ChunkExtractor`].
pub fn extract_chunks(text: &str) -> ChunkExtractor<'_> {
    ChunkExtractor::new(text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        extract_chunks(input).map(|c| c.text).collect()
    }

    #[test]
    fn test_newline_delimited_objects() {
        let input = "{\"a\":1}\n{\"b\":2}\n";
        assert_eq!(texts(input), vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_concatenated_and_comma_separated() {
        assert_eq!(texts("{\"a\":1}{\"b\":2}"), vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(
            texts("[{\"a\":1}, {\"b\":2}]"),
            vec!["{\"a\":1}", "{\"b\":2}"]
        );
    }

    #[test]
    fn test_nested_object_is_one_chunk() {
        let input = "{\"a\":{\"b\":{\"c\":1}}} {\"d\":2}";
        assert_eq!(texts(input), vec!["{\"a\":{\"b\":{\"c\":1}}}", "{\"d\":2}"]);
    }

    #[test]
    fn test_ordinals_are_one_based_and_sequential() {
        let ordinals: Vec<usize> = extract_chunks("{} x {} y {}").map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[test]
    fn test_unterminated_trailing_object_dropped() {
        assert!(texts("{\"user_id\": 1,").is_empty());
        assert_eq!(texts("{\"a\":1}\n{\"b\":"), vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_stray_closing_brace_ignored() {
        assert_eq!(texts("} {\"a\":1} }} {\"b\":2}"), vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_empty_and_braceless_input() {
        assert!(texts("").is_empty());
        assert!(texts("   \n\t not json at all").is_empty());
    }

    #[test]
    fn test_multibyte_text_slices_cleanly() {
        let input = "ü {\"t\":\"héllo\"} ✓";
        assert_eq!(texts(input), vec!["{\"t\":\"héllo\"}"]);
    }

    #[test]
    fn test_fused_after_exhaustion() {
        let mut extractor = extract_chunks("{}{}");
        assert_eq!(extractor.next().map(|c| c.ordinal), Some(1));
        assert_eq!(extractor.next().map(|c| c.ordinal), Some(2));
        assert!(extractor.next().is_none());
        assert!(extractor.next().is_none());
    }

    #[test]
    fn test_brace_inside_string_closes_object() {
        let input = r#"{"user_id": 1, "event_type": "a}b"} {"user_id": 2}"#;
        assert_eq!(
            texts(input),
            vec![r#"{"user_id": 1, "event_type": "a}"#, r#"{"user_id": 2}"#]
        );
    }
}
