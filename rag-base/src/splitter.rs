//! Recursive character text splitter.
//!
//! Tries separators in order (`"\n\n"`, `"\n"`, `" "`, `""`): the text is cut
//! before every occurrence of the first separator found in it, pieces shorter
//! than the chunk size are merged back together, and pieces that are still
//! too long are split again with the remaining separators. Separators stay
//! attached to the piece that follows them, so every chunk is a (trimmed)
//! substring of the source. Sizes are measured in chars.
//!
//! Consecutive chunks share up to `chunk_overlap` characters of trailing
//! pieces so that a sentence cut at a boundary stays retrievable.

use std::collections::VecDeque;

use tracing::warn;

use crate::errors::rag_base_error::RagBaseError;

/// Default separator cascade: paragraphs, lines, words, characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// # Errors
    /// [`RagBaseError::InvalidConfig`] if `chunk_size` is zero or the overlap
    /// is not smaller than the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagBaseError> {
        if chunk_size == 0 {
            return Err(RagBaseError::InvalidConfig("chunk size must be > 0".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagBaseError::InvalidConfig(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` into trimmed, non-empty chunks in document order.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_on(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge_splits(&fitting));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge_splits(&fitting));
        }
        chunks
    }

    /// Greedily packs `pieces` into chunks, keeping an overlap window.
    fn merge_splits(&self, pieces: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        chunk_len = total,
                        chunk_size = self.chunk_size,
                        "created a chunk longer than the configured size"
                    );
                }
                if !window.is_empty() {
                    if let Some(doc) = join_window(&window) {
                        docs.push(doc);
                    }
                    // Drop from the front until the window fits the overlap
                    // and leaves room for the next piece.
                    while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                        match window.pop_front() {
                            Some(first) => total = total.saturating_sub(char_len(first)),
                            None => break,
                        }
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_window(&window) {
            docs.push(doc);
        }
        docs
    }
}

/// Cuts `text` right before each occurrence of `separator` (occurrences may
/// overlap, e.g. a run of blank lines), or into single chars when empty.
fn split_on<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, _) in text.char_indices().skip(1) {
        if text[i..].starts_with(separator) {
            pieces.push(&text[start..i]);
            start = i;
        }
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join_window(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{i:02}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(RecursiveCharacterSplitter::new(0, 0).is_err());
        assert!(RecursiveCharacterSplitter::new(10, 10).is_err());
        assert!(RecursiveCharacterSplitter::new(350, 35).is_ok());
    }

    #[test]
    fn chunks_respect_size_and_overlap() {
        let text = words(100);
        let splitter = RecursiveCharacterSplitter::new(50, 15).unwrap();
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {chunk:?}");
        }
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').next_back().unwrap();
            assert!(
                pair[1].starts_with(last_word) || pair[1].contains(last_word),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
        for i in 0..100 {
            let w = format!("word{i:02}");
            assert!(chunks.iter().any(|c| c.split(' ').any(|x| x == w)), "{w} lost");
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let splitter = RecursiveCharacterSplitter::new(12, 0).unwrap();
        let chunks = splitter.split_text("aaaa bbbb\n\ncccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);

        let splitter = RecursiveCharacterSplitter::new(350, 35).unwrap();
        let chunks = splitter.split_text("para one.\n\npara two.");
        assert_eq!(chunks, vec!["para one.\n\npara two."]);
    }

    #[test]
    fn falls_back_to_characters() {
        let splitter = RecursiveCharacterSplitter::new(4, 1).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn blank_line_runs_survive_splitting() {
        let splitter = RecursiveCharacterSplitter::new(350, 35).unwrap();
        assert_eq!(splitter.split_text("a\n\n\n\nb"), vec!["a\n\n\n\nb"]);
    }

    #[test]
    fn chunks_are_substrings_of_the_source() {
        let text = "Rough: the item is reduced to scrap.\n\n\n\nCoarse: parts are  \
separated.\nFine: a useful  improvement.\n\n1:1: an equivalent item of the same  kind.";
        let splitter = RecursiveCharacterSplitter::new(40, 8).unwrap();
        let chunks = splitter.split_text(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(text.contains(chunk.as_str()), "{chunk:?} is not in the source");
            assert!(chunk.chars().count() <= 40, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn empty_text_has_no_chunks() {
        let splitter = RecursiveCharacterSplitter::new(350, 35).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n ").is_empty());
    }
}
