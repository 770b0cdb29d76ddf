//! Text chunking for embedding
//!
//! Splits extracted document text into bounded, overlapping chunks:
//! - Prefers paragraph (blank-line) boundaries while a buffer fits the limit
//! - Hard-splits oversized paragraphs into fixed-width overlapping slices
//! - Single forward pass, chunks produced lazily

use crate::config::ChunkConfig;
use crate::error::{Error, Result};
use blake3::Hasher;

/// Paragraph-aware overlapping chunker
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, validating the size/overlap relationship
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "overlap ({}) must be less than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    /// Chunk a document's text. Empty input yields zero chunks.
    pub fn chunks(&self, text: &str) -> Chunks {
        Chunks {
            text: text.replace("\r\n", "\n"),
            pos: 0,
            buffer: String::new(),
            pending: None,
            split: None,
            chunk_size: self.chunk_size,
            overlap: self.overlap,
        }
    }
}

/// Lazy iterator over a document's chunks (single pass, not restartable)
pub struct Chunks {
    text: String,
    pos: usize,
    buffer: String,
    pending: Option<(usize, usize)>,
    split: Option<HardSplit>,
    chunk_size: usize,
    overlap: usize,
}

struct HardSplit {
    end: usize,
    cursor: usize,
}

impl Chunks {
    /// Scan forward to the next blank-line-delimited paragraph
    fn next_paragraph(&mut self) -> Option<(usize, usize)> {
        while self.pos < self.text.len() {
            let rest = &self.text[self.pos..];
            let (raw_start, raw_end, advance) = match rest.find("\n\n") {
                Some(idx) => (self.pos, self.pos + idx, self.pos + idx + 2),
                None => (self.pos, self.text.len(), self.text.len()),
            };
            self.pos = advance;

            let para = &self.text[raw_start..raw_end];
            let trimmed = para.trim();
            if trimmed.is_empty() {
                continue;
            }
            let start = raw_start + (para.len() - para.trim_start().len());
            return Some((start, start + trimmed.len()));
        }
        None
    }

    fn take_buffer(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// Emit the next fixed-width slice of an oversized paragraph
    fn next_slice(&mut self) -> Option<String> {
        let split = self.split.as_mut()?;
        if split.cursor >= split.end {
            self.split = None;
            return None;
        }

        let start = split.cursor;
        let mut end = floor_char_boundary(&self.text, (start + self.chunk_size).min(split.end));
        if end <= start {
            end = ceil_char_boundary(&self.text, start + 1).min(split.end);
        }

        let slice = self.text[start..end].to_string();

        if end >= split.end {
            self.split = None;
        } else {
            // Next slice starts `overlap` characters before this one ended
            let mut next = floor_char_boundary(&self.text, end.saturating_sub(self.overlap));
            if next <= start {
                next = ceil_char_boundary(&self.text, start + 1);
            }
            split.cursor = next;
        }

        Some(slice)
    }
}

impl Iterator for Chunks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.split.is_some() {
                match self.next_slice() {
                    Some(slice) => return Some(slice),
                    None => continue,
                }
            }

            let para = match self.pending.take() {
                Some(range) => Some(range),
                None => self.next_paragraph(),
            };

            let Some((start, end)) = para else {
                if self.buffer.is_empty() {
                    return None;
                }
                return Some(self.take_buffer());
            };

            let para_len = end - start;

            if self.buffer.is_empty() {
                if para_len > self.chunk_size {
                    self.split = Some(HardSplit { end, cursor: start });
                    continue;
                }
                self.buffer.push_str(&self.text[start..end]);
                continue;
            }

            // Joining with a paragraph separator must keep the buffer in bounds
            if self.buffer.len() + 2 + para_len <= self.chunk_size {
                self.buffer.push_str("\n\n");
                self.buffer.push_str(&self.text[start..end]);
                continue;
            }

            self.pending = Some((start, end));
            return Some(self.take_buffer());
        }
    }
}

/// Clamp a byte position down to a valid UTF-8 character boundary
fn floor_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut adjusted = pos;
    while adjusted > 0 && !text.is_char_boundary(adjusted) {
        adjusted -= 1;
    }
    adjusted
}

/// Clamp a byte position up to a valid UTF-8 character boundary
fn ceil_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut adjusted = pos;
    while adjusted < text.len() && !text.is_char_boundary(adjusted) {
        adjusted += 1;
    }
    adjusted
}

/// Compute a stable hash for document content
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}

/// Compute a stable hash for a string
pub fn compute_text_hash(text: &str) -> String {
    compute_content_hash(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chunker: &Chunker, text: &str) -> Vec<String> {
        chunker.chunks(text).collect()
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = Chunker::new(1000, 200).unwrap();
        assert!(collect(&chunker, "").is_empty());
        assert!(collect(&chunker, "  \n\n  \n\n").is_empty());
    }

    #[test]
    fn test_overlap_must_be_less_than_size() {
        assert!(matches!(
            Chunker::new(100, 100),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Chunker::new(100, 150),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Chunker::new(0, 0),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_short_document_is_one_chunk() {
        let chunker = Chunker::new(1000, 200).unwrap();
        let chunks = collect(&chunker, "Clause 1. The parties agree.");
        assert_eq!(chunks, vec!["Clause 1. The parties agree.".to_string()]);
    }

    #[test]
    fn test_paragraphs_accumulate_until_full() {
        let chunker = Chunker::new(50, 10).unwrap();
        let text = "First paragraph here.\n\nSecond one.\n\nThird paragraph is also short.";
        let chunks = collect(&chunker, text);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len() <= 50, "chunk exceeds limit: {:?}", chunk);
        }
        assert!(chunks[0].contains("First paragraph here."));
    }

    #[test]
    fn test_crlf_normalized() {
        let chunker = Chunker::new(1000, 200).unwrap();
        let chunks = collect(&chunker, "First.\r\n\r\nSecond.");
        assert_eq!(chunks, vec!["First.\n\nSecond.".to_string()]);
    }

    #[test]
    fn test_long_paragraph_hard_split_with_overlap() {
        let chunker = Chunker::new(1000, 200).unwrap();
        let text = "ab".repeat(1250); // one 2500-char paragraph
        let chunks = collect(&chunker, &text);

        assert!(chunks.len() >= 3);
        // Combined length minus the declared overlaps reconstructs the input
        let total: usize = chunks.iter().map(String::len).sum();
        let overlapped = 200 * (chunks.len() - 1);
        assert_eq!(total - overlapped, 2500);

        // Each slice begins `overlap` characters before the previous slice's end
        for pair in chunks.windows(2) {
            let prev_tail = &pair[0][pair[0].len() - 200..];
            assert!(pair[1].starts_with(prev_tail));
        }
    }

    #[test]
    fn test_hard_split_respects_char_boundaries() {
        let chunker = Chunker::new(10, 3).unwrap();
        let text = "é".repeat(40); // 2 bytes per char, 80 bytes total
        let chunks = collect(&chunker, &text);

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().all(|c| c == 'é'));
        }
    }

    #[test]
    fn test_reconstruction_without_overlap() {
        // With overlap 0, hard-split slices concatenate back to the paragraph
        let chunker = Chunker::new(100, 0).unwrap();
        let text = "x".repeat(450);
        let chunks = collect(&chunker, &text);

        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_oversized_paragraph_after_buffered_text() {
        let chunker = Chunker::new(30, 5).unwrap();
        let text = format!("Short intro.\n\n{}", "y".repeat(100));
        let chunks = collect(&chunker, &text);

        assert_eq!(chunks[0], "Short intro.");
        let total: usize = chunks[1..].iter().map(String::len).sum();
        let overlapped = 5 * (chunks.len() - 2);
        assert_eq!(total - overlapped, 100);
    }

    #[test]
    fn test_content_hash_stability() {
        let h1 = compute_text_hash("agreement text");
        let h2 = compute_text_hash("agreement text");
        let h3 = compute_text_hash("different text");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
