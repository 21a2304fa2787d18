use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::ChunkError;

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Paragraphs at or below this trimmed length are dropped as noise.
const MIN_PARAGRAPH_CHARS: usize = 10;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

/// Paragraph-aware chunker. Sizes are counted in characters.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ChunkError::InvalidConfig {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks of at most `chunk_size` characters.
    ///
    /// Short paragraphs are emitted whole; longer ones are cut with a sliding
    /// window that advances by `chunk_size - overlap`.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();

        for paragraph in PARAGRAPH_BREAK.split(text) {
            if paragraph.trim().chars().count() <= MIN_PARAGRAPH_CHARS {
                continue;
            }

            let chars: Vec<char> = paragraph.chars().collect();
            if chars.len() <= self.chunk_size {
                push_trimmed(&mut chunks, paragraph);
                continue;
            }

            let step = self.chunk_size - self.overlap;
            let mut start = 0;
            loop {
                let end = (start + self.chunk_size).min(chars.len());
                let window: String = chars[start..end].iter().collect();
                push_trimmed(&mut chunks, &window);

                if end >= chars.len() {
                    break;
                }
                start += step;
            }
        }

        debug!("Chunked {} chars into {} chunks", text.chars().count(), chunks.len());
        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert_eq!(
            TextChunker::new(10, 10).unwrap_err(),
            ChunkError::InvalidConfig {
                chunk_size: 10,
                overlap: 10
            }
        );
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(10, 9).is_ok());
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(TextChunker::default().chunk("").is_empty());
        assert!(TextChunker::default().chunk("\n\n   \n\n").is_empty());
    }

    #[test]
    fn test_short_paragraphs_are_dropped() {
        let text = "Short.\n\nok\n\nThis paragraph is long enough.";
        let chunks = TextChunker::default().chunk(text);
        assert_eq!(chunks, vec!["This paragraph is long enough."]);
    }

    #[test]
    fn test_paragraph_at_threshold_is_dropped() {
        let chunks = TextChunker::default().chunk("  0123456789  \n\n01234567890");
        assert_eq!(chunks, vec!["01234567890"]);
    }

    #[test]
    fn test_sliding_window_offsets() {
        let text = "abcdefghijklmnopqrstuvwxy";
        let chunks = TextChunker::new(10, 2).unwrap().chunk(text);
        assert_eq!(chunks, vec!["abcdefghij", "ijklmnopqr", "qrstuvwxy"]);
    }

    #[test]
    fn test_windows_respect_size_and_overlap() {
        let text: String = (0..5000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunker = TextChunker::new(500, 50).unwrap();
        let chunks = chunker.chunk(&text);

        assert!(chunks.iter().all(|c| c.chars().count() <= 500));
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(450).collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn test_blank_line_with_whitespace_splits_paragraphs() {
        let text = "First paragraph here.\n  \t \nSecond paragraph here.";
        let chunks = TextChunker::default().chunk(text);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let text = "제1조(목적) 이 법은 산업 안전 및 보건에 관한 기준을 확립한다.".repeat(3);
        let chunker = TextChunker::new(30, 5).unwrap();
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 30));
    }
}
