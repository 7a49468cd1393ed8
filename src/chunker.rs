//! Knowledge-base text chunking
//!
//! Splits a raw document into overlapping segments, preferring to break at
//! the largest available semantic boundary: paragraph break, line break,
//! sentence-terminal punctuation, whitespace, and finally an arbitrary
//! character cut. Each chunk after the first begins `overlap` characters
//! before the prior chunk's end so context spanning a boundary is captured
//! in at least one chunk.

use crate::error::{KbChatError, Result};
use serde::{Deserialize, Serialize};

/// Default target chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// A bounded contiguous slice of the knowledge-base text
///
/// Immutable once produced. `chunk_index` is unique within one build batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text content; never an empty string
    pub content: String,
    /// Identifier of the source document this chunk came from
    pub source_id: String,
    /// Position of this chunk within the build batch
    pub chunk_index: usize,
    /// Length of `content` in characters
    pub size: usize,
}

/// Boundary classes, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    Character,
    Whitespace,
    Sentence,
    Line,
    Paragraph,
}

/// Split `text` into overlapping chunks
///
/// # Arguments
///
/// * `text` - The raw knowledge-base document
/// * `source_id` - Identifier recorded on every produced chunk
/// * `target_size` - Maximum chunk length in characters
/// * `overlap` - Characters of the prior chunk repeated at the start of the next
///
/// # Errors
///
/// Returns `KbChatError::EmptyKnowledgeBase` when the text is empty or
/// whitespace-only (there is nothing to index), and `KbChatError::Config`
/// when `overlap >= target_size` or `target_size == 0`.
///
/// # Examples
///
/// ```
/// use kbchat::chunker::split;
///
/// let chunks = split("A short document.", "kb", 1000, 200).unwrap();
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].content, "A short document.");
/// ```
pub fn split(text: &str, source_id: &str, target_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    if target_size == 0 || overlap >= target_size {
        return Err(KbChatError::Config(format!(
            "invalid chunking parameters: target_size={}, overlap={}",
            target_size, overlap
        ))
        .into());
    }

    if text.trim().is_empty() {
        return Err(KbChatError::EmptyKnowledgeBase(format!(
            "source '{}' contains no indexable text",
            source_id
        ))
        .into());
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let window_end = (start + target_size).min(total);
        let cut = if window_end == total {
            total
        } else {
            // Boundaries inside the overlap region are not eligible, so
            // every chunk carries content not already in its predecessor.
            snap_to_boundary(&chars, start + overlap, window_end)
        };

        let content: String = chars[start..cut].iter().collect();
        if !content.trim().is_empty() {
            let size = cut - start;
            chunks.push(Chunk {
                content,
                source_id: source_id.to_string(),
                chunk_index: chunks.len(),
                size,
            });
        }

        if cut == total {
            break;
        }

        // Back up by `overlap` so boundary-spanning context lands in both
        // chunks, while guaranteeing forward progress.
        let next_start = cut.saturating_sub(overlap);
        start = if next_start > start { next_start } else { cut };
    }

    if chunks.is_empty() {
        return Err(KbChatError::EmptyKnowledgeBase(format!(
            "source '{}' produced zero chunks",
            source_id
        ))
        .into());
    }

    Ok(chunks)
}

/// Find the best cut position in `(floor, window_end]`
///
/// Scans the window once, tracking the latest occurrence of each boundary
/// class, then picks the strongest class seen. Falls back to a hard
/// character cut at `window_end` when the window has no eligible boundary.
fn snap_to_boundary(chars: &[char], floor: usize, window_end: usize) -> usize {
    let mut best: Option<(Boundary, usize)> = None;

    let mut record = |boundary: Boundary, cut: usize| {
        let better = match best {
            None => true,
            Some((b, c)) => boundary > b || (boundary == b && cut > c),
        };
        if better {
            best = Some((boundary, cut));
        }
    };

    for i in (floor + 1)..window_end {
        let prev = chars[i - 1];
        let curr = chars[i];

        if prev == '\n' && curr == '\n' {
            // Cut after the blank line
            record(Boundary::Paragraph, (i + 1).min(window_end));
        } else if prev == '\n' {
            record(Boundary::Line, i);
        } else if matches!(prev, '.' | '!' | '?') && curr == ' ' {
            // Start the next chunk at the following sentence
            record(Boundary::Sentence, (i + 1).min(window_end));
        } else if prev.is_whitespace() {
            record(Boundary::Whitespace, i);
        }
    }

    match best {
        Some((_, cut)) if cut > floor => cut,
        _ => window_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_yields_single_chunk() {
        let chunks = split("Just one small chunk.", "kb", 1000, 200).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].source_id, "kb");
        assert_eq!(chunks[0].size, chunks[0].content.chars().count());
    }

    #[test]
    fn test_empty_text_is_an_error() {
        let result = split("", "kb", 1000, 200);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Empty knowledge base"));
    }

    #[test]
    fn test_whitespace_only_text_is_an_error() {
        let result = split("   \n\n \t ", "kb", 1000, 200);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(split("text", "kb", 0, 0).is_err());
        assert!(split("text", "kb", 100, 100).is_err());
        assert!(split("text", "kb", 100, 200).is_err());
    }

    #[test]
    fn test_chunks_respect_target_size() {
        let text = "word ".repeat(400);
        let chunks = split(&text, "kb", 100, 20).unwrap();
        for chunk in &chunks {
            assert!(chunk.size <= 100, "chunk size {} exceeds target", chunk.size);
            assert!(!chunk.content.trim().is_empty());
        }
    }

    #[test]
    fn test_chunk_indexes_are_ordered_and_unique() {
        let text = "sentence one. ".repeat(100);
        let chunks = split(&text, "kb", 80, 10).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn test_overlap_repeats_prior_tail() {
        let text = "abcdefghij ".repeat(50);
        let chunks = split(&text, "kb", 100, 20).unwrap();
        assert!(chunks.len() > 1);

        // Each chunk after the first starts with text that also ends the
        // previous chunk (within boundary-snapping tolerance).
        for pair in chunks.windows(2) {
            let prev_tail: String = pair[0]
                .content
                .chars()
                .rev()
                .take(20)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            let next_head: String = pair[1].content.chars().take(20).collect();
            assert_eq!(prev_tail, next_head);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let para1 = "First paragraph sentence one. First paragraph sentence two.";
        let para2 = "Second paragraph starts here and carries on for a while longer.";
        let text = format!("{}\n\n{}", para1, para2);
        let chunks = split(&text, "kb", 70, 10).unwrap();

        // The first chunk ends at the paragraph break, not mid-sentence.
        assert!(chunks[0].content.starts_with("First paragraph"));
        assert!(chunks[0].content.trim_end().ends_with("sentence two."));
    }

    #[test]
    fn test_sentence_boundary_fallback() {
        let text = "One long sentence here. Another follows it. And a third one too.";
        let chunks = split(text, "kb", 30, 5).unwrap();
        assert!(chunks.len() > 1);
        // First cut falls after a sentence terminator.
        assert!(chunks[0].content.trim_end().ends_with('.'));
    }

    #[test]
    fn test_unbroken_text_hard_cuts() {
        let text = "x".repeat(250);
        let chunks = split(&text, "kb", 100, 10).unwrap();
        assert!(chunks.len() >= 3);
        assert_eq!(chunks[0].size, 100);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let text = format!(
            "{}\n\n{}\n\n{}",
            "Paragraph one content. ".repeat(30),
            "Paragraph two content. ".repeat(30),
            "Paragraph three content. ".repeat(30)
        );
        let first = split(&text, "kb", 1000, 200).unwrap();
        let second = split(&text, "kb", 1000, 200).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Ça coûte dix euros. ".repeat(20);
        let chunks = split(&text, "kb", 50, 10).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.size <= 50);
        }
    }
}
