//! Overlap-aware splitting of long text into bounded chunks.
//!
//! Sizes are counted in [`SizeUnit`]s. A cut lands on the latest whitespace
//! inside the trailing window of the chunk, or on a sentence end just before
//! it, and falls back to a hard cut at `max_size` units. The next chunk restarts `overlap` units
//! before the previous end, so removing those units from every chunk but the
//! first rebuilds the input exactly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, SizeUnit};

const SENTENCE_END: &[char] = &['.', '!', '?'];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_size: usize,
    pub overlap: usize,
    pub unit: SizeUnit,
    /// Fraction of `max_size` at the end of a chunk searched for a natural boundary.
    pub boundary_window: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_size: 500, overlap: 50, unit: SizeUnit::Chars, boundary_window: 0.2 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidConfig("max_size must be greater than zero".into()));
        }
        if self.overlap >= self.max_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than max_size ({})",
                self.overlap, self.max_size
            )));
        }
        if !(0.0..=1.0).contains(&self.boundary_window) {
            return Err(Error::InvalidConfig(format!(
                "boundary_window must lie in [0, 1], got {}",
                self.boundary_window
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Character-unit chunker with the default boundary window.
    pub fn with_sizes(max_size: usize, overlap: usize) -> Result<Self> {
        Self::new(ChunkingConfig { max_size, overlap, ..ChunkingConfig::default() })
    }

    #[must_use]
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Lazily split `text`. The returned iterator is `Clone`, so a pass can be
    /// restarted from any point.
    #[must_use]
    pub fn chunk<'a>(&self, text: &'a str) -> Chunks<'a> {
        let bounds = unit_bounds(text, self.config.unit);
        let window = (self.config.max_size as f32 * self.config.boundary_window).floor() as usize;
        Chunks {
            text,
            next_start: if text.is_empty() { None } else { Some(0) },
            bounds,
            max_size: self.config.max_size,
            overlap: self.config.overlap,
            window,
        }
    }
}

/// Split `text` into character chunks of at most `max_size` with `overlap`.
pub fn chunk(text: &str, max_size: usize, overlap: usize) -> Result<Chunks<'_>> {
    Ok(Chunker::with_sizes(max_size, overlap)?.chunk(text))
}

/// Byte offsets of unit starts plus the final `text.len()`.
///
/// Word units carry their trailing whitespace; leading whitespace belongs to
/// the first unit. Either way the units partition `text`.
fn unit_bounds(text: &str, unit: SizeUnit) -> Vec<usize> {
    let mut bounds = Vec::new();
    match unit {
        SizeUnit::Chars => bounds.extend(text.char_indices().map(|(i, _)| i)),
        SizeUnit::Words => {
            bounds.push(0);
            let mut prev_space = true;
            let mut seen_word = false;
            for (i, c) in text.char_indices() {
                let space = c.is_whitespace();
                if !space && prev_space {
                    if seen_word {
                        bounds.push(i);
                    }
                    seen_word = true;
                }
                prev_space = space;
            }
        }
    }
    if !text.is_empty() {
        bounds.push(text.len());
    }
    bounds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    None,
    Space,
    Sentence,
}

/// Iterator over the chunks of one text.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    bounds: Vec<usize>,
    next_start: Option<usize>,
    max_size: usize,
    overlap: usize,
    window: usize,
}

impl Chunks<'_> {
    fn units(&self) -> usize {
        self.bounds.len().saturating_sub(1)
    }

    fn boundary_at(&self, start: usize, end: usize) -> Boundary {
        let head = &self.text[self.bounds[start]..self.bounds[end]];
        let tail = &self.text[self.bounds[end]..];
        if !(head.ends_with(char::is_whitespace) || tail.starts_with(char::is_whitespace)) {
            return Boundary::None;
        }
        if head.trim_end().ends_with(SENTENCE_END) {
            Boundary::Sentence
        } else {
            Boundary::Space
        }
    }

    /// Latest natural boundary in the trailing window. A sentence end wins
    /// over a later whitespace cut when it lies within a quarter window of it.
    /// Cuts never land at or before `start + overlap` so every chunk makes
    /// progress.
    fn cut(&self, start: usize, hard_end: usize) -> usize {
        let lo = hard_end.saturating_sub(self.window).max(start + self.overlap + 1);
        let slack = self.window / 4;
        let mut latest = None;
        for end in (lo..=hard_end).rev() {
            match self.boundary_at(start, end) {
                Boundary::None => {}
                Boundary::Sentence => {
                    return match latest {
                        Some(space) if space - end > slack => space,
                        _ => end,
                    };
                }
                Boundary::Space => {
                    if latest.is_none() {
                        latest = Some(end);
                    }
                }
            }
        }
        latest.unwrap_or(hard_end)
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start?;
        let units = self.units();
        let hard_end = start + self.max_size;
        let end = if hard_end >= units { units } else { self.cut(start, hard_end) };

        self.next_start = if end >= units { None } else { Some(end - self.overlap) };

        let (start_offset, end_offset) = (self.bounds[start], self.bounds[end]);
        Some(Chunk {
            text: self.text[start_offset..end_offset].to_string(),
            start_offset,
            end_offset,
        })
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0;
        for c in chunks {
            assert!(c.start_offset <= covered, "gap before chunk at {}", c.start_offset);
            out.push_str(&c.text[covered - c.start_offset..]);
            covered = c.end_offset;
        }
        out
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert_eq!(chunk("", 10, 2).expect("chunker").count(), 0);
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks: Vec<_> = chunk("Mars is a planet", 300, 50).expect("chunker").collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Mars is a planet");
        assert_eq!((chunks[0].start_offset, chunks[0].end_offset), (0, 16));
    }

    #[test]
    fn exact_fit_is_one_chunk() {
        let text = "x".repeat(300);
        assert_eq!(chunk(&text, 300, 50).expect("chunker").count(), 1);
    }

    #[test]
    fn overlap_must_be_smaller_than_max_size() {
        assert!(matches!(chunk("abc", 10, 10), Err(Error::InvalidConfig(_))));
        assert!(matches!(chunk("abc", 0, 0), Err(Error::InvalidConfig(_))));
        let bad_window = ChunkingConfig { boundary_window: 1.5, ..ChunkingConfig::default() };
        assert!(Chunker::new(bad_window).is_err());
    }

    #[test]
    fn thousand_chars_hard_cut_into_four() {
        let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks: Vec<_> = chunk(&text, 300, 50).expect("chunker").collect();
        assert_eq!(chunks.len(), 4);
        for c in &chunks {
            assert!(c.text.chars().count() <= 300);
        }
        for pair in chunks.windows(2) {
            let len = pair[0].text.chars().count();
            let tail: String = pair[0].text.chars().skip(len - 50).collect();
            let head: String = pair[1].text.chars().take(50).collect();
            assert_eq!(tail, head);
            assert_eq!(pair[0].end_offset - pair[1].start_offset, 50);
        }
        assert_eq!(rebuild(&chunks), text);
    }

    #[test]
    fn prefers_sentence_end_in_window() {
        // The sentence ends at char 90; the window covers chars 80..100.
        let mut text = "a".repeat(89);
        text.push_str(". ");
        text.push_str(&"b".repeat(60));
        let chunks: Vec<_> = chunk(&text, 100, 10).expect("chunker").collect();
        assert_eq!(chunks[0].text, format!("{}. ", "a".repeat(89)));
        assert_eq!(rebuild(&chunks), text);
    }

    #[test]
    fn sentence_end_wins_only_near_the_latest_space() {
        // Window 20, slack 5: sentence end at 92, space at 96.
        let near = format!("{}. {} {}", "a".repeat(90), "b".repeat(3), "c".repeat(60));
        let chunks: Vec<_> = chunk(&near, 100, 0).expect("chunker").collect();
        assert_eq!(chunks[0].end_offset, 92);

        // Sentence end at 84 is 12 units behind the space at 96.
        let far = format!("{}. {} {}", "a".repeat(82), "b".repeat(11), "c".repeat(60));
        let chunks: Vec<_> = chunk(&far, 100, 0).expect("chunker").collect();
        assert_eq!(chunks[0].end_offset, 96);
        assert_eq!(rebuild(&chunks), far);
    }

    #[test]
    fn falls_back_to_whitespace_then_hard_cut() {
        let mut text = "a".repeat(85);
        text.push(' ');
        text.push_str(&"b".repeat(60));
        let chunks: Vec<_> = chunk(&text, 100, 0).expect("chunker").collect();
        assert_eq!(chunks[0].end_offset, 86);

        let solid = "c".repeat(150);
        let chunks: Vec<_> = chunk(&solid, 100, 0).expect("chunker").collect();
        assert_eq!(chunks[0].end_offset, 100);
    }

    #[test]
    fn word_units_bound_word_counts() {
        let config = ChunkingConfig {
            max_size: 5,
            overlap: 1,
            unit: SizeUnit::Words,
            ..ChunkingConfig::default()
        };
        let text = "  one two three four five six seven eight nine ten eleven";
        let chunks: Vec<_> = Chunker::new(config).expect("chunker").chunk(text).collect();
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(SizeUnit::Words.measure(&c.text) <= 5);
        }
        assert_eq!(rebuild(&chunks), text);
    }

    #[test]
    fn multibyte_text_cuts_on_char_boundaries() {
        let text = "日本語のテキスト。".repeat(20);
        let chunks: Vec<_> = chunk(&text, 16, 4).expect("chunker").collect();
        for c in &chunks {
            assert!(c.text.chars().count() <= 16);
        }
        assert_eq!(rebuild(&chunks), text);
    }

    #[test]
    fn reconstruction_over_many_configs() {
        let text = "The quick brown fox jumps over the lazy dog. It was not amused! \
                    Why would it be? Foxes are rude.\n\nA second paragraph follows here.";
        for max_size in 1..40 {
            for overlap in 0..max_size {
                let chunks: Vec<_> = chunk(text, max_size, overlap).expect("chunker").collect();
                assert_eq!(rebuild(&chunks), text, "max_size={max_size} overlap={overlap}");
                for c in &chunks {
                    assert!(c.text.chars().count() <= max_size);
                }
            }
        }
    }

    #[test]
    fn iterator_restarts_from_clone() {
        let chunker = Chunker::with_sizes(10, 2).expect("chunker");
        let mut it = chunker.chunk("abcdefghijklmnopqrstuvwxyz");
        let first = it.next();
        let snapshot = it.clone();
        let rest: Vec<_> = it.collect();
        let again: Vec<_> = snapshot.collect();
        assert!(first.is_some());
        assert_eq!(rest, again);
    }
}
