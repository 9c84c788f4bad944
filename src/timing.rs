//! Word-level timing records and their normalization
//!
//! Every provider shape (per-word STT output, per-character TTS alignment)
//! is converted here into an ordered `Vec<WordTiming>` satisfying:
//! `end > start` for every entry, and `end_i <= start_{i+1}` for
//! consecutive entries.

use serde::{Deserialize, Serialize};

/// Word-level timing, in seconds relative to the narration audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    #[must_use]
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }

    /// Length of the word in seconds
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Result of a transcription chain run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub words: Vec<WordTiming>,
    pub detected_language: Option<String>,
}

impl Transcript {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Normalize raw word timings into an ordered, non-overlapping sequence.
///
/// Text is trimmed and empty words dropped; non-finite times are dropped;
/// entries are sorted by start (stable, so speaking order is kept for
/// ties). When a word starts before the previous one ends, the previous
/// word's end is clamped to the new start. Words left with `end <= start`
/// are dropped.
#[must_use]
pub fn normalize(raw: Vec<WordTiming>) -> Vec<WordTiming> {
    let mut words: Vec<WordTiming> = raw
        .into_iter()
        .filter(|w| w.start.is_finite() && w.end.is_finite())
        .filter_map(|w| {
            let text = w.word.trim();
            (!text.is_empty()).then(|| WordTiming::new(text, w.start.max(0.0), w.end))
        })
        .collect();

    words.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut out: Vec<WordTiming> = Vec::with_capacity(words.len());
    for word in words {
        if let Some(prev) = out.last_mut() {
            if prev.end > word.start {
                prev.end = word.start;
                if prev.end <= prev.start {
                    out.pop();
                }
            }
        }
        if word.end > word.start {
            out.push(word);
        }
    }
    out
}

/// Whether `words` already satisfies the ordering invariant
#[must_use]
pub fn is_well_formed(words: &[WordTiming]) -> bool {
    words.iter().all(|w| w.end > w.start)
        && words
            .windows(2)
            .all(|pair| pair[0].start <= pair[1].start && pair[0].end <= pair[1].start)
}

/// Group per-character alignment data into words.
///
/// Characters are split on whitespace; a word spans from its first
/// character's start to its last character's end. The three slices are
/// truncated to their common length.
#[must_use]
pub fn words_from_characters(chars: &[String], starts: &[f64], ends: &[f64]) -> Vec<WordTiming> {
    let len = chars.len().min(starts.len()).min(ends.len());
    let mut words = Vec::new();
    let mut current = String::new();
    let mut word_start = 0.0;
    let mut word_end = 0.0;

    for i in 0..len {
        let ch = &chars[i];
        if ch.trim().is_empty() {
            if !current.is_empty() {
                words.push(WordTiming::new(std::mem::take(&mut current), word_start, word_end));
            }
            continue;
        }
        if current.is_empty() {
            word_start = starts[i];
        }
        current.push_str(ch);
        word_end = ends[i];
    }
    if !current.is_empty() {
        words.push(WordTiming::new(current, word_start, word_end));
    }

    normalize(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sorts_and_trims() {
        let words = normalize(vec![
            WordTiming::new(" world ", 0.6, 1.2),
            WordTiming::new("Hello", 0.0, 0.5),
        ]);
        assert_eq!(words[0].word, "Hello");
        assert_eq!(words[1].word, "world");
        assert!(is_well_formed(&words));
    }

    #[test]
    fn test_normalize_drops_zero_duration_and_empty() {
        let words = normalize(vec![
            WordTiming::new("a", 0.0, 0.4),
            WordTiming::new("b", 0.5, 0.5),
            WordTiming::new("   ", 0.6, 0.9),
            WordTiming::new("c", 1.0, 0.8),
            WordTiming::new("d", f64::NAN, 1.0),
        ]);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].word, "a");
    }

    #[test]
    fn test_normalize_clamps_overlaps() {
        let words = normalize(vec![
            WordTiming::new("one", 0.0, 1.0),
            WordTiming::new("two", 0.8, 1.5),
        ]);
        assert_eq!(words[0].end, 0.8);
        assert_eq!(words[1].start, 0.8);
        assert!(is_well_formed(&words));
    }

    #[test]
    fn test_normalize_removes_fully_shadowed_word() {
        let words = normalize(vec![
            WordTiming::new("first", 1.0, 2.0),
            WordTiming::new("second", 1.0, 1.5),
        ]);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].word, "second");
    }

    #[test]
    fn test_normalized_output_is_monotonic_for_messy_input() {
        let raw: Vec<WordTiming> = (0..50)
            .map(|i| {
                let start = f64::from((i * 37) % 23) * 0.25;
                WordTiming::new(format!("w{i}"), start, start + 0.4)
            })
            .collect();
        let words = normalize(raw);
        assert!(!words.is_empty());
        assert!(is_well_formed(&words));
    }

    #[test]
    fn test_words_from_characters() {
        let chars: Vec<String> = "Hi yo".chars().map(String::from).collect();
        let starts = [0.0, 0.1, 0.2, 0.3, 0.4];
        let ends = [0.1, 0.2, 0.3, 0.4, 0.5];
        let words = words_from_characters(&chars, &starts, &ends);

        assert_eq!(
            words,
            vec![WordTiming::new("Hi", 0.0, 0.2), WordTiming::new("yo", 0.3, 0.5)]
        );
    }

    #[test]
    fn test_words_from_characters_truncates_mismatched_lengths() {
        let chars: Vec<String> = "abc".chars().map(String::from).collect();
        let words = words_from_characters(&chars, &[0.0, 0.1], &[0.1, 0.2, 0.3]);
        assert_eq!(words, vec![WordTiming::new("ab", 0.0, 0.2)]);
    }
}
