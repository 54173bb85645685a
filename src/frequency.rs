//! Word tokenizer and frequency table.

use std::cmp::Ordering;

use serde;

use crate::sort::{sort_by, Algorithm};

/// Common English words skipped by tables built with [`FrequencyTable::with_stop_words`].
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "for",
    "from", "had", "has", "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its", "more", "not", "of",
    "on", "one", "or", "our", "out", "said", "she", "so", "that", "the", "their", "them", "there", "they", "this",
    "to", "up", "was", "we", "were", "what", "when", "which", "who", "will", "with", "would", "you",
];

/// Splits text on whitespace, strips every non-alphanumeric character and lowercases what remains.
/// Tokens left empty after stripping are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Word and number of its occurrences.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Orders by count descending, then by word ascending.
pub fn by_count_desc(a: &WordCount, b: &WordCount) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word))
}

/// Word frequency table.
///
/// Entries live in a plain vector and lookups scan it linearly, so an insert costs O(k) in the
/// number of distinct words.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    entries: Vec<WordCount>,
    skip_stop_words: bool,
}

impl FrequencyTable {
    pub fn new() -> Self {
        FrequencyTable::default()
    }

    /// Creates a table that ignores [`STOP_WORDS`] when counting text.
    pub fn with_stop_words() -> Self {
        FrequencyTable {
            entries: Vec::new(),
            skip_stop_words: true,
        }
    }

    /// Counts one occurrence of `word`.
    pub fn insert_or_increment(&mut self, word: &str) {
        for entry in self.entries.iter_mut() {
            if entry.word == word {
                entry.count += 1;
                return;
            }
        }
        self.entries.push(WordCount {
            word: word.to_string(),
            count: 1,
        });
    }

    /// Tokenizes `text` and counts every token.
    pub fn add_text(&mut self, text: &str) {
        for token in tokenize(text) {
            if self.skip_stop_words && STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            self.insert_or_increment(&token);
        }
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.entries.iter().find(|entry| entry.word == word).map(|entry| entry.count)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of counted tokens.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Entries in first-occurrence order.
    pub fn entries(&self) -> &[WordCount] {
        &self.entries
    }

    /// Returns all entries ranked by [`by_count_desc`] using the given algorithm.
    pub fn into_ranked(self, algorithm: Algorithm) -> Vec<WordCount> {
        let mut entries = self.entries;
        sort_by(algorithm, &mut entries, by_count_desc);
        entries
    }

    /// Returns the `n` most frequent words, ranked with selection sort.
    pub fn top(self, n: usize) -> Vec<WordCount> {
        let mut ranked = self.into_ranked(Algorithm::Selection);
        ranked.truncate(n);
        ranked
    }
}
