//! Sentence segmentation
//!
//! Splits free text into sentences that keep their own terminal punctuation
//! and trailing whitespace, so the sentence list is a lossless partition of
//! the source text.
//!
//! A boundary is either a run of `.`, `!` or `?` (plus any whitespace that
//! follows it) or a paragraph break of two or more newlines. Everything else,
//! including `…`, `¡`, `¿` and dashes, is ordinary content.

use recital_core::types::Sentence;
use std::ops::Index;

/// Segment text into sentences
///
/// Deterministic: the same input always yields the same list. Whitespace-only
/// input (or input made only of delimiters) yields an empty list.
///
/// # Example
///
/// ```rust
/// use recital_playback::segment;
///
/// let sentences = segment("Hello world. How are you? I am fine!");
/// let texts: Vec<&str> = sentences.iter().map(|s| s.as_str()).collect();
/// assert_eq!(texts, ["Hello world. ", "How are you? ", "I am fine!"]);
/// ```
pub fn segment(text: &str) -> SentenceList {
    if text.trim().is_empty() {
        return SentenceList::default();
    }

    let mut builder = Builder::default();
    let mut content_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        match delimiter_len(rest) {
            Some(len) => {
                builder.push(&text[content_start..pos], &rest[..len]);
                pos += len;
                content_start = pos;
            }
            None => pos += rest.chars().next().map_or(1, char::len_utf8),
        }
    }

    if content_start < text.len() {
        builder.push(&text[content_start..], "");
    }

    SentenceList::new(builder.sentences.into_iter().map(Sentence::new).collect())
}

/// Length in bytes of the delimiter starting at the beginning of `rest`
fn delimiter_len(rest: &str) -> Option<usize> {
    let first = rest.chars().next()?;

    if is_terminal(first) {
        let punct = rest.find(|c: char| !is_terminal(c)).unwrap_or(rest.len());
        let after = &rest[punct..];
        let space = after
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(after.len());
        return Some(punct + space);
    }

    if first == '\n' || first == '\r' {
        let run = rest
            .find(|c: char| c != '\n' && c != '\r')
            .unwrap_or(rest.len());
        let newlines = rest[..run].matches('\n').count();
        if newlines >= 2 {
            return Some(run);
        }
    }

    None
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Accumulates content/delimiter pairs into sentences
#[derive(Default)]
struct Builder {
    sentences: Vec<String>,
    /// Delimiters and whitespace seen before the first real content
    prefix: String,
}

impl Builder {
    fn push(&mut self, content: &str, delimiter: &str) {
        if content.trim().is_empty() {
            // No speakable content: the delimiter (and any whitespace) closes
            // the same boundary as the previous sentence
            let target = self.sentences.last_mut().unwrap_or(&mut self.prefix);
            target.push_str(content);
            target.push_str(delimiter);
            return;
        }

        let mut sentence = std::mem::take(&mut self.prefix);
        sentence.push_str(content);
        sentence.push_str(delimiter);
        self.sentences.push(sentence);
    }
}

/// Ordered, immutable list of sentences with character prefix sums
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceList {
    sentences: Vec<Sentence>,
    /// `offsets[i]` = characters before sentence `i`; has `len() + 1` entries
    offsets: Vec<usize>,
}

impl SentenceList {
    /// Build a list from already segmented sentences
    pub fn new(sentences: Vec<Sentence>) -> Self {
        let mut offsets = Vec::with_capacity(sentences.len() + 1);
        let mut total = 0;
        offsets.push(0);
        for sentence in &sentences {
            total += sentence.char_len();
            offsets.push(total);
        }

        Self { sentences, offsets }
    }

    /// Number of sentences
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// Check if there are no sentences
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Get a sentence by index
    pub fn get(&self, index: usize) -> Option<&Sentence> {
        self.sentences.get(index)
    }

    /// Iterate over sentences in order
    pub fn iter(&self) -> std::slice::Iter<'_, Sentence> {
        self.sentences.iter()
    }

    /// All sentences as a slice
    pub fn as_slice(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Characters in all sentences before `index` (clamped to the list length)
    pub fn chars_before(&self, index: usize) -> usize {
        self.offsets
            .get(index.min(self.len()))
            .copied()
            .unwrap_or_default()
    }

    /// Characters from sentence `index` to the end
    pub fn chars_from(&self, index: usize) -> usize {
        self.total_chars() - self.chars_before(index)
    }

    /// Total characters in the list
    pub fn total_chars(&self) -> usize {
        self.offsets.last().copied().unwrap_or_default()
    }

    /// Reassemble the source text
    pub fn concat(&self) -> String {
        self.sentences.iter().map(Sentence::as_str).collect()
    }
}

impl Index<usize> for SentenceList {
    type Output = Sentence;

    fn index(&self, index: usize) -> &Self::Output {
        &self.sentences[index]
    }
}

impl<'a> IntoIterator for &'a SentenceList {
    type Item = &'a Sentence;
    type IntoIter = std::slice::Iter<'a, Sentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences.iter()
    }
}
