//! Sentence type
use serde::{Deserialize, Serialize};
use std::fmt;

/// One sentence of source text
///
/// Carries its own trailing delimiter and whitespace verbatim, so concatenating
/// every sentence of a document reproduces the document exactly. Never mutated
/// after segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Sentence {
    text: String,
    char_len: usize,
}

impl Sentence {
    /// Create a sentence from its verbatim text
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self { text, char_len }
    }

    /// Verbatim text, including trailing delimiter and whitespace
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in Unicode scalar values
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Text without trailing whitespace, for display and synthesis
    pub fn spoken_text(&self) -> &str {
        self.text.trim_end()
    }
}

impl From<String> for Sentence {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<Sentence> for String {
    fn from(sentence: Sentence) -> Self {
        sentence.text
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
