use std::collections::HashMap;
use std::fs;
use std::path::Path;

use smallvec::SmallVec;

use crate::error::{CrosswordError, CrosswordResult};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a given slot.
#[derive(Debug, Clone)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let glyphs = string.chars().collect();
        Word { string, glyphs }
    }

    /// Length of the word in chars, which is what slot lengths are measured in.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The glyph at the given cell, or `None` if the word is too short to reach it.
    pub fn glyph(&self, cell_idx: usize) -> Option<char> {
        self.glyphs.get(cell_idx).copied()
    }
}

/// The catalogue of candidate words. Words are upper-cased and deduplicated, so two distinct
/// `WordId`s always refer to two distinct strings.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    pub words: Vec<Word>,
    ids_by_string: HashMap<String, WordId>,
}

impl WordList {
    /// Build a word list from arbitrary strings. Surrounding whitespace is trimmed, blank entries
    /// are skipped and the first occurrence of a duplicate wins.
    pub fn new<I, S>(raw_words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_list = WordList::default();

        for raw_word in raw_words {
            let normalized = raw_word.as_ref().trim().to_uppercase();
            if normalized.is_empty() || word_list.ids_by_string.contains_key(&normalized) {
                continue;
            }

            let _ = word_list.ids_by_string.insert(normalized.clone(), word_list.words.len());
            word_list.words.push(Word::new(normalized));
        }

        word_list
    }

    /// Parse a newline-separated word list.
    pub fn parse(contents: &str) -> WordList {
        WordList::new(contents.lines())
    }

    pub fn from_file(path: impl AsRef<Path>) -> CrosswordResult<WordList> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| CrosswordError::read(path, err))?;

        let word_list = WordList::parse(&contents);
        log::debug!("Loaded {} words from {}", word_list.len(), path.display());

        Ok(word_list)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }
}
