//! Static reference data: the alphabet and the progressive vocabulary.
//!
//! Both are read-only once loaded. A Persian sample set is embedded for
//! defaults, demos and tests; real deployments load their own JSON.

use std::collections::{HashMap, HashSet};

use crate::error::{DrillError, Result};
use crate::types::{Symbol, VocabularyItem};

const PERSIAN_LETTERS_JSON: &str = include_str!("../data/persian_letters.json");
const PERSIAN_WORDS_JSON: &str = include_str!("../data/progressive_words.json");

/// Persian letters that never join to the letter that follows them.
pub const PERSIAN_NON_CONNECTING: [&str; 6] = ["alef", "dal", "reh", "zeh", "zheh", "vav"];

#[derive(Debug, Clone)]
pub struct Alphabet {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl Alphabet {
    pub fn new(symbols: Vec<Symbol>) -> Result<Self> {
        let mut index = HashMap::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if symbol.id.is_empty() {
                return Err(DrillError::Dataset(format!("symbol #{i} has an empty id")));
            }
            if index.insert(symbol.id.clone(), i).is_some() {
                return Err(DrillError::Dataset(format!(
                    "duplicate symbol id: {}",
                    symbol.id
                )));
            }
        }
        Ok(Self { symbols, index })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let symbols: Vec<Symbol> = serde_json::from_str(json)?;
        Self::new(symbols)
    }

    /// The embedded Persian sample alphabet.
    pub fn persian() -> Self {
        // The embedded file is checked by `test_builtin_datasets_load`.
        Self::from_json(PERSIAN_LETTERS_JSON).unwrap_or_else(|_| Self {
            symbols: Vec::new(),
            index: HashMap::new(),
        })
    }

    pub fn get(&self, id: &str) -> Option<&Symbol> {
        self.index.get(id).map(|&i| &self.symbols[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.symbols.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    items: Vec<VocabularyItem>,
}

impl Vocabulary {
    pub fn new(items: Vec<VocabularyItem>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id.as_str()) {
                return Err(DrillError::Dataset(format!(
                    "duplicate vocabulary id: {}",
                    item.id
                )));
            }
            if !(1..=3).contains(&item.difficulty) {
                return Err(DrillError::Dataset(format!(
                    "{}: difficulty {} outside 1..=3",
                    item.id, item.difficulty
                )));
            }
            if !(1..=5).contains(&item.frequency) {
                return Err(DrillError::Dataset(format!(
                    "{}: frequency {} outside 1..=5",
                    item.id, item.frequency
                )));
            }
        }
        Ok(Self { items })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<VocabularyItem> = serde_json::from_str(json)?;
        Self::new(items)
    }

    /// The embedded Persian sample vocabulary.
    pub fn persian() -> Self {
        Self::from_json(PERSIAN_WORDS_JSON).unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<&VocabularyItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VocabularyItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose every required symbol is in `known`.
    pub fn available_items(&self, known: &HashSet<String>) -> Vec<&VocabularyItem> {
        self.items
            .iter()
            .filter(|item| item.required_symbols.iter().all(|id| known.contains(id)))
            .collect()
    }

    pub fn by_difficulty(&self, difficulty: u8) -> Vec<&VocabularyItem> {
        self.items
            .iter()
            .filter(|item| item.difficulty == difficulty)
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&VocabularyItem> {
        self.items
            .iter()
            .filter(|item| item.category == category)
            .collect()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|item| seen.insert(item.category.as_str()))
            .map(|item| item.category.clone())
            .collect()
    }
}
