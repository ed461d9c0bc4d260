//! Decomposes written words into (symbol, form) occurrences.
//!
//! The form of each character follows from its neighbours: a character joins
//! backwards when the previous character is a tracked symbol that connects
//! forward, and joins forwards when the next character is tracked and the
//! character itself is not in the non-connecting set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dataset::{Alphabet, PERSIAN_NON_CONNECTING};
use crate::types::Form;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolOccurrence {
    #[serde(rename = "letterId")]
    pub symbol_id: String,
    pub form: Form,
    /// Character index within the word, not a byte offset.
    pub position: usize,
    pub character: char,
}

#[derive(Debug, Clone)]
pub struct SymbolAnalyzer {
    alphabet: Arc<Alphabet>,
    glyph_index: HashMap<char, String>,
    non_connecting: HashSet<String>,
}

impl SymbolAnalyzer {
    pub fn new<I, S>(alphabet: Arc<Alphabet>, non_connecting: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut glyph_index = HashMap::new();
        for symbol in alphabet.iter() {
            let glyphs = Form::ALL
                .iter()
                .map(|form| symbol.glyph(*form))
                .chain(symbol.aliases.iter().map(String::as_str));
            for glyph in glyphs {
                if let Some(ch) = single_char(glyph) {
                    glyph_index.entry(ch).or_insert_with(|| symbol.id.clone());
                }
            }
        }

        Self {
            alphabet,
            glyph_index,
            non_connecting: non_connecting.into_iter().map(Into::into).collect(),
        }
    }

    /// Analyzer over `alphabet` using the Persian joining rules.
    pub fn persian(alphabet: Arc<Alphabet>) -> Self {
        Self::new(alphabet, PERSIAN_NON_CONNECTING)
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn symbol_for(&self, ch: char) -> Option<&str> {
        self.glyph_index.get(&ch).map(String::as_str)
    }

    pub fn analyze(&self, text: &str) -> Vec<SymbolOccurrence> {
        let chars: Vec<char> = text.chars().collect();
        let ids: Vec<Option<&str>> = chars.iter().map(|ch| self.symbol_for(*ch)).collect();

        chars
            .iter()
            .enumerate()
            .filter_map(|(i, &character)| {
                let symbol_id = ids[i]?;
                let prev = if i > 0 { ids[i - 1] } else { None };
                let next = ids.get(i + 1).copied().flatten();

                let joins_prev = prev.is_some_and(|p| self.connects_forward(p));
                let joins_next = next.is_some() && self.connects_forward(symbol_id);

                Some(SymbolOccurrence {
                    symbol_id: symbol_id.to_string(),
                    form: form_from_joins(joins_prev, joins_next),
                    position: i,
                    character,
                })
            })
            .collect()
    }

    pub fn find_occurrences(
        &self,
        text: &str,
        symbol_id: &str,
        form: Option<Form>,
    ) -> Vec<SymbolOccurrence> {
        self.analyze(text)
            .into_iter()
            .filter(|occ| occ.symbol_id == symbol_id && form.map_or(true, |f| occ.form == f))
            .collect()
    }

    fn connects_forward(&self, symbol_id: &str) -> bool {
        !self.non_connecting.contains(symbol_id)
    }
}

fn form_from_joins(joins_prev: bool, joins_next: bool) -> Form {
    match (joins_prev, joins_next) {
        (true, true) => Form::Medial,
        (true, false) => Form::Final,
        (false, true) => Form::Initial,
        (false, false) => Form::Isolated,
    }
}

fn single_char(glyph: &str) -> Option<char> {
    let mut chars = glyph.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}
