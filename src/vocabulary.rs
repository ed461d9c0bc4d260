//! Progressive vocabulary selection.
//!
//! Words unlock once every symbol they contain is known. Among unlocked words
//! the selector balances novelty, difficulty, frequency, spacing and topical
//! variety, then picks at random among the best few.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SelectionWeights;
use crate::dataset::Vocabulary;
use crate::error::{DrillError, Result};
use crate::mastery::{hours_since, MasteryStore};
use crate::sampling::choose_top_k;
use crate::types::VocabularyItem;

/// Overall mastery at which a symbol counts as known for word unlocking.
pub const KNOWN_SYMBOL_THRESHOLD: f64 = 0.40;
const RECENT_ITEM_EXCLUSION: usize = 5;
const MAX_RECENT_CATEGORIES: usize = 3;
const TOP_K: usize = 3;
const NOVELTY_HORIZON: f64 = 10.0;
const REVIEW_ACCURACY: f64 = 0.8;
const REVIEW_AFTER_HOURS: f64 = 12.0;

/// Presentation history of one vocabulary item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub word_id: String,
    pub last_seen: DateTime<Utc>,
    pub times_presented: u32,
    pub times_correct: u32,
    pub average_response_time: f64,
    #[serde(default)]
    pub confused_with: Vec<String>,
}

impl WordProgress {
    pub fn accuracy(&self) -> f64 {
        self.times_correct as f64 / self.times_presented.max(1) as f64
    }
}

/// Persisted form of the selector state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionSnapshot {
    pub word_mastery: Vec<WordProgress>,
    #[serde(default)]
    pub recent_categories: Vec<String>,
}

impl ProgressionSnapshot {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.word_mastery {
            if !seen.insert(entry.word_id.as_str()) {
                return Err(DrillError::InvalidData(format!(
                    "duplicate word progress entry: {}",
                    entry.word_id
                )));
            }
            if entry.times_correct > entry.times_presented {
                return Err(DrillError::InvalidData(format!(
                    "{}: {} correct answers exceed {} presentations",
                    entry.word_id, entry.times_correct, entry.times_presented
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct VocabularySelector {
    vocabulary: Arc<Vocabulary>,
    weights: SelectionWeights,
    progress: BTreeMap<String, WordProgress>,
    /// Most recent first.
    recent_categories: VecDeque<String>,
}

impl VocabularySelector {
    pub fn new(vocabulary: Arc<Vocabulary>, weights: SelectionWeights) -> Self {
        Self {
            vocabulary,
            weights,
            progress: BTreeMap::new(),
            recent_categories: VecDeque::with_capacity(MAX_RECENT_CATEGORIES),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn weights(&self) -> &SelectionWeights {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: SelectionWeights) {
        self.weights = weights;
    }

    pub fn progress(&self, word_id: &str) -> Option<&WordProgress> {
        self.progress.get(word_id)
    }

    pub fn recent_categories(&self) -> impl Iterator<Item = &str> {
        self.recent_categories.iter().map(String::as_str)
    }

    /// Picks the next word to practise, or `None` when no word is unlocked.
    /// The word's category enters the recent-category window.
    pub fn select_next<S, R>(
        &mut self,
        mastery: &MasteryStore,
        recently_shown: &[S],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<VocabularyItem>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let chosen = self.propose_next(mastery, recently_shown, rng, now)?;
        self.mark_presented(&chosen);
        Some(chosen)
    }

    /// Same choice as [`select_next`](Self::select_next) without touching the
    /// category window; follow with [`mark_presented`](Self::mark_presented)
    /// once the word is actually shown.
    pub fn propose_next<S, R>(
        &self,
        mastery: &MasteryStore,
        recently_shown: &[S],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<VocabularyItem>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let known = known_symbols(mastery);
        let available = self.vocabulary.available_items(&known);
        if available.is_empty() {
            return None;
        }

        let skip = recently_shown.len().saturating_sub(RECENT_ITEM_EXCLUSION);
        let recent: HashSet<&str> = recently_shown[skip..].iter().map(|id| id.as_ref()).collect();
        let fresh: Vec<&VocabularyItem> = available
            .iter()
            .copied()
            .filter(|item| !recent.contains(item.id.as_str()))
            .collect();
        let candidates = if fresh.is_empty() { available } else { fresh };

        let level = user_level(mastery, &known);
        let mut scored: Vec<(&VocabularyItem, f64)> = candidates
            .into_iter()
            .map(|item| (item, self.score(item, level, now)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (chosen, score) = choose_top_k(&scored, TOP_K, rng)?;
        tracing::debug!(word = %chosen.id, score, level, "selected vocabulary item");
        Some((*chosen).clone())
    }

    pub fn mark_presented(&mut self, item: &VocabularyItem) {
        self.push_category(&item.category);
    }

    pub fn update_mastery(
        &mut self,
        word_id: &str,
        correct: bool,
        response_time_ms: Option<f64>,
        confused_with: Option<&str>,
        now: DateTime<Utc>,
    ) {
        match self.progress.get_mut(word_id) {
            Some(entry) => {
                if let Some(sample) = response_time_ms {
                    let n = entry.times_presented as f64;
                    entry.average_response_time =
                        (entry.average_response_time * n + sample) / (n + 1.0);
                }
                entry.times_presented += 1;
                if correct {
                    entry.times_correct += 1;
                }
                entry.last_seen = now;
                if let Some(other) = confused_with {
                    if !entry.confused_with.iter().any(|id| id == other) {
                        entry.confused_with.push(other.to_string());
                    }
                }
            }
            None => {
                self.progress.insert(
                    word_id.to_string(),
                    WordProgress {
                        word_id: word_id.to_string(),
                        last_seen: now,
                        times_presented: 1,
                        times_correct: u32::from(correct),
                        average_response_time: response_time_ms.unwrap_or(0.0),
                        confused_with: confused_with.map(|id| vec![id.to_string()]).unwrap_or_default(),
                    },
                );
            }
        }
    }

    /// Unlocked words already seen that are shaky or overdue, weakest first.
    pub fn items_for_review(
        &self,
        mastery: &MasteryStore,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<&VocabularyItem> {
        let known = known_symbols(mastery);
        let mut due: Vec<(&VocabularyItem, f64)> = self
            .vocabulary
            .available_items(&known)
            .into_iter()
            .filter_map(|item| {
                let entry = self.progress.get(&item.id)?;
                let accuracy = entry.accuracy();
                let overdue = hours_since(entry.last_seen, now) > REVIEW_AFTER_HOURS;
                (accuracy < REVIEW_ACCURACY || overdue).then_some((item, accuracy))
            })
            .collect();

        due.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        due.into_iter().take(limit).map(|(item, _)| item).collect()
    }

    pub fn snapshot(&self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            word_mastery: self.progress.values().cloned().collect(),
            recent_categories: self.recent_categories.iter().cloned().collect(),
        }
    }

    /// Replaces the selector state. The snapshot is validated first and
    /// nothing changes when it is rejected.
    pub fn load(&mut self, snapshot: ProgressionSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.progress = snapshot
            .word_mastery
            .into_iter()
            .map(|entry| (entry.word_id.clone(), entry))
            .collect();
        self.recent_categories = snapshot
            .recent_categories
            .into_iter()
            .take(MAX_RECENT_CATEGORIES)
            .collect();
        Ok(())
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn deserialize(&mut self, json: &str) -> Result<()> {
        let snapshot: ProgressionSnapshot = serde_json::from_str(json)?;
        self.load(snapshot)
    }

    pub fn reset(&mut self) {
        self.progress.clear();
        self.recent_categories.clear();
    }

    fn score(&self, item: &VocabularyItem, level: u8, now: DateTime<Utc>) -> f64 {
        let entry = self.progress.get(&item.id);

        let novelty = entry
            .map(|e| (1.0 - e.times_presented as f64 / NOVELTY_HORIZON).max(0.0))
            .unwrap_or(1.0);
        let difficulty = 1.0 - (item.difficulty as f64 - level as f64).abs() / 3.0;
        let frequency = item.frequency as f64 / 5.0;
        let spacing = entry.map(|e| spacing_score(e, now)).unwrap_or(1.0);
        let category = if self.recent_categories.contains(&item.category) {
            0.0
        } else {
            1.0
        };

        novelty * self.weights.novelty
            + difficulty * self.weights.difficulty
            + frequency * self.weights.frequency
            + spacing * self.weights.spacing
            + category * self.weights.category
    }

    fn push_category(&mut self, category: &str) {
        self.recent_categories.push_front(category.to_string());
        self.recent_categories.truncate(MAX_RECENT_CATEGORIES);
    }
}

/// Symbols whose overall mastery reaches [`KNOWN_SYMBOL_THRESHOLD`].
pub fn known_symbols(mastery: &MasteryStore) -> HashSet<String> {
    mastery
        .iter()
        .filter(|m| m.overall_mastery >= KNOWN_SYMBOL_THRESHOLD)
        .map(|m| m.symbol_id.clone())
        .collect()
}

/// Difficulty band 1..=3 from the mean mastery of the known symbols.
fn user_level(mastery: &MasteryStore, known: &HashSet<String>) -> u8 {
    let total: f64 = known.iter().map(|id| mastery.overall_mastery(id)).sum();
    let average = total / known.len().max(1) as f64;
    if average < 0.6 {
        1
    } else if average < 0.85 {
        2
    } else {
        3
    }
}

/// Peaks once the optimal interval has elapsed, holds for one more interval,
/// then decays towards 0.5.
fn spacing_score(entry: &WordProgress, now: DateTime<Utc>) -> f64 {
    let accuracy = entry.accuracy();
    let optimal_hours = if accuracy > 0.8 {
        24.0
    } else if accuracy > 0.6 {
        12.0
    } else {
        6.0
    };

    let ratio = hours_since(entry.last_seen, now) / optimal_hours;
    if ratio < 1.0 {
        ratio
    } else if ratio < 2.0 {
        1.0
    } else {
        (1.0 - (ratio - 2.0) / 10.0).max(0.5)
    }
}
