//! Whole-word proficiency, tracked the same way as symbol forms.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DrillError, Result};
use crate::mastery::{blended_accuracy, recency_bonus};
use crate::types::MasteryLevel;

const MIN_EXPOSURES_FOR_AVERAGE: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordMastery {
    pub word_id: String,
    pub exposures: u32,
    pub correct_answers: u32,
    pub recent_accuracy: VecDeque<u8>,
    pub last_seen: DateTime<Utc>,
    /// Running mean in milliseconds; attempts without a latency leave it as is.
    pub average_response_time: f64,
    pub overall_mastery: f64,
    pub mastery_level: MasteryLevel,
}

impl WordMastery {
    fn new(word_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            word_id: word_id.to_string(),
            exposures: 0,
            correct_answers: 0,
            recent_accuracy: VecDeque::new(),
            last_seen: now,
            average_response_time: 0.0,
            overall_mastery: 0.0,
            mastery_level: MasteryLevel::Learning,
        }
    }

    pub fn accuracy(&self) -> f64 {
        blended_accuracy(
            self.recent_accuracy.iter(),
            self.correct_answers,
            self.exposures,
        )
    }

    fn recompute(&mut self, now: DateTime<Utc>) {
        self.overall_mastery = if self.exposures == 0 {
            0.0
        } else {
            self.accuracy() * recency_bonus(self.last_seen, now)
        };
        self.mastery_level = MasteryLevel::from_score(self.overall_mastery);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordPracticeCandidate {
    pub word_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStats {
    pub practiced: usize,
    pub mastered: usize,
    pub total: usize,
    pub avg_mastery: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WordMasteryStore {
    records: BTreeMap<String, WordMastery>,
}

impl WordMasteryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(
        &mut self,
        word_id: &str,
        correct: bool,
        response_time_ms: Option<f64>,
        now: DateTime<Utc>,
    ) {
        let mastery = self
            .records
            .entry(word_id.to_string())
            .or_insert_with(|| WordMastery::new(word_id, now));

        mastery.exposures += 1;
        if correct {
            mastery.correct_answers += 1;
        }
        mastery.last_seen = now;
        crate::mastery::push_outcome(&mut mastery.recent_accuracy, correct);

        if let Some(sample) = response_time_ms {
            let n = mastery.exposures as f64;
            mastery.average_response_time =
                (mastery.average_response_time * (n - 1.0) + sample) / n;
        }

        mastery.recompute(now);
    }

    pub fn word_mastery(&self, word_id: &str) -> Option<&WordMastery> {
        self.records.get(word_id)
    }

    /// Lowest scores first; never-seen words score zero.
    pub fn items_needing_practice<S: AsRef<str>>(
        &self,
        word_ids: &[S],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<WordPracticeCandidate> {
        let mut candidates: Vec<WordPracticeCandidate> = word_ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                let score = self
                    .records
                    .get(id)
                    .map(|m| m.overall_mastery * recency_bonus(m.last_seen, now))
                    .unwrap_or(0.0);
                WordPracticeCandidate {
                    word_id: id.to_string(),
                    score,
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);
        candidates
    }

    /// Mean mastery over words with at least three exposures.
    pub fn average_mastery<S: AsRef<str>>(&self, word_ids: &[S]) -> f64 {
        let (total, count) = word_ids
            .iter()
            .filter_map(|id| self.records.get(id.as_ref()))
            .filter(|m| m.exposures >= MIN_EXPOSURES_FOR_AVERAGE)
            .fold((0.0, 0usize), |(sum, n), m| (sum + m.overall_mastery, n + 1));
        if count > 0 {
            total / count as f64
        } else {
            0.0
        }
    }

    pub fn stats<S: AsRef<str>>(&self, word_ids: &[S]) -> WordStats {
        let mut stats = WordStats {
            total: word_ids.len(),
            ..Default::default()
        };
        let mut total_mastery = 0.0;

        for mastery in word_ids
            .iter()
            .filter_map(|id| self.records.get(id.as_ref()))
            .filter(|m| m.exposures > 0)
        {
            stats.practiced += 1;
            total_mastery += mastery.overall_mastery;
            if mastery.mastery_level >= MasteryLevel::Proficient {
                stats.mastered += 1;
            }
        }

        if stats.practiced > 0 {
            stats.avg_mastery = total_mastery / stats.practiced as f64;
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.records)?)
    }

    pub fn to_blob(&self) -> &BTreeMap<String, WordMastery> {
        &self.records
    }

    pub fn restore(json: &str, now: DateTime<Utc>) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value, now)
    }

    pub(crate) fn from_value(value: serde_json::Value, now: DateTime<Utc>) -> Result<Self> {
        let mut records: BTreeMap<String, WordMastery> = serde_json::from_value(value)?;
        for (key, mastery) in records.iter_mut() {
            if mastery.word_id != *key {
                return Err(DrillError::InvalidData(format!(
                    "record keyed {key} claims wordId {}",
                    mastery.word_id
                )));
            }
            if mastery.correct_answers > mastery.exposures {
                return Err(DrillError::InvalidData(format!(
                    "{key}: {} correct answers exceed {} exposures",
                    mastery.correct_answers, mastery.exposures
                )));
            }
            crate::mastery::validate_window(&mastery.recent_accuracy, key)?;
            mastery.recompute(now);
        }
        Ok(Self { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_running_average_latency() {
        let now = Utc::now();
        let mut store = WordMasteryStore::new();
        store.record_attempt("nan", true, Some(1000.0), now);
        store.record_attempt("nan", true, Some(2000.0), now);
        store.record_attempt("nan", false, Some(3000.0), now);
        let m = store.word_mastery("nan").unwrap();
        assert!((m.average_response_time - 2000.0).abs() < 1e-9);
        assert_eq!(m.exposures, 3);
        assert_eq!(m.correct_answers, 2);
    }

    #[test]
    fn test_mastery_decays_with_recency() {
        let now = Utc::now();
        let mut store = WordMasteryStore::new();
        store.record_attempt("fresh", true, None, now);
        store.record_attempt("stale", true, None, now - Duration::hours(48));
        let fresh = store.word_mastery("fresh").unwrap();
        assert!((fresh.overall_mastery - 1.0).abs() < 1e-9);
        assert_eq!(fresh.mastery_level, MasteryLevel::Mastered);
        // recorded "then", so its mastery was computed at full recency
        let stale = store.word_mastery("stale").unwrap();
        assert!((stale.overall_mastery - 1.0).abs() < 1e-9);

        let ranked = store.items_needing_practice(&["fresh", "stale", "unseen"], 10, now);
        assert_eq!(ranked[0].word_id, "unseen");
        assert_eq!(ranked[0].score, 0.0);
        assert_eq!(ranked[1].word_id, "stale");
        assert!((ranked[1].score - 0.5).abs() < 1e-9);
        assert_eq!(ranked[2].word_id, "fresh");
    }

    #[test]
    fn test_average_requires_three_exposures() {
        let now = Utc::now();
        let mut store = WordMasteryStore::new();
        store.record_attempt("a", true, None, now);
        for _ in 0..3 {
            store.record_attempt("b", true, None, now);
        }
        assert!((store.average_mastery(&["a", "b"]) - 1.0).abs() < 1e-9);
        assert_eq!(store.average_mastery(&["a"]), 0.0);
    }

    #[test]
    fn test_stats() {
        let now = Utc::now();
        let mut store = WordMasteryStore::new();
        store.record_attempt("a", true, None, now);
        store.record_attempt("b", false, None, now);
        let stats = store.stats(&["a", "b", "c"]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.practiced, 2);
        assert_eq!(stats.mastered, 1);
        assert!((stats.avg_mastery - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip() {
        let now = Utc::now();
        let mut store = WordMasteryStore::new();
        store.record_attempt("salam", true, Some(1500.0), now);
        store.record_attempt("salam", false, Some(2500.0), now);
        let restored = WordMasteryStore::restore(&store.serialize().unwrap(), now).unwrap();
        let m = restored.word_mastery("salam").unwrap();
        assert_eq!(m.exposures, 2);
        assert_eq!(m.recent_accuracy, VecDeque::from(vec![1, 0]));
        assert!((m.average_response_time - 2000.0).abs() < 1e-9);
        assert!(WordMasteryStore::restore("{\"x\":1}", now).is_err());

        let mut value = serde_json::to_value(store.to_blob()).unwrap();
        value["salam"]["wordId"] = serde_json::json!("ab");
        assert!(WordMasteryStore::from_value(value, now).is_err());
    }
}
