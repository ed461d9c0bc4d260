use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::form::{FormMastery, FormSet};
use super::recency_bonus;
use crate::error::{DrillError, Result};
use crate::types::{AttemptContext, Form, MasteryLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionPair {
    #[serde(rename = "letterId")]
    pub symbol_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Form>,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualMastery {
    pub in_words: f64,
    pub standalone: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolMastery {
    #[serde(rename = "letterId")]
    pub symbol_id: String,
    pub forms: FormSet,
    pub overall_mastery: f64,
    pub mastery_level: MasteryLevel,
    #[serde(default)]
    pub confused_with: Vec<ConfusionPair>,
    #[serde(default)]
    pub contextual_mastery: ContextualMastery,
}

impl SymbolMastery {
    fn new(symbol_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            symbol_id: symbol_id.to_string(),
            forms: FormSet::new(now),
            overall_mastery: 0.0,
            mastery_level: MasteryLevel::Learning,
            confused_with: Vec::new(),
            contextual_mastery: ContextualMastery::default(),
        }
    }

    pub fn form(&self, form: Form) -> &FormMastery {
        self.forms.get(form)
    }

    pub fn total_exposures(&self) -> u32 {
        self.forms.total_exposures()
    }

    /// Lifetime correct/exposures across all four forms.
    pub fn aggregate_accuracy(&self) -> f64 {
        let total = self.forms.total_exposures();
        if total == 0 {
            0.0
        } else {
            self.forms.total_correct() as f64 / total as f64
        }
    }

    fn add_confusion(&mut self, symbol_id: &str, form: Option<Form>) {
        match self
            .confused_with
            .iter_mut()
            .find(|pair| pair.symbol_id == symbol_id && pair.form == form)
        {
            Some(pair) => pair.count += 1,
            None => self.confused_with.push(ConfusionPair {
                symbol_id: symbol_id.to_string(),
                form,
                count: 1,
            }),
        }
    }

    /// Both context buckets are fed the same all-forms ratio; only the bucket
    /// of the attempt being recorded is refreshed.
    fn update_contextual(&mut self, context: AttemptContext) {
        let ratio = self.aggregate_accuracy();
        match context {
            AttemptContext::Standalone => self.contextual_mastery.standalone = ratio,
            AttemptContext::InWord => self.contextual_mastery.in_words = ratio,
        }
    }

    fn recompute(&mut self, now: DateTime<Utc>) {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for fm in self.forms.iter().filter(|fm| fm.is_attempted()) {
            let weight = fm.form.mastery_weight() * recency_bonus(fm.last_seen, now);
            weighted_sum += fm.accuracy() * weight;
            total_weight += weight;
        }

        self.overall_mastery = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        };
        self.mastery_level = MasteryLevel::from_score(self.overall_mastery);
    }
}

/// A (symbol, form) pair ranked for practice; lower score is more urgent.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeCandidate {
    pub symbol_id: String,
    pub form: Form,
    pub score: f64,
}

/// Owns every symbol's mastery record. Records are created on first attempt
/// and only ever changed through [`MasteryStore::record_attempt`].
#[derive(Debug, Clone, Default)]
pub struct MasteryStore {
    records: BTreeMap<String, SymbolMastery>,
}

impl MasteryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_attempt(
        &mut self,
        symbol_id: &str,
        form: Form,
        correct: bool,
        context: AttemptContext,
        confused_with: Option<&str>,
        confused_form: Option<Form>,
        now: DateTime<Utc>,
    ) {
        let mastery = self
            .records
            .entry(symbol_id.to_string())
            .or_insert_with(|| SymbolMastery::new(symbol_id, now));

        mastery.forms.get_mut(form).record(correct, now);

        if !correct {
            if let Some(other) = confused_with {
                mastery.add_confusion(other, confused_form);
            }
        }

        mastery.update_contextual(context);
        mastery.recompute(now);
    }

    pub fn symbol_mastery(&self, symbol_id: &str) -> Option<&SymbolMastery> {
        self.records.get(symbol_id)
    }

    pub fn form_mastery(&self, symbol_id: &str, form: Form) -> Option<&FormMastery> {
        self.records.get(symbol_id).map(|m| m.form(form))
    }

    /// Overall mastery, zero for symbols never attempted.
    pub fn overall_mastery(&self, symbol_id: &str) -> f64 {
        self.records
            .get(symbol_id)
            .map(|m| m.overall_mastery)
            .unwrap_or(0.0)
    }

    pub fn mastery_level(&self, symbol_id: &str) -> MasteryLevel {
        self.records
            .get(symbol_id)
            .map(|m| m.mastery_level)
            .unwrap_or_default()
    }

    /// Form with the lowest accuracy; ties resolve to the earlier form.
    pub fn weakest_form(&self, symbol_id: &str) -> Option<Form> {
        let mastery = self.records.get(symbol_id)?;
        let mut weakest = Form::Isolated;
        let mut lowest = f64::INFINITY;
        for fm in mastery.forms.iter() {
            let accuracy = fm.accuracy();
            if accuracy < lowest {
                lowest = accuracy;
                weakest = fm.form;
            }
        }
        Some(weakest)
    }

    /// The `limit` attempted (symbol, form) pairs most in need of practice,
    /// scored `accuracy × recency` ascending.
    pub fn symbols_needing_practice(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<PracticeCandidate> {
        let mut candidates: Vec<PracticeCandidate> = self
            .records
            .values()
            .flat_map(|mastery| {
                mastery
                    .forms
                    .iter()
                    .filter(|fm| fm.is_attempted())
                    .map(move |fm| PracticeCandidate {
                        symbol_id: mastery.symbol_id.clone(),
                        form: fm.form,
                        score: fm.accuracy() * recency_bonus(fm.last_seen, now),
                    })
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

    pub fn confusion_pairs(&self, symbol_id: &str) -> &[ConfusionPair] {
        self.records
            .get(symbol_id)
            .map(|m| m.confused_with.as_slice())
            .unwrap_or(&[])
    }

    /// Mean overall mastery over `ids`, counting unknown symbols as zero.
    pub fn average_mastery<S: AsRef<str>>(&self, ids: &[S]) -> f64 {
        if ids.is_empty() {
            return 0.0;
        }
        let total: f64 = ids.iter().map(|id| self.overall_mastery(id.as_ref())).sum();
        total / ids.len() as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolMastery> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Refreshes recency-dependent derived values, e.g. after a restore.
    pub fn recompute_all(&mut self, now: DateTime<Utc>) {
        for mastery in self.records.values_mut() {
            mastery.recompute(now);
        }
    }

    pub fn to_blob(&self) -> &BTreeMap<String, SymbolMastery> {
        &self.records
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.records)?)
    }

    /// Rebuilds a store from a mastery blob, rejecting records that break
    /// the counter invariants.
    pub fn restore(json: &str, now: DateTime<Utc>) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value, now)
    }

    pub(crate) fn from_value(value: serde_json::Value, now: DateTime<Utc>) -> Result<Self> {
        let mut records: BTreeMap<String, SymbolMastery> = serde_json::from_value(value)?;
        for (key, mastery) in records.iter_mut() {
            if mastery.symbol_id.is_empty() {
                mastery.symbol_id = key.clone();
            } else if mastery.symbol_id != *key {
                return Err(DrillError::InvalidData(format!(
                    "record keyed {key} claims letterId {}",
                    mastery.symbol_id
                )));
            }
            for fm in mastery.forms.iter() {
                fm.validate(key)?;
            }
            mastery.recompute(now);
        }
        Ok(Self { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn attempt(store: &mut MasteryStore, id: &str, form: Form, correct: bool, now: DateTime<Utc>) {
        store.record_attempt(id, form, correct, AttemptContext::Standalone, None, None, now);
    }

    #[test]
    fn test_first_attempt_creates_all_forms() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        assert!(store.symbol_mastery("beh").is_none());
        assert!(store.form_mastery("beh", Form::Medial).is_none());

        attempt(&mut store, "beh", Form::Initial, true, now);
        let m = store.symbol_mastery("beh").unwrap();
        assert_eq!(m.form(Form::Initial).exposures, 1);
        for form in [Form::Isolated, Form::Medial, Form::Final] {
            assert_eq!(m.form(form).exposures, 0);
        }
        assert!((m.overall_mastery - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confusions_keyed_by_symbol_and_form() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        let ctx = AttemptContext::Standalone;
        store.record_attempt("beh", Form::Isolated, false, ctx, Some("teh"), Some(Form::Isolated), now);
        store.record_attempt("beh", Form::Isolated, false, ctx, Some("teh"), Some(Form::Isolated), now);
        store.record_attempt("beh", Form::Isolated, false, ctx, Some("teh"), Some(Form::Initial), now);
        // Correct answers never record confusion.
        store.record_attempt("beh", Form::Isolated, true, ctx, Some("nun"), None, now);

        let pairs = store.confusion_pairs("beh");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].count, 2);
        assert_eq!(pairs[0].form, Some(Form::Isolated));
        assert_eq!(pairs[1].count, 1);
        assert_eq!(pairs[1].form, Some(Form::Initial));
        assert!(store.confusion_pairs("nun").is_empty());
    }

    #[test]
    fn test_overall_mastery_weights_forms() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        attempt(&mut store, "sin", Form::Isolated, true, now);
        attempt(&mut store, "sin", Form::Medial, false, now);
        let m = store.symbol_mastery("sin").unwrap();
        // isolated 1.0 * 0.30, medial 0.0 * 0.20, equal recency
        assert!((m.overall_mastery - 0.6).abs() < 1e-9);
        assert!(m.mastery_level <= MasteryLevel::Familiar);
    }

    #[test]
    fn test_stale_forms_count_less() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        attempt(&mut store, "mim", Form::Isolated, false, now - Duration::hours(48));
        attempt(&mut store, "mim", Form::Final, true, now);
        let m = store.symbol_mastery("mim").unwrap();
        // isolated weight 0.30 * 0.5, final 0.25 * 1.0
        let expected = 0.25 / (0.15 + 0.25);
        assert!((m.overall_mastery - expected).abs() < 1e-9);
    }

    #[test]
    fn test_weakest_form_tie_break() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        assert!(store.weakest_form("dal").is_none());
        attempt(&mut store, "dal", Form::Isolated, true, now);
        // initial, medial and final all sit at 0.0; initial comes first
        assert_eq!(store.weakest_form("dal"), Some(Form::Initial));
        attempt(&mut store, "dal", Form::Initial, true, now);
        attempt(&mut store, "dal", Form::Medial, true, now);
        attempt(&mut store, "dal", Form::Final, true, now);
        assert_eq!(store.weakest_form("dal"), Some(Form::Isolated));
    }

    #[test]
    fn test_contextual_mastery_tracks_aggregate() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        attempt(&mut store, "nun", Form::Isolated, true, now);
        attempt(&mut store, "nun", Form::Initial, false, now);
        store.record_attempt("nun", Form::Final, true, AttemptContext::InWord, None, None, now);
        let ctx = &store.symbol_mastery("nun").unwrap().contextual_mastery;
        assert!((ctx.standalone - 0.5).abs() < 1e-9);
        assert!((ctx.in_words - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_practice_ranking_only_attempted_pairs() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        attempt(&mut store, "alef", Form::Isolated, true, now);
        attempt(&mut store, "beh", Form::Isolated, false, now);
        let ranked = store.symbols_needing_practice(10, now);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].symbol_id, "beh");
        assert_eq!(ranked[1].symbol_id, "alef");
        assert_eq!(store.symbols_needing_practice(1, now).len(), 1);
    }

    #[test]
    fn test_restore_rejects_broken_counters() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        attempt(&mut store, "alef", Form::Isolated, true, now);
        let mut value = serde_json::to_value(store.to_blob()).unwrap();
        value["alef"]["forms"]["isolated"]["correctAnswers"] = serde_json::json!(9);
        assert!(MasteryStore::from_value(value, now).is_err());
    }

    #[test]
    fn test_restore_rejects_mismatched_identity() {
        let now = Utc::now();
        let mut store = MasteryStore::new();
        attempt(&mut store, "beh", Form::Isolated, true, now);
        let mut value = serde_json::to_value(store.to_blob()).unwrap();
        value["beh"]["letterId"] = serde_json::json!("teh");
        assert!(matches!(
            MasteryStore::from_value(value, now),
            Err(DrillError::InvalidData(_))
        ));

        let mut value = serde_json::to_value(store.to_blob()).unwrap();
        value["beh"]["letterId"] = serde_json::json!("");
        let restored = MasteryStore::from_value(value, now).unwrap();
        assert_eq!(restored.symbol_mastery("beh").unwrap().symbol_id, "beh");
    }
}
