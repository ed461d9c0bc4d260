//! Export and import of learner progress.
//!
//! The export envelope carries the mastery blob, the word-progression blob and
//! the word-mastery blob. Import also understands the older layouts: a bare
//! mastery blob and a mastery blob wrapped as `{version: "1.0", letters: {...}}`.
//! Everything is parsed and validated before anything is handed back, so a
//! rejected payload never leaves a store half-updated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DrillError, Result};
use crate::mastery::{MasteryStore, SymbolMastery};
use crate::vocabulary::{ProgressionSnapshot, VocabularySelector};
use crate::word_mastery::{WordMastery, WordMasteryStore};

pub const EXPORT_VERSION: &str = "2.0";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportEnvelope<'a> {
    version: &'static str,
    export_date: DateTime<Utc>,
    mastery_data: &'a BTreeMap<String, SymbolMastery>,
    word_progression_data: Option<ProgressionSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    word_mastery_data: Option<&'a BTreeMap<String, WordMastery>>,
}

/// Which layout an imported payload used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Envelope,
    /// Bare or `letters`-wrapped mastery blob.
    Legacy,
}

/// Fully validated import, ready to replace the live stores.
#[derive(Debug, Clone)]
pub struct ImportedProgress {
    pub format: ImportFormat,
    pub mastery: MasteryStore,
    pub word_progression: Option<ProgressionSnapshot>,
    pub word_mastery: Option<WordMasteryStore>,
}

pub fn export_progress(
    mastery: &MasteryStore,
    words: &WordMasteryStore,
    selector: &VocabularySelector,
    now: DateTime<Utc>,
) -> Result<String> {
    let envelope = ExportEnvelope {
        version: EXPORT_VERSION,
        export_date: now,
        mastery_data: mastery.to_blob(),
        word_progression_data: Some(selector.snapshot()),
        word_mastery_data: (!words.is_empty()).then(|| words.to_blob()),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

pub fn parse_import(json: &str, now: DateTime<Utc>) -> Result<ImportedProgress> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(mut root) = value else {
        return Err(DrillError::InvalidData(
            "progress payload must be a JSON object".to_string(),
        ));
    };

    let is_envelope = root.get("version").and_then(Value::as_str) == Some(EXPORT_VERSION)
        && root.contains_key("masteryData");

    if !is_envelope {
        let mastery = MasteryStore::from_value(unwrap_letters(Value::Object(root)), now)?;
        return Ok(ImportedProgress {
            format: ImportFormat::Legacy,
            mastery,
            word_progression: None,
            word_mastery: None,
        });
    }

    let mastery_data = root.remove("masteryData").unwrap_or(Value::Null);
    let mastery = MasteryStore::from_value(unwrap_letters(mastery_data), now)?;

    let word_progression = match root.remove("wordProgressionData") {
        None | Some(Value::Null) => None,
        Some(data) => {
            let snapshot: ProgressionSnapshot = serde_json::from_value(data)?;
            snapshot.validate()?;
            Some(snapshot)
        }
    };

    let word_mastery = match root.remove("wordMasteryData") {
        None | Some(Value::Null) => None,
        Some(data) => Some(WordMasteryStore::from_value(data, now)?),
    };

    Ok(ImportedProgress {
        format: ImportFormat::Envelope,
        mastery,
        word_progression,
        word_mastery,
    })
}

/// Strips the `{version, letters}` wrapper of the first export layout.
fn unwrap_letters(value: Value) -> Value {
    match value {
        Value::Object(mut map)
            if map.get("letters").is_some_and(Value::is_object) && map.contains_key("version") =>
        {
            map.remove("letters").unwrap_or(Value::Null)
        }
        other => other,
    }
}
