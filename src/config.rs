//! Engine configuration.
//!
//! Contains:
//! - GeneratorConfig - enabled symbols, progression groups, question-type tables
//! - SelectionWeights - factor weights for vocabulary selection
//! - LoggingConfig - log filter and optional rolling log file
//! - DrillConfig - top-level bundle with environment overrides

use serde::{Deserialize, Serialize};

use crate::error::{DrillError, Result};
use crate::types::{MasteryLevel, QuestionType};

/// Weights of the five question types for one mastery level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeWeights {
    pub letter_recognition: f64,
    pub name_to_letter: f64,
    pub form_recognition: f64,
    pub word_context: f64,
    pub word_reading: f64,
}

impl TypeWeights {
    pub fn get(&self, question_type: QuestionType) -> f64 {
        match question_type {
            QuestionType::LetterRecognition => self.letter_recognition,
            QuestionType::NameToLetter => self.name_to_letter,
            QuestionType::FormRecognition => self.form_recognition,
            QuestionType::WordContext => self.word_context,
            QuestionType::WordReading => self.word_reading,
        }
    }

    pub fn get_mut(&mut self, question_type: QuestionType) -> &mut f64 {
        match question_type {
            QuestionType::LetterRecognition => &mut self.letter_recognition,
            QuestionType::NameToLetter => &mut self.name_to_letter,
            QuestionType::FormRecognition => &mut self.form_recognition,
            QuestionType::WordContext => &mut self.word_context,
            QuestionType::WordReading => &mut self.word_reading,
        }
    }

    pub fn total(&self) -> f64 {
        QuestionType::ALL.iter().map(|t| self.get(*t)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizTypeWeights {
    pub learning: TypeWeights,
    pub familiar: TypeWeights,
    pub proficient: TypeWeights,
    pub mastered: TypeWeights,
}

impl QuizTypeWeights {
    pub fn for_level(&self, level: MasteryLevel) -> &TypeWeights {
        match level {
            MasteryLevel::Learning => &self.learning,
            MasteryLevel::Familiar => &self.familiar,
            MasteryLevel::Proficient => &self.proficient,
            MasteryLevel::Mastered => &self.mastered,
        }
    }

    fn tables(&self) -> [(&'static str, &TypeWeights); 4] {
        [
            ("learning", &self.learning),
            ("familiar", &self.familiar),
            ("proficient", &self.proficient),
            ("mastered", &self.mastered),
        ]
    }
}

impl Default for QuizTypeWeights {
    fn default() -> Self {
        Self {
            learning: TypeWeights {
                letter_recognition: 0.45,
                name_to_letter: 0.30,
                form_recognition: 0.15,
                word_context: 0.05,
                word_reading: 0.05,
            },
            familiar: TypeWeights {
                letter_recognition: 0.30,
                name_to_letter: 0.30,
                form_recognition: 0.20,
                word_context: 0.10,
                word_reading: 0.10,
            },
            proficient: TypeWeights {
                letter_recognition: 0.20,
                name_to_letter: 0.20,
                form_recognition: 0.25,
                word_context: 0.20,
                word_reading: 0.15,
            },
            mastered: TypeWeights {
                letter_recognition: 0.10,
                name_to_letter: 0.10,
                form_recognition: 0.25,
                word_context: 0.30,
                word_reading: 0.25,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Symbols eligible for questions. Empty means the whole alphabet.
    pub enabled_symbol_ids: Vec<String>,
    /// Mean accuracy the active set must reach before the next group opens.
    pub min_mastery_for_new_symbol: f64,
    pub confusion_pair_boost: f64,
    pub form_progression_enabled: bool,
    /// Ordered introduction groups; the first is always active. Empty means
    /// every enabled symbol is active from the start.
    pub progression_groups: Vec<Vec<String>>,
    pub quiz_type_weights: QuizTypeWeights,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled_symbol_ids: Vec::new(),
            min_mastery_for_new_symbol: 0.7,
            confusion_pair_boost: 2.0,
            form_progression_enabled: true,
            progression_groups: default_progression_groups(),
            quiz_type_weights: QuizTypeWeights::default(),
        }
    }
}

/// Introduction order for the bundled Persian alphabet.
pub fn default_progression_groups() -> Vec<Vec<String>> {
    [
        ["alef", "beh", "sin", "mim", "dal"],
        ["nun", "lam", "reh", "yeh", "vav"],
        ["teh", "heh", "kaf", "zeh", "kheh"],
    ]
    .iter()
    .map(|group| group.iter().map(|id| id.to_string()).collect())
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionWeights {
    pub novelty: f64,
    pub difficulty: f64,
    pub frequency: f64,
    pub spacing: f64,
    pub category: f64,
}

impl SelectionWeights {
    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("novelty", self.novelty),
            ("difficulty", self.difficulty),
            ("frequency", self.frequency),
            ("spacing", self.spacing),
            ("category", self.category),
        ]
    }
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            novelty: 0.3,
            difficulty: 0.2,
            frequency: 0.2,
            spacing: 0.2,
            category: 0.1,
        }
    }
}

/// Where log output goes. Read by [`crate::logging::build_subscriber`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `harf_drill::generator=debug`.
    pub level: String,
    pub file_enabled: bool,
    pub dir: String,
    /// Daily rotation appends the date to this name.
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            dir: "./logs".to_string(),
            file_prefix: "drill.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrillConfig {
    pub generator: GeneratorConfig,
    pub selection: SelectionWeights,
    pub logging: LoggingConfig,
}

impl DrillConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DRILL_MIN_MASTERY_FOR_NEW_SYMBOL") {
            config.generator.min_mastery_for_new_symbol = val.parse().unwrap_or(0.7);
        }
        if let Ok(val) = std::env::var("DRILL_CONFUSION_PAIR_BOOST") {
            config.generator.confusion_pair_boost = val.parse().unwrap_or(2.0);
        }
        if let Ok(val) = std::env::var("DRILL_FORM_PROGRESSION") {
            config.generator.form_progression_enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("DRILL_ENABLED_SYMBOLS") {
            config.generator.enabled_symbol_ids = parse_id_list(&val);
        }
        if let Ok(val) = std::env::var("DRILL_LOG_LEVEL") {
            config.logging.level = val;
        }
        if let Ok(val) = std::env::var("DRILL_LOG_FILE") {
            config.logging.file_enabled = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("DRILL_LOG_DIR") {
            config.logging.dir = val;
        }
        if let Ok(val) = std::env::var("DRILL_LOG_FILE_PREFIX") {
            config.logging.file_prefix = val;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        let generator = &self.generator;

        if !(0.0..=1.0).contains(&generator.min_mastery_for_new_symbol) {
            return Err(DrillError::Config(format!(
                "min_mastery_for_new_symbol must be within [0, 1], got {}",
                generator.min_mastery_for_new_symbol
            )));
        }
        if !generator.confusion_pair_boost.is_finite() || generator.confusion_pair_boost <= 0.0 {
            return Err(DrillError::Config(format!(
                "confusion_pair_boost must be positive, got {}",
                generator.confusion_pair_boost
            )));
        }
        if let Some(i) = generator.progression_groups.iter().position(|g| g.is_empty()) {
            return Err(DrillError::Config(format!("progression group {i} is empty")));
        }

        for (level, table) in generator.quiz_type_weights.tables() {
            for question_type in QuestionType::ALL {
                check_weight(&format!("{level}.{}", question_type.as_str()), table.get(question_type))?;
            }
            if table.total() <= 0.0 {
                return Err(DrillError::Config(format!(
                    "question type weights for {level} sum to zero"
                )));
            }
        }

        for (name, weight) in self.selection.entries() {
            check_weight(name, weight)?;
        }

        if self.logging.level.trim().is_empty() {
            return Err(DrillError::Config("log level must not be empty".to_string()));
        }
        if self.logging.file_enabled && self.logging.file_prefix.is_empty() {
            return Err(DrillError::Config(
                "file logging needs a file prefix".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_weight(name: &str, weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(DrillError::Config(format!(
            "weight {name} must be a non-negative number, got {weight}"
        )))
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "yes")
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
