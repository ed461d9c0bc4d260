//! Learner-facing façade.
//!
//! A `DrillSession` owns every store, the random source and the datasets. It
//! reads the clock once per call and routes answer outcomes back into the
//! stores that depend on them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::analyzer::SymbolAnalyzer;
use crate::config::{DrillConfig, GeneratorConfig};
use crate::dataset::{Alphabet, Vocabulary, PERSIAN_NON_CONNECTING};
use crate::error::Result;
use crate::generator::QuestionGenerator;
use crate::mastery::MasteryStore;
use crate::persistence::{self, ImportFormat};
use crate::types::{MasteryLevel, Question, QuestionType};
use crate::vocabulary::VocabularySelector;
use crate::word_mastery::{WordMasteryStore, WordStats};

/// Result of grading one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_answer: String,
    /// Symbol the learner picked instead, when the answer names one.
    pub confused_with: Option<String>,
    pub overall_mastery: Option<f64>,
    pub mastery_level: Option<MasteryLevel>,
}

pub struct DrillSession<R: Rng = ChaCha8Rng> {
    config: DrillConfig,
    alphabet: Arc<Alphabet>,
    vocabulary: Arc<Vocabulary>,
    mastery: MasteryStore,
    word_mastery: WordMasteryStore,
    selector: VocabularySelector,
    generator: QuestionGenerator,
    rng: R,
}

impl DrillSession<ChaCha8Rng> {
    /// Session over the bundled Persian datasets, seeded from the thread RNG.
    pub fn new(config: DrillConfig) -> Result<Self> {
        let rng = ChaCha8Rng::from_rng(&mut rand::rng());
        Self::with_datasets(config, Alphabet::persian(), Vocabulary::persian(), rng)
    }

    /// Deterministic session for tests and simulations.
    pub fn with_seed(config: DrillConfig, seed: u64) -> Result<Self> {
        Self::with_datasets(
            config,
            Alphabet::persian(),
            Vocabulary::persian(),
            ChaCha8Rng::seed_from_u64(seed),
        )
    }
}

impl<R: Rng> DrillSession<R> {
    pub fn with_datasets(
        config: DrillConfig,
        alphabet: Alphabet,
        vocabulary: Vocabulary,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;

        let alphabet = Arc::new(alphabet);
        let vocabulary = Arc::new(vocabulary);
        let analyzer = SymbolAnalyzer::new(alphabet.clone(), PERSIAN_NON_CONNECTING);
        let generator =
            QuestionGenerator::new(alphabet.clone(), analyzer, config.generator.clone());
        let selector = VocabularySelector::new(vocabulary.clone(), config.selection);

        tracing::info!(
            symbols = alphabet.len(),
            words = vocabulary.len(),
            enabled = generator.enabled_symbol_count(),
            "drill session ready"
        );

        Ok(Self {
            config,
            alphabet,
            vocabulary,
            mastery: MasteryStore::new(),
            word_mastery: WordMasteryStore::new(),
            selector,
            generator,
            rng,
        })
    }

    pub fn config(&self) -> &DrillConfig {
        &self.config
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn mastery(&self) -> &MasteryStore {
        &self.mastery
    }

    pub fn word_mastery(&self) -> &WordMasteryStore {
        &self.word_mastery
    }

    pub fn selector(&self) -> &VocabularySelector {
        &self.selector
    }

    pub fn generator(&self) -> &QuestionGenerator {
        &self.generator
    }

    pub fn update_generator_config(&mut self, generator: GeneratorConfig) -> Result<()> {
        let config = DrillConfig {
            generator,
            ..self.config.clone()
        };
        config.validate()?;
        self.generator.update_config(config.generator.clone());
        self.config = config;
        Ok(())
    }

    pub fn next_question(&mut self) -> Question {
        self.next_question_at(Utc::now())
    }

    pub fn next_question_at(&mut self, now: DateTime<Utc>) -> Question {
        self.generator
            .generate(&self.mastery, &mut self.selector, &mut self.rng, now)
    }

    pub fn submit_answer(
        &mut self,
        question: &Question,
        answer: &str,
        response_time_ms: Option<f64>,
    ) -> AnswerOutcome {
        self.submit_answer_at(question, answer, response_time_ms, Utc::now())
    }

    pub fn submit_answer_at(
        &mut self,
        question: &Question,
        answer: &str,
        response_time_ms: Option<f64>,
        now: DateTime<Utc>,
    ) -> AnswerOutcome {
        let correct = question.is_correct(answer);
        let confused_with = if correct {
            None
        } else {
            self.symbol_for_answer(question, answer)
        };

        if let (Some(symbol_id), Some(form)) = (question.symbol_id.as_deref(), question.form) {
            self.mastery.record_attempt(
                symbol_id,
                form,
                correct,
                question.question_type.context(),
                confused_with.as_deref(),
                confused_with.as_ref().map(|_| form),
                now,
            );
        }

        if question.question_type == QuestionType::WordReading {
            if let Some(word_id) = question.vocabulary_id.as_deref() {
                self.word_mastery
                    .record_attempt(word_id, correct, response_time_ms, now);
                self.selector
                    .update_mastery(word_id, correct, response_time_ms, None, now);
            }
        }

        let record = question
            .symbol_id
            .as_deref()
            .and_then(|id| self.mastery.symbol_mastery(id));
        tracing::debug!(
            question_type = question.question_type.as_str(),
            symbol = question.symbol_id.as_deref().unwrap_or("-"),
            correct,
            "answer recorded"
        );

        AnswerOutcome {
            correct,
            correct_answer: question.correct_answer.clone(),
            confused_with,
            overall_mastery: record.map(|m| m.overall_mastery),
            mastery_level: record.map(|m| m.mastery_level),
        }
    }

    pub fn active_symbols(&self) -> Vec<String> {
        self.generator.active_symbols(&self.mastery)
    }

    pub fn suggest_next_symbols(&self) -> Vec<String> {
        self.generator.suggest_next(&self.mastery)
    }

    pub fn word_stats(&self) -> WordStats {
        let ids: Vec<&str> = self.vocabulary.iter().map(|item| item.id.as_str()).collect();
        self.word_mastery.stats(&ids)
    }

    pub fn export_progress(&self) -> Result<String> {
        persistence::export_progress(&self.mastery, &self.word_mastery, &self.selector, Utc::now())
    }

    /// Replaces the learner's progress. On error nothing changes.
    pub fn import_progress(&mut self, json: &str) -> Result<ImportFormat> {
        let now = Utc::now();
        let imported = match persistence::parse_import(json, now) {
            Ok(imported) => imported,
            Err(e) => {
                tracing::warn!(error = %e, "rejected progress import");
                return Err(e);
            }
        };

        let mut selector = self.selector.clone();
        if let Some(snapshot) = imported.word_progression {
            selector.load(snapshot)?;
        }

        self.mastery = imported.mastery;
        self.selector = selector;
        if let Some(words) = imported.word_mastery {
            self.word_mastery = words;
        }
        self.generator.clear_history();

        tracing::info!(
            format = ?imported.format,
            symbols = self.mastery.len(),
            "progress imported"
        );
        Ok(imported.format)
    }

    /// Symbol whose value for this question type equals `answer`.
    fn symbol_for_answer(&self, question: &Question, answer: &str) -> Option<String> {
        let symbol = match question.question_type {
            QuestionType::FormRecognition => return None,
            QuestionType::NameToLetter => {
                let form = question.form?;
                self.alphabet.iter().find(|s| s.glyph(form) == answer)
            }
            QuestionType::LetterRecognition
            | QuestionType::WordContext
            | QuestionType::WordReading => self.alphabet.iter().find(|s| s.name == answer),
        }?;
        (question.symbol_id.as_deref() != Some(symbol.id.as_str())).then(|| symbol.id.clone())
    }
}
