//! Adaptive question generation.
//!
//! Each call runs four phases and always yields a question:
//! 1. word-reading gate: occasionally read a whole unlocked word
//! 2. weighted (symbol, form) draw over the active set
//! 3. question-type draw from the symbol's mastery level
//! 4. construction with smart distractors
//!
//! Contains:
//! - QuestionGenerator - orchestration and repetition history
//! - progression - active-set widening by introduction groups
//! - distractors - confusion-aware wrong answers

mod distractors;
mod progression;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::analyzer::SymbolAnalyzer;
use crate::config::{GeneratorConfig, TypeWeights};
use crate::dataset::Alphabet;
use crate::mastery::MasteryStore;
use crate::sampling::{shuffled, weighted_choice};
use crate::types::{Form, Question, QuestionType, Symbol, SymbolProperty, WordData};
use crate::vocabulary::VocabularySelector;

use distractors::smart_distractors;

const MAX_RECENT_QUESTIONS: usize = 10;
const DISTRACTOR_COUNT: usize = 3;
const MIN_ACTIVE_FOR_WORD_READING: usize = 3;
const FORM_RECOGNITION_BOOST: f64 = 1.5;
const WEAK_FORM_ACCURACY: f64 = 0.7;
const SMALL_ACTIVE_SET: usize = 5;

#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    alphabet: Arc<Alphabet>,
    analyzer: SymbolAnalyzer,
    config: GeneratorConfig,
    /// Enabled symbols that exist in the alphabet, in configuration order.
    enabled: Vec<String>,
    groups: Vec<Vec<String>>,
    recent: VecDeque<Question>,
}

impl QuestionGenerator {
    pub fn new(alphabet: Arc<Alphabet>, analyzer: SymbolAnalyzer, config: GeneratorConfig) -> Self {
        let mut generator = Self {
            alphabet,
            analyzer,
            config: GeneratorConfig::default(),
            enabled: Vec::new(),
            groups: Vec::new(),
            recent: VecDeque::with_capacity(MAX_RECENT_QUESTIONS),
        };
        generator.update_config(config);
        generator
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Replaces the configuration; the repetition history is kept.
    pub fn update_config(&mut self, config: GeneratorConfig) {
        self.enabled = if config.enabled_symbol_ids.is_empty() {
            self.alphabet.ids()
        } else {
            config
                .enabled_symbol_ids
                .iter()
                .filter(|id| self.alphabet.contains(id))
                .cloned()
                .collect()
        };
        self.groups = progression::effective_groups(&config.progression_groups, &self.enabled);
        self.config = config;
    }

    pub fn enabled_symbol_count(&self) -> usize {
        self.enabled.len()
    }

    pub fn enabled_symbols(&self) -> &[String] {
        &self.enabled
    }

    /// Oldest first.
    pub fn recent_questions(&self) -> impl Iterator<Item = &Question> {
        self.recent.iter()
    }

    pub fn clear_history(&mut self) {
        self.recent.clear();
    }

    pub fn active_symbols(&self, mastery: &MasteryStore) -> Vec<String> {
        progression::active_symbols(&self.groups, mastery, self.config.min_mastery_for_new_symbol)
    }

    /// Preview of the symbols the next group would introduce.
    pub fn suggest_next(&self, mastery: &MasteryStore) -> Vec<String> {
        progression::suggest_next(&self.groups, &self.active_symbols(mastery))
    }

    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        mastery: &MasteryStore,
        selector: &mut VocabularySelector,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Question {
        let active = self.active_symbols(mastery);

        let question = match self.try_word_reading(&active, mastery, selector, rng, now) {
            Some(question) => question,
            None => match self.select_symbol_and_form(&active, mastery, rng) {
                Some((symbol, form)) => {
                    let question_type = self.select_question_type(symbol, form, mastery, rng);
                    tracing::debug!(
                        symbol = %symbol.id,
                        form = form.as_str(),
                        question_type = question_type.as_str(),
                        "generating question"
                    );
                    self.build(symbol, form, question_type, mastery, selector, rng, now)
                }
                None => {
                    tracing::debug!("no symbol available, falling back to a bare form question");
                    form_recognition(None, Form::ALL[rng.random_range(0..Form::ALL.len())])
                }
            },
        };

        self.remember(question.clone());
        question
    }

    fn remember(&mut self, question: Question) {
        self.recent.push_back(question);
        while self.recent.len() > MAX_RECENT_QUESTIONS {
            self.recent.pop_front();
        }
    }

    fn recent_count(&self, symbol_id: &str, form: Form) -> usize {
        self.recent.iter().filter(|q| q.tests(symbol_id, form)).count()
    }

    fn recent_vocabulary_ids(&self) -> Vec<&str> {
        self.recent
            .iter()
            .filter_map(|q| q.vocabulary_id.as_deref())
            .collect()
    }

    fn try_word_reading<R: Rng + ?Sized>(
        &self,
        active: &[String],
        mastery: &MasteryStore,
        selector: &mut VocabularySelector,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<Question> {
        if active.len() < MIN_ACTIVE_FOR_WORD_READING {
            return None;
        }

        let attempted: Vec<f64> = active
            .iter()
            .map(|id| mastery.overall_mastery(id))
            .filter(|m| *m > 0.0)
            .collect();
        let mean = if attempted.is_empty() {
            0.0
        } else {
            attempted.iter().sum::<f64>() / attempted.len() as f64
        };
        if rng.random::<f64>() >= word_reading_chance(mean) {
            return None;
        }

        let question = self.build_word_reading(mastery, selector, rng, now);
        if question.is_none() {
            tracing::debug!(mean_mastery = mean, "word reading unavailable, drilling a symbol");
        }
        question
    }

    fn build_word_reading<R: Rng + ?Sized>(
        &self,
        mastery: &MasteryStore,
        selector: &mut VocabularySelector,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<Question> {
        let recent_ids = self.recent_vocabulary_ids();
        let item = selector.propose_next(mastery, recent_ids.as_slice(), rng, now)?;

        let occurrences: Vec<_> = self
            .analyzer
            .analyze(&item.text)
            .into_iter()
            .filter(|occ| self.alphabet.contains(&occ.symbol_id))
            .collect();
        let uncovered: Vec<_> = occurrences
            .iter()
            .filter(|occ| self.recent_count(&occ.symbol_id, occ.form) == 0)
            .collect();
        let pool: Vec<_> = if uncovered.is_empty() {
            occurrences.iter().collect()
        } else {
            uncovered
        };
        let occurrence = *weighted_choice(&pool, |_| 1.0, rng)?;
        let symbol = self.alphabet.get(&occurrence.symbol_id)?;
        selector.mark_presented(&item);

        let mut question =
            self.named_question(QuestionType::WordReading, symbol, occurrence.form, mastery, rng);
        question.word = Some(WordData::from(&item));
        question.vocabulary_id = Some(item.id.clone());
        question.target_index = Some(occurrence.position);
        tracing::debug!(word = %item.id, symbol = %symbol.id, form = occurrence.form.as_str(), "word reading question");
        Some(question)
    }

    fn select_symbol_and_form<R: Rng + ?Sized>(
        &self,
        active: &[String],
        mastery: &MasteryStore,
        rng: &mut R,
    ) -> Option<(&Symbol, Form)> {
        let pool = self.selection_pool(active, mastery);
        if let Some(&(symbol, form, _)) = weighted_choice(&pool, |entry| entry.2, rng) {
            return Some((symbol, form));
        }

        tracing::debug!("selection pool empty, picking a random enabled symbol");
        let symbols: Vec<&Symbol> = self
            .enabled
            .iter()
            .filter_map(|id| self.alphabet.get(id))
            .collect();
        let symbol = match weighted_choice(&symbols, |_| 1.0, rng) {
            Some(symbol) => *symbol,
            None => self.alphabet.iter().next()?,
        };
        Some((symbol, Form::ALL[rng.random_range(0..Form::ALL.len())]))
    }

    /// Every (active symbol, form) pair with its draw weight.
    fn selection_pool(&self, active: &[String], mastery: &MasteryStore) -> Vec<(&Symbol, Form, f64)> {
        let penalty = if active.len() < SMALL_ACTIVE_SET { 0.5 } else { 0.3 };

        let mut pool: Vec<(&Symbol, Form, f64)> = Vec::with_capacity(active.len() * 4);
        for id in active {
            let Some(symbol) = self.alphabet.get(id) else {
                continue;
            };
            let record = mastery.symbol_mastery(id);
            let confused = !mastery.confusion_pairs(id).is_empty();
            let isolated_exposures = record.map(|m| m.form(Form::Isolated).exposures).unwrap_or(0);

            for form in Form::ALL {
                let fm = record.map(|m| m.form(form));
                let mut weight = match fm {
                    None => 2.0,
                    Some(fm) if fm.exposures == 0 => 2.0,
                    Some(fm) if fm.exposures < 3 => 1.5,
                    Some(fm) => (1.0 - fm.accuracy()).max(0.1),
                };
                if confused {
                    weight *= self.config.confusion_pair_boost;
                }
                if self.config.form_progression_enabled {
                    weight *= progression_damping(form, isolated_exposures);
                }
                weight *= penalty_factor(penalty, self.recent_count(id, form));
                pool.push((symbol, form, weight));
            }
        }
        pool
    }

    fn select_question_type<R: Rng + ?Sized>(
        &self,
        symbol: &Symbol,
        form: Form,
        mastery: &MasteryStore,
        rng: &mut R,
    ) -> QuestionType {
        let weights = self.question_type_weights(symbol, form, mastery);
        weighted_choice(&QuestionType::ALL, |t| weights.get(*t), rng)
            .copied()
            .unwrap_or(QuestionType::LetterRecognition)
    }

    /// The level's type table adjusted for weak forms and missing examples.
    fn question_type_weights(&self, symbol: &Symbol, form: Form, mastery: &MasteryStore) -> TypeWeights {
        let level = mastery.mastery_level(&symbol.id);
        let mut weights = *self.config.quiz_type_weights.for_level(level);

        if form != Form::Isolated {
            if let Some(fm) = mastery.form_mastery(&symbol.id, form) {
                if fm.overall_accuracy() < WEAK_FORM_ACCURACY {
                    *weights.get_mut(QuestionType::FormRecognition) *= FORM_RECOGNITION_BOOST;
                }
            }
        }
        if symbol.example_words.is_empty() {
            *weights.get_mut(QuestionType::WordContext) = 0.0;
        }
        weights
    }

    #[allow(clippy::too_many_arguments)]
    fn build<R: Rng + ?Sized>(
        &self,
        symbol: &Symbol,
        form: Form,
        question_type: QuestionType,
        mastery: &MasteryStore,
        selector: &mut VocabularySelector,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Question {
        match question_type {
            QuestionType::LetterRecognition => {
                self.named_question(question_type, symbol, form, mastery, rng)
            }
            QuestionType::NameToLetter => self.name_to_letter(symbol, form, mastery, rng),
            QuestionType::FormRecognition => form_recognition(Some(&symbol.id), form),
            QuestionType::WordContext => self.word_context(symbol, form, mastery, rng),
            QuestionType::WordReading => self
                .build_word_reading(mastery, selector, rng, now)
                .unwrap_or_else(|| {
                    tracing::debug!(symbol = %symbol.id, "word reading unavailable, asking for the name");
                    self.named_question(QuestionType::LetterRecognition, symbol, form, mastery, rng)
                }),
        }
    }

    /// A question whose answer is the symbol's display name.
    fn named_question<R: Rng + ?Sized>(
        &self,
        question_type: QuestionType,
        symbol: &Symbol,
        form: Form,
        mastery: &MasteryStore,
        rng: &mut R,
    ) -> Question {
        let correct = symbol.name.clone();
        let options = self.options(symbol, SymbolProperty::Name, &correct, mastery, rng);
        Question {
            question_type,
            symbol_id: Some(symbol.id.clone()),
            form: Some(form),
            options,
            correct_answer: correct,
            word: None,
            vocabulary_id: None,
            target_index: None,
        }
    }

    fn name_to_letter<R: Rng + ?Sized>(
        &self,
        symbol: &Symbol,
        form: Form,
        mastery: &MasteryStore,
        rng: &mut R,
    ) -> Question {
        let correct = symbol.glyph(form).to_string();
        let options = self.options(symbol, SymbolProperty::Glyph(form), &correct, mastery, rng);
        Question {
            question_type: QuestionType::NameToLetter,
            symbol_id: Some(symbol.id.clone()),
            form: Some(form),
            options,
            correct_answer: correct,
            word: None,
            vocabulary_id: None,
            target_index: None,
        }
    }

    fn word_context<R: Rng + ?Sized>(
        &self,
        symbol: &Symbol,
        form: Form,
        mastery: &MasteryStore,
        rng: &mut R,
    ) -> Question {
        let Some((word, index, form)) = self.locate_in_examples(symbol, form) else {
            return self.named_question(QuestionType::LetterRecognition, symbol, form, mastery, rng);
        };

        let mut question = self.named_question(QuestionType::WordContext, symbol, form, mastery, rng);
        question.word = Some(word);
        question.target_index = Some(index);
        question
    }

    /// Finds an example word showing `symbol`.
    ///
    /// Prefers an occurrence in `form`; otherwise takes the first occurrence
    /// in any form and reports that form; otherwise the first example word
    /// at index 0.
    fn locate_in_examples(&self, symbol: &Symbol, form: Form) -> Option<(WordData, usize, Form)> {
        for example in &symbol.example_words {
            let found = self.analyzer.find_occurrences(&example.word, &symbol.id, Some(form));
            if let Some(occ) = found.first() {
                return Some((WordData::from(example), occ.position, form));
            }
        }

        for example in &symbol.example_words {
            let found = self.analyzer.find_occurrences(&example.word, &symbol.id, None);
            if let Some(occ) = found.first() {
                return Some((WordData::from(example), occ.position, occ.form));
            }
        }

        symbol
            .example_words
            .first()
            .map(|example| (WordData::from(example), 0, form))
    }

    /// Correct answer plus distractors, uniformly shuffled.
    fn options<R: Rng + ?Sized>(
        &self,
        symbol: &Symbol,
        property: SymbolProperty,
        correct: &str,
        mastery: &MasteryStore,
        rng: &mut R,
    ) -> Vec<String> {
        let mut options = Vec::with_capacity(DISTRACTOR_COUNT + 1);
        options.push(correct.to_string());
        options.extend(smart_distractors(
            &self.alphabet,
            &self.enabled,
            mastery,
            &symbol.id,
            property,
            correct,
            DISTRACTOR_COUNT,
            rng,
        ));
        shuffled(&options, rng)
    }
}

/// Chance of a word-reading round given the mean mastery of the active set.
fn word_reading_chance(mean_mastery: f64) -> f64 {
    if mean_mastery >= 0.8 {
        0.30
    } else if mean_mastery >= 0.6 {
        0.20
    } else if mean_mastery >= 0.4 {
        0.15
    } else {
        0.10
    }
}

/// Holds back connected forms until the isolated form has been seen enough.
fn progression_damping(form: Form, isolated_exposures: u32) -> f64 {
    match form {
        Form::Medial if isolated_exposures < 5 => 0.3,
        Form::Initial | Form::Final if isolated_exposures < 3 => 0.5,
        _ => 1.0,
    }
}

fn penalty_factor(penalty: f64, recent_count: usize) -> f64 {
    penalty.powi(recent_count as i32)
}

fn form_recognition(symbol_id: Option<&str>, form: Form) -> Question {
    Question {
        question_type: QuestionType::FormRecognition,
        symbol_id: symbol_id.map(str::to_string),
        form: Some(form),
        options: Form::ALL.iter().map(|f| f.label().to_string()).collect(),
        correct_answer: form.label().to_string(),
        word: None,
        vocabulary_id: None,
        target_index: None,
    }
}
