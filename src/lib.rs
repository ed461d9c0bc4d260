//! # harf-drill - adaptive alphabet and vocabulary drilling
//!
//! Tracks how well a learner knows each symbol of a script in each of its
//! positional forms, and uses that to decide what to ask next.
//!
//! - **Mastery tracking** - per-form counters, a sliding window of recent
//!   outcomes, recency-weighted overall scores and confusion pairs
//! - **Question generation** - five question types, progressive symbol
//!   groups, confusion-aware distractors
//! - **Word selection** - vocabulary restricted to known symbols, scored on
//!   novelty, difficulty, frequency, spacing and category variety
//!
//! ## Modules
//!
//! - [`dataset`] - alphabet and vocabulary tables
//! - [`analyzer`] - which symbol, in which form, sits at each position of a word
//! - [`mastery`] - the symbol mastery store
//! - [`word_mastery`] - the word mastery store
//! - [`vocabulary`] - progressive word selection
//! - [`generator`] - question generation
//! - [`persistence`] - progress export and import
//! - [`session`] - the learner-facing façade tying everything together
//! - [`config`] - tunables, with environment overrides
//! - [`logging`] - builds the tracing subscriber a binary installs
//!
//! ## Example
//!
//! ```rust
//! use harf_drill::{DrillConfig, DrillSession};
//!
//! let mut session = DrillSession::with_seed(DrillConfig::default(), 7).unwrap();
//! let question = session.next_question();
//! let answer = question.correct_answer.clone();
//! let outcome = session.submit_answer(&question, &answer, Some(1500.0));
//! assert!(outcome.correct);
//! ```

pub mod analyzer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod logging;
pub mod mastery;
pub mod persistence;
pub mod sampling;
pub mod session;
pub mod types;
pub mod vocabulary;
pub mod word_mastery;

pub use analyzer::{SymbolAnalyzer, SymbolOccurrence};
pub use config::{
    DrillConfig, GeneratorConfig, LoggingConfig, QuizTypeWeights, SelectionWeights, TypeWeights,
};
pub use dataset::{Alphabet, Vocabulary};
pub use error::{DrillError, Result};
pub use generator::QuestionGenerator;
pub use mastery::{
    ConfusionPair, FormMastery, MasteryStore, PracticeCandidate, SymbolMastery, MAX_RECENT_OUTCOMES,
};
pub use persistence::{ImportFormat, ImportedProgress};
pub use session::{AnswerOutcome, DrillSession};
pub use types::*;
pub use vocabulary::{ProgressionSnapshot, VocabularySelector, WordProgress};
pub use word_mastery::{WordMastery, WordMasteryStore, WordStats};
