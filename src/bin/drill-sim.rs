//! Drives a session with a simulated learner and logs how mastery evolves.
//!
//! Environment:
//! - `DRILL_SIM_QUESTIONS` - number of questions to ask (default 300)
//! - `DRILL_SIM_SEED` - RNG seed for both the session and the learner (default 7)
//! - `DRILL_SIM_SKILL` - probability the learner answers correctly (default 0.8)
//! - `DRILL_SIM_EXPORT` - path to write the final progress export to
//! - `DRILL_LOG_LEVEL`, `DRILL_LOG_FILE`, `DRILL_LOG_DIR`, `DRILL_LOG_FILE_PREFIX` -
//!   the `logging` section of [`DrillConfig`]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use harf_drill::logging::build_subscriber;
use harf_drill::{DrillConfig, DrillError, DrillSession, QuestionType};

struct SimConfig {
    questions: usize,
    seed: u64,
    skill: f64,
    export_path: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            questions: 300,
            seed: 7,
            skill: 0.8,
            export_path: None,
        }
    }
}

impl SimConfig {
    fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = std::env::var("DRILL_SIM_QUESTIONS") {
            config.questions = val.parse().unwrap_or(config.questions);
        }
        if let Ok(val) = std::env::var("DRILL_SIM_SEED") {
            config.seed = val.parse().unwrap_or(config.seed);
        }
        if let Ok(val) = std::env::var("DRILL_SIM_SKILL") {
            config.skill = val.parse::<f64>().unwrap_or(config.skill).clamp(0.0, 1.0);
        }
        config.export_path = std::env::var("DRILL_SIM_EXPORT").ok();
        config
    }
}

fn main() {
    let sim = SimConfig::from_env();
    let config = DrillConfig::from_env();

    let _log_guard = match build_subscriber(&config.logging) {
        Ok((subscriber, guard)) => {
            if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                eprintln!("failed to install tracing subscriber: {e}");
            }
            guard
        }
        Err(e) => {
            eprintln!("invalid logging configuration: {e}");
            std::process::exit(1);
        }
    };

    let mut session = match DrillSession::with_seed(config, sim.seed) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "invalid drill configuration");
            std::process::exit(1);
        }
    };
    let mut learner = ChaCha8Rng::seed_from_u64(sim.seed.wrapping_add(1));

    let mut correct = 0usize;
    let mut word_questions = 0usize;
    for i in 0..sim.questions {
        let question = session.next_question();
        if question.question_type == QuestionType::WordReading {
            word_questions += 1;
        }

        let answer = if learner.random::<f64>() < sim.skill {
            question.correct_answer.clone()
        } else {
            question
                .options
                .iter()
                .find(|o| **o != question.correct_answer)
                .cloned()
                .unwrap_or_default()
        };
        let latency = learner.random_range(600.0..4000.0);
        let outcome = session.submit_answer(&question, &answer, Some(latency));
        if outcome.correct {
            correct += 1;
        }

        if (i + 1) % 50 == 0 {
            tracing::info!(
                asked = i + 1,
                active = session.active_symbols().len(),
                average_mastery = session.mastery().average_mastery(&session.active_symbols()),
                "progress"
            );
        }
    }

    let words = session.word_stats();
    tracing::info!(
        asked = sim.questions,
        correct,
        word_questions,
        active = session.active_symbols().len(),
        words_practiced = words.practiced,
        words_mastered = words.mastered,
        "simulation finished"
    );
    for m in session.mastery().iter() {
        tracing::info!(
            symbol = %m.symbol_id,
            overall = m.overall_mastery,
            level = m.mastery_level.as_u8(),
            confusions = m.confused_with.len(),
            "symbol mastery"
        );
    }
    let next = session.suggest_next_symbols();
    if !next.is_empty() {
        tracing::info!(next = ?next, "suggested next symbols");
    }

    if let Some(path) = sim.export_path {
        let written = session
            .export_progress()
            .and_then(|json| std::fs::write(&path, json).map_err(DrillError::from));
        match written {
            Ok(()) => tracing::info!(path = %path, "progress exported"),
            Err(e) => tracing::error!(error = %e, path = %path, "progress export failed"),
        }
    }
}
