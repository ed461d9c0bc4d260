//! End-to-end behaviour of a drill session and its stores.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use harf_drill::config::SelectionWeights;
use harf_drill::vocabulary::known_symbols;
use harf_drill::{
    AttemptContext, DrillConfig, DrillSession, Form, ImportFormat, MasteryLevel, MasteryStore,
    QuestionType, Vocabulary, VocabularySelector,
};

fn session(seed: u64) -> DrillSession {
    DrillSession::with_seed(DrillConfig::default(), seed).unwrap()
}

fn standalone(store: &mut MasteryStore, id: &str, form: Form, correct: bool) {
    store.record_attempt(id, form, correct, AttemptContext::Standalone, None, None, Utc::now());
}

#[test]
fn test_every_question_has_four_options_with_answer() {
    let mut s = session(1);
    let mut seen_types = HashSet::new();
    for i in 0..250 {
        let q = s.next_question();
        assert_eq!(q.options.len(), 4, "question {i}: {q:?}");
        assert!(q.options.contains(&q.correct_answer), "question {i}: {q:?}");
        let distinct: HashSet<&String> = q.options.iter().collect();
        assert_eq!(distinct.len(), 4, "question {i}: {q:?}");
        seen_types.insert(q.question_type);

        let answer = if i % 4 == 0 {
            q.options.iter().find(|o| **o != q.correct_answer).cloned().unwrap()
        } else {
            q.correct_answer.clone()
        };
        s.submit_answer(&q, &answer, Some(1500.0));
    }
    assert!(seen_types.len() >= 3, "{seen_types:?}");
}

#[test]
fn test_word_reading_questions_point_at_their_symbol() {
    let mut s = session(2);
    let mut checked = 0;
    for _ in 0..400 {
        let q = s.next_question();
        if q.question_type == QuestionType::WordReading {
            let word = q.word.as_ref().unwrap();
            let index = q.target_index.unwrap();
            let symbol = s.alphabet().get(q.symbol_id.as_deref().unwrap()).unwrap();
            let ch = word.text.chars().nth(index).unwrap();
            let glyph_match = Form::ALL
                .iter()
                .any(|f| symbol.glyph(*f).contains(ch))
                || symbol.aliases.iter().any(|a| a.contains(ch));
            assert!(glyph_match, "{q:?}");
            assert!(q.vocabulary_id.is_some());
            checked += 1;
        }
        let answer = q.correct_answer.clone();
        s.submit_answer(&q, &answer, Some(900.0));
    }
    assert!(checked > 0);
}

#[test]
fn test_selector_only_offers_words_over_known_symbols() {
    let mut mastery = MasteryStore::new();
    for id in ["alef", "beh", "dal", "reh"] {
        for _ in 0..3 {
            standalone(&mut mastery, id, Form::Isolated, true);
        }
    }
    standalone(&mut mastery, "sin", Form::Isolated, false);

    let known = known_symbols(&mastery);
    assert!(!known.contains("sin"));

    let mut selector =
        VocabularySelector::new(Arc::new(Vocabulary::persian()), SelectionWeights::default());
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut shown: Vec<String> = Vec::new();
    for _ in 0..30 {
        let item = selector
            .select_next(&mastery, shown.as_slice(), &mut rng, Utc::now())
            .expect("words over alef, beh, dal and reh exist");
        assert!(item.required_symbols.iter().all(|s| known.contains(s)), "{item:?}");
        shown.push(item.id);
    }
}

#[test]
fn test_selector_returns_none_without_known_symbols() {
    let mastery = MasteryStore::new();
    let mut selector =
        VocabularySelector::new(Arc::new(Vocabulary::persian()), SelectionWeights::default());
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let shown: Vec<String> = Vec::new();
    assert!(selector
        .select_next(&mastery, shown.as_slice(), &mut rng, Utc::now())
        .is_none());
}

#[test]
fn test_export_import_round_trip() {
    let mut s = session(3);
    for _ in 0..120 {
        let q = s.next_question();
        let answer = q.correct_answer.clone();
        s.submit_answer(&q, &answer, Some(1100.0));
    }
    let json = s.export_progress().unwrap();

    let mut restored = session(4);
    assert_eq!(restored.import_progress(&json).unwrap(), ImportFormat::Envelope);
    assert_eq!(restored.mastery().len(), s.mastery().len());
    for m in s.mastery().iter() {
        let other = restored.mastery().symbol_mastery(&m.symbol_id).unwrap();
        assert_eq!(other.forms, m.forms);
        assert_eq!(other.confused_with, m.confused_with);
        assert!((other.overall_mastery - m.overall_mastery).abs() < 1e-6);
    }
    assert_eq!(restored.selector().snapshot(), s.selector().snapshot());
}

#[test]
fn test_legacy_import_keeps_word_progress() {
    let mut s = session(5);
    let now = Utc::now();
    s.submit_answer(
        &harf_drill::Question {
            question_type: QuestionType::WordReading,
            symbol_id: Some("alef".into()),
            form: Some(Form::Isolated),
            options: vec!["alef".into(), "beh".into(), "dal".into(), "sin".into()],
            correct_answer: "alef".into(),
            word: None,
            vocabulary_id: Some("ab".into()),
            target_index: Some(0),
        },
        "alef",
        Some(700.0),
    );

    let mut donor = MasteryStore::new();
    donor.record_attempt("mim", Form::Final, true, AttemptContext::Standalone, None, None, now);
    let legacy = donor.serialize().unwrap();

    assert_eq!(s.import_progress(&legacy).unwrap(), ImportFormat::Legacy);
    assert!(s.mastery().symbol_mastery("mim").is_some());
    assert!(s.mastery().symbol_mastery("alef").is_none());
    assert_eq!(s.selector().progress("ab").unwrap().times_presented, 1);
}

#[test]
fn test_alternating_outcomes_window() {
    let mut store = MasteryStore::new();
    for i in 0..6 {
        standalone(&mut store, "nun", Form::Medial, i % 2 == 0);
    }
    let fm = store.form_mastery("nun", Form::Medial).unwrap();
    assert_eq!(fm.recent_accuracy.iter().copied().collect::<Vec<u8>>(), vec![0, 1, 0, 1, 0]);
    assert_eq!(fm.exposures, 6);
    assert_eq!(fm.correct_answers, 3);
}

#[test]
fn test_perfect_run_reaches_mastered() {
    let mut store = MasteryStore::new();
    for i in 0..20 {
        standalone(&mut store, "lam", Form::ALL[i % 4], true);
    }
    let m = store.symbol_mastery("lam").unwrap();
    assert!(m.overall_mastery > 0.95);
    assert_eq!(m.mastery_level, MasteryLevel::Mastered);
    assert_eq!(m.mastery_level.as_u8(), 3);
}

#[test]
fn test_weak_pairs_rank_first() {
    let mut store = MasteryStore::new();
    for _ in 0..4 {
        standalone(&mut store, "kaf", Form::Initial, false);
        standalone(&mut store, "heh", Form::Final, true);
    }
    let ranked = store.symbols_needing_practice(10, Utc::now());
    assert_eq!(ranked.len(), 2);
    assert_eq!((ranked[0].symbol_id.as_str(), ranked[0].form), ("kaf", Form::Initial));
    assert_eq!((ranked[1].symbol_id.as_str(), ranked[1].form), ("heh", Form::Final));
}

#[test]
fn test_confusions_accumulate_per_form() {
    let mut store = MasteryStore::new();
    let now = Utc::now();
    for _ in 0..3 {
        store.record_attempt("beh", Form::Initial, false, AttemptContext::Standalone, Some("teh"), Some(Form::Initial), now);
    }
    store.record_attempt("beh", Form::Final, false, AttemptContext::InWord, Some("teh"), Some(Form::Final), now);
    // correct answers never add confusions
    store.record_attempt("beh", Form::Final, true, AttemptContext::InWord, Some("teh"), Some(Form::Final), now);

    let pairs = store.confusion_pairs("beh");
    assert_eq!(pairs.len(), 2);
    let initial = pairs.iter().find(|p| p.form == Some(Form::Initial)).unwrap();
    let final_form = pairs.iter().find(|p| p.form == Some(Form::Final)).unwrap();
    assert_eq!(initial.count, 3);
    assert_eq!(final_form.count, 1);
}

#[test]
fn test_stale_mastery_decays_with_recency() {
    let mut store = MasteryStore::new();
    let then = Utc::now() - Duration::hours(72);
    store.record_attempt("zeh", Form::Isolated, true, AttemptContext::Standalone, None, None, then);
    let fresh = store.symbols_needing_practice(1, then)[0].score;
    let stale = store.symbols_needing_practice(1, Utc::now())[0].score;
    assert!((fresh - 1.0).abs() < 1e-9);
    assert!((stale - 0.5).abs() < 1e-9);
}
