//! Property-based tests for the mastery stores
//!
//! Tests the following invariants:
//! - Counters: correct answers never exceed exposures, exposures count every attempt
//! - Window: the recent-outcome window holds at most five entries, newest last
//! - Scores: overall mastery stays in [0, 1] and matches its level
//! - Persistence: serialize -> restore preserves every counter

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use harf_drill::{
    AttemptContext, Form, MasteryLevel, MasteryStore, WordMasteryStore, MAX_RECENT_OUTCOMES,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

const IDS: [&str; 4] = ["alef", "beh", "sin", "mim"];

#[derive(Debug, Clone)]
struct Attempt {
    symbol: usize,
    form: Form,
    correct: bool,
    in_word: bool,
    confused: Option<usize>,
    minutes: i64,
}

fn arb_form() -> impl Strategy<Value = Form> {
    prop_oneof![
        Just(Form::Isolated),
        Just(Form::Initial),
        Just(Form::Medial),
        Just(Form::Final),
    ]
}

fn arb_attempt() -> impl Strategy<Value = Attempt> {
    (
        0..IDS.len(),
        arb_form(),
        any::<bool>(),
        any::<bool>(),
        proptest::option::of(0..IDS.len()),
        0i64..=600,
    )
        .prop_map(|(symbol, form, correct, in_word, confused, minutes)| Attempt {
            symbol,
            form,
            correct,
            in_word,
            confused,
            minutes,
        })
}

fn replay(attempts: &[Attempt]) -> (MasteryStore, chrono::DateTime<Utc>) {
    let mut now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let mut store = MasteryStore::new();
    for a in attempts {
        now += Duration::minutes(a.minutes);
        let context = if a.in_word {
            AttemptContext::InWord
        } else {
            AttemptContext::Standalone
        };
        let confused = a.confused.map(|i| IDS[i]);
        store.record_attempt(IDS[a.symbol], a.form, a.correct, context, confused, Some(a.form), now);
    }
    (store, now)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_counters_stay_consistent(attempts in prop::collection::vec(arb_attempt(), 1..80)) {
        let (store, _) = replay(&attempts);

        for (i, id) in IDS.iter().enumerate() {
            let expected: usize = attempts.iter().filter(|a| a.symbol == i).count();
            match store.symbol_mastery(id) {
                None => prop_assert_eq!(expected, 0),
                Some(m) => {
                    prop_assert_eq!(m.total_exposures() as usize, expected);
                    for fm in m.forms.iter() {
                        prop_assert!(fm.correct_answers <= fm.exposures);
                        prop_assert!(fm.recent_accuracy.len() <= MAX_RECENT_OUTCOMES);
                        prop_assert!(fm.recent_accuracy.len() <= fm.exposures as usize);
                        prop_assert!(fm.recent_accuracy.iter().all(|v| *v <= 1));
                    }
                }
            }
        }
    }

    #[test]
    fn prop_window_tracks_latest_outcomes(attempts in prop::collection::vec(arb_attempt(), 1..60)) {
        let (store, _) = replay(&attempts);

        for (i, id) in IDS.iter().enumerate() {
            for form in Form::ALL {
                let outcomes: Vec<u8> = attempts
                    .iter()
                    .filter(|a| a.symbol == i && a.form == form)
                    .map(|a| a.correct as u8)
                    .collect();
                let skip = outcomes.len().saturating_sub(MAX_RECENT_OUTCOMES);
                if let Some(fm) = store.form_mastery(id, form) {
                    let window: Vec<u8> = fm.recent_accuracy.iter().copied().collect();
                    prop_assert_eq!(window, outcomes[skip..].to_vec());
                }
            }
        }
    }

    #[test]
    fn prop_overall_mastery_bounded(attempts in prop::collection::vec(arb_attempt(), 1..80)) {
        let (store, _) = replay(&attempts);

        for m in store.iter() {
            prop_assert!((0.0..=1.0).contains(&m.overall_mastery));
            prop_assert_eq!(m.mastery_level, MasteryLevel::from_score(m.overall_mastery));
            prop_assert!((0.0..=1.0).contains(&m.contextual_mastery.in_words));
            prop_assert!((0.0..=1.0).contains(&m.contextual_mastery.standalone));
            for pair in &m.confused_with {
                prop_assert!(pair.count >= 1);
            }
        }
    }

    #[test]
    fn prop_restore_preserves_counters(attempts in prop::collection::vec(arb_attempt(), 1..50)) {
        let (mut store, now) = replay(&attempts);
        let json = store.serialize().unwrap();
        let restored = MasteryStore::restore(&json, now).unwrap();
        store.recompute_all(now);

        prop_assert_eq!(restored.len(), store.len());
        for m in store.iter() {
            let r = restored.symbol_mastery(&m.symbol_id).unwrap();
            prop_assert_eq!(&r.forms, &m.forms);
            prop_assert_eq!(&r.confused_with, &m.confused_with);
            prop_assert!((r.overall_mastery - m.overall_mastery).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_word_counters_consistent(outcomes in prop::collection::vec((0usize..3, any::<bool>(), 200.0f64..5000.0), 1..60)) {
        let words = ["ab", "bad", "dar"];
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut store = WordMasteryStore::new();
        for (i, correct, latency) in &outcomes {
            store.record_attempt(words[*i], *correct, Some(*latency), now);
        }

        for (i, id) in words.iter().enumerate() {
            let mine: Vec<&(usize, bool, f64)> = outcomes.iter().filter(|o| o.0 == i).collect();
            match store.word_mastery(id) {
                None => prop_assert!(mine.is_empty()),
                Some(w) => {
                    prop_assert_eq!(w.exposures as usize, mine.len());
                    prop_assert!(w.correct_answers <= w.exposures);
                    prop_assert!(w.recent_accuracy.len() <= MAX_RECENT_OUTCOMES);
                    let mean = mine.iter().map(|o| o.2).sum::<f64>() / mine.len() as f64;
                    prop_assert!((w.average_response_time - mean).abs() < 1e-6);
                    prop_assert!((0.0..=1.0).contains(&w.overall_mastery));
                }
            }
        }
    }
}
