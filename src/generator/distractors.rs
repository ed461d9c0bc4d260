use rand::Rng;

use crate::dataset::Alphabet;
use crate::mastery::MasteryStore;
use crate::sampling::shuffled;
use crate::types::SymbolProperty;

const MAX_PAD_ATTEMPTS: usize = 50;

/// Wrong answers for a question about `symbol_id`.
///
/// Values of symbols the learner confused with the target come first, then
/// random other enabled symbols fill the remaining slots. Never contains
/// `correct` or duplicates; may come back short when too few distinct values
/// exist.
#[allow(clippy::too_many_arguments)]
pub(crate) fn smart_distractors<R: Rng + ?Sized>(
    alphabet: &Alphabet,
    enabled: &[String],
    mastery: &MasteryStore,
    symbol_id: &str,
    property: SymbolProperty,
    correct: &str,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(count);
    let accept = |value: &str, out: &mut Vec<String>| {
        if !value.is_empty() && value != correct && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    };

    for pair in mastery.confusion_pairs(symbol_id) {
        if out.len() >= count {
            break;
        }
        if let Some(symbol) = alphabet.get(&pair.symbol_id) {
            accept(symbol.property(property), &mut out);
        }
    }

    let others: Vec<&String> = enabled.iter().filter(|id| *id != symbol_id).collect();
    for id in shuffled(&others, rng).into_iter().take(MAX_PAD_ATTEMPTS) {
        if out.len() >= count {
            break;
        }
        if let Some(symbol) = alphabet.get(id) {
            accept(symbol.property(property), &mut out);
        }
    }

    out.truncate(count);
    out
}
