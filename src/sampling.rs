//! Randomised selection helpers shared by the generator and the selector.

use rand::seq::SliceRandom;
use rand::Rng;

/// Draws one item with probability proportional to `weight(item)`.
///
/// Non-finite and non-positive weights never win. Returns `None` when no item
/// carries positive weight.
pub fn weighted_choice<'a, T, R, F>(items: &'a [T], weight: F, rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> f64,
{
    weighted_index(items, weight, rng).map(|i| &items[i])
}

pub fn weighted_index<T, R, F>(items: &[T], weight: F, rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> f64,
{
    let weights: Vec<f64> = items.iter().map(|item| sanitize(weight(item))).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut remaining = rng.random::<f64>() * total;
    let mut last_positive = None;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        last_positive = Some(i);
        remaining -= w;
        if remaining <= 0.0 {
            return Some(i);
        }
    }
    // Float drift can leave a sliver of weight unspent.
    last_positive
}

/// Picks uniformly among the first `k` items of an already ranked slice.
pub fn choose_top_k<'a, T, R>(ranked: &'a [T], k: usize, rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    let pool = k.min(ranked.len());
    weighted_choice(&ranked[..pool], |_| 1.0, rng)
}

/// Returns a uniformly permuted copy.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}
