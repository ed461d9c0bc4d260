//! Gradual widening of the active symbol set.

use std::collections::HashSet;

use crate::mastery::MasteryStore;

const MIN_EXPOSURES: u32 = 5;
const EXPOSED_SHARE: f64 = 0.8;
const MAX_SUGGESTIONS: usize = 2;

/// Introduction groups restricted to the enabled symbols.
///
/// Enabled symbols that no group mentions form one trailing group; groups left
/// empty by the restriction are dropped.
pub(crate) fn effective_groups(groups: &[Vec<String>], enabled: &[String]) -> Vec<Vec<String>> {
    if groups.is_empty() {
        return if enabled.is_empty() {
            Vec::new()
        } else {
            vec![enabled.to_vec()]
        };
    }

    let enabled_set: HashSet<&str> = enabled.iter().map(String::as_str).collect();
    let mut grouped = HashSet::new();
    let mut out: Vec<Vec<String>> = Vec::with_capacity(groups.len() + 1);

    for group in groups {
        let mut members = Vec::with_capacity(group.len());
        for id in group {
            if enabled_set.contains(id.as_str()) && grouped.insert(id.as_str()) {
                members.push(id.clone());
            }
        }
        if !members.is_empty() {
            out.push(members);
        }
    }

    let ungrouped: Vec<String> = enabled
        .iter()
        .filter(|id| !grouped.contains(id.as_str()))
        .cloned()
        .collect();
    if !ungrouped.is_empty() {
        out.push(ungrouped);
    }
    out
}

/// Symbols currently eligible for questions.
///
/// The first group is always active. Each later group opens once 80% of the
/// active symbols have at least five exposures and the mean accuracy of those
/// symbols reaches `min_mastery`; the first group that fails stops the scan.
pub(crate) fn active_symbols(
    groups: &[Vec<String>],
    mastery: &MasteryStore,
    min_mastery: f64,
) -> Vec<String> {
    let mut groups = groups.iter();
    let mut active: Vec<String> = match groups.next() {
        Some(first) => first.clone(),
        None => return Vec::new(),
    };

    for (i, group) in groups.enumerate() {
        if !ready_for_next_group(&active, mastery, min_mastery) {
            break;
        }
        tracing::debug!(group = i + 2, size = group.len(), "activating symbol group");
        active.extend(group.iter().cloned());
    }
    active
}

fn ready_for_next_group(active: &[String], mastery: &MasteryStore, min_mastery: f64) -> bool {
    let exposed: Vec<f64> = active
        .iter()
        .filter_map(|id| mastery.symbol_mastery(id))
        .filter(|m| m.total_exposures() >= MIN_EXPOSURES)
        .map(|m| m.aggregate_accuracy())
        .collect();

    if exposed.is_empty() || (exposed.len() as f64) < EXPOSED_SHARE * active.len() as f64 {
        return false;
    }
    let mean = exposed.iter().sum::<f64>() / exposed.len() as f64;
    mean >= min_mastery
}

/// Up to two not-yet-active members of the first group that has any.
pub(crate) fn suggest_next(groups: &[Vec<String>], active: &[String]) -> Vec<String> {
    let active: HashSet<&str> = active.iter().map(String::as_str).collect();
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .filter(|id| !active.contains(id.as_str()))
                .take(MAX_SUGGESTIONS)
                .cloned()
                .collect::<Vec<_>>()
        })
        .find(|pending| !pending.is_empty())
        .unwrap_or_default()
}
