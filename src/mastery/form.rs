use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blended_accuracy;
use crate::error::{DrillError, Result};
use crate::types::Form;

pub const MAX_RECENT_OUTCOMES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMastery {
    pub form: Form,
    pub exposures: u32,
    pub correct_answers: u32,
    /// Last outcomes as 1/0, oldest first.
    pub recent_accuracy: VecDeque<u8>,
    pub last_seen: DateTime<Utc>,
}

impl FormMastery {
    pub fn new(form: Form, now: DateTime<Utc>) -> Self {
        Self {
            form,
            exposures: 0,
            correct_answers: 0,
            recent_accuracy: VecDeque::with_capacity(MAX_RECENT_OUTCOMES),
            last_seen: now,
        }
    }

    pub(crate) fn record(&mut self, correct: bool, now: DateTime<Utc>) {
        self.exposures += 1;
        if correct {
            self.correct_answers += 1;
        }
        self.last_seen = now;
        push_outcome(&mut self.recent_accuracy, correct);
    }

    /// `0.7 × recent + 0.3 × lifetime`, zero when never attempted.
    pub fn accuracy(&self) -> f64 {
        blended_accuracy(
            self.recent_accuracy.iter(),
            self.correct_answers,
            self.exposures,
        )
    }

    /// Plain lifetime ratio.
    pub fn overall_accuracy(&self) -> f64 {
        if self.exposures == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.exposures as f64
        }
    }

    pub fn is_attempted(&self) -> bool {
        self.exposures > 0
    }

    pub(crate) fn validate(&self, symbol_id: &str) -> Result<()> {
        if self.correct_answers > self.exposures {
            return Err(DrillError::InvalidData(format!(
                "{symbol_id}/{}: {} correct answers exceed {} exposures",
                self.form.as_str(),
                self.correct_answers,
                self.exposures
            )));
        }
        validate_window(&self.recent_accuracy, symbol_id)
    }
}

pub(crate) fn push_outcome(window: &mut VecDeque<u8>, correct: bool) {
    window.push_back(u8::from(correct));
    while window.len() > MAX_RECENT_OUTCOMES {
        window.pop_front();
    }
}

pub(crate) fn validate_window(window: &VecDeque<u8>, owner: &str) -> Result<()> {
    if window.len() > MAX_RECENT_OUTCOMES {
        return Err(DrillError::InvalidData(format!(
            "{owner}: recent window holds {} entries (max {MAX_RECENT_OUTCOMES})",
            window.len()
        )));
    }
    if window.iter().any(|&v| v > 1) {
        return Err(DrillError::InvalidData(format!(
            "{owner}: recent window entries must be 0 or 1"
        )));
    }
    Ok(())
}

/// The four positional records of one symbol; every form is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSet {
    pub isolated: FormMastery,
    pub initial: FormMastery,
    pub medial: FormMastery,
    #[serde(rename = "final")]
    pub final_form: FormMastery,
}

impl FormSet {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            isolated: FormMastery::new(Form::Isolated, now),
            initial: FormMastery::new(Form::Initial, now),
            medial: FormMastery::new(Form::Medial, now),
            final_form: FormMastery::new(Form::Final, now),
        }
    }

    pub fn get(&self, form: Form) -> &FormMastery {
        match form {
            Form::Isolated => &self.isolated,
            Form::Initial => &self.initial,
            Form::Medial => &self.medial,
            Form::Final => &self.final_form,
        }
    }

    pub(crate) fn get_mut(&mut self, form: Form) -> &mut FormMastery {
        match form {
            Form::Isolated => &mut self.isolated,
            Form::Initial => &mut self.initial,
            Form::Medial => &mut self.medial,
            Form::Final => &mut self.final_form,
        }
    }

    /// Forms in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FormMastery> {
        Form::ALL.into_iter().map(move |form| self.get(form))
    }

    pub fn total_exposures(&self) -> u32 {
        self.iter().map(|f| f.exposures).sum()
    }

    pub fn total_correct(&self) -> u32 {
        self.iter().map(|f| f.correct_answers).sum()
    }
}
