use serde::{Deserialize, Serialize};

/// Positional rendering of a symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    #[default]
    Isolated,
    Initial,
    Medial,
    Final,
}

impl Form {
    /// Declaration order; also the tie-break order wherever forms are ranked.
    pub const ALL: [Form; 4] = [Form::Isolated, Form::Initial, Form::Medial, Form::Final];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Isolated => "isolated",
            Self::Initial => "initial",
            Self::Medial => "medial",
            Self::Final => "final",
        }
    }

    /// Capitalised name, as shown in form-recognition options.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Isolated => "Isolated",
            Self::Initial => "Initial",
            Self::Medial => "Medial",
            Self::Final => "Final",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "isolated" => Some(Self::Isolated),
            "initial" => Some(Self::Initial),
            "medial" => Some(Self::Medial),
            "final" => Some(Self::Final),
            _ => None,
        }
    }

    /// Weight of this form in the overall mastery mean.
    pub fn mastery_weight(&self) -> f64 {
        match self {
            Self::Isolated => 0.30,
            Self::Initial => 0.25,
            Self::Medial => 0.20,
            Self::Final => 0.25,
        }
    }
}

/// Coarse proficiency bucket. Persisted as the integers 0..=3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MasteryLevel {
    #[default]
    Learning,
    Familiar,
    Proficient,
    Mastered,
}

impl MasteryLevel {
    pub const FAMILIAR_THRESHOLD: f64 = 0.60;
    pub const PROFICIENT_THRESHOLD: f64 = 0.80;
    pub const MASTERED_THRESHOLD: f64 = 0.95;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::MASTERED_THRESHOLD {
            Self::Mastered
        } else if score >= Self::PROFICIENT_THRESHOLD {
            Self::Proficient
        } else if score >= Self::FAMILIAR_THRESHOLD {
            Self::Familiar
        } else {
            Self::Learning
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Learning => 0,
            Self::Familiar => 1,
            Self::Proficient => 2,
            Self::Mastered => 3,
        }
    }
}

impl From<MasteryLevel> for u8 {
    fn from(level: MasteryLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for MasteryLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Learning),
            1 => Ok(Self::Familiar),
            2 => Ok(Self::Proficient),
            3 => Ok(Self::Mastered),
            other => Err(format!("mastery level out of range: {other}")),
        }
    }
}

/// Where an attempt happened: a bare glyph, or a glyph inside a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptContext {
    #[default]
    Standalone,
    InWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    LetterRecognition,
    NameToLetter,
    FormRecognition,
    WordContext,
    WordReading,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::LetterRecognition,
        QuestionType::NameToLetter,
        QuestionType::FormRecognition,
        QuestionType::WordContext,
        QuestionType::WordReading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LetterRecognition => "letterRecognition",
            Self::NameToLetter => "nameToLetter",
            Self::FormRecognition => "formRecognition",
            Self::WordContext => "wordContext",
            Self::WordReading => "wordReading",
        }
    }

    /// Word-based questions test a symbol inside a word.
    pub fn context(&self) -> AttemptContext {
        match self {
            Self::WordContext | Self::WordReading => AttemptContext::InWord,
            _ => AttemptContext::Standalone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleWord {
    pub word: String,
    pub transliteration: String,
    pub meaning: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
}

fn default_difficulty() -> u8 {
    1
}

/// One alphabet character with its four positional glyphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub id: String,
    pub isolated: String,
    pub initial: String,
    pub medial: String,
    #[serde(rename = "final")]
    pub final_form: String,
    #[serde(rename = "nameEn")]
    pub name: String,
    #[serde(rename = "nameFa", default)]
    pub native_name: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub example_words: Vec<ExampleWord>,
    /// Extra glyphs that render this symbol (ligature variants and the like).
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Symbol {
    pub fn glyph(&self, form: Form) -> &str {
        match form {
            Form::Isolated => &self.isolated,
            Form::Initial => &self.initial,
            Form::Medial => &self.medial,
            Form::Final => &self.final_form,
        }
    }

    /// Value of this symbol for the given distractor property.
    pub fn property(&self, property: SymbolProperty) -> &str {
        match property {
            SymbolProperty::Name => &self.name,
            SymbolProperty::Glyph(form) => self.glyph(form),
        }
    }

    /// Which form renders as exactly this text, first match in declaration order.
    pub fn form_of(&self, text: &str) -> Option<Form> {
        Form::ALL.into_iter().find(|form| self.glyph(*form) == text)
    }
}

/// Field of a symbol that answers and distractors are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolProperty {
    Name,
    Glyph(Form),
}

/// A whole-word exercise, unlocked once all of its symbols are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    pub id: String,
    #[serde(rename = "persian")]
    pub text: String,
    #[serde(rename = "persianWithDiacritics", default, skip_serializing_if = "Option::is_none")]
    pub text_with_diacritics: Option<String>,
    pub transliteration: String,
    pub meaning: String,
    #[serde(rename = "requiredLetters")]
    pub required_symbols: Vec<String>,
    pub difficulty: u8,
    pub category: String,
    pub frequency: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordData {
    pub text: String,
    pub transliteration: String,
    pub meaning: String,
}

impl From<&ExampleWord> for WordData {
    fn from(word: &ExampleWord) -> Self {
        Self {
            text: word.word.clone(),
            transliteration: word.transliteration.clone(),
            meaning: word.meaning.clone(),
        }
    }
}

impl From<&VocabularyItem> for WordData {
    fn from(item: &VocabularyItem) -> Self {
        Self {
            text: item.text.clone(),
            transliteration: item.transliteration.clone(),
            meaning: item.meaning.clone(),
        }
    }
}

/// A fully formed multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub symbol_id: Option<String>,
    pub form: Option<Form>,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<WordData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_index: Option<usize>,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    pub fn tests(&self, symbol_id: &str, form: Form) -> bool {
        self.symbol_id.as_deref() == Some(symbol_id) && self.form == Some(form)
    }
}
