use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::FactError;

const ANIMAL_KEYWORDS: &[&str] = &[
    "animal", "dog", "cat", "bird", "fish", "insect", "mammal", "species", "wolf", "bear",
    "elephant", "whale", "shark", "spider", "snake", "bee", "ant", "horse", "lion", "tiger",
];

const HISTORY_KEYWORDS: &[&str] = &[
    "history", "war", "ancient", "century", "king", "queen", "emperor", "empire", "roman",
    "egypt", "medieval", "revolution", "dynasty", "battle", "historical",
];

const SCIENCE_KEYWORDS: &[&str] = &[
    "science", "scientist", "physics", "chemistry", "biology", "atom", "molecule", "energy",
    "planet", "space", "universe", "cell", "dna", "gravity", "element", "experiment",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    Random,
    General,
    Interesting,
    Surprising,
    Animals,
    History,
    Science,
}

impl FactCategory {
    pub const ALL: [FactCategory; 7] = [
        FactCategory::Random,
        FactCategory::General,
        FactCategory::Interesting,
        FactCategory::Surprising,
        FactCategory::Animals,
        FactCategory::History,
        FactCategory::Science,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FactCategory::Random => "random",
            FactCategory::General => "general",
            FactCategory::Interesting => "interesting",
            FactCategory::Surprising => "surprising",
            FactCategory::Animals => "animals",
            FactCategory::History => "history",
            FactCategory::Science => "science",
        }
    }

    /// Keyword filter applied when fetching for this category.
    ///
    /// `None` means any fact text is acceptable.
    pub fn keywords(&self) -> Option<&'static [&'static str]> {
        match self {
            FactCategory::Animals => Some(ANIMAL_KEYWORDS),
            FactCategory::History => Some(HISTORY_KEYWORDS),
            FactCategory::Science => Some(SCIENCE_KEYWORDS),
            _ => None,
        }
    }
}

impl fmt::Display for FactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FactCategory {
    type Err = FactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        FactCategory::ALL
            .into_iter()
            .find(|category| category.label() == lowered)
            .ok_or_else(|| FactError::CategoryNotFound(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Spanish,
    Russian,
    Swedish,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Spanish, Language::Russian, Language::Swedish];

    /// Language code understood by the translation endpoint.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Spanish => "es",
            Language::Russian => "ru",
            Language::Swedish => "sv",
        }
    }

    /// Locale passed to the speech synthesizer for this language.
    pub fn speech_locale(&self) -> &'static str {
        match self {
            Language::Spanish => "es-ES",
            Language::Russian => "ru-RU",
            Language::Swedish => "sv-SE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let lowered = code.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|language| language.code() == lowered)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single trivia fact.
///
/// Identity is the fact text: two facts with the same text are the same
/// fact regardless of category or annotations. Favorite and translation
/// changes produce a new value via the `with_*` helpers rather than
/// mutating in place, so containers always hold complete records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub text: String,
    pub category: FactCategory,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_language: Option<Language>,
}

impl Fact {
    pub fn new(text: impl Into<String>, category: FactCategory) -> Self {
        Self {
            text: text.into(),
            category,
            is_favorite: false,
            translated_text: None,
            translation_language: None,
        }
    }

    pub fn with_favorite(&self, is_favorite: bool) -> Self {
        Self {
            is_favorite,
            ..self.clone()
        }
    }

    pub fn with_translation(&self, translated_text: String, language: Language) -> Self {
        Self {
            translated_text: Some(translated_text),
            translation_language: Some(language),
            ..self.clone()
        }
    }

    pub fn without_translation(&self) -> Self {
        Self {
            translated_text: None,
            translation_language: None,
            ..self.clone()
        }
    }

    /// Text shown to the user: the translation when one is present.
    pub fn display_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.text)
    }
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Fact {}
