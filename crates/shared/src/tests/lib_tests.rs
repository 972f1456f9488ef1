use std::str::FromStr;

use crate::{
    domain::{Fact, FactCategory, Language},
    error::FactError,
};

#[test]
fn fact_equality_is_textual() {
    let a = Fact::new("Bees can recognize human faces.", FactCategory::Animals);
    let b = Fact::new("Bees can recognize human faces.", FactCategory::Random).with_favorite(true);
    assert_eq!(a, b);

    let c = Fact::new("Honey never spoils.", FactCategory::Animals);
    assert_ne!(a, c);
}

#[test]
fn with_helpers_replace_whole_records() {
    let fact = Fact::new("Octopuses have three hearts.", FactCategory::Animals);

    let favorited = fact.with_favorite(true);
    assert!(favorited.is_favorite);
    assert!(!fact.is_favorite);

    let translated = favorited.with_translation("Los pulpos tienen tres corazones.".into(), Language::Spanish);
    assert_eq!(translated.translation_language, Some(Language::Spanish));
    assert!(translated.is_favorite);
    assert_eq!(translated.display_text(), "Los pulpos tienen tres corazones.");

    let reset = translated.without_translation();
    assert!(reset.translated_text.is_none());
    assert!(reset.translation_language.is_none());
    assert_eq!(reset.display_text(), "Octopuses have three hearts.");
}

#[test]
fn category_parsing_is_case_insensitive() {
    assert_eq!(
        FactCategory::from_str("Animals").expect("parse"),
        FactCategory::Animals
    );
    assert_eq!(
        FactCategory::from_str(" science ").expect("parse"),
        FactCategory::Science
    );
    assert!(matches!(
        FactCategory::from_str("cooking"),
        Err(FactError::CategoryNotFound(_))
    ));
}

#[test]
fn filtered_categories_carry_keyword_sets() {
    for category in [FactCategory::Animals, FactCategory::History, FactCategory::Science] {
        let keywords = category.keywords().expect("filtered category");
        assert!(!keywords.is_empty());
    }
    for category in [
        FactCategory::Random,
        FactCategory::General,
        FactCategory::Interesting,
        FactCategory::Surprising,
    ] {
        assert!(category.keywords().is_none());
    }
}

#[test]
fn language_codes_round_trip() {
    for language in Language::ALL {
        assert_eq!(Language::from_code(language.code()), Some(language));
    }
    assert_eq!(Language::from_code("fr"), None);
}

#[test]
fn fact_serializes_without_empty_translation_fields() {
    let fact = Fact::new("Sloths can hold their breath for 40 minutes.", FactCategory::Animals);
    let raw = serde_json::to_string(&fact).expect("serialize");
    assert!(!raw.contains("translated_text"));

    let restored: Fact = serde_json::from_str(&raw).expect("deserialize");
    assert_eq!(restored, fact);
    assert!(!restored.is_favorite);
}
