use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub generic_facts_url: String,
    pub keyworded_facts_url: String,
    pub facts_api_key: String,
    pub translate_url: String,
    pub database_url: String,
    pub speech_program: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            generic_facts_url: "https://uselessfacts.jsph.pl".into(),
            keyworded_facts_url: "https://api.api-ninjas.com".into(),
            facts_api_key: String::new(),
            translate_url: "https://translate.googleapis.com".into(),
            database_url: "sqlite://./data/trivia.db".into(),
            speech_program: "espeak-ng".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("trivia.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("generic_facts_url") {
                settings.generic_facts_url = v.clone();
            }
            if let Some(v) = file_cfg.get("keyworded_facts_url") {
                settings.keyworded_facts_url = v.clone();
            }
            if let Some(v) = file_cfg.get("facts_api_key") {
                settings.facts_api_key = v.clone();
            }
            if let Some(v) = file_cfg.get("translate_url") {
                settings.translate_url = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
            if let Some(v) = file_cfg.get("speech_program") {
                settings.speech_program = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("FACTS_API_KEY") {
        settings.facts_api_key = v;
    }
    if let Ok(v) = std::env::var("APP__FACTS_API_KEY") {
        settings.facts_api_key = v;
    }

    if let Ok(v) = std::env::var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Ok(v) = std::env::var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Ok(v) = std::env::var("APP__GENERIC_FACTS_URL") {
        settings.generic_facts_url = v;
    }
    if let Ok(v) = std::env::var("APP__KEYWORDED_FACTS_URL") {
        settings.keyworded_facts_url = v;
    }
    if let Ok(v) = std::env::var("APP__TRANSLATE_URL") {
        settings.translate_url = v;
    }
    if let Ok(v) = std::env::var("APP__SPEECH_PROGRAM") {
        settings.speech_program = v;
    }

    settings.database_url = normalize_database_url(&settings.database_url);
    settings
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            normalize_database_url("./data/facts.db"),
            "sqlite://./data/facts.db"
        );
    }

    #[test]
    fn leaves_memory_and_full_urls_alone() {
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_database_url("sqlite://./data/facts.db"),
            "sqlite://./data/facts.db"
        );
    }

    #[test]
    fn empty_url_falls_back_to_the_default() {
        assert_eq!(
            normalize_database_url("   "),
            Settings::default().database_url
        );
    }
}
