use reqwest::Client;
use shared::{domain::Language, error::FactError};
use tracing::warn;
use url::Url;

/// Client for the free web translation endpoint.
///
/// Translation decorates content already on screen, so this client
/// never fails outward: any network, status, or parse problem yields
/// the deterministic fallback `"[<code>] " + text`.
pub struct WebTranslateClient {
    http: Client,
    base_url: String,
}

impl WebTranslateClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FactError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|_| FactError::InvalidUrl(base_url.clone()))?;
        Ok(Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn translate(&self, text: &str, language: Language) -> String {
        match self.request_translation(text, language).await {
            Ok(translated) if !translated.is_empty() => translated,
            Ok(_) => {
                warn!(language = language.code(), "translate: empty translation, using fallback");
                fallback_text(text, language)
            }
            Err(err) => {
                warn!(language = language.code(), "translate: request failed, using fallback: {err}");
                fallback_text(text, language)
            }
        }
    }

    async fn request_translation(&self, text: &str, language: Language) -> Result<String, FactError> {
        let value: serde_json::Value = self
            .http
            .get(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", language.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|err| FactError::Network(err.to_string()))?
            .error_for_status()
            .map_err(|err| FactError::Network(err.to_string()))?
            .json()
            .await
            .map_err(|err| FactError::Decoding(err.to_string()))?;

        let segments = value
            .get(0)
            .and_then(|segments| segments.as_array())
            .ok_or_else(|| FactError::Decoding("missing segment list".to_string()))?;

        let mut translated = String::new();
        for segment in segments {
            if let Some(part) = segment.get(0).and_then(|part| part.as_str()) {
                translated.push_str(part);
            }
        }
        Ok(translated)
    }
}

pub fn fallback_text(text: &str, language: Language) -> String {
    format!("[{}] {}", language.code(), text)
}
