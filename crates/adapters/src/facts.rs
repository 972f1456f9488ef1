use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{Fact, FactCategory},
    error::FactError,
    protocol::{KeywordFactPayload, RandomFactPayload},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

const GENERIC_ATTEMPTS: usize = 15;
const KEYWORDED_ATTEMPTS: usize = 5;
const RECENT_TEXT_CAPACITY: usize = 50;

/// A remote source producing one uncategorized fact text per call.
#[async_trait]
pub trait RemoteFactApi: Send + Sync {
    async fn random_fact(&self) -> Result<String, FactError>;
}

/// Client for the generic random-fact endpoint
/// (`GET {base}/random.json?language=en`).
pub struct RandomFactsClient {
    http: Client,
    base_url: String,
}

impl RandomFactsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FactError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|_| FactError::InvalidUrl(base_url.clone()))?;
        Ok(Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RemoteFactApi for RandomFactsClient {
    async fn random_fact(&self) -> Result<String, FactError> {
        let payload: RandomFactPayload = self
            .http
            .get(format!("{}/random.json", self.base_url))
            .query(&[("language", "en")])
            .send()
            .await
            .map_err(|err| FactError::Network(err.to_string()))?
            .error_for_status()
            .map_err(|err| FactError::Network(err.to_string()))?
            .json()
            .await
            .map_err(|err| FactError::Decoding(err.to_string()))?;
        Ok(payload.text)
    }
}

/// Client for the keyworded endpoint (`GET {base}/v1/facts` with a
/// static API key header, returning an array of `{fact}` objects).
pub struct KeywordedFactsClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl KeywordedFactsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, FactError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|_| FactError::InvalidUrl(base_url.clone()))?;
        Ok(Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl RemoteFactApi for KeywordedFactsClient {
    async fn random_fact(&self) -> Result<String, FactError> {
        let payload: Vec<KeywordFactPayload> = self
            .http
            .get(format!("{}/v1/facts", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|err| FactError::Network(err.to_string()))?
            .error_for_status()
            .map_err(|err| FactError::Network(err.to_string()))?
            .json()
            .await
            .map_err(|err| FactError::Decoding(err.to_string()))?;
        payload
            .into_iter()
            .next()
            .map(|entry| entry.fact)
            .ok_or_else(|| FactError::Decoding("empty fact list".to_string()))
    }
}

/// Category-aware front for the two remote fact sources.
///
/// Filtered categories run a bounded fetch-and-test loop: up to 15
/// generic fetches, then up to 5 keyworded fetches, accepting the first
/// text matching the category's keyword set. When the budget is
/// exhausted the last fetched text is accepted under the requested
/// category; only total failure of every attempt propagates an error.
pub struct CategoryFactProvider {
    generic: Arc<dyn RemoteFactApi>,
    keyworded: Arc<dyn RemoteFactApi>,
    recent_texts: Mutex<VecDeque<String>>,
}

impl CategoryFactProvider {
    pub fn new(generic: Arc<dyn RemoteFactApi>, keyworded: Arc<dyn RemoteFactApi>) -> Self {
        Self {
            generic,
            keyworded,
            recent_texts: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn fetch_by_category(&self, category: FactCategory) -> Result<Fact, FactError> {
        let fact = match category.keywords() {
            Some(keywords) => self.fetch_filtered(category, keywords).await?,
            None => self.fetch_unfiltered(category).await?,
        };
        self.remember(&fact.text).await;
        Ok(fact)
    }

    /// Texts returned recently, oldest first. Bounded at 50 entries.
    pub async fn recent_texts(&self) -> Vec<String> {
        self.recent_texts.lock().await.iter().cloned().collect()
    }

    async fn fetch_unfiltered(&self, category: FactCategory) -> Result<Fact, FactError> {
        match self.keyworded.random_fact().await {
            Ok(text) => Ok(Fact::new(text, category)),
            Err(err) => {
                warn!(category = %category, "facts: keyworded source failed, falling back to generic: {err}");
                let text = self.generic.random_fact().await?;
                Ok(Fact::new(text, category))
            }
        }
    }

    async fn fetch_filtered(
        &self,
        category: FactCategory,
        keywords: &[&str],
    ) -> Result<Fact, FactError> {
        let mut last_text: Option<String> = None;
        let mut last_err: Option<FactError> = None;

        let sources: [(&Arc<dyn RemoteFactApi>, usize, &str); 2] = [
            (&self.generic, GENERIC_ATTEMPTS, "generic"),
            (&self.keyworded, KEYWORDED_ATTEMPTS, "keyworded"),
        ];

        for (source, attempts, name) in sources {
            for attempt in 0..attempts {
                match source.random_fact().await {
                    Ok(text) => {
                        if matches_keywords(&text, keywords) {
                            debug!(
                                category = %category,
                                source = name,
                                attempt = attempt + 1,
                                "facts: keyword match"
                            );
                            return Ok(Fact::new(text, category));
                        }
                        last_text = Some(text);
                    }
                    Err(err) => {
                        debug!(
                            category = %category,
                            source = name,
                            attempt = attempt + 1,
                            "facts: fetch attempt failed: {err}"
                        );
                        last_err = Some(err);
                    }
                }
            }
        }

        match last_text {
            Some(text) => {
                warn!(
                    category = %category,
                    "facts: attempt budget exhausted without keyword match, relabeling last fetched fact"
                );
                Ok(Fact::new(text, category))
            }
            None => Err(last_err
                .unwrap_or_else(|| FactError::Network("all fact fetch attempts failed".to_string()))),
        }
    }

    async fn remember(&self, text: &str) {
        let mut recent = self.recent_texts.lock().await;
        recent.push_back(text.to_string());
        while recent.len() > RECENT_TEXT_CAPACITY {
            recent.pop_front();
        }
    }
}

fn matches_keywords(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword))
}
