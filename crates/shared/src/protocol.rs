use serde::{Deserialize, Serialize};

/// Response body of the generic random-fact endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomFactPayload {
    pub id: String,
    pub text: String,
    pub source: String,
    pub source_url: String,
    pub language: String,
    pub permalink: String,
}

/// Element of the keyworded endpoint's response array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordFactPayload {
    pub fact: String,
}
