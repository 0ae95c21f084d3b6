use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{Result, TubelensError},
    oracle::{self, PunctuationRestorer},
    provider::Provider,
};

static PUNCTUATION_PROMPT: &str = r#"You restore punctuation in speech transcripts.

Rewrite the user's text with correct punctuation and sentence capitalization.

Rules:
- Keep every word, in the original order
- Do not add, remove, translate or summarize anything
- Output ONLY the restored text, nothing else"#;

/// Punctuation restoration through an OpenAI-compatible chat endpoint
pub struct ChatPunctuationRestorer {
    client: reqwest::Client,
    provider: Provider,
    api_key: String,
}

impl ChatPunctuationRestorer {
    pub fn new(provider: Provider) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        Ok(Self {
            client: reqwest::Client::new(),
            provider,
            api_key,
        })
    }
}

#[async_trait]
impl PunctuationRestorer for ChatPunctuationRestorer {
    async fn restore_punctuation(&self, chunk: &str) -> Result<String> {
        let config = self.provider.config();

        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": PUNCTUATION_PROMPT,
                    },
                    {
                        "role": "user",
                        "content": chunk,
                    },
                ],
                "temperature": 0.0,
            }))
            .send()
            .await?
            .json::<Value>()
            .await?;

        extract_content(&response)
    }
}

fn extract_content(response: &Value) -> Result<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            TubelensError::oracle(
                oracle::PUNCTUATION,
                format!("Invalid API response: {response:?}"),
            )
        })
}
