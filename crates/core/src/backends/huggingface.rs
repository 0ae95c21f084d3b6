//! Hugging Face Inference API backends for summarization and sentiment.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    error::{Result, TubelensError},
    oracle::{self, Classification, SentimentClassifier, SentimentLabel, Summarizer},
    provider::huggingface_token,
};

struct InferenceEndpoint {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl InferenceEndpoint {
    fn new(base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            url: format!("{}/{}", base_url.trim_end_matches('/'), model),
            token: huggingface_token()?,
        })
    }

    async fn infer(&self, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await?
            .json::<Value>()
            .await?;
        Ok(response)
    }
}

pub struct HuggingFaceSummarizer {
    endpoint: InferenceEndpoint,
}

impl HuggingFaceSummarizer {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            endpoint: InferenceEndpoint::new(base_url, model)?,
        })
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(&self, chunk: &str, min_length: usize, max_length: usize) -> Result<String> {
        let response = self
            .endpoint
            .infer(json!({
                "inputs": chunk,
                "parameters": {
                    "min_length": min_length,
                    "max_length": max_length,
                    "do_sample": false,
                },
            }))
            .await?;
        parse_summary(&response)
    }
}

pub struct HuggingFaceSentimentClassifier {
    endpoint: InferenceEndpoint,
}

impl HuggingFaceSentimentClassifier {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            endpoint: InferenceEndpoint::new(base_url, model)?,
        })
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        let response = self.endpoint.infer(json!({ "inputs": text })).await?;
        parse_classification(&response)
    }
}

fn api_error(oracle: &'static str, response: &Value) -> TubelensError {
    match response["error"].as_str() {
        Some(message) => TubelensError::oracle(oracle, message),
        None => TubelensError::oracle(oracle, format!("Invalid API response: {response}")),
    }
}

/// `[{"summary_text": "..."}]`
fn parse_summary(response: &Value) -> Result<String> {
    response[0]["summary_text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| api_error(oracle::SUMMARIZER, response))
}

/// `[[{"label": "POSITIVE", "score": 0.98}, ...]]`, sometimes without the
/// outer list. The highest-scoring label wins.
fn parse_classification(response: &Value) -> Result<Classification> {
    let scores = match response.get(0) {
        Some(Value::Array(inner)) => inner.as_slice(),
        Some(_) => response.as_array().map(Vec::as_slice).unwrap_or_default(),
        None => return Err(api_error(oracle::SENTIMENT, response)),
    };

    let (label, confidence) = scores
        .iter()
        .filter_map(|entry| Some((entry["label"].as_str()?, entry["score"].as_f64()?)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| api_error(oracle::SENTIMENT, response))?;

    let label = match label.to_ascii_uppercase().as_str() {
        "POSITIVE" | "POS" | "LABEL_1" => SentimentLabel::Positive,
        "NEGATIVE" | "NEG" | "LABEL_0" => SentimentLabel::Negative,
        other => {
            return Err(TubelensError::oracle(
                oracle::SENTIMENT,
                format!("unsupported label {other}"),
            ));
        }
    };

    Ok(Classification { label, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_summary_text() {
        let response = json!([{ "summary_text": "A short summary." }]);
        assert_eq!(parse_summary(&response).unwrap(), "A short summary.");
    }

    #[test]
    fn surfaces_api_error_message() {
        let response = json!({ "error": "Model is currently loading" });
        let err = parse_summary(&response).unwrap_err();
        assert!(err.to_string().contains("Model is currently loading"));
    }

    #[test]
    fn picks_top_scoring_label_from_nested_list() {
        let response = json!([[
            { "label": "NEGATIVE", "score": 0.12 },
            { "label": "POSITIVE", "score": 0.88 }
        ]]);
        let classification = parse_classification(&response).unwrap();
        assert_eq!(classification.label, SentimentLabel::Positive);
        assert!((classification.confidence - 0.88).abs() < 1e-12);
    }

    #[test]
    fn accepts_flat_label_list() {
        let response = json!([{ "label": "NEGATIVE", "score": 0.97 }]);
        let classification = parse_classification(&response).unwrap();
        assert_eq!(classification.label, SentimentLabel::Negative);
        assert!((classification.positivity() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn rejects_unknown_labels() {
        let response = json!([[{ "label": "NEUTRAL", "score": 0.9 }]]);
        assert!(parse_classification(&response).is_err());
    }
}
