// Caption sentiment via the Cloud Natural Language REST API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use crate::config::LanguageConfig;
use crate::error::AnalysisError;
use crate::models::Sentiment;

const SERVICE: &str = "language";

/// Scores the sentiment of a caption. Failures are not retried.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, AnalysisError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSentimentRequest<'a> {
    document: Document<'a>,
    encoding_type: &'static str,
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSentimentResponse {
    document_sentiment: Option<WireSentiment>,
}

#[derive(Deserialize)]
struct WireSentiment {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    magnitude: f64,
}

pub struct LanguageRepo {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LanguageRepo {
    pub fn new(config: &LanguageConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::version::user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl SentimentAnalyzer for LanguageRepo {
    #[instrument(skip_all, fields(repo = "language", operation = "analyze_sentiment"))]
    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, AnalysisError> {
        let body = AnalyzeSentimentRequest {
            document: Document {
                kind: "PLAIN_TEXT",
                content: text,
            },
            encoding_type: "UTF8",
        };
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::transport(SERVICE, e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::transport(
                SERVICE,
                format!("HTTP {}: {}", status, text),
            ));
        }
        let parsed: AnalyzeSentimentResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::transport(SERVICE, e))?;
        let sentiment = parsed
            .document_sentiment
            .ok_or_else(|| AnalysisError::transport(SERVICE, "response has no documentSentiment"))?;
        Ok(Sentiment {
            score: sentiment.score,
            magnitude: sentiment.magnitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_is_plain_text_document() {
        let body = AnalyzeSentimentRequest {
            document: Document {
                kind: "PLAIN_TEXT",
                content: "great day",
            },
            encoding_type: "UTF8",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["document"]["type"], "PLAIN_TEXT");
        assert_eq!(json["document"]["content"], "great day");
        assert_eq!(json["encodingType"], "UTF8");
    }

    #[test]
    fn response_reads_document_sentiment() {
        let parsed: AnalyzeSentimentResponse = serde_json::from_str(
            r#"{"documentSentiment":{"magnitude":1.2,"score":0.8},"language":"en","sentences":[]}"#,
        )
        .unwrap();
        let s = parsed.document_sentiment.unwrap();
        assert_eq!(s.score, 0.8);
        assert_eq!(s.magnitude, 1.2);
    }
}
