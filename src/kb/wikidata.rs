// Wikidata `wbsearchentities` client
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{KbCandidate, KnowledgeBase};
use crate::config::EntityConfig;
use crate::errors::{RagError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://www.wikidata.org/w/api.php";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    search: Vec<KbCandidate>,
}

/// HTTP client for the Wikidata entity search API
pub struct WikidataClient {
    client: Client,
    endpoint: String,
}

impl WikidataClient {
    pub fn new(endpoint: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| RagError::BadConfig(format!("cannot build KB client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &EntityConfig) -> Result<Self> {
        Self::new(
            config.kb_endpoint.clone(),
            &config.user_agent,
            Duration::from_secs(config.kb_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl KnowledgeBase for WikidataClient {
    async fn search(&self, surface: &str, limit: usize) -> Result<Vec<KbCandidate>> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "wbsearchentities"),
                ("language", "en"),
                ("format", "json"),
                ("search", surface),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RagError::KbUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RagError::KbUnavailable(format!(
                "KB returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RagError::KbUnavailable(format!("failed to read body: {}", e)))?;

        let candidates = parse_search_response(&body)?;
        debug!(surface, hits = candidates.len(), "KB search");
        Ok(candidates)
    }
}

fn parse_search_response(body: &str) -> Result<Vec<KbCandidate>> {
    serde_json::from_str::<SearchResponse>(body)
        .map(|parsed| parsed.search)
        .map_err(|e| RagError::KbUnavailable(format!("malformed KB response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_hits() {
        let body = r#"{
            "searchinfo": {"search": "Apple"},
            "search": [
                {"id": "Q312", "label": "Apple Inc.", "description": "American technology company", "url": "//www.wikidata.org/wiki/Q312"},
                {"id": "Q89", "label": "apple", "description": "fruit of the apple tree"},
                {"id": "Q213710", "label": "Apple Records"}
            ],
            "success": 1
        }"#;

        let hits = parse_search_response(body).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "Q312");
        assert_eq!(hits[1].gloss(), "fruit of the apple tree");
        assert_eq!(hits[2].description, None);
    }

    #[test]
    fn test_parse_empty_search() {
        let hits = parse_search_response(r#"{"search": []}"#).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_api_error_payload_is_unavailable() {
        let body = r#"{"error": {"code": "param-missing", "info": "The required parameter search is missing"}}"#;
        let err = parse_search_response(body).unwrap_err();
        assert!(matches!(err, RagError::KbUnavailable(_)));
    }

    #[test]
    fn test_html_body_is_unavailable() {
        let err = parse_search_response("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, RagError::KbUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let client = WikidataClient::new(
            "http://127.0.0.1:9/w/api.php",
            "elerag-test/0.1",
            Duration::from_millis(500),
        )
        .unwrap();

        let err = client.search("Apple", 5).await.unwrap_err();
        assert!(matches!(err, RagError::KbUnavailable(_)));
    }
}
