//! Semantic match service client for Seekmark.
//!
//! The service receives a block of anchor text plus the active query and
//! returns the phrases inside that text it considers relevant. This crate owns
//! the wire format and the [`SemanticMatcher`] seam; locating the phrases on
//! the page is done by `seekmark-core`.

pub mod config;

pub use config::ClientConfig;

use async_trait::async_trait;
use seekmark_core::{HighlightType, SemanticMatch};
use serde::{Deserialize, Serialize};

/// Request body sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub text: String,
    pub query: String,
    pub highlight_type: HighlightType,
    pub semantic_threshold: f32,
}

impl MatchRequest {
    pub fn new(text: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            query: query.into(),
            highlight_type: HighlightType::default(),
            semantic_threshold: 0.5,
        }
    }

    pub fn with_highlight_type(mut self, highlight_type: HighlightType) -> Self {
        self.highlight_type = highlight_type;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.semantic_threshold = threshold;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    text: String,
    #[serde(default)]
    similarity: Option<f32>,
}

/// Source of semantic phrase matches.
///
/// Callers treat any error as "no matches"; implementations should not retry
/// internally.
#[async_trait]
pub trait SemanticMatcher: Send + Sync {
    async fn find_matches(&self, request: &MatchRequest) -> Result<Vec<SemanticMatch>, ServiceError>;
}

/// Decodes a response body, dropping blank phrases.
pub fn parse_response(body: &str) -> Result<Vec<SemanticMatch>, ServiceError> {
    let response: MatchResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

    Ok(response
        .matches
        .into_iter()
        .filter(|m| !m.text.trim().is_empty())
        .map(|m| SemanticMatch {
            matched_text: m.text,
            similarity: m.similarity,
        })
        .collect())
}

/// [`SemanticMatcher`] backed by a JSON-over-HTTP endpoint.
///
/// `ureq` is blocking, so each request runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct HttpSemanticMatcher {
    config: ClientConfig,
    agent: ureq::Agent,
}

impl HttpSemanticMatcher {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build();
        Self { config, agent }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn post_match_request(
    agent: &ureq::Agent,
    endpoint: &str,
    request: &MatchRequest,
) -> Result<Vec<SemanticMatch>, ServiceError> {
    let body = serde_json::to_string(request).map_err(|e| ServiceError::Transport(e.to_string()))?;

    let resp = agent
        .post(endpoint)
        .set("Content-Type", "application/json")
        .set("Accept", "application/json")
        .send_string(&body)
        .map_err(|e| match e {
            ureq::Error::Status(code, _) => ServiceError::Status(code),
            ureq::Error::Transport(transport) => ServiceError::Transport(transport.to_string()),
        })?;

    let body = resp
        .into_string()
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
    parse_response(&body)
}

#[async_trait]
impl SemanticMatcher for HttpSemanticMatcher {
    async fn find_matches(&self, request: &MatchRequest) -> Result<Vec<SemanticMatch>, ServiceError> {
        let agent = self.agent.clone();
        let endpoint = self.config.endpoint.clone();
        let request = request.clone();

        let matches = tokio::task::spawn_blocking(move || post_match_request(&agent, &endpoint, &request))
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))??;

        tracing::debug!(count = matches.len(), "semantic service returned matches");
        Ok(matches)
    }
}
