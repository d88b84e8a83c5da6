//! Remote text-generation estimator.
//!
//! One textual prompt goes out, one free-form textual response comes back.
//! Interpreting the text is the caller's job (see [`crate::estimation`]).

use crate::config::EstimatorConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// A remote service that answers a prompt with free-form text
#[async_trait]
pub trait Estimator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Submit `prompt` and return the raw text of the answer
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ============================================================================
// Gemini API types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ============================================================================
// Gemini client
// ============================================================================

/// Google Gemini `generateContent` client
pub struct GeminiEstimator {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiEstimator {
    /// Build a client from resolved configuration
    ///
    /// Every request is bounded by `config.timeout`.
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::EstimatorUnavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Text of the first part of the first candidate
    fn extract_text(response: GenerateResponse) -> Result<String> {
        if let Some(err) = response.error {
            return Err(Error::Remote(format!("Gemini API error: {}", err.message)));
        }

        response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| Error::Remote("no text content in Gemini response".into()))
    }
}

impl std::fmt::Debug for GeminiEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEstimator")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Estimator for GeminiEstimator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, "Sending prompt to Gemini");

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GenerateResponse>(&text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or_else(|| text.chars().take(256).collect());
            return Err(Error::Remote(format!(
                "Gemini API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Remote(format!("failed to decode Gemini response: {}", e)))?;

        Self::extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> EstimatorConfig {
        EstimatorConfig {
            api_key: SecretString::from("tok".to_string()),
            model: "gemini-2.0-flash".into(),
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        }
    }

    fn text_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}
            ]
        })
    }

    #[tokio::test]
    async fn generate_sends_key_and_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "tok"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "how many?"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_body("350\n")))
            .expect(1)
            .mount(&server)
            .await;

        let estimator = GeminiEstimator::new(&config_for(&server)).unwrap();
        let text = estimator.generate("how many?").await.unwrap();
        assert_eq!(text, "350\n");
    }

    #[tokio::test]
    async fn non_success_status_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "quota exceeded"}
            })))
            .mount(&server)
            .await;

        let estimator = GeminiEstimator::new(&config_for(&server)).unwrap();
        let err = estimator.generate("x").await.unwrap_err();
        match err {
            Error::Remote(msg) => assert!(msg.contains("quota exceeded"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_candidates_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let estimator = GeminiEstimator::new(&config_for(&server)).unwrap();
        assert!(matches!(
            estimator.generate("x").await,
            Err(Error::Remote(_))
        ));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_body("100"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.timeout = Duration::from_millis(200);
        let estimator = GeminiEstimator::new(&config).unwrap();
        assert!(matches!(
            estimator.generate("x").await,
            Err(Error::Remote(_))
        ));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = EstimatorConfig {
            api_key: SecretString::from("super-secret".to_string()),
            model: "m".into(),
            base_url: "http://localhost/".into(),
            timeout: Duration::from_secs(1),
        };
        let estimator = GeminiEstimator::new(&config).unwrap();
        let debug = format!("{:?}", estimator);
        assert!(!debug.contains("super-secret"));
        assert_eq!(estimator.endpoint(), "http://localhost/models/m:generateContent");
    }
}
