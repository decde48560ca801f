use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("model API returned {status}: {message}")]
	Api { status: u16, message: String },

	#[error("model returned no text")]
	EmptyResponse,
}

/// Turns a prompt into generated source code.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CodeGenerator: Send + Sync {
	async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
	contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
	parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
	text: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
	#[serde(default)]
	candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
	content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
	#[serde(default)]
	parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
	text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorEnvelope {
	error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
	message: String,
}

impl GenerateContentResponse {
	/// Concatenated text parts of the first candidate.
	fn into_text(self) -> Option<String> {
		let parts = self.candidates.into_iter().next()?.content?.parts;
		let text: String = parts.into_iter().filter_map(|p| p.text).collect();
		if text.is_empty() {
			None
		} else {
			Some(text)
		}
	}
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
	client: reqwest::Client,
	endpoint: String,
	api_key: String,
}

impl GeminiClient {
	pub fn new(
		api_base: &str,
		model: &str,
		api_key: &str,
		timeout: Duration,
	) -> Result<Self, LlmError> {
		let client = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self {
			client,
			endpoint: format!("{}/models/{}:generateContent", api_base.trim_end_matches('/'), model),
			api_key: api_key.to_string(),
		})
	}
}

#[async_trait]
impl CodeGenerator for GeminiClient {
	async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
		let body = GenerateContentRequest { contents: [Content { parts: [Part { text: prompt }] }] };
		let resp = self
			.client
			.post(&self.endpoint)
			.header("x-goog-api-key", &self.api_key)
			.json(&body)
			.send()
			.await?;

		let status = resp.status();
		if !status.is_success() {
			let raw = resp.text().await.unwrap_or_default();
			let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
				.map(|e| e.error.message)
				.unwrap_or(raw);
			return Err(LlmError::Api { status: status.as_u16(), message });
		}

		resp.json::<GenerateContentResponse>().await?.into_text().ok_or(LlmError::EmptyResponse)
	}
}
