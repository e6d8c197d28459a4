//! Gemini generator
//!
//! Calls the `generateContent` REST endpoint. Every conversation starts with
//! the Aether system prompt and a primer model turn, followed by the client's
//! history and the new message. Token usage is estimated, not reported.

use std::time::Duration;

use kernel::error::fault::{Cause, Dependency, Fault};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::entity::{HistoryTurn, Role};
use crate::domain::repository::{Generation, TextGenerator};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const NOT_INITIALIZED: &str = "Gemini AI is not initialized. Please check your API key.";

const SYSTEM_PROMPT: &str = "You are Aether, an advanced AI assistant built on DocsGPT and powered by Hedera blockchain technology. You are:

- A sophisticated AI with expertise in coding, enterprise analytics, and advanced reasoning
- Knowledgeable about quantum computing, blockchain technology, and distributed ledgers
- Capable of explaining complex technical concepts in clear, accessible ways
- Professional yet approachable in tone
- Built with carbon-negative operations using Hedera's energy-efficient hashgraph consensus

When discussing Aether's capabilities:
- You process queries through the Hedera Token Service for transparent, auditable API calls
- Every interaction is recorded on Hedera's distributed ledger with immutable receipts
- You're fine-tuned from DocsGPT for hallucination-free responses with source citations
- You support enterprise features like code analysis, document intelligence, and data analytics

Respond helpfully, accurately, and with the sophistication expected of an enterprise-grade AI platform.";

const PRIMER: &str = "Understood. I am Aether, ready to assist you with advanced AI capabilities.";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Without a key every generation fails with a configuration fault
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct GeminiGenerator {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        if config.api_key.is_none() {
            tracing::warn!("GOOGLE_GENAI_API_KEY is not set; chat generation is disabled");
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl TextGenerator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, message: &str, history: &[HistoryTurn]) -> Result<Generation, Fault> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(Fault::Configuration(NOT_INITIALIZED.to_string()));
        };

        let prior = conversation(history);
        let input_tokens = estimate_tokens(&format!("{message}{}", serialize_contents(&prior)));

        let mut contents = prior;
        contents.push(Content::new("user", message));
        let body = GenerateRequest::new(contents);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_fault)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_fault)?;
        if !status.is_success() {
            let fault = status_fault(status, &text);
            tracing::error!(status = status.as_u16(), error = %fault, "AI generation failed");
            return Err(fault);
        }

        let reply = extract_reply(&text)?;
        let tokens_used = input_tokens + estimate_tokens(&reply);

        Ok(Generation {
            text: reply,
            tokens_used,
            model: self.config.model.clone(),
        })
    }
}

/// About four characters per token
pub fn estimate_tokens(text: &str) -> i32 {
    i32::try_from(text.chars().count().div_ceil(4)).unwrap_or(i32::MAX)
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

impl<'a> Content<'a> {
    fn new(role: &'static str, text: &'a str) -> Self {
        Self {
            role,
            parts: [Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

impl<'a> GenerateRequest<'a> {
    fn new(contents: Vec<Content<'a>>) -> Self {
        Self {
            contents,
            generation_config: GenerationConfig {
                temperature: 0.9,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 8192,
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
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
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// System prompt, primer, then the client's history
fn conversation(history: &[HistoryTurn]) -> Vec<Content<'_>> {
    let mut contents = Vec::with_capacity(history.len() + 3);
    contents.push(Content::new("user", SYSTEM_PROMPT));
    contents.push(Content::new("model", PRIMER));
    contents.extend(history.iter().map(|turn| {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant | Role::System => "model",
        };
        Content::new(role, &turn.content)
    }));
    contents
}

fn serialize_contents(contents: &[Content<'_>]) -> String {
    serde_json::to_string(contents).unwrap_or_default()
}

// ============================================================================
// Fault classification
// ============================================================================

fn ai_fault(cause: Cause, detail: impl std::fmt::Display) -> Fault {
    Fault::dependency(Dependency::Ai, cause, detail)
}

fn transport_fault(err: reqwest::Error) -> Fault {
    let cause = if err.is_timeout() {
        Cause::Timeout
    } else if err.is_connect() {
        Cause::Unavailable
    } else {
        Cause::Failed
    };
    tracing::error!(error = %err, "AI request failed");
    ai_fault(cause, err)
}

fn status_fault(status: StatusCode, body: &str) -> Fault {
    let (message, api_status) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => (error.message, error.status.unwrap_or_default()),
        Err(_) => (body.to_string(), String::new()),
    };

    let cause = match (status.as_u16(), api_status.as_str()) {
        (429, _) | (_, "RESOURCE_EXHAUSTED") => Cause::Quota,
        (401 | 403, _) | (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => Cause::Auth,
        // Invalid keys come back as 400 INVALID_ARGUMENT
        _ if message.contains("API key") => Cause::Auth,
        (504, _) | (_, "DEADLINE_EXCEEDED") => Cause::Timeout,
        (503, _) | (_, "UNAVAILABLE") => Cause::Unavailable,
        _ => Cause::Failed,
    };

    ai_fault(cause, format!("{status}: {message}"))
}

fn extract_reply(body: &str) -> Result<String, Fault> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ai_fault(Cause::Failed, format!("malformed response: {e}")))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ai_fault(Cause::Rejected, format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ai_fault(Cause::Failed, "response has no candidates"));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.is_empty() && candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(ai_fault(Cause::Rejected, "candidate blocked by safety filters"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::error::kind::ErrorKind;

    fn cause(fault: &Fault) -> Cause {
        match fault {
            Fault::Dependency { cause, .. } => *cause,
            other => panic!("expected dependency fault, got {other:?}"),
        }
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_conversation_layout() {
        let history = vec![
            HistoryTurn {
                role: Role::User,
                content: "hi".into(),
            },
            HistoryTurn {
                role: Role::Assistant,
                content: "hello".into(),
            },
        ];
        let json = serialize_contents(&conversation(&history));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 4);
        assert_eq!(value[1]["role"], "model");
        assert_eq!(value[1]["parts"][0]["text"], PRIMER);
        assert_eq!(value[3]["role"], "model");
        assert!(json.starts_with(r#"[{"role":"user","parts":[{"text":"You are Aether"#));
    }

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(GenerateRequest::new(vec![Content::new("user", "x")])).unwrap();
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_status_classification() {
        let quota = status_fault(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert_eq!(cause(&quota), Cause::Quota);
        assert_eq!(quota.kind(), ErrorKind::ServiceUnavailable);

        let key = status_fault(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
        );
        assert_eq!(cause(&key), Cause::Auth);

        assert_eq!(cause(&status_fault(StatusCode::SERVICE_UNAVAILABLE, "overloaded")), Cause::Unavailable);
        assert_eq!(cause(&status_fault(StatusCode::GATEWAY_TIMEOUT, "")), Cause::Timeout);

        let other = status_fault(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(cause(&other), Cause::Failed);
        assert_eq!(other.kind(), ErrorKind::AiServiceError);
    }

    #[test]
    fn test_extract_reply() {
        let ok = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(extract_reply(ok).unwrap(), "Hello there");

        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert_eq!(cause(&extract_reply(blocked).unwrap_err()), Cause::Rejected);

        let filtered = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let fault = extract_reply(filtered).unwrap_err();
        assert_eq!(cause(&fault), Cause::Rejected);
        assert_eq!(
            fault.into_app_error(false).message(),
            "Response blocked by safety filters. Please rephrase your query."
        );

        assert_eq!(cause(&extract_reply("{}").unwrap_err()), Cause::Failed);
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_fault() {
        let generator = GeminiGenerator::new(GeminiConfig::new(None)).unwrap();
        assert!(!generator.is_configured());

        let fault = generator.generate("hi", &[]).await.unwrap_err();
        assert_eq!(fault.kind(), ErrorKind::ConfigurationError);
    }
}
