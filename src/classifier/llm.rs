//! LLM-backed classifier over an OpenAI-compatible chat completions API.
//!
//! One request per message: a fixed triage system prompt, the sender and
//! body as the user turn, and a JSON object back. The model may wrap the
//! object in markdown; extraction tolerates that, but the parsed verdict
//! itself is validated strictly — a missing flag or unknown category is
//! a classification failure, not a default.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::classifier::{Category, Classifier, Verdict};
use crate::error::{ClassifierError, ConfigError};

/// Default API base (OpenAI-compatible).
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default model for triage.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Max tokens for the triage call — kept tight, it runs every cycle.
const TRIAGE_MAX_TOKENS: u32 = 1000;

// ── Configuration ───────────────────────────────────────────────────

/// Classifier configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
    pub api_base: String,
}

impl LlmConfig {
    /// Build config from environment variables.
    ///
    /// Requires `OPENAI_API_KEY`; `TRIAGE_MODEL` and `OPENAI_API_BASE`
    /// are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".into()))?;

        let model = std::env::var("TRIAGE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_base =
            std::env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        Ok(Self {
            api_key: SecretString::from(api_key),
            model,
            api_base,
        })
    }
}

// ── Chat wire types ─────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

// ── Classifier ──────────────────────────────────────────────────────

/// OpenAI-compatible implementation of [`Classifier`].
pub struct LlmClassifier {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClassifier {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Send the triage request and return the raw model output.
    async fn complete(&self, sender: &str, body: &str) -> Result<String, ClassifierError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: build_system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(sender, body),
                },
            ],
            max_tokens: TRIAGE_MAX_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifierError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(format!("response decode: {e}")))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ClassifierError::EmptyResponse)
    }
}

#[async_trait::async_trait]
impl Classifier for LlmClassifier {
    async fn evaluate(&self, sender: &str, body: &str) -> Result<Verdict, ClassifierError> {
        let raw = self.complete(sender, body).await?;
        parse_verdict(&raw)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the triage system prompt.
fn build_system_prompt() -> String {
    "You are a high-level executive assistant. Triage the incoming email before \
     any response is drafted.\n\n\
     CRITERIA:\n\
     1. is_spam: true if the email is unsolicited marketing, an unrequested \
     newsletter, or suspicious phishing.\n\
     2. is_noreply: true if the sender is a 'noreply@' address or the body says \
     not to reply.\n\
     3. category: one of [Inquiry, Complaint, Feedback, Other].\n\n\
     Respond with ONLY a JSON object:\n\
     {\"subject\": \"...\", \"html_content\": \"...\", \"is_spam\": false, \
     \"is_noreply\": false, \"category\": \"...\"}\n\n\
     Rules:\n\
     - If is_spam or is_noreply is true, leave html_content empty.\n\
     - Otherwise draft a professional reply in a concise, rigorous tone.\n\
     - Use clean HTML for the reply body."
        .to_string()
}

/// Build the user prompt from sender and body.
fn build_user_prompt(sender: &str, body: &str) -> String {
    format!("Email from: {sender}\nEmail body: {body}")
}

// ── Verdict parsing ─────────────────────────────────────────────────

/// Raw verdict as the model emits it. Booleans and category are
/// required; a verdict missing either is malformed.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    html_content: String,
    is_spam: bool,
    is_noreply: bool,
    category: String,
}

/// Parse and validate the model output into a [`Verdict`].
fn parse_verdict(raw: &str) -> Result<Verdict, ClassifierError> {
    let json_str = extract_json_object(raw);
    let parsed: RawVerdict =
        serde_json::from_str(&json_str).map_err(|e| ClassifierError::Parse(e.to_string()))?;

    let category = Category::parse(&parsed.category)?;

    let verdict = Verdict {
        subject: parsed.subject,
        html_content: parsed.html_content,
        is_spam: parsed.is_spam,
        is_noreply: parsed.is_noreply,
        category,
    };

    // A replyable message with no draft cannot be acted on.
    if verdict.wants_reply() && verdict.html_content.trim().is_empty() {
        return Err(ClassifierError::MissingDraft);
    }

    Ok(verdict)
}

/// Extract a JSON object from model output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_contains_criteria() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("is_spam"));
        assert!(prompt.contains("is_noreply"));
        assert!(prompt.contains("Inquiry"));
        assert!(prompt.contains("html_content"));
    }

    #[test]
    fn user_prompt_includes_sender_and_body() {
        let prompt = build_user_prompt("alice@example.com", "Can we meet Tuesday?");
        assert!(prompt.contains("alice@example.com"));
        assert!(prompt.contains("Can we meet Tuesday?"));
    }

    #[test]
    fn parse_replyable_verdict() {
        let raw = r#"{"subject": "Re: Meeting", "html_content": "<p>Tuesday works.</p>",
                      "is_spam": false, "is_noreply": false, "category": "Inquiry"}"#;
        let verdict = parse_verdict(raw).unwrap();
        assert!(verdict.wants_reply());
        assert_eq!(verdict.category, Category::Inquiry);
        assert_eq!(verdict.html_content, "<p>Tuesday works.</p>");
    }

    #[test]
    fn parse_spam_verdict_with_empty_draft() {
        let raw = r#"{"subject": "", "html_content": "",
                      "is_spam": true, "is_noreply": false, "category": "Other"}"#;
        let verdict = parse_verdict(raw).unwrap();
        assert!(verdict.is_spam);
        assert!(!verdict.wants_reply());
    }

    #[test]
    fn parse_verdict_wrapped_in_markdown() {
        let raw = "Here is the triage:\n```json\n{\"subject\": \"Re: Hi\", \
                   \"html_content\": \"<p>Hello</p>\", \"is_spam\": false, \
                   \"is_noreply\": false, \"category\": \"Other\"}\n```";
        let verdict = parse_verdict(raw).unwrap();
        assert!(verdict.wants_reply());
    }

    #[test]
    fn parse_verdict_missing_flag_fails() {
        let raw = r#"{"subject": "x", "html_content": "<p>y</p>", "category": "Other"}"#;
        assert!(matches!(
            parse_verdict(raw),
            Err(ClassifierError::Parse(_))
        ));
    }

    #[test]
    fn parse_verdict_invalid_category_fails() {
        let raw = r#"{"subject": "x", "html_content": "<p>y</p>",
                      "is_spam": false, "is_noreply": false, "category": "Urgent"}"#;
        assert!(matches!(
            parse_verdict(raw),
            Err(ClassifierError::InvalidCategory(_))
        ));
    }

    #[test]
    fn parse_replyable_verdict_without_draft_fails() {
        let raw = r#"{"subject": "Re: x", "html_content": "  ",
                      "is_spam": false, "is_noreply": false, "category": "Inquiry"}"#;
        assert!(matches!(
            parse_verdict(raw),
            Err(ClassifierError::MissingDraft)
        ));
    }

    #[test]
    fn extract_json_embedded_in_text() {
        let input = "Assessment: {\"is_spam\": true} done.";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.ends_with('}'));
    }
}
