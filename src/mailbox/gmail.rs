//! Gmail REST client.
//!
//! Talks to the Gmail API (`users/me`) with a bearer access token.
//! Token acquisition and refresh are out of scope — the token is handed
//! in via the environment and assumed valid for the process lifetime of
//! a cycle.
//!
//! Outbound replies are built as MIME with lettre's builder, then sent
//! through `messages/send` as a base64url-encoded `raw` payload so they
//! land on the original thread.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use lettre::message::header::ContentType;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ConfigError, MailboxError};
use crate::mailbox::{Header, Label, MailMessage, MailboxClient, MessageRef, OutgoingReply};

/// Default Gmail API base for the authenticated user.
const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

// ── Configuration ───────────────────────────────────────────────────

/// Gmail client configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct GmailConfig {
    /// OAuth2 access token with `gmail.modify` scope.
    pub access_token: SecretString,
    /// Address placed in the `From` header of outgoing replies.
    pub from_address: String,
    /// API base URL — overridable for tests.
    pub api_base: String,
}

impl GmailConfig {
    /// Build config from environment variables.
    ///
    /// Requires `GMAIL_ACCESS_TOKEN` and `GMAIL_FROM_ADDRESS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_token = std::env::var("GMAIL_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("GMAIL_ACCESS_TOKEN".into()))?;

        let from_address = std::env::var("GMAIL_FROM_ADDRESS")
            .map_err(|_| ConfigError::MissingEnvVar("GMAIL_FROM_ADDRESS".into()))?;

        let api_base =
            std::env::var("GMAIL_API_BASE").unwrap_or_else(|_| GMAIL_API_BASE.to_string());

        Ok(Self {
            access_token: SecretString::from(access_token),
            from_address,
            api_base,
        })
    }
}

// ── Response shapes ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<ListedMessage>,
}

#[derive(Debug, Deserialize)]
struct ListedMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetMessageResponse {
    id: String,
    thread_id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: MessagePayload,
}

#[derive(Debug, Default, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

// ── Client ──────────────────────────────────────────────────────────

/// Gmail REST implementation of [`MailboxClient`].
pub struct GmailClient {
    http: reqwest::Client,
    config: GmailConfig,
}

impl GmailClient {
    pub fn new(config: GmailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Check an API response status, mapping auth failures separately.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MailboxError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MailboxError::Auth(format!("{status}: {body}")));
        }
        Err(MailboxError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Build the base64url-encoded MIME payload for a reply.
    fn encode_reply(&self, reply: &OutgoingReply) -> Result<String, MailboxError> {
        let from = self
            .config
            .from_address
            .parse()
            .map_err(|e| MailboxError::InvalidMessage(format!("from address: {e}")))?;
        let to = reply
            .to
            .parse()
            .map_err(|e| MailboxError::InvalidMessage(format!("to address: {e}")))?;

        let mime = lettre::Message::builder()
            .from(from)
            .to(to)
            .subject(&reply.subject)
            .header(ContentType::TEXT_HTML)
            .body(reply.html_body.clone())
            .map_err(|e| MailboxError::InvalidMessage(format!("MIME build: {e}")))?;

        Ok(URL_SAFE.encode(mime.formatted()))
    }
}

#[async_trait::async_trait]
impl MailboxClient for GmailClient {
    async fn list_unread(&self, max_results: u32) -> Result<Vec<MessageRef>, MailboxError> {
        let url = format!(
            "{}/messages?q=is:unread&maxResults={}",
            self.config.api_base, max_results
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))?;

        let listing: ListMessagesResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MailboxError::Http(format!("list decode: {e}")))?;

        Ok(listing
            .messages
            .into_iter()
            .map(|m| MessageRef { id: m.id })
            .collect())
    }

    async fn get_message(&self, id: &str) -> Result<MailMessage, MailboxError> {
        let url = format!("{}/messages/{}", self.config.api_base, id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))?;

        let msg: GetMessageResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MailboxError::Http(format!("message decode: {e}")))?;

        Ok(MailMessage {
            id: msg.id,
            thread_id: msg.thread_id,
            headers: msg.payload.headers,
            snippet: msg.snippet,
        })
    }

    async fn send_reply(&self, reply: &OutgoingReply) -> Result<(), MailboxError> {
        let raw = self.encode_reply(reply)?;
        let url = format!("{}/messages/send", self.config.api_base);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&json!({ "raw": raw, "threadId": reply.thread_id }))
            .send()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))?;

        Self::check_status(response).await?;
        tracing::info!(to = %reply.to, "Reply sent");
        Ok(())
    }

    async fn remove_labels(&self, id: &str, labels: &[Label]) -> Result<(), MailboxError> {
        let label_ids: Vec<&str> = labels.iter().map(Label::as_label_id).collect();
        let url = format!("{}/messages/{}/modify", self.config.api_base, id);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&json!({ "removeLabelIds": label_ids }))
            .send()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GmailClient {
        GmailClient::new(GmailConfig {
            access_token: SecretString::from("test-token"),
            from_address: "me@example.com".to_string(),
            api_base: GMAIL_API_BASE.to_string(),
        })
    }

    #[test]
    fn encode_reply_produces_base64url() {
        let client = test_client();
        let reply = OutgoingReply {
            to: "alice@example.com".into(),
            thread_id: "t-1".into(),
            subject: "Re: Hello".into(),
            html_body: "<p>Hi Alice</p>".into(),
        };

        let raw = client.encode_reply(&reply).unwrap();
        // base64url alphabet only
        assert!(
            raw.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=')
        );

        let decoded = URL_SAFE.decode(&raw).unwrap();
        let text = String::from_utf8_lossy(&decoded);
        assert!(text.contains("Subject: Re: Hello"));
        assert!(text.contains("alice@example.com"));
        assert!(text.contains("<p>Hi Alice</p>"));
        assert!(text.contains("text/html"));
    }

    #[test]
    fn encode_reply_rejects_bad_address() {
        let client = test_client();
        let reply = OutgoingReply {
            to: "not an address".into(),
            thread_id: "t-1".into(),
            subject: "Re: x".into(),
            html_body: "<p>x</p>".into(),
        };
        assert!(matches!(
            client.encode_reply(&reply),
            Err(MailboxError::InvalidMessage(_))
        ));
    }

    #[test]
    fn list_response_tolerates_missing_messages_field() {
        let listing: ListMessagesResponse =
            serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(listing.messages.is_empty());
    }

    #[test]
    fn get_response_parses_gmail_shape() {
        let raw = r#"{
            "id": "m-1",
            "threadId": "t-1",
            "snippet": "Hey, quick question",
            "payload": {
                "headers": [
                    {"name": "From", "value": "alice@example.com"},
                    {"name": "Subject", "value": "Question"}
                ]
            }
        }"#;
        let msg: GetMessageResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.id, "m-1");
        assert_eq!(msg.thread_id, "t-1");
        assert_eq!(msg.payload.headers.len(), 2);
    }
}
