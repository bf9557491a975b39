//! Error types for the inbox triage bot.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox client errors — transport, API rejection, auth.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Mailbox API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid outgoing message: {0}")]
    InvalidMessage(String),
}

/// Classifier/drafter errors.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Classifier API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Classifier returned no content")]
    EmptyResponse,

    #[error("Failed to parse verdict: {0}")]
    Parse(String),

    #[error("Invalid category: '{0}'")]
    InvalidCategory(String),

    #[error("Verdict warrants a reply but carries no draft")]
    MissingDraft,
}

/// Run-level errors raised by workflow nodes.
///
/// All variants except `LabelMutation` abort the current run. The
/// scheduler logs the failure and starts the next cycle regardless.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Message {email_id} is missing the {header} header")]
    HeaderMissing { header: String, email_id: String },

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Send failed: {0}")]
    Send(String),

    /// Non-fatal: raised by label mutation, downgraded to a warning by the node.
    #[error("Label mutation failed: {0}")]
    LabelMutation(String),

    #[error("{service} unavailable: {reason}")]
    CollaboratorUnavailable { service: String, reason: String },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_error_display_includes_context() {
        let err = WorkflowError::HeaderMissing {
            header: "From".into(),
            email_id: "msg-42".into(),
        };
        let text = err.to_string();
        assert!(text.contains("From"));
        assert!(text.contains("msg-42"));
    }

    #[test]
    fn collaborator_unavailable_names_service() {
        let err = WorkflowError::CollaboratorUnavailable {
            service: "mailbox".into(),
            reason: "connection refused".into(),
        };
        assert!(err.to_string().contains("mailbox"));
    }
}
