//! Classifier/drafter — the external collaborator that turns a message
//! into a structured verdict plus an optional reply draft.

pub mod llm;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

pub use llm::{LlmClassifier, LlmConfig};

/// Message category assigned by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Inquiry,
    Complaint,
    Feedback,
    #[default]
    Other,
}

impl Category {
    /// Parse a category as the classifier reports it. Case-insensitive;
    /// anything outside the four known values is rejected.
    pub fn parse(raw: &str) -> Result<Self, ClassifierError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inquiry" => Ok(Self::Inquiry),
            "complaint" => Ok(Self::Complaint),
            "feedback" => Ok(Self::Feedback),
            "other" => Ok(Self::Other),
            _ => Err(ClassifierError::InvalidCategory(raw.to_string())),
        }
    }
}

/// Structured classification output.
///
/// `html_content` is empty when the verdict is spam or no-reply — the
/// workflow never sends a reply on those paths.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub subject: String,
    pub html_content: String,
    pub is_spam: bool,
    pub is_noreply: bool,
    pub category: Category,
}

impl Verdict {
    /// A reply is warranted when the message is neither spam nor no-reply.
    pub fn wants_reply(&self) -> bool {
        !self.is_spam && !self.is_noreply
    }
}

/// Classification collaborator consumed by the evaluate node.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a message and draft a reply when one is warranted.
    async fn evaluate(&self, sender: &str, body: &str) -> Result<Verdict, ClassifierError>;
}
