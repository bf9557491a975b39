//! The workflow engine: a fixed node graph executed strictly
//! sequentially, one run at a time.
//!
//! Graph:
//! ```text
//! Start → Monitor ─┬─ no new emails ──────────────→ End
//!                  └→ Evaluate ─┬─ spam/noreply → Cleanup → End
//!                               └→ Send ────────→ Cleanup → End
//! ```
//!
//! Each node is `(RunState) -> StateDelta` plus a possible failure; the
//! engine merges the delta and evaluates the outgoing transition. The
//! transition function is pure — side effects live in the nodes only.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::error::{ClassifierError, MailboxError, WorkflowError};
use crate::mailbox::{Label, MailboxClient, OutgoingReply};
use crate::workflow::state::{RunState, RunStatus, StateDelta};

/// Workflow nodes. The graph is fixed; there is no re-entry within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Monitor,
    Evaluate,
    Send,
    Cleanup,
}

impl Node {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Evaluate => "evaluate",
            Self::Send => "send",
            Self::Cleanup => "cleanup",
        }
    }
}

/// Pure transition function: select the next node from the current node
/// and run state. `None` is the terminal state.
pub fn next_node(current: Node, state: &RunState) -> Option<Node> {
    match current {
        Node::Monitor => {
            if state.status == RunStatus::NoNewEmails {
                None
            } else {
                Some(Node::Evaluate)
            }
        }
        Node::Evaluate => {
            if state.is_spam || state.is_noreply {
                Some(Node::Cleanup)
            } else {
                Some(Node::Send)
            }
        }
        // A sent email still gets archived and marked read.
        Node::Send => Some(Node::Cleanup),
        Node::Cleanup => None,
    }
}

/// Executes one run of the triage workflow against the collaborators.
pub struct WorkflowEngine {
    mailbox: Arc<dyn MailboxClient>,
    classifier: Arc<dyn Classifier>,
    page_size: u32,
}

impl WorkflowEngine {
    pub fn new(
        mailbox: Arc<dyn MailboxClient>,
        classifier: Arc<dyn Classifier>,
        page_size: u32,
    ) -> Self {
        Self {
            mailbox,
            classifier,
            page_size,
        }
    }

    /// Run the workflow from `Monitor` to a terminal state.
    ///
    /// Returns the final run state, or the first fatal node error.
    /// Label-mutation failures after the business-critical action are
    /// logged as warnings and never abort the run.
    pub async fn run_once(&self) -> Result<RunState, WorkflowError> {
        let mut state = RunState::new();
        let mut node = Some(Node::Monitor);

        while let Some(current) = node {
            debug!(node = current.label(), "Running node");

            let delta = match current {
                Node::Monitor => self.monitor().await?,
                Node::Evaluate => self.evaluate(&state).await?,
                Node::Send => self.send(&state).await?,
                Node::Cleanup => self.cleanup(&state).await?,
            };

            state.apply(delta);
            node = next_node(current, &state);
        }

        Ok(state)
    }

    // ── Nodes ───────────────────────────────────────────────────────

    /// List unread messages and load the first one. Only one message is
    /// processed per cycle; the rest stay unread for later cycles.
    async fn monitor(&self) -> Result<StateDelta, WorkflowError> {
        let unread = self
            .mailbox
            .list_unread(self.page_size)
            .await
            .map_err(mailbox_unavailable)?;

        let Some(first) = unread.first() else {
            return Ok(StateDelta::status(RunStatus::NoNewEmails));
        };

        let msg = self
            .mailbox
            .get_message(&first.id)
            .await
            .map_err(mailbox_unavailable)?;

        let sender = require_header(&msg.id, msg.header("From"), "From")?;
        let subject = require_header(&msg.id, msg.header("Subject"), "Subject")?;

        info!(sender = %sender, subject = %subject, "New unread email detected");

        Ok(StateDelta {
            sender: Some(sender),
            subject: Some(subject),
            raw_body: Some(msg.snippet.clone()),
            email_id: Some(msg.id),
            thread_id: Some(msg.thread_id),
            status: Some(RunStatus::NewEmailDetected),
            ..Default::default()
        })
    }

    /// Classify the message and draft a reply when one is warranted.
    async fn evaluate(&self, state: &RunState) -> Result<StateDelta, WorkflowError> {
        let verdict = self
            .classifier
            .evaluate(&state.sender, &state.raw_body)
            .await
            .map_err(map_classifier_error)?;

        debug!(
            is_spam = verdict.is_spam,
            is_noreply = verdict.is_noreply,
            category = ?verdict.category,
            "Classification verdict"
        );

        let draft = verdict.wants_reply().then(|| verdict.html_content.clone());

        Ok(StateDelta {
            is_spam: Some(verdict.is_spam),
            is_noreply: Some(verdict.is_noreply),
            category: Some(verdict.category),
            draft,
            status: Some(RunStatus::Drafted),
            ..Default::default()
        })
    }

    /// Send the drafted reply on the original thread, then clear the
    /// unread label. The label clear is attempted only after a
    /// successful send and its own failure is a warning, not an abort.
    async fn send(&self, state: &RunState) -> Result<StateDelta, WorkflowError> {
        let Some(draft) = state.draft.as_deref() else {
            return Err(WorkflowError::Send("no draft present in run state".into()));
        };

        let reply = OutgoingReply {
            to: state.sender.clone(),
            thread_id: state.thread_id.clone(),
            subject: format!("Re: {}", state.subject),
            html_body: draft.to_string(),
        };

        self.mailbox
            .send_reply(&reply)
            .await
            .map_err(|e| WorkflowError::Send(e.to_string()))?;

        if let Err(e) = self
            .mailbox
            .remove_labels(&state.email_id, &[Label::Unread])
            .await
        {
            let warning = WorkflowError::LabelMutation(e.to_string());
            warn!(email_id = %state.email_id, "{warning} (reply was sent)");
        }

        Ok(StateDelta::status(RunStatus::Sent))
    }

    /// Archive the message: clear unread and inbox labels. Failure is
    /// non-fatal — the run keeps its prior status and a warning is
    /// logged, since the business-critical action already completed.
    async fn cleanup(&self, state: &RunState) -> Result<StateDelta, WorkflowError> {
        match self
            .mailbox
            .remove_labels(&state.email_id, &[Label::Unread, Label::Inbox])
            .await
        {
            Ok(()) => {
                info!(subject = %state.subject, "Archived and marked as read");
                Ok(StateDelta::status(RunStatus::Archived))
            }
            Err(e) => {
                let warning = WorkflowError::LabelMutation(e.to_string());
                warn!(
                    email_id = %state.email_id,
                    status = state.status.label(),
                    "{warning} (keeping prior status)"
                );
                Ok(StateDelta::default())
            }
        }
    }
}

// ── Error mapping ───────────────────────────────────────────────────

fn mailbox_unavailable(e: MailboxError) -> WorkflowError {
    WorkflowError::CollaboratorUnavailable {
        service: "mailbox".into(),
        reason: e.to_string(),
    }
}

fn map_classifier_error(e: ClassifierError) -> WorkflowError {
    match e {
        // Transport-level failure — the service itself is unreachable.
        ClassifierError::Http(reason) => WorkflowError::CollaboratorUnavailable {
            service: "classifier".into(),
            reason,
        },
        other => WorkflowError::Classification(other.to_string()),
    }
}

fn require_header(
    email_id: &str,
    value: Option<&str>,
    name: &str,
) -> Result<String, WorkflowError> {
    value
        .map(str::to_string)
        .ok_or_else(|| WorkflowError::HeaderMissing {
            header: name.to_string(),
            email_id: email_id.to_string(),
        })
}
