//! Inbox Triage — polls an inbox, classifies each unread message with an
//! LLM, drafts and sends a reply when warranted, and archives it.

pub mod classifier;
pub mod config;
pub mod error;
pub mod mailbox;
pub mod scheduler;
pub mod workflow;
