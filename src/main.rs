use std::sync::Arc;
use std::sync::atomic::Ordering;

use inbox_triage::classifier::{LlmClassifier, LlmConfig};
use inbox_triage::config::TriageConfig;
use inbox_triage::mailbox::{GmailClient, GmailConfig};
use inbox_triage::scheduler::spawn_scheduler;
use inbox_triage::workflow::WorkflowEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let triage_config = TriageConfig::from_env();
    let gmail_config = GmailConfig::from_env()?;
    let llm_config = LlmConfig::from_env()?;

    eprintln!("📬 Inbox Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   From:  {}", gmail_config.from_address);
    eprintln!(
        "   Poll:  every {}s, page size {}",
        triage_config.poll_interval.as_secs(),
        triage_config.page_size
    );

    let mailbox = Arc::new(GmailClient::new(gmail_config));
    let classifier = Arc::new(LlmClassifier::new(llm_config));
    let engine = Arc::new(WorkflowEngine::new(
        mailbox,
        classifier,
        triage_config.page_size,
    ));

    let (handle, shutdown) = spawn_scheduler(engine, triage_config.poll_interval);

    tokio::signal::ctrl_c().await?;
    eprintln!("Shutting down...");
    shutdown.store(true, Ordering::Relaxed);
    handle.await?;

    Ok(())
}
