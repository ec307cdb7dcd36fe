use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use gatekeeper_cli::{remember, server};
use gatekeeper_core::config::Config;
use gatekeeper_core::types::QueryRequest;
use gatekeeper_rag::KnowledgeBase;

const DEFAULT_QUESTION: &str = "What do I do for fun?";

/// A RAG for your own personal knowledge base
#[derive(Debug, Parser)]
#[command(name = "gatekeeper", version)]
struct Cli {
    /// Query the RAG for info
    #[arg(short, long, value_name = "QUERY", num_args = 0..=1, default_missing_value = DEFAULT_QUESTION)]
    ask: Option<String>,

    /// Add content to the RAG to be queried later: a file, a directory, or raw text
    #[arg(short, long, value_name = "CONTENT")]
    remember: Option<String>,

    /// Start a server on the given port, or the configured one (6969 by default)
    #[arg(short, long, value_name = "PORT", num_args = 0..=1)]
    serve: Option<Option<u16>>,
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.ask.is_none() && cli.remember.is_none() && cli.serve.is_none() {
        bail!("nothing to do: pass --ask, --remember or --serve (see --help)");
    }

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let kb = Arc::new(KnowledgeBase::from_settings(&settings).await?);

    if let Some(question) = cli.ask.as_deref() {
        let pb = spinner("Searching knowledge base...");
        match kb.query(&QueryRequest::new(question)).await {
            Ok(result) => {
                pb.finish_and_clear();
                println!("{}", result.answer);
            }
            Err(e) => {
                pb.abandon_with_message("Failed to answer.");
                eprintln!("{}", e);
            }
        }
    }

    if let Some(content) = cli.remember.as_deref() {
        let requests = remember::plan(content, kb.extractors());
        if requests.is_empty() {
            bail!("no supported files under {}", content);
        }
        let pb = spinner("Indexing content into knowledge base...");
        let mut indexed = 0usize;
        let mut failures = 0usize;
        for request in &requests {
            let outcome = kb.ingest(request).await;
            if outcome.success {
                indexed += outcome.documents_indexed;
            } else {
                failures += 1;
                pb.suspend(|| eprintln!("{}", outcome.error.as_deref().unwrap_or("unknown error")));
            }
        }
        if failures == 0 {
            pb.finish_with_message(format!("Indexed {} chunks successfully.", indexed));
        } else {
            pb.abandon_with_message(format!("Failed to index {} of {} inputs.", failures, requests.len()));
        }
    }

    if let Some(port) = cli.serve {
        let port = port.unwrap_or(settings.server.port);
        server::serve(kb, port).await?;
    }
    Ok(())
}
