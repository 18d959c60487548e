use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use agentdesk_cli::App;
use agentdesk_core::config::{expand_path, Config};

#[derive(Parser)]
#[command(name = "agentdesk", about = "Retrieval-augmented answers over your documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and index every matching file under DIR
    Ingest {
        dir: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print reranked hits as JSON
    Retrieve {
        query: String,
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },
    /// Answer from retrieved context and print {query, answer, sources}
    Answer {
        query: String,
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },
    /// Route to the ticket tool or to answering by intent
    Ask {
        query: String,
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },
    /// Show index size and reranker mode
    Status,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Config::load()?.settings().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let app = App::build(settings).await?;

    match cli.command {
        Command::Ingest { dir, limit } => {
            let dir = dir.unwrap_or_else(|| expand_path(&app.settings.ingest.source_dir));
            let report = app.ingest_dir(&dir, limit, true).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Retrieve { query, top_k } => {
            let hits = app.service.retrieve(&query, app.default_top_k(top_k)).await?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Command::Answer { query, top_k } => {
            let answer = app.service.answer(&query, app.default_top_k(top_k)).await?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        Command::Ask { query, top_k } => {
            let response = app.desk.handle(&query, app.default_top_k(top_k)).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Status => {
            use agentdesk_core::traits::VectorIndex;
            let status = json!({
                "collection": app.settings.index.collection,
                "points": app.index.count().await?,
                "reranker": if app.service.reranker().is_degraded() { "degraded" } else { "active" },
                "providers": app.service.chain().provider_names(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
