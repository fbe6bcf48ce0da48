//! Study assistant server binary
//!
//! Run with: cargo run -p study-rag --bin study-rag-server
//! Set `STUDY_RAG_CONFIG` to a TOML file to override the defaults.

use anyhow::Context;
use study_rag::{config::StudyRagConfig, server::StudyServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_ENV: &str = "STUDY_RAG_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => StudyRagConfig::load(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        Err(_) => {
            let config = StudyRagConfig::default();
            config.validate().context("default configuration")?;
            config
        }
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Database: {}", config.storage.database_path.display());
    tracing::info!("  - Indexes: {}", config.storage.index_root.display());
    tracing::info!(
        "  - Embedding model: {} ({} dims)",
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - LLM model: {} (judge: {})", config.llm.generate_model, config.llm.judge_model());
    tracing::info!(
        "  - Retrieval: top {} of {} candidates, {:?} re-ranker",
        config.retrieval.final_k,
        config.retrieval.candidate_k,
        config.reranker.kind
    );

    let server = StudyServer::new(config).await?;

    println!("\nStudy assistant listening on http://{}", server.address());
    println!("  Health:   http://{}/health", server.address());
    println!("  API info: http://{}/api/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
