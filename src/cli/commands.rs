//! CLI commands

use std::path::Path;
use std::sync::Arc;

use crate::agent::Agent;
use crate::core::{Config, Result};
use crate::llm::OpenAIClient;
use crate::retrieval::{IndexSpec, Ingestor, PineconeControl, PineconeIndex};

/// Start the chat server and block until it stops
pub async fn serve(config: Config) -> Result<()> {
    tracing::info!("{}", status_text(&config));
    let agent = Agent::from_config(&config).await?;
    crate::web::serve(&config, agent).await
}

/// Chunk, embed and upsert one file; returns the number of chunks written
///
/// The index is created and awaited first when missing. A configured
/// `index_host` takes precedence over the host the control plane reports.
pub async fn ingest(config: &Config, file: &Path) -> Result<usize> {
    let embedder = Arc::new(OpenAIClient::from_config(config)?);

    let control = PineconeControl::from_config(config)?;
    let resolved = control
        .ensure_index(&IndexSpec::from_config(&config.pinecone))
        .await?;
    let host = config.pinecone.index_host.as_deref().unwrap_or(&resolved);
    let index = Arc::new(PineconeIndex::for_host(config, host)?);
    let ingestor = Ingestor::new(
        embedder,
        index,
        &config.pinecone.namespace,
        config.pinecone.chunk_size,
    );

    tracing::info!(
        file = %file.display(),
        namespace = %config.pinecone.namespace,
        chunk_size = config.pinecone.chunk_size,
        "Ingesting"
    );
    ingestor.ingest_file(file).await
}

/// Print the default configuration, or save it and report where
pub fn config(save: bool) -> Result<String> {
    if save {
        let path = Config::default().save()?;
        return Ok(format!("Config written to {}", path.display()));
    }
    Ok(Config::default_config_toml())
}

/// One-line summary of the effective configuration
pub fn status_text(config: &Config) -> String {
    format!(
        "model={} listen={} retrieval={} resources={} debug={}",
        config.openai.model,
        config.server_addr(),
        if config.retrieval_ready() { "on" } else { "off" },
        config.resources.files.len(),
        if config.agent.debug { "on" } else { "off" }
    )
}
