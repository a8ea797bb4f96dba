//! Check command handler.
//!
//! Connection diagnostics for the configured Elasticsearch deployment.

use clap::Args;
use hybrid_rag_core::{config::AppConfig, logging::redact, AppError, AppResult};
use hybrid_rag_search::{ElasticsearchClient, SearchBackend};
use serde_json::json;

/// Check the Elasticsearch connection and index
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Also print the index mapping
    #[arg(long)]
    pub show_mapping: bool,

    /// Also print the index settings, mappings and aliases
    #[arg(long)]
    pub show_info: bool,
}

impl CheckCommand {
    /// Execute the check command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing check command");

        let search = &config.search;
        let index = search.index.as_str();

        if let Some(ref cloud_id) = search.cloud_id {
            println!("Cloud ID: {}", redact(cloud_id, 10));
        } else if let Some(ref url) = search.url {
            println!("URL: {}", url);
        }
        println!("Index: {}", index);

        if let Err(e) = self.run(config).await {
            println!("Connection check failed: {}", e);
            println!("Check ES_CLOUD_ID / ES_URL and ES_API_KEY");
            return Err(e);
        }

        Ok(())
    }

    async fn run(&self, config: &AppConfig) -> AppResult<()> {
        config.validate_search()?;

        let search = &config.search;
        let index = search.index.as_str();
        let client = ElasticsearchClient::new(search)?;

        println!("Pinging {}...", client.base_url());
        if !client.ping().await? {
            return Err(AppError::Connection("Ping returned false".to_string()));
        }
        println!("Connection OK");

        if !client.index_exists(index).await? {
            println!("Index '{}' does not exist", index);

            let indices = client.list_indices().await?;
            println!("Available indices: {}", indices.join(", "));
            return Ok(());
        }
        println!("Index '{}' found", index);

        let mapping = client.get_mapping(index).await?;
        println!("Mapping retrieved");
        if self.show_mapping {
            println!("{}", serde_json::to_string_pretty(&mapping)?);
        }

        if self.show_info {
            let info = client.index_info(index).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        let count = client.count(index).await?;
        println!("Index contains {} documents", count);

        match client.search(index, &json!({ "size": 1 })).await {
            Ok(response) => match response.hits.hits.first() {
                Some(hit) => println!("Sample document ID: {}", hit.id),
                None => println!("No documents found in the index"),
            },
            Err(e) => println!("Failed to fetch a sample document: {}", e),
        }

        Ok(())
    }
}
