//! Query command handler.
//!
//! Prints the hybrid search request a question would run. In LLM mode the
//! model is asked to write it; the search backend is never contacted.

use clap::Args;
use hybrid_rag_core::{config::AppConfig, AppResult};
use hybrid_rag_llm::create_client;
use hybrid_rag_pipeline::QueryBuilder;
use hybrid_rag_prompt::PromptTemplates;
use hybrid_rag_search::{SearchFields, SearchRequest};

/// Show the search request for a question without searching
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question to prepare a request for
    pub question: String,

    /// Use heuristic keywords instead of the LLM
    #[arg(long)]
    pub direct: bool,
}

impl QueryCommand {
    /// Execute the query command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command");
        tracing::debug!("Query command options: {:?}", self);

        let fields = SearchFields::from_settings(&config.search);
        let max_results = config.search.max_results;

        let request = if self.direct {
            SearchRequest::heuristic(&self.question, &fields, max_results)
        } else {
            config.validate_llm()?;

            let llm = create_client(
                &config.llm.provider,
                config.llm.endpoint.as_deref(),
                config.llm.api_key.as_deref(),
                config.llm.timeout_secs,
            )?;
            let templates = PromptTemplates::resolve(&config.prompts, &config.prompts_dir())?;

            let builder = QueryBuilder::new(
                llm,
                &config.llm.model,
                config.llm.temperature,
                templates.query,
                fields,
            );
            builder.build_query(&self.question, max_results, true).await?
        };

        println!("{}", request.to_pretty_string());

        Ok(())
    }
}
