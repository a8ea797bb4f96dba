//! End-to-end RAG orchestration.

use crate::answerer::{Answerer, NO_INFORMATION_MESSAGE};
use crate::query_builder::QueryBuilder;
use hybrid_rag_core::{AppConfig, AppError, AppResult};
use hybrid_rag_llm::{create_client, LlmClient};
use hybrid_rag_prompt::PromptTemplates;
use hybrid_rag_search::{
    Document, ElasticsearchClient, Retrieval, Retriever, SearchBackend, SearchFields,
    SearchRequest,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Prefix of the text returned by [`RagPipeline::process_query`] on failure.
pub const ERROR_PREFIX: &str = "Ocorreu um erro ao processar sua consulta:";

/// How the search request is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// The LLM writes the request (with heuristic fallback)
    Llm,

    /// Heuristic keywords only
    Direct,
}

impl QueryMode {
    pub fn from_flag(use_llm_query: bool) -> Self {
        if use_llm_query {
            QueryMode::Llm
        } else {
            QueryMode::Direct
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Llm => "llm",
            QueryMode::Direct => "direct",
        }
    }
}

/// Progress of a single request through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    QueryPrepared,
    DocumentsRetrieved,
    AnswerGenerated,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::QueryPrepared => "query_prepared",
            Stage::DocumentsRetrieved => "documents_retrieved",
            Stage::AnswerGenerated => "answer_generated",
            Stage::Done => "done",
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,

    /// The request that was executed, with `size` applied
    pub request: SearchRequest,

    pub documents: Vec<Document>,
    pub mode: QueryMode,

    /// Seconds from request start until retrieval finished
    pub search_secs: f64,

    /// Seconds for the whole request
    pub total_secs: f64,
}

/// Question -> search request -> documents -> answer.
///
/// Holds the shared service clients; one instance serves any number of
/// sequential requests.
pub struct RagPipeline {
    query_builder: QueryBuilder,
    retriever: Retriever,
    answerer: Answerer,
    max_results: usize,
}

impl RagPipeline {
    /// Assemble a pipeline from already-built clients.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        backend: Arc<dyn SearchBackend>,
        config: &AppConfig,
        templates: PromptTemplates,
    ) -> Self {
        let fields = SearchFields::from_settings(&config.search);

        Self {
            query_builder: QueryBuilder::new(
                llm.clone(),
                &config.llm.model,
                config.llm.temperature,
                templates.query,
                fields.clone(),
            ),
            retriever: Retriever::new(backend, &config.search.index, fields.clone()),
            answerer: Answerer::new(
                llm,
                &config.llm.model,
                config.llm.temperature,
                templates.answer,
                fields,
            ),
            max_results: config.search.max_results,
        }
    }

    /// Validate the configuration, build both clients and verify the search
    /// backend answers.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let llm = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            config.llm.api_key.as_deref(),
            config.llm.timeout_secs,
        )?;
        let backend = ElasticsearchClient::connect(&config.search).await?;
        let templates = PromptTemplates::resolve(&config.prompts, &config.prompts_dir())?;

        tracing::info!(
            "RAG pipeline ready (index: {}, provider: {}, model: {})",
            config.search.index,
            config.llm.provider,
            config.llm.model
        );

        Ok(Self::new(llm, Arc::new(backend), config, templates))
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// The search request a question would run, without executing it.
    pub async fn prepare_query(
        &self,
        user_query: &str,
        use_llm_query: bool,
    ) -> AppResult<SearchRequest> {
        self.query_builder
            .build_query(user_query, self.max_results, use_llm_query)
            .await
    }

    /// Run the full pipeline for one question.
    pub async fn answer(&self, user_query: &str, use_llm_query: bool) -> AppResult<RagAnswer> {
        let mut stage = Stage::Start;

        match self.run(user_query, use_llm_query, &mut stage).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                tracing::error!(
                    "Query processing failed after stage {}: {}",
                    stage.as_str(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Run the pipeline and render any failure as user-facing text.
    pub async fn process_query(&self, user_query: &str, use_llm_query: bool) -> String {
        match self.answer(user_query, use_llm_query).await {
            Ok(answer) => answer.answer,
            Err(e) => render_error(&e),
        }
    }

    async fn run(
        &self,
        user_query: &str,
        use_llm_query: bool,
        stage: &mut Stage,
    ) -> AppResult<RagAnswer> {
        let started = Instant::now();
        let mode = QueryMode::from_flag(use_llm_query);

        let retrieval = match mode {
            QueryMode::Llm => {
                tracing::info!("Preparing search request with the LLM");
                let request = self.prepare_query(user_query, true).await?;
                advance(stage, Stage::QueryPrepared);

                tracing::info!("Executing prepared search request");
                self.retriever.search(request, self.max_results).await?
            }
            QueryMode::Direct => {
                tracing::info!("Running direct hybrid search");
                advance(stage, Stage::QueryPrepared);

                self.retriever
                    .semantic_search(user_query, self.max_results)
                    .await?
            }
        };
        let Retrieval { request, documents } = retrieval;
        advance(stage, Stage::DocumentsRetrieved);

        let search_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            "Search finished in {:.2} seconds with {} documents",
            search_secs,
            documents.len()
        );

        let answer = if documents.is_empty() {
            NO_INFORMATION_MESSAGE.to_string()
        } else {
            self.answerer
                .generate_response(user_query, &documents)
                .await?
        };
        advance(stage, Stage::AnswerGenerated);

        let total_secs = started.elapsed().as_secs_f64();
        tracing::info!("Query processed in {:.2} seconds", total_secs);
        advance(stage, Stage::Done);

        Ok(RagAnswer {
            answer,
            request,
            documents,
            mode,
            search_secs,
            total_secs,
        })
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!("Pipeline stage: {} -> {}", stage.as_str(), next.as_str());
    *stage = next;
}

/// User-facing text for a failed request.
pub fn render_error(error: &AppError) -> String {
    format!("{} {}", ERROR_PREFIX, error)
}
