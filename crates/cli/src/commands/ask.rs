//! Ask command handler.
//!
//! Runs one question through the RAG pipeline and prints the answer.

use clap::Args;
use hybrid_rag_core::{config::AppConfig, AppError, AppResult};
use hybrid_rag_pipeline::{render_error, RagAnswer, RagPipeline};
use std::path::PathBuf;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Skip LLM query preparation and search with heuristic keywords
    #[arg(long)]
    pub direct: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the executed search request before the answer
    #[arg(long)]
    pub show_query: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.get_question()?;

        let pipeline = match RagPipeline::connect(config).await {
            Ok(pipeline) => pipeline,
            Err(e) => {
                tracing::error!("Pipeline initialization failed: {}", e);
                eprintln!("Erro ao inicializar pipeline: {}", e);
                std::process::exit(1);
            }
        };

        let result = pipeline.answer(&question, !self.direct).await;
        let failed = result.is_err();

        let output = self.report(result)?;
        println!("{}", output);

        if failed {
            std::process::exit(1);
        }

        Ok(())
    }

    /// Text printed for a pipeline outcome. A failed request is reported as
    /// its rendered message, the same text the chat session shows.
    fn report(&self, result: AppResult<RagAnswer>) -> AppResult<String> {
        let answer = match result {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Question failed: {}", e);
                let message = render_error(&e);
                if self.json {
                    let output = serde_json::json!({ "error": message });
                    return Ok(serde_json::to_string_pretty(&output)?);
                }
                return Ok(message);
            }
        };

        tracing::debug!(
            "Mode: {}, documents: {}, search: {:.2}s, total: {:.2}s",
            answer.mode.as_str(),
            answer.documents.len(),
            answer.search_secs,
            answer.total_secs
        );

        if self.json {
            let documents: Vec<_> = answer
                .documents
                .iter()
                .map(|doc| serde_json::json!({ "id": doc.id, "score": doc.score }))
                .collect();

            let mut output = serde_json::json!({
                "answer": answer.answer,
                "mode": answer.mode.as_str(),
                "documents": documents,
                "timings": {
                    "searchSecs": answer.search_secs,
                    "totalSecs": answer.total_secs
                }
            });

            if self.show_query {
                output["request"] = answer.request.as_json().clone();
            }

            return Ok(serde_json::to_string_pretty(&output)?);
        }

        if self.show_query {
            return Ok(format!(
                "{}\n\n{}",
                answer.request.to_pretty_string(),
                answer.answer
            ));
        }

        Ok(answer.answer)
    }

    /// Get the question text from the argument or the file.
    fn get_question(&self) -> AppResult<String> {
        if let Some(ref question) = self.question {
            return Ok(question.clone());
        }

        match self.file {
            Some(ref path) => std::fs::read_to_string(path)
                .map(|text| text.trim().to_string())
                .map_err(|e| {
                    AppError::Config(format!("Failed to read question file {:?}: {}", path, e))
                }),
            None => Err(AppError::Config("No question provided".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_llm::MockLlmClient;
    use hybrid_rag_pipeline::{ERROR_PREFIX, NO_INFORMATION_MESSAGE};
    use hybrid_rag_prompt::PromptTemplates;
    use hybrid_rag_search::MockSearchBackend;
    use std::sync::Arc;

    fn command(question: Option<&str>) -> AskCommand {
        AskCommand {
            question: question.map(str::to_string),
            file: None,
            direct: false,
            json: false,
            show_query: false,
        }
    }

    #[test]
    fn test_question_from_argument() {
        let cmd = command(Some("O que é RRF?"));
        assert_eq!(cmd.get_question().unwrap(), "O que é RRF?");
    }

    #[test]
    fn test_empty_question_is_accepted() {
        let cmd = command(Some(""));
        assert_eq!(cmd.get_question().unwrap(), "");
    }

    #[test]
    fn test_missing_question() {
        let cmd = command(None);
        assert!(matches!(cmd.get_question(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_question_file() {
        let mut cmd = command(None);
        cmd.file = Some(PathBuf::from("/nonexistent/question.txt"));
        assert!(matches!(cmd.get_question(), Err(AppError::Config(_))));
    }

    fn pipeline(backend: MockSearchBackend) -> RagPipeline {
        RagPipeline::new(
            Arc::new(MockLlmClient::new("Durma em horários regulares.")),
            Arc::new(backend),
            &AppConfig::default(),
            PromptTemplates::defaults(),
        )
    }

    #[tokio::test]
    async fn test_failed_request_reported_once_as_answer() {
        let cmd = command(Some("Como dormir melhor?"));
        let result = pipeline(MockSearchBackend::failing("connection refused"))
            .answer("Como dormir melhor?", false)
            .await;
        assert!(result.is_err());

        let output = cmd.report(result).unwrap();
        assert!(output.starts_with(ERROR_PREFIX));
        assert!(output.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_failed_request_as_json() {
        let mut cmd = command(Some("Como dormir melhor?"));
        cmd.json = true;
        let result = pipeline(MockSearchBackend::failing("down"))
            .answer("Como dormir melhor?", true)
            .await;

        let text = cmd.report(result).unwrap();
        let output: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(output["error"].as_str().unwrap().starts_with(ERROR_PREFIX));
        assert!(output.get("answer").is_none());
    }

    #[tokio::test]
    async fn test_show_query_prints_request_before_answer() {
        let mut cmd = command(Some("Como dormir melhor?"));
        cmd.show_query = true;
        cmd.direct = true;
        let result = pipeline(MockSearchBackend::new())
            .answer("Como dormir melhor?", false)
            .await;

        let output = cmd.report(result).unwrap();
        assert!(output.contains("\"rrf\""));
        assert!(output.ends_with(NO_INFORMATION_MESSAGE));
    }
}
