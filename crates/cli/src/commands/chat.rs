//! Chat command handler.
//!
//! Interactive session reading questions from stdin. The pipeline is built
//! once and reused; it can be rebuilt with `:init`.

use clap::Args;
use hybrid_rag_core::{config::AppConfig, AppResult};
use hybrid_rag_pipeline::RagPipeline;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const INIT_SUCCESS: &str = "Pipeline RAG inicializada com sucesso!";

const HELP: &str = "Comandos:
  :init          reinicializa a pipeline
  :llm on|off    ativa ou desativa a preparação da consulta pela LLM
  :help          mostra esta ajuda
  :quit          encerra a sessão
Qualquer outro texto é tratado como pergunta.";

/// Interactive question-and-answer session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Start with LLM query preparation disabled
    #[arg(long)]
    pub direct: bool,
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Question(String),
    Init,
    SetLlm(bool),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return ChatInput::Empty;
    }

    if !trimmed.starts_with(':') {
        return ChatInput::Question(trimmed.to_string());
    }

    let mut parts = trimmed.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(":quit") | Some(":q") | Some(":exit"), _) => ChatInput::Quit,
        (Some(":init"), _) => ChatInput::Init,
        (Some(":help"), _) => ChatInput::Help,
        (Some(":llm"), Some("on")) => ChatInput::SetLlm(true),
        (Some(":llm"), Some("off")) => ChatInput::SetLlm(false),
        _ => ChatInput::Unknown(trimmed.to_string()),
    }
}

/// Session state: the lazily built pipeline and the query mode.
struct Session<'a> {
    config: &'a AppConfig,
    pipeline: Option<RagPipeline>,
    use_llm_query: bool,
}

impl<'a> Session<'a> {
    fn new(config: &'a AppConfig, use_llm_query: bool) -> Self {
        Self {
            config,
            pipeline: None,
            use_llm_query,
        }
    }

    /// Build the pipeline, replacing any previous one. Prints the outcome.
    async fn initialize(&mut self) -> bool {
        match RagPipeline::connect(self.config).await {
            Ok(pipeline) => {
                self.pipeline = Some(pipeline);
                println!("{}", INIT_SUCCESS);
                true
            }
            Err(e) => {
                tracing::error!("Pipeline initialization failed: {}", e);
                println!("Erro ao inicializar pipeline: {}", e);
                false
            }
        }
    }

    /// Answer a question, initializing the pipeline first when needed.
    async fn ask(&mut self, question: &str) {
        if self.pipeline.is_none() && !self.initialize().await {
            return;
        }

        if let Some(ref pipeline) = self.pipeline {
            let answer = pipeline.process_query(question, self.use_llm_query).await;
            println!("\n{}\n", answer);
        }
    }
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let mut session = Session::new(config, !self.direct);
        session.initialize().await;

        println!("Digite sua pergunta (:help para ajuda, :quit para sair).");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush().ok();

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line) {
                ChatInput::Quit => break,
                ChatInput::Empty => continue,
                ChatInput::Help => println!("{}", HELP),
                ChatInput::Init => {
                    session.initialize().await;
                }
                ChatInput::SetLlm(enabled) => {
                    session.use_llm_query = enabled;
                    let state = if enabled { "ativada" } else { "desativada" };
                    println!("Preparação da consulta pela LLM {}.", state);
                }
                ChatInput::Unknown(command) => {
                    println!("Comando desconhecido: {}", command);
                    println!("{}", HELP);
                }
                ChatInput::Question(question) => session.ask(&question).await,
            }
        }

        tracing::info!("Chat session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question() {
        assert_eq!(
            parse_input("  Como dormir melhor?  "),
            ChatInput::Question("Como dormir melhor?".to_string())
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input(":quit"), ChatInput::Quit);
        assert_eq!(parse_input(":q"), ChatInput::Quit);
        assert_eq!(parse_input(":init"), ChatInput::Init);
        assert_eq!(parse_input(":help"), ChatInput::Help);
        assert_eq!(parse_input(":llm on"), ChatInput::SetLlm(true));
        assert_eq!(parse_input(":llm   off"), ChatInput::SetLlm(false));
    }

    #[test]
    fn test_parse_unknown_and_empty() {
        assert_eq!(parse_input(""), ChatInput::Empty);
        assert_eq!(parse_input("   "), ChatInput::Empty);
        assert_eq!(
            parse_input(":llm talvez"),
            ChatInput::Unknown(":llm talvez".to_string())
        );
        assert_eq!(
            parse_input(":reset"),
            ChatInput::Unknown(":reset".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_init_leaves_session_empty() {
        // No search endpoint configured, so initialization fails before any I/O
        let config = AppConfig::default();
        let mut session = Session::new(&config, true);

        assert!(!session.initialize().await);
        assert!(session.pipeline.is_none());

        session.ask("Pergunta sem pipeline").await;
        assert!(session.pipeline.is_none());
    }
}
