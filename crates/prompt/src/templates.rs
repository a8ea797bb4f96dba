//! Built-in RAG prompt templates and their override resolution.
//!
//! Variables:
//! - query preparation: `query`, `text_field`, `semantic_field`, `max_results`
//! - answer generation: `context`, `query`
//!
//! Literal JSON in templates keeps every brace on its own token so that
//! Handlebars never sees `{{` outside a variable.

use crate::loader::load_prompt;
use crate::types::PromptDefinition;
use hybrid_rag_core::{AppResult, PromptSettings};
use std::path::Path;

/// ID of the query-preparation prompt.
pub const QUERY_PREPARATION_ID: &str = "rag.query.prepare";

/// ID of the answer-generation prompt.
pub const ANSWER_GENERATION_ID: &str = "rag.answer.generate";

const QUERY_PREPARATION_SYSTEM: &str = "Você é um assistente especializado em gerar consultas Elasticsearch e extrair palavras-chave relevantes.";

const QUERY_PREPARATION_TEMPLATE: &str = r#"
Você é um assistente especializado em transformar perguntas em consultas para Elasticsearch.
Baseado na seguinte pergunta do usuário, crie uma consulta híbrida para o Elasticsearch.

Pergunta do usuário: {{query}}

A consulta deve incluir:
1. Uma parte semântica (semantic search) usando o campo '{{semantic_field}}' para busca vetorial
2. Uma parte de texto (query_string) extraindo palavras-chave da pergunta do usuário

IMPORTANTE:
- Para a busca do tipo "query_string", você DEVE extrair apenas as palavras-chave relevantes da pergunta do usuário e formatá-las como uma consulta booleana.
- A consulta original completa do usuário só deve ser usada na parte semântica.

Exemplo de extração de palavras-chave:

Pergunta do usuário: "Quais podcasts de fitness são mais populares?"
Palavras-chave extraídas: "(fitness)"

Pergunta do usuário: "Me resuma 3 notícias de copas do mundo de futebol"
Palavras-chave extraídas: "(copa do mundo) OR (futebol)"

Pergunta do usuário: "Como posso melhorar meu sono com meditação?"
Palavras-chave extraídas: "(sono) OR (meditação) OR (insonia)"

Formate a consulta Elasticsearch como JSON seguindo este modelo:
{
  "retriever": {
    "rrf": {
      "retrievers": [
        {
          "standard": {
            "query": {
              "query_string": {
                "default_field": "{{text_field}}",
                "query": "PALAVRAS_CHAVE_AQUI"
              }
            }
          }
        },
        {
          "standard": {
            "query": {
              "semantic": {
                "field": "{{semantic_field}}",
                "query": "{{query}}"
              }
            }
          }
        }
      ]
    }
  },
  "size": {{max_results}}
}

Você DEVE substituir "PALAVRAS_CHAVE_AQUI" pelas palavras-chave relevantes que você extraiu da pergunta do usuário, formatadas como expressão booleana com operadores OR.
Mantenha a pergunta original do usuário, sem alterações, no campo "query" da parte semântica.
Responda apenas com o JSON, sem comentários.
"#;

const ANSWER_GENERATION_SYSTEM: &str =
    "Você é um assistente especializado em fornecer respostas precisas baseadas no contexto.";

const ANSWER_GENERATION_TEMPLATE: &str = r#"
Você é um assistente especializado em fornecer respostas precisas com base no contexto fornecido.

Contexto:
{{context}}

Pergunta do usuário: {{query}}

Forneça uma resposta resumida e informativa com base apenas nas informações contidas no contexto acima.
Se o contexto não contiver informações suficientes para responder à pergunta, indique isso claramente.
Não invente informações ou use conhecimento externo ao contexto fornecido.
Sempre forneça a resposta baseado nos documentos mais relevantes. Priorize-os, sempre. No entanto, não mencione o número do documento.
Sempre forneça a resposta em português, mesmo que o contexto esteja em outro idioma.
Seja breve, preciso e não vá muito além do solicitado.
"#;

/// The pair of prompts used by the pipeline.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Question -> hybrid search request
    pub query: PromptDefinition,

    /// Question + context -> answer
    pub answer: PromptDefinition,
}

impl PromptTemplates {
    /// Built-in Portuguese templates.
    pub fn defaults() -> Self {
        Self {
            query: builtin(
                QUERY_PREPARATION_ID,
                "Query preparation",
                QUERY_PREPARATION_SYSTEM,
                QUERY_PREPARATION_TEMPLATE,
            ),
            answer: builtin(
                ANSWER_GENERATION_ID,
                "Answer generation",
                ANSWER_GENERATION_SYSTEM,
                ANSWER_GENERATION_TEMPLATE,
            ),
        }
    }

    /// Resolve templates: built-in defaults, replaced by `<id>.yml` files in
    /// `prompts_dir` when present, then by inline overrides from the config.
    pub fn resolve(settings: &PromptSettings, prompts_dir: &Path) -> AppResult<Self> {
        let mut templates = Self::defaults();

        if prompts_dir.join(format!("{}.yml", QUERY_PREPARATION_ID)).exists() {
            let loaded = load_prompt(prompts_dir, QUERY_PREPARATION_ID)?;
            templates.query = merge_file(templates.query, loaded);
        }

        if prompts_dir.join(format!("{}.yml", ANSWER_GENERATION_ID)).exists() {
            let loaded = load_prompt(prompts_dir, ANSWER_GENERATION_ID)?;
            templates.answer = merge_file(templates.answer, loaded);
        }

        if let Some(ref template) = settings.query_template {
            tracing::debug!("Using inline query-preparation template from config");
            templates.query.template = template.clone();
        }

        if let Some(ref template) = settings.answer_template {
            tracing::debug!("Using inline answer-generation template from config");
            templates.answer.template = template.clone();
        }

        Ok(templates)
    }
}

fn builtin(id: &str, title: &str, system: &str, template: &str) -> PromptDefinition {
    PromptDefinition {
        id: id.to_string(),
        title: title.to_string(),
        api_version: "1.0".to_string(),
        created_by: "builtin".to_string(),
        system: Some(system.to_string()),
        template: template.to_string(),
    }
}

/// A file definition without a system instruction keeps the built-in one.
fn merge_file(builtin: PromptDefinition, mut loaded: PromptDefinition) -> PromptDefinition {
    if loaded.system.is_none() {
        loaded.system = builtin.system;
    }
    loaded
}
