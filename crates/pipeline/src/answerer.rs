//! Answer generation from retrieved documents.

use hybrid_rag_core::AppResult;
use hybrid_rag_llm::{LlmClient, LlmRequest};
use hybrid_rag_prompt::{build_prompt, PromptDefinition};
use hybrid_rag_search::{Document, SearchFields};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Answer returned when retrieval finds nothing.
pub const NO_INFORMATION_MESSAGE: &str =
    "Não encontrei informações relevantes para responder sua pergunta.";

/// Format documents as numbered context blocks for the answer prompt.
///
/// Each block is `Documento N:` followed by the document text and a blank
/// line. The text is the first of: the configured text field, `text`,
/// `content`, `title` with `body`, or the whole source as pretty JSON
/// without the semantic field.
pub fn build_context(documents: &[Document], fields: &SearchFields) -> String {
    let mut context = String::new();

    for (i, document) in documents.iter().enumerate() {
        context.push_str(&format!("Documento {}:\n", i + 1));
        context.push_str(&document_text(document, fields));
        context.push_str("\n\n");
    }

    context
}

fn document_text(document: &Document, fields: &SearchFields) -> String {
    if let Some(text) = document.field_text(&fields.text_field) {
        return text;
    }

    for field in ["text", "content"] {
        if let Some(text) = document.field_text(field) {
            return text;
        }
    }

    if let (Some(title), Some(body)) = (document.field_text("title"), document.field_text("body"))
    {
        return format!("Título: {}\n\nConteúdo: {}", title, body);
    }

    let source: Map<String, Value> = document
        .source
        .iter()
        .filter(|(key, _)| **key != fields.semantic_field)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let source = Value::Object(source);

    serde_json::to_string_pretty(&source).unwrap_or_else(|_| source.to_string())
}

/// Generates the final answer from the question and retrieved documents.
pub struct Answerer {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    template: PromptDefinition,
    fields: SearchFields,
}

impl Answerer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        temperature: f32,
        template: PromptDefinition,
        fields: SearchFields,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature,
            template,
            fields,
        }
    }

    /// Answer `user_query` from `documents`.
    ///
    /// Returns [`NO_INFORMATION_MESSAGE`] without calling the LLM when there
    /// are no documents; otherwise the completion text, unmodified.
    pub async fn generate_response(
        &self,
        user_query: &str,
        documents: &[Document],
    ) -> AppResult<String> {
        if documents.is_empty() {
            return Ok(NO_INFORMATION_MESSAGE.to_string());
        }

        let mut variables = HashMap::new();
        variables.insert(
            "context".to_string(),
            build_context(documents, &self.fields),
        );
        variables.insert("query".to_string(), user_query.to_string());

        let prompt = build_prompt(&self.template, variables)?;
        tracing::debug!("Answer prompt:\n{}", prompt.user);

        let mut request =
            LlmRequest::new(prompt.user, &self.model).with_temperature(self.temperature);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        tracing::info!(
            "Generating answer from {} documents with {}",
            documents.len(),
            self.llm.provider_name()
        );
        let response = self.llm.complete(&request).await?;
        tracing::info!("Answer generated");

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_core::AppError;
    use hybrid_rag_llm::MockLlmClient;
    use hybrid_rag_prompt::PromptTemplates;
    use serde_json::json;

    fn document(id: &str, source: Value) -> Document {
        match source {
            Value::Object(map) => Document::new(id, 1.0, map),
            _ => panic!("source must be an object"),
        }
    }

    fn answerer(llm: Arc<MockLlmClient>) -> Answerer {
        Answerer::new(
            llm,
            "llama3-70b-8192",
            0.3,
            PromptTemplates::defaults().answer,
            SearchFields::default(),
        )
    }

    #[test]
    fn test_context_field_priority() {
        let docs = vec![
            document("1", json!({"texto": "Campo principal", "text": "ignorado"})),
            document("2", json!({"text": "Texto em inglês"})),
            document("3", json!({"content": "Conteúdo genérico"})),
            document("4", json!({"title": "Sono", "body": "Durma oito horas"})),
        ];

        let context = build_context(&docs, &SearchFields::default());
        assert_eq!(
            context,
            "Documento 1:\nCampo principal\n\n\
             Documento 2:\nTexto em inglês\n\n\
             Documento 3:\nConteúdo genérico\n\n\
             Documento 4:\nTítulo: Sono\n\nConteúdo: Durma oito horas\n\n"
        );
    }

    #[test]
    fn test_context_falls_back_to_source_json() {
        let docs = vec![document(
            "1",
            json!({"autor": "Ana", "semantic_text": [0.1, 0.2], "ano": 2024}),
        )];

        let context = build_context(&docs, &SearchFields::default());
        assert_eq!(
            context,
            "Documento 1:\n{\n  \"autor\": \"Ana\",\n  \"ano\": 2024\n}\n\n"
        );
    }

    #[test]
    fn test_context_non_string_text_field() {
        let docs = vec![document("1", json!({"texto": ["a", "b"]}))];
        let context = build_context(&docs, &SearchFields::default());
        assert_eq!(context, "Documento 1:\n[\"a\",\"b\"]\n\n");
    }

    #[test]
    fn test_title_without_body_uses_json() {
        let docs = vec![document("1", json!({"title": "Só título"}))];
        let context = build_context(&docs, &SearchFields::default());
        assert!(context.contains("\"title\": \"Só título\""));
    }

    #[tokio::test]
    async fn test_no_documents_skips_llm() {
        let llm = Arc::new(MockLlmClient::new("não deveria ser usado"));
        let answer = answerer(llm.clone())
            .generate_response("Qualquer pergunta?", &[])
            .await
            .unwrap();

        assert_eq!(answer, NO_INFORMATION_MESSAGE);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_answer_is_completion_text() {
        let llm = Arc::new(MockLlmClient::new("Medite antes de dormir."));
        let docs = vec![document("1", json!({"texto": "Meditação melhora o sono."}))];

        let answer = answerer(llm.clone())
            .generate_response("Como dormir melhor?", &docs)
            .await
            .unwrap();

        assert_eq!(answer, "Medite antes de dormir.");

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0]
            .prompt
            .contains("Documento 1:\nMeditação melhora o sono."));
        assert!(requests[0].prompt.contains("Como dormir melhor?"));
        assert_eq!(
            requests[0].system.as_deref(),
            Some("Você é um assistente especializado em fornecer respostas precisas baseadas no contexto.")
        );
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let llm = Arc::new(MockLlmClient::new("").with_error("timeout"));
        let docs = vec![document("1", json!({"texto": "x"}))];

        let result = answerer(llm).generate_response("q", &docs).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
