//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use hybrid_rag_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders the template with Handlebars (no HTML escaping) and pairs the
/// result with the definition's system instruction.
///
/// # Example
/// ```no_run
/// use hybrid_rag_prompt::{build_prompt, PromptTemplates};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let templates = PromptTemplates::defaults();
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "O que é RRF?".to_string());
/// vars.insert("context".to_string(), "Documento 1:\n...".to_string());
///
/// let built = build_prompt(&templates.answer, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        definition.system.clone(),
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_definition() -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: Some("Sistema".to_string()),
            template: "Pergunta: {{query}}".to_string(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "Olá, mundo!".to_string());

        let result = render_template("Pergunta: {{query}}", &vars).unwrap();
        assert_eq!(result, "Pergunta: Olá, mundo!");
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "\"aspas\" & <tags>".to_string());

        let result = render_template("{{query}}", &vars).unwrap();
        assert_eq!(result, "\"aspas\" & <tags>");
    }

    #[test]
    fn test_single_braces_are_literal() {
        let vars = HashMap::new();
        let result = render_template("{ \"size\": 5 }", &vars).unwrap();
        assert_eq!(result, "{ \"size\": 5 }");
    }

    #[test]
    fn test_build_prompt_carries_system() {
        let def = create_test_definition();
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "Teste".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user, "Pergunta: Teste");
        assert_eq!(built.system.as_deref(), Some("Sistema"));
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        let result = render_template("Pergunta: {{missing}}", &vars);
        // Handlebars renders missing variables as empty string
        assert_eq!(result.unwrap(), "Pergunta: ");
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let vars = HashMap::new();
        let result = render_template("{{#if}}", &vars);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
