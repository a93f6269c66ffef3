//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use compliance_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the system and the user template are rendered with Handlebars.
/// Escaping is disabled since the output is plain text for a model.
///
/// # Example
/// ```no_run
/// use compliance_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "Can we onboard a sanctioned entity?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let user = render(&mut handlebars, "user", &definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|template| render(&mut handlebars, "system", template, &variables))
        .transpose()?
        .map(|s| s.trim_end().to_string())
        .filter(|s| !s.is_empty());

    let built = BuiltPrompt::new(system, user, definition.id.clone(), variables);
    tracing::debug!(
        "Built prompt {} ({} chars)",
        definition.id,
        built.char_len()
    );

    Ok(built)
}

fn render(
    handlebars: &mut Handlebars<'_>,
    name: &str,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render(name, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
