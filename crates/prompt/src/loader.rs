//! Prompt loader for YAML prompt definitions.
//!
//! Built-in definitions are compiled into the binary. A workspace may
//! override any of them with `.compliance/prompts/<id>.yml`.

use crate::types::{PromptDefinition, PromptSource};
use compliance_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Prompt used to generate a grounded answer.
pub const ANSWER_PROMPT_ID: &str = "compliance.answer";

/// Prompt used by the LLM judge.
pub const JUDGE_PROMPT_ID: &str = "compliance.judge";

/// Prompt used for the single repair pass.
pub const REPAIR_PROMPT_ID: &str = "compliance.repair";

const BUILTIN_PROMPTS: [(&str, &str); 3] = [
    (
        ANSWER_PROMPT_ID,
        include_str!("../prompts/compliance.answer.yml"),
    ),
    (JUDGE_PROMPT_ID, include_str!("../prompts/compliance.judge.yml")),
    (
        REPAIR_PROMPT_ID,
        include_str!("../prompts/compliance.repair.yml"),
    ),
];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".compliance/prompts")
}

/// Load a prompt definition by ID.
///
/// The workspace override wins over the built-in definition. An override
/// that exists but cannot be parsed is an error rather than a silent
/// fallback.
///
/// # Example
/// ```no_run
/// use compliance_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "compliance.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    let (definition, source) = if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);
        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;
        let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to parse prompt YAML {:?}: {}",
                prompt_file, e
            ))
        })?;
        (definition, PromptSource::Workspace)
    } else {
        (builtin_prompt(prompt_id)?, PromptSource::Builtin)
    };

    validate_prompt(&definition)?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file declares id '{}' but was loaded as '{}'",
            definition.id, prompt_id
        )));
    }

    tracing::debug!(
        "Loaded prompt: {} ({}, {:?})",
        definition.id,
        definition.title,
        source
    );

    Ok(definition)
}

/// Parse a built-in prompt definition.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, raw) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    serde_yaml::from_str(raw)
        .map_err(|e| AppError::Prompt(format!("Built-in prompt {} is invalid: {}", prompt_id, e)))
}

/// List prompt IDs with where each one resolves from.
pub fn list_prompts(workspace_path: &Path) -> Vec<(String, PromptSource)> {
    let mut prompts: Vec<(String, PromptSource)> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| (id.to_string(), PromptSource::Builtin))
        .collect();

    let dir = prompts_dir(workspace_path);
    if !dir.exists() {
        return prompts;
    }

    for entry in walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("yml") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            match prompts.iter_mut().find(|(id, _)| id == stem) {
                Some(existing) => existing.1 = PromptSource::Workspace,
                None => prompts.push((stem.to_string(), PromptSource::Workspace)),
            }
        }
    }

    prompts
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt {} has an empty template",
            def.id
        )));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, content: &str) {
        let prompts_dir = dir.join(".compliance/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(format!("{}.yml", id)), content).unwrap();
    }

    #[test]
    fn test_builtins_parse_and_validate() {
        let temp_dir = TempDir::new().unwrap();
        for id in [ANSWER_PROMPT_ID, JUDGE_PROMPT_ID, REPAIR_PROMPT_ID] {
            let def = load_prompt(temp_dir.path(), id).unwrap();
            assert_eq!(def.id, id);
            assert!(def.system.is_some());
        }
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            JUDGE_PROMPT_ID,
            r#"
id: compliance.judge
title: "Local judge"
apiVersion: "1.1"
template: "Judge {{answer}}"
"#,
        );

        let def = load_prompt(temp_dir.path(), JUDGE_PROMPT_ID).unwrap();
        assert_eq!(def.title, "Local judge");
        assert!(def.system.is_none());

        let listed = list_prompts(temp_dir.path());
        assert!(listed.contains(&(JUDGE_PROMPT_ID.to_string(), PromptSource::Workspace)));
        assert!(listed.contains(&(ANSWER_PROMPT_ID.to_string(), PromptSource::Builtin)));
    }

    #[test]
    fn test_invalid_override_is_error() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), ANSWER_PROMPT_ID, "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), ANSWER_PROMPT_ID).is_err());
    }

    #[test]
    fn test_mismatched_id_is_error() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            REPAIR_PROMPT_ID,
            "id: other\ntitle: t\napiVersion: \"1.0\"\ntemplate: x\n",
        );
        assert!(load_prompt(temp_dir.path(), REPAIR_PROMPT_ID).is_err());
    }

    #[test]
    fn test_unknown_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            load_prompt(temp_dir.path(), "nonexistent"),
            Err(AppError::Prompt(_))
        ));
    }
}
