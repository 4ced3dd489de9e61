//! Prompt catalog and templates
//!
//! The catalog is a flat YAML mapping loaded once at startup. Templates are
//! immutable strings with `{name}` placeholders that must all be bound at
//! render time.

use super::errors::{ChatError, ChatResult};
use prompt_utils::placeholder::{self, Segment};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

pub const GUARD_PROMPT: &str = "guard_prompt";
pub const SYSTEM_PROMPT: &str = "system_prompt";
pub const REJECTION_MESSAGE: &str = "rejection_message";

const REQUIRED_KEYS: [&str; 3] = [SYSTEM_PROMPT, GUARD_PROMPT, REJECTION_MESSAGE];

/// Named prompt strings loaded from the prompt resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptCatalog {
    entries: BTreeMap<String, String>,
}

impl PromptCatalog {
    /// Load the catalog from a YAML file
    pub fn from_file(path: &Path) -> ChatResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::config(format!("Failed to read prompt file {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_yaml(&content)?;
        debug!("Loaded {} prompts from {}", catalog.entries.len(), path.display());
        Ok(catalog)
    }

    /// Parse the catalog from YAML text
    pub fn from_yaml(content: &str) -> ChatResult<Self> {
        let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(content)?;

        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            match value {
                serde_yaml::Value::String(text) => {
                    entries.insert(key, text);
                }
                _ if REQUIRED_KEYS.contains(&key.as_str()) => {
                    return Err(ChatError::config(format!("Prompt '{}' must be a string", key)));
                }
                _ => debug!("Ignoring non-string prompt entry '{}'", key),
            }
        }

        Self::from_entries(entries)
    }

    /// Build a catalog from key/value pairs, checking required keys
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> ChatResult<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries: BTreeMap<String, String> =
            entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

        for key in REQUIRED_KEYS {
            if !entries.contains_key(key) {
                return Err(ChatError::config(format!("Prompt catalog is missing '{}'", key)));
            }
        }

        Ok(Self { entries })
    }

    /// Look up a prompt by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn guard_prompt(&self) -> &str {
        self.required(GUARD_PROMPT)
    }

    pub fn system_prompt(&self) -> &str {
        self.required(SYSTEM_PROMPT)
    }

    pub fn rejection_message(&self) -> &str {
        self.required(REJECTION_MESSAGE)
    }

    fn required(&self, name: &str) -> &str {
        // presence is checked in from_entries
        self.get(name).unwrap_or_default()
    }
}

/// Immutable template with named placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    name: String,
    text: String,
    variables: Vec<String>,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    /// Create a template; placeholders are discovered from the text
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let variables = placeholder::names(&text);
        Self { name: name.into(), text, variables, partials: HashMap::new() }
    }

    /// Guard template: the catalog guard prompt followed by the question slot
    pub fn guard(guard_prompt: &str) -> Self {
        Self::new("guard", format!("{}\n\nQuestion: {{question}}\nAnswer:", guard_prompt))
    }

    /// Answer template with the system prompt pre-bound
    pub fn answer(system_prompt: &str) -> Self {
        Self::new(
            "answer",
            "{system_prompt}\n\n### User Question:\n{question}\n\n### Assistant Response:\n",
        )
        .partial("system_prompt", system_prompt)
    }

    /// Pre-bind a placeholder value
    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.insert(name.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All placeholder names in the template text
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Placeholders that still need a value at render time
    pub fn input_variables(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|v| !self.partials.contains_key(v.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Fail unless every unbound placeholder is one of `allowed`
    pub fn ensure_inputs(&self, allowed: &[&str]) -> ChatResult<()> {
        for var in self.input_variables() {
            if !allowed.contains(&var) {
                return Err(ChatError::config(format!(
                    "Template '{}' uses unknown placeholder '{{{}}}'",
                    self.name, var
                )));
            }
        }
        Ok(())
    }

    /// Substitute every placeholder in a single pass.
    ///
    /// Values are inserted verbatim and never re-scanned, so a question
    /// containing `{braces}` is rendered as typed.
    pub fn render(&self, values: &[(&str, &str)]) -> ChatResult<String> {
        let mut out = String::with_capacity(self.text.len() + 64);

        for segment in placeholder::segments(&self.text) {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Brace(brace) => out.push(brace),
                Segment::Placeholder(var) => {
                    let value = values
                        .iter()
                        .find(|(k, _)| *k == var)
                        .map(|(_, v)| *v)
                        .or_else(|| self.partials.get(var).map(String::as_str))
                        .ok_or_else(|| ChatError::missing_variable(var, &self.name))?;
                    out.push_str(value);
                }
            }
        }

        Ok(out)
    }
}
