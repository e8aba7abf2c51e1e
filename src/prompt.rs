//! Prompt templates and `{key}` substitution.

use crate::{error::Result, PipelineError};
use std::collections::HashMap;

/// Search prompt. Placeholders: `{product}`, `{section}`.
pub const SEARCH_PROMPT: &str = "
You are a smart shopping assistant. Search for the best deals on Amazon for {product} in the {section} category.
Provide results in a structured format:
- Title
- Price
- Ratings
- URL
";

/// Recommendation prompt. Placeholder: `{amazon_results}`.
pub const RECOMMENDATION_PROMPT: &str = "
Given the search results from Amazon, analyze the best product based on price, ratings, and availability.
Provide a recommendation in this format:

Search Results: {amazon_results}

**Recommendation:**
[Product Name]
- Price: $X.XX
- Rating: X.X stars
- Buy from: [Retailer Name]
- Reason: (Short justification)
";

/// Values substituted into prompt `{key}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct PromptVars {
    pub data: HashMap<String, String>,
}

impl PromptVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }
}

/// Render a prompt template, replacing every `{key}` with its value.
///
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
/// Braces that do not enclose an identifier (e.g. inline JSON) are kept
/// as-is. Substituted values are never re-scanned.
///
/// # Errors
///
/// [`PipelineError::MissingVariable`] if a placeholder has no value.
///
/// # Example
///
/// ```
/// use product_recommender::prompt::{render, PromptVars};
///
/// let vars = PromptVars::new().insert("product", "kettle");
/// let result = render("Find {product}, format: {{\"title\": \"..\"}}", &vars).unwrap();
/// assert_eq!(result, r#"Find kettle, format: {"title": ".."}"#);
/// ```
pub fn render(template: &str, vars: &PromptVars) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(&['{', '}'][..]) {
        rendered.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            rendered.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            rendered.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            rendered.push('}');
            rest = &tail[1..];
        } else {
            match placeholder_at(tail) {
                Some(name) => {
                    let value = vars.get(name).ok_or_else(|| PipelineError::MissingVariable {
                        name: name.to_string(),
                    })?;
                    rendered.push_str(value);
                    rest = &tail[name.len() + 2..];
                }
                None => {
                    rendered.push('{');
                    rest = &tail[1..];
                }
            }
        }
    }

    rendered.push_str(rest);
    Ok(rendered)
}

/// List the placeholder names a template references, in order of first use.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            rest = &tail[2..];
            continue;
        }
        match placeholder_at(tail) {
            Some(name) => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &tail[name.len() + 2..];
            }
            None => rest = &tail[1..],
        }
    }

    names
}

/// If `tail` starts with `{identifier}`, return the identifier.
fn placeholder_at(tail: &str) -> Option<&str> {
    let body = tail.strip_prefix('{')?;
    let end = body.find('}')?;
    let name = &body[..end];
    let is_ident = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    is_ident.then_some(name)
}
