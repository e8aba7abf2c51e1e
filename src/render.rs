//! Front-end helpers: input checks, search submission and report rendering.

use crate::{
    client::LlmClient,
    error::Result,
    pipeline::ProductPipeline,
    types::{Category, PipelineOutcome, PipelineProgress, ProductRecord, SearchQuery},
};
use std::fmt::Write as _;

/// Warning shown when the search is submitted without a product name.
pub const EMPTY_PRODUCT_WARNING: &str = "Please enter a product name.";

/// Warning shown in place of the listing when nothing was found.
pub const NO_RESULTS_WARNING: &str = "No results found. Try a different search.";

/// Something the user should fix before or after a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    EmptyProduct,
    NoResults,
}

impl Warning {
    pub fn message(&self) -> &'static str {
        match self {
            Warning::EmptyProduct => EMPTY_PRODUCT_WARNING,
            Warning::NoResults => NO_RESULTS_WARNING,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Accept a product name, or return the empty-input warning.
///
/// Only the empty string is rejected; any other text is passed on as typed.
pub fn validate_product(input: &str) -> std::result::Result<&str, Warning> {
    if input.is_empty() {
        Err(Warning::EmptyProduct)
    } else {
        Ok(input)
    }
}

/// What a submitted search produced.
#[derive(Debug)]
pub enum Submission {
    /// Rejected before any LLM call.
    Rejected(Warning),
    /// Both stages ran.
    Completed(PipelineOutcome),
}

/// Validate the product name, then run the pipeline.
///
/// An empty name comes back as [`Submission::Rejected`] without the
/// client being called. Pipeline failures propagate unchanged.
pub async fn submit<F>(
    pipeline: &ProductPipeline,
    client: &LlmClient,
    product: &str,
    category: Category,
    on_progress: F,
) -> Result<Submission>
where
    F: FnMut(PipelineProgress),
{
    let product = match validate_product(product) {
        Ok(product) => product,
        Err(warning) => return Ok(Submission::Rejected(warning)),
    };
    let outcome = pipeline
        .run_with_progress(client, SearchQuery::new(product, category), on_progress)
        .await?;
    Ok(Submission::Completed(outcome))
}

fn render_record(out: &mut String, index: usize, record: &ProductRecord) {
    let _ = writeln!(
        out,
        "**{}. {}**",
        index + 1,
        record.title.as_deref().unwrap_or("No Title")
    );
    let _ = writeln!(out, "- 💲 Price: {}", record.price.as_deref().unwrap_or("N/A"));
    let _ = writeln!(out, "- ⭐ Rating: {}", record.ratings.as_deref().unwrap_or("N/A"));
    let _ = writeln!(
        out,
        "- 🔗 [View Product]({})",
        record.url.as_deref().unwrap_or("#")
    );
    out.push_str("---\n");
}

/// Render a run as markdown-flavored text.
///
/// When only the placeholder record came back, the result is the
/// no-results warning alone.
pub fn render_text(outcome: &PipelineOutcome) -> String {
    if outcome.search_results.is_sentinel() {
        return format!("⚠️  {}\n", Warning::NoResults);
    }

    let mut out = String::from("## 🔍 Search Results\n\n");
    for (index, record) in outcome.search_results.records().iter().enumerate() {
        render_record(&mut out, index, record);
    }
    out.push_str("\n## ✅ Best Recommendation\n\n");
    out.push_str(outcome.recommendation.as_str());
    out.push('\n');
    out
}

/// Render a run as pretty-printed JSON.
pub fn render_json(outcome: &PipelineOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}
