//! Pipeline nodes.
//!
//! A [`Node`] takes the previous stage's output by value, makes its LLM
//! call through the shared [`LlmClient`], and returns a fresh value. No
//! node mutates state owned by another.

use crate::{
    client::LlmClient,
    error::Result,
    events::{emit, Event},
    parser,
    prompt::{self, PromptVars, RECOMMENDATION_PROMPT, SEARCH_PROMPT},
    types::{Recommendation, SearchQuery, SearchResults},
    PipelineError,
};
use async_trait::async_trait;
use tracing::{debug, info};

/// A named processing stage.
#[async_trait]
pub trait Node: Send + Sync {
    type Input: Send + 'static;
    type Output: Send;

    /// Stage name (for logging/progress/events).
    fn name(&self) -> &str;

    /// Check the node's configuration before any run.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Execute the stage.
    async fn run(&self, client: &LlmClient, input: Self::Input) -> Result<Self::Output>;
}

/// Reject templates that reference placeholders the node never supplies.
fn check_placeholders(node: &str, template: &str, supplied: &[&str]) -> Result<()> {
    let unknown: Vec<String> = prompt::placeholders(template)
        .into_iter()
        .filter(|p| !supplied.contains(&p.as_str()))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(format!(
            "Template for '{}' uses unknown placeholders: {}",
            node,
            unknown.join(", ")
        )))
    }
}

/// Stage one: ask the LLM for products and parse its reply.
#[derive(Debug, Clone)]
pub struct SearchNode {
    template: String,
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            template: SEARCH_PROMPT.to_string(),
        }
    }
}

impl SearchNode {
    pub const NAME: &'static str = "search";

    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the prompt template. Placeholders: `{product}`, `{section}`.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the search prompt for a query.
    pub fn prompt_for(&self, query: &SearchQuery) -> Result<String> {
        let vars = PromptVars::new()
            .insert("product", query.product.as_str())
            .insert("section", query.category.label());
        prompt::render(&self.template, &vars)
    }
}

#[async_trait]
impl Node for SearchNode {
    type Input = SearchQuery;
    type Output = SearchResults;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self) -> Result<()> {
        check_placeholders(Self::NAME, &self.template, &["product", "section"])
    }

    async fn run(&self, client: &LlmClient, query: SearchQuery) -> Result<SearchResults> {
        let prompt = self.prompt_for(&query)?;
        let reply = client.complete(Self::NAME, &prompt).await?;
        debug!(reply = %reply, "search reply");

        let report = parser::parse_search_results(&reply);
        info!(
            product = %query.product,
            category = %query.category,
            records = report.results.len(),
            placeholder = report.results.is_sentinel(),
            dropped = report.dropped(),
            "search results parsed"
        );
        emit(
            client.events(),
            Event::ResultsParsed {
                records: report.results.len(),
                dropped: report.dropped(),
            },
        );

        Ok(report.results)
    }
}

/// Stage two: ask the LLM to pick the best product.
#[derive(Debug, Clone)]
pub struct RecommendNode {
    template: String,
    streaming: bool,
}

impl Default for RecommendNode {
    fn default() -> Self {
        Self {
            template: RECOMMENDATION_PROMPT.to_string(),
            streaming: false,
        }
    }
}

impl RecommendNode {
    pub const NAME: &'static str = "recommend";

    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the prompt template. Placeholder: `{amazon_results}`.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Stream the reply, emitting [`Event::Token`] per chunk.
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming = enabled;
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Render the recommendation prompt, embedding the results verbatim.
    pub fn prompt_for(&self, results: &SearchResults) -> Result<String> {
        let vars = PromptVars::new().insert("amazon_results", results.to_prompt_text()?);
        prompt::render(&self.template, &vars)
    }
}

#[async_trait]
impl Node for RecommendNode {
    type Input = SearchResults;
    type Output = Recommendation;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self) -> Result<()> {
        check_placeholders(Self::NAME, &self.template, &["amazon_results"])
    }

    async fn run(&self, client: &LlmClient, results: SearchResults) -> Result<Recommendation> {
        let prompt = self.prompt_for(&results)?;
        let reply = if self.streaming {
            client.complete_streaming(Self::NAME, &prompt).await?
        } else {
            client.complete(Self::NAME, &prompt).await?
        };

        let recommendation = Recommendation::from_response(reply);
        info!(fallback = recommendation.is_fallback(), "recommendation received");
        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::types::{Category, ProductRecord, NO_RECOMMENDATION};
    use std::sync::Arc;

    fn client_with(mock: Arc<MockBackend>) -> LlmClient {
        LlmClient::builder("http://unused").backend(mock).build().unwrap()
    }

    #[tokio::test]
    async fn test_search_node_end_to_end_example() {
        let mock = Arc::new(MockBackend::fixed(
            "Title: Logitech M185\nPrice: $14.99\nRatings: 4.6\nURL: yes",
        ));
        let client = client_with(mock.clone());

        let results = SearchNode::new()
            .run(&client, SearchQuery::new("wireless mouse", Category::Computers))
            .await
            .unwrap();

        assert_eq!(
            results.records(),
            &[ProductRecord {
                title: Some("Logitech M185".into()),
                price: Some("$14.99".into()),
                ratings: Some("4.6".into()),
                url: Some("https://www.amazon.com/s?k=Logitech+M185".into()),
            }]
        );
        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("for wireless mouse in the Computers category"));
    }

    #[tokio::test]
    async fn test_search_node_unparseable_reply() {
        let client = client_with(Arc::new(MockBackend::fixed("No idea, sorry.")));
        let results = SearchNode::new()
            .run(&client, SearchQuery::new("teapot", Category::HomeAppliances))
            .await
            .unwrap();
        assert!(results.is_sentinel());
    }

    #[tokio::test]
    async fn test_recommend_node_single_call_with_serialized_results() {
        let mock = Arc::new(MockBackend::fixed("Go with the Logitech M185."));
        let client = client_with(mock.clone());
        let mut record = ProductRecord::titled("Logitech M185");
        record.price = Some("$14.99".into());
        let results = SearchResults::from_records(vec![record]);
        let serialized = results.to_prompt_text().unwrap();

        let rec = RecommendNode::new().run(&client, results).await.unwrap();

        assert_eq!(rec.as_str(), "Go with the Logitech M185.");
        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&serialized));
        assert!(prompts[0].contains(r#"[{"title":"Logitech M185","price":"$14.99"}]"#));
    }

    #[tokio::test]
    async fn test_recommend_node_empty_reply_falls_back() {
        let client = client_with(Arc::new(MockBackend::fixed("")));
        let rec = RecommendNode::new()
            .run(&client, SearchResults::from_records(Vec::new()))
            .await
            .unwrap();
        assert_eq!(rec.as_str(), NO_RECOMMENDATION);
    }

    #[tokio::test]
    async fn test_recommend_node_streaming() {
        let mock = Arc::new(MockBackend::fixed("Pick the first one."));
        let client = client_with(mock.clone());
        let rec = RecommendNode::new()
            .with_streaming(true)
            .run(&client, SearchResults::from_records(Vec::new()))
            .await
            .unwrap();
        assert_eq!(rec.as_str(), "Pick the first one.");
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_template_validation() {
        assert!(SearchNode::new().validate().is_ok());
        assert!(RecommendNode::new().validate().is_ok());

        let bad = SearchNode::new().with_template("Find {product} under {budget}");
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("budget"));

        let bad = RecommendNode::new().with_template("Pick from {results}");
        assert!(matches!(bad.validate(), Err(PipelineError::InvalidConfig(_))));
    }
}
