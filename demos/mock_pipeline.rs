//! Example: running the full pipeline against MockBackend, no network.
//!
//! Run with: `cargo run --example mock_pipeline`

use product_recommender::{
    render, Category, LlmClient, MockBackend, ProductPipeline, SearchQuery,
};
use std::sync::Arc;

const SEARCH_REPLY: &str = "\
Here are two options:

**Title:** Logitech M185
**Price:** $14.99
**Ratings:** 4.6
**URL:** https://example.com

**Title:** Anker Vertical Mouse
**Price:** $19.99
**Ratings:** 4.4
**URL:** https://example.com";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // First reply answers the search prompt, second the recommendation prompt
    let mock = Arc::new(MockBackend::new(vec![
        SEARCH_REPLY.to_string(),
        "**Recommendation:** Logitech M185, cheapest with the best rating.".to_string(),
    ]));

    let client = LlmClient::builder("http://unused")
        .backend(mock.clone())
        .build()?;
    let pipeline = ProductPipeline::builder().build()?;

    let outcome = pipeline
        .run(&client, SearchQuery::new("wireless mouse", Category::Computers))
        .await?;

    println!("{}", render::render_text(&outcome));
    println!("LLM calls: {}", mock.call_count());

    Ok(())
}
