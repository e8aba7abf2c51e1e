//! # Product Recommender
//!
//! A two-stage LLM pipeline: ask a hosted model to "search" for products
//! matching a name and category, parse its free-text reply into product
//! records, then ask the same model to recommend the best one.
//!
//! The search is a prompt-engineering exercise, not a shopping API:
//! prices, ratings and links are whatever the model produces, and every
//! link is a search URL built from the product title.
//!
//! ## Core Concepts
//!
//! - **[`LlmClient`]**: one shared, read-only handle on the model
//!   (HTTP client, [`Backend`](backend::Backend), model, sampling config).
//! - **[`Node`](node::Node)**: a stage taking the previous stage's output
//!   by value. [`SearchNode`] and [`RecommendNode`] are the two stages.
//! - **[`ProductPipeline`]**: runs search then recommend, once per query.
//! - **[`parser`]**: the line-marker state machine behind the search stage.
//! - **[`MockBackend`]**: canned replies for tests, no network.
//!
//! ## Quick Start
//!
//! ```no_run
//! use product_recommender::{Category, LlmClient, ProductPipeline, SearchQuery, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LlmClient::from_settings(&Settings::with_api_key("gsk_..."))?;
//!     let pipeline = ProductPipeline::builder().build()?;
//!
//!     let outcome = pipeline
//!         .run(&client, SearchQuery::new("wireless mouse", Category::Computers))
//!         .await?;
//!     println!("{}", product_recommender::render::render_text(&outcome));
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod node;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod types;

pub use backend::{MockBackend, OpenAiBackend};
pub use client::{LlmClient, LlmClientBuilder};
pub use config::{LlmConfig, Settings};
pub use error::{PipelineError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use node::{Node, RecommendNode, SearchNode};
pub use parser::{parse_search_results, ParseReport, ResultParser};
pub use pipeline::{ProductPipeline, ProductPipelineBuilder};
pub use types::{
    Category, PipelineOutcome, PipelineProgress, ProductRecord, Recommendation, SearchQuery,
    SearchResults,
};
