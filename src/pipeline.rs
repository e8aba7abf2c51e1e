use crate::{
    client::LlmClient,
    error::Result,
    events::{emit, Event},
    node::{Node, RecommendNode, SearchNode},
    types::{PipelineOutcome, PipelineProgress, SearchQuery},
    PipelineError,
};
use tracing::{info, info_span, Instrument};

/// Two-stage runner: search, then recommend.
///
/// The edge is fixed and there is no branching or retry. Each stage's
/// output is handed to the next by value, and the final values are
/// collected into a [`PipelineOutcome`].
#[derive(Debug, Clone, Default)]
pub struct ProductPipeline {
    search: SearchNode,
    recommend: RecommendNode,
}

impl ProductPipeline {
    /// Number of stages in every run.
    pub const STAGES: usize = 2;

    /// Create a new pipeline builder.
    pub fn builder() -> ProductPipelineBuilder {
        ProductPipelineBuilder::new()
    }

    pub fn search_node(&self) -> &SearchNode {
        &self.search
    }

    pub fn recommend_node(&self) -> &RecommendNode {
        &self.recommend
    }

    /// Run both stages for one query.
    pub async fn run(&self, client: &LlmClient, query: SearchQuery) -> Result<PipelineOutcome> {
        self.run_with_progress(client, query, |_| {}).await
    }

    /// Run both stages, invoking `on_progress` at the start of each.
    pub async fn run_with_progress<F>(
        &self,
        client: &LlmClient,
        query: SearchQuery,
        mut on_progress: F,
    ) -> Result<PipelineOutcome>
    where
        F: FnMut(PipelineProgress),
    {
        let span = info_span!("pipeline.run", product = %query.product, category = %query.category);
        async move {
            on_progress(progress(0, &self.search));
            let search_results = run_stage(client, &self.search, query.clone()).await?;

            on_progress(progress(1, &self.recommend));
            let recommendation =
                run_stage(client, &self.recommend, search_results.clone()).await?;

            info!(records = search_results.len(), "pipeline finished");
            Ok(PipelineOutcome {
                query,
                search_results,
                recommendation,
            })
        }
        .instrument(span)
        .await
    }
}

fn progress<N: Node>(stage_index: usize, node: &N) -> PipelineProgress {
    PipelineProgress {
        stage_index,
        total_stages: ProductPipeline::STAGES,
        stage_name: node.name().to_string(),
    }
}

/// Run one node, emitting lifecycle events and tagging failures with the stage name.
async fn run_stage<N: Node>(client: &LlmClient, node: &N, input: N::Input) -> Result<N::Output> {
    let stage = node.name().to_string();
    emit(client.events(), Event::StageStart { stage: stage.clone() });

    let result = node
        .run(client, input)
        .instrument(info_span!("stage", name = %stage))
        .await;

    emit(
        client.events(),
        Event::StageEnd {
            stage: stage.clone(),
            ok: result.is_ok(),
        },
    );

    result.map_err(|e| PipelineError::StageFailed {
        stage,
        message: e.to_string(),
    })
}

/// Builder for [`ProductPipeline`].
#[derive(Debug, Default)]
pub struct ProductPipelineBuilder {
    search: Option<SearchNode>,
    recommend: Option<RecommendNode>,
}

impl ProductPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search stage. Default: [`SearchNode::new`].
    pub fn search(mut self, node: SearchNode) -> Self {
        self.search = Some(node);
        self
    }

    /// Set the recommendation stage. Default: [`RecommendNode::new`].
    pub fn recommend(mut self, node: RecommendNode) -> Self {
        self.recommend = Some(node);
        self
    }

    /// Build the pipeline, validating both stage templates.
    pub fn build(self) -> Result<ProductPipeline> {
        let search = self.search.unwrap_or_default();
        let recommend = self.recommend.unwrap_or_default();
        search.validate()?;
        recommend.validate()?;
        Ok(ProductPipeline { search, recommend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::events::FnEventHandler;
    use crate::types::{Category, NO_RECOMMENDATION};
    use std::sync::{Arc, Mutex};
    use tokio_test::{assert_err, assert_ok};

    const SEARCH_REPLY: &str = "Title: Logitech M185\nPrice: $14.99\nRatings: 4.6\nURL: yes";

    fn client_with(mock: Arc<MockBackend>) -> LlmClient {
        LlmClient::builder("http://unused").backend(mock).build().unwrap()
    }

    fn query() -> SearchQuery {
        SearchQuery::new("wireless mouse", Category::Computers)
    }

    #[test]
    fn test_builder_defaults() {
        let pipeline = assert_ok!(ProductPipeline::builder().build());
        assert!(!pipeline.recommend_node().is_streaming());
        assert!(pipeline.search_node().template().contains("{product}"));
    }

    #[test]
    fn test_builder_rejects_bad_template() {
        assert_err!(ProductPipeline::builder()
            .search(SearchNode::new().with_template("{product} {colour}"))
            .build());
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let mock = Arc::new(MockBackend::new(vec![
            SEARCH_REPLY.to_string(),
            "**Recommendation:** Logitech M185".to_string(),
        ]));
        let client = client_with(mock.clone());
        let pipeline = ProductPipeline::builder().build().unwrap();

        let outcome = pipeline.run(&client, query()).await.unwrap();

        assert_eq!(outcome.query, query());
        assert_eq!(outcome.search_results.len(), 1);
        assert_eq!(
            outcome.search_results.records()[0].url.as_deref(),
            Some("https://www.amazon.com/s?k=Logitech+M185")
        );
        assert_eq!(outcome.recommendation.as_str(), "**Recommendation:** Logitech M185");

        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("wireless mouse"));
        assert!(prompts[1].contains(&outcome.search_results.to_prompt_text().unwrap()));
    }

    #[tokio::test]
    async fn test_run_sentinel_still_recommends() {
        let mock = Arc::new(MockBackend::new(vec!["nothing useful".into(), "".into()]));
        let client = client_with(mock.clone());

        let outcome = ProductPipeline::default().run(&client, query()).await.unwrap();

        assert!(outcome.search_results.is_sentinel());
        assert_eq!(outcome.recommendation.as_str(), NO_RECOMMENDATION);
        assert!(mock.prompts()[1].contains(r#"[{"title":"No products found"}]"#));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_stage_failure() {
        let mock = Arc::new(MockBackend::failing(500));
        let client = client_with(mock.clone());

        let err = ProductPipeline::default().run(&client, query()).await.unwrap_err();

        match err {
            PipelineError::StageFailed { stage, message } => {
                assert_eq!(stage, "search");
                assert!(message.contains("500"));
            }
            other => panic!("Expected StageFailed, got {other:?}"),
        }
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_progress_and_events_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let client = LlmClient::builder("http://unused")
            .backend(Arc::new(MockBackend::new(vec![
                SEARCH_REPLY.to_string(),
                "ok".to_string(),
            ])))
            .event_handler(Arc::new(FnEventHandler(move |event| {
                let label = match event {
                    Event::StageStart { stage } => format!("start:{stage}"),
                    Event::StageEnd { stage, ok } => format!("end:{stage}:{ok}"),
                    Event::ResultsParsed { records, dropped } => format!("parsed:{records}:{dropped}"),
                    Event::Token { .. } => "token".to_string(),
                };
                sink.lock().unwrap().push(label);
            })))
            .build()
            .unwrap();

        let mut stages = Vec::new();
        ProductPipeline::default()
            .run_with_progress(&client, query(), |p| {
                assert_eq!(p.total_stages, 2);
                stages.push((p.stage_index, p.stage_name));
            })
            .await
            .unwrap();

        assert_eq!(
            stages,
            vec![(0, "search".to_string()), (1, "recommend".to_string())]
        );
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "start:search",
                "parsed:1:0",
                "end:search:true",
                "start:recommend",
                "end:recommend:true",
            ]
        );
    }
}
