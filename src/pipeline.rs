use futures::FutureExt;
use nanoid::nanoid;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::data_models::{Briefing, FinalRecord, ResearchRecord, SearchResult};
use crate::error::{ParseError, RunError, RunResult};
use crate::generator::{GenerationRequest, StageOutput, TextGenerator};
use crate::parser::parse_stage_output;
use crate::search::SearchService;
use crate::snippet::SnippetNormalizer;
use crate::stages::{self, Stage};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Drop fabricated research sources and restore them if stage 2 rewrote them.
    pub enforce_source_contract: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            enforce_source_contract: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Complete {
        briefing: Briefing,
        /// `None` when stage 1's output didn't parse but stage 2 still produced a record.
        research: Option<ResearchRecord>,
    },
    /// Stage 2 produced output that couldn't be parsed; `raw` is what it said.
    Partial {
        topic: String,
        raw: String,
        error: ParseError,
    },
}

impl RunOutcome {
    pub fn briefing(&self) -> Option<&Briefing> {
        match self {
            RunOutcome::Complete { briefing, .. } => Some(briefing),
            RunOutcome::Partial { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete { .. })
    }
}

/// Research then summarize, once, in order.
pub struct Pipeline<S, G> {
    search: S,
    generator: G,
    normalizer: SnippetNormalizer,
    options: PipelineOptions,
}

impl<S, G> Pipeline<S, G>
where
    S: SearchService,
    G: TextGenerator,
{
    pub fn new(search: S, generator: G, options: PipelineOptions) -> Self {
        Self {
            search,
            generator,
            normalizer: SnippetNormalizer::default(),
            options,
        }
    }

    pub fn with_normalizer(mut self, normalizer: SnippetNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Runs both stages for `topic`. Collaborator panics are caught here and
    /// reported as `RunError::Internal`; they never escape the run.
    pub async fn run(&self, topic: &str) -> RunResult<RunOutcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(RunError::InvalidTopic);
        }

        let run_id = nanoid!(8);
        log::info!("[{run_id}] starting run for topic {topic:?}");

        let result = AssertUnwindSafe(self.run_stages(topic, &run_id))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(RunError::Internal(panic_message(panic))));

        match &result {
            Ok(RunOutcome::Complete { .. }) => log::info!("[{run_id}] run complete"),
            Ok(RunOutcome::Partial { error, .. }) => {
                log::warn!("[{run_id}] run partial: {error}")
            }
            Err(e) => log::error!("[{run_id}] run failed: {e}"),
        }
        result
    }

    async fn run_stages(&self, topic: &str, run_id: &str) -> RunResult<RunOutcome> {
        // Stage 1: exactly one search call, no page fetching.
        let results = self.search.search(topic).await.map_err(RunError::Search)?;
        log::info!("[{run_id}] search returned {} results", results.len());

        let request = stages::research_request(topic, &results, &self.normalizer);
        let research_output = self.generate(Stage::Research, &request, run_id).await?;

        let research = match parse_stage_output::<ResearchRecord>(&research_output) {
            Ok(mut record) => {
                if self.options.enforce_source_contract {
                    let dropped = retain_known_sources(&mut record, &results);
                    if dropped > 0 {
                        log::warn!(
                            "[{run_id}] dropped {dropped} research sources not returned by search"
                        );
                    }
                }
                Some(record)
            }
            Err(e) => {
                // Best effort: stage 2 still gets the raw text.
                log::warn!("[{run_id}] research output did not parse, continuing: {e}");
                None
            }
        };

        let request = stages::summarize_request(topic, &research_output.display_text());
        let final_output = self.generate(Stage::Summarize, &request, run_id).await?;

        let mut record = match parse_stage_output::<FinalRecord>(&final_output) {
            Ok(record) => record,
            Err(error) => {
                return Ok(RunOutcome::Partial {
                    topic: topic.to_string(),
                    raw: final_output.display_text(),
                    error,
                });
            }
        };

        if self.options.enforce_source_contract {
            if let Some(research) = &research {
                if restore_sources(&mut record, research) {
                    log::warn!("[{run_id}] summarize stage altered sources; restored research list");
                }
            }
        }

        Ok(RunOutcome::Complete {
            briefing: Briefing::new(topic.to_string(), record),
            research,
        })
    }

    async fn generate(
        &self,
        stage: Stage,
        request: &GenerationRequest,
        run_id: &str,
    ) -> RunResult<StageOutput> {
        let output = self
            .generator
            .generate(request)
            .await
            .map_err(|source| RunError::Generation { stage, source })?;
        log::info!(
            "[{run_id}] {stage} stage returned {} output ({} chars)",
            output.kind(),
            output.display_text().len()
        );
        Ok(output)
    }
}

/// Removes research sources whose URL wasn't in the search results.
/// Returns how many were dropped.
pub fn retain_known_sources(record: &mut ResearchRecord, results: &[SearchResult]) -> usize {
    let before = record.sources.len();
    record
        .sources
        .retain(|source| results.iter().any(|r| r.url == source.url));
    before - record.sources.len()
}

/// Puts the research sources back if stage 2 changed them in any way.
/// Returns true when a correction was made.
pub fn restore_sources(record: &mut FinalRecord, research: &ResearchRecord) -> bool {
    if record.final_sources == research.sources {
        return false;
    }
    record.final_sources = research.sources.clone();
    true
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
