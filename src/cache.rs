use dashmap::DashMap;

use crate::data_models::Briefing;
use crate::error::{RunError, RunResult};
use crate::generator::TextGenerator;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::search::SearchService;

/// Completed briefings, one per topic. Partial runs are never stored.
#[derive(Debug, Default)]
pub struct TopicCache {
    entries: DashMap<String, Briefing>,
}

impl TopicCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, topic: &str) -> Option<Briefing> {
        self.entries.get(topic).map(|entry| entry.value().clone())
    }

    /// Replaces any existing briefing for the same topic.
    pub fn insert(&self, briefing: Briefing) {
        self.entries.insert(briefing.topic.clone(), briefing);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The pipeline with a topic cache in front of it.
pub struct BriefingService<S, G> {
    pipeline: Pipeline<S, G>,
    cache: TopicCache,
}

impl<S, G> BriefingService<S, G>
where
    S: SearchService,
    G: TextGenerator,
{
    pub fn new(pipeline: Pipeline<S, G>) -> Self {
        Self {
            pipeline,
            cache: TopicCache::new(),
        }
    }

    pub fn cache(&self) -> &TopicCache {
        &self.cache
    }

    /// Returns the outcome and whether it came from the cache. A hit skips
    /// both stages entirely.
    pub async fn brief(&self, topic: &str) -> RunResult<(RunOutcome, bool)> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(RunError::InvalidTopic);
        }

        if let Some(briefing) = self.cache.get(topic) {
            log::info!("cache hit for topic {topic:?}");
            return Ok((
                RunOutcome::Complete {
                    briefing,
                    research: None,
                },
                true,
            ));
        }

        let outcome = self.pipeline.run(topic).await?;
        if let Some(briefing) = outcome.briefing() {
            self.cache.insert(briefing.clone());
        }
        Ok((outcome, false))
    }
}
