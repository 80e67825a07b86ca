#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use briefing::data_models::{SearchResult, Source};
use briefing::error::ServiceError;
use briefing::generator::{GenerationRequest, StageOutput, TextGenerator};
use briefing::search::SearchService;

/// Search service returning a fixed response and counting calls.
pub struct FakeSearch {
    response: Result<Vec<SearchResult>, ServiceError>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSearch {
    pub fn returning(results: Vec<SearchResult>) -> Self {
        Self {
            response: Ok(results),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(err: ServiceError) -> Self {
        Self {
            response: Err(err),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SearchService for FakeSearch {
    async fn search(&self, _topic: &str) -> Result<Vec<SearchResult>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

pub struct PanickingSearch;

impl SearchService for PanickingSearch {
    async fn search(&self, _topic: &str) -> Result<Vec<SearchResult>, ServiceError> {
        panic!("search backend exploded")
    }
}

/// Generator that plays back `(research, summarize)` outputs once per run,
/// cycling when it runs out, and records every request it saw.
pub struct ScriptedGenerator {
    script: Vec<Result<StageOutput, ServiceError>>,
    queue: Mutex<VecDeque<Result<StageOutput, ServiceError>>>,
    pub requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<StageOutput, ServiceError>>) -> Self {
        Self {
            queue: Mutex::new(script.iter().cloned().collect()),
            script,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn texts(research: &str, summarize: &str) -> Self {
        Self::new(vec![
            Ok(StageOutput::Text(research.to_string())),
            Ok(StageOutput::Text(summarize.to_string())),
        ])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<StageOutput, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = {
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                queue.extend(self.script.iter().cloned());
            }
            queue.pop_front()
        };
        next.unwrap_or(Ok(StageOutput::Empty))
    }
}

pub fn result(title: &str) -> SearchResult {
    SearchResult::new(
        title.to_string(),
        format!("https://news.example/{}", title.to_lowercase()),
        format!("Snippet about {title}"),
    )
}

pub fn sources_json(titles: &[&str]) -> String {
    let sources: Vec<Source> = titles.iter().map(|t| result(t).source()).collect();
    serde_json::to_string(&sources).unwrap()
}

pub fn research_text(summary: &str, titles: &[&str]) -> String {
    format!(
        "Here is my research:\n```json\n{{\"summary\": \"{summary}\", \"sources\": {}}}\n```",
        sources_json(titles)
    )
}

pub fn final_text(summary: &str, titles: &[&str]) -> String {
    format!(
        "Final answer: {{\"final_summary\": \"{summary}\", \"final_sources\": {}}} Done.",
        sources_json(titles)
    )
}
