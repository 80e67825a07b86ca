use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hit from the search service, in relevance order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(title: String, url: String, snippet: String) -> SearchResult {
        SearchResult {
            title,
            url,
            snippet,
        }
    }

    pub fn source(&self) -> Source {
        Source {
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// Stage 1 output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResearchRecord {
    pub summary: String,
    pub sources: Vec<Source>,
}

/// Stage 2 output. `final_sources` is the research record's `sources`, untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FinalRecord {
    pub final_summary: String,
    pub final_sources: Vec<Source>,
}

/// A completed run, ready to render or cache.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Briefing {
    pub topic: String,
    pub record: FinalRecord,
    pub generated_at: DateTime<Utc>,
}

impl Briefing {
    pub fn new(topic: String, record: FinalRecord) -> Briefing {
        Briefing {
            topic,
            record,
            generated_at: Utc::now(),
        }
    }
}
