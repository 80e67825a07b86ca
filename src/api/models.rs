use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data_models::Source;

#[derive(Debug, Deserialize)]
pub struct BriefingRequest {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BriefingResponse {
    Complete {
        topic: String,
        final_summary: String,
        final_sources: Vec<Source>,
        /// `final_sources` minus entries without a URL, for rendering as links.
        links: Vec<Source>,
        generated_at: DateTime<Utc>,
        cached: bool,
        download_filename: String,
    },
    Partial {
        topic: String,
        raw: String,
        notice: String,
        error: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicsResponse {
    pub topics: Vec<String>,
}
