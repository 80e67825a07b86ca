use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::cache::BriefingService;
use crate::error::RunError;
use crate::generator::TextGenerator;
use crate::pipeline::RunOutcome;
use crate::report;
use crate::search::SearchService;

use super::DEFAULT_TOPICS;
use super::models::{BriefingRequest, BriefingResponse, DownloadQuery, TopicsResponse};

pub async fn briefing_handler<S, G>(
    State(service): State<Arc<BriefingService<S, G>>>,
    Json(request): Json<BriefingRequest>,
) -> (StatusCode, Json<BriefingResponse>)
where
    S: SearchService + 'static,
    G: TextGenerator + 'static,
{
    match service.brief(&request.topic).await {
        Ok((RunOutcome::Complete { briefing, .. }, cached)) => (
            StatusCode::OK,
            Json(BriefingResponse::Complete {
                download_filename: report::download_filename(&briefing.topic),
                topic: briefing.topic,
                links: report::linkable_sources(&briefing.record.final_sources)
                    .into_iter()
                    .cloned()
                    .collect(),
                final_summary: briefing.record.final_summary,
                final_sources: briefing.record.final_sources,
                generated_at: briefing.generated_at,
                cached,
            }),
        ),
        Ok((RunOutcome::Partial { topic, raw, error }, _)) => (
            StatusCode::OK,
            Json(BriefingResponse::Partial {
                topic,
                raw,
                notice: report::PARSE_FAILURE_NOTICE.to_string(),
                error: error.to_string(),
            }),
        ),
        Err(e) => {
            let status = match &e {
                RunError::InvalidTopic => StatusCode::BAD_REQUEST,
                RunError::Search(_) | RunError::Generation { .. } => StatusCode::BAD_GATEWAY,
                RunError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(BriefingResponse::Failed {
                    error: e.to_string(),
                }),
            )
        }
    }
}

/// Markdown download of a briefing that has already been generated.
pub async fn download_handler<S, G>(
    State(service): State<Arc<BriefingService<S, G>>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, (StatusCode, String)>
where
    S: SearchService + 'static,
    G: TextGenerator + 'static,
{
    let topic = query.topic.trim();
    let briefing = service.cache().get(topic).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("No briefing generated for topic {topic:?}"),
        )
    })?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        report::download_filename(&briefing.topic).replace('"', "")
    );
    let disposition = HeaderValue::from_str(&disposition).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Invalid filename: {}", e),
        )
    })?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/markdown; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report::render_markdown(&briefing),
    )
        .into_response())
}

pub async fn topics_handler() -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
    })
}
