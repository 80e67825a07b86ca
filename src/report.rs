use crate::data_models::{Briefing, Source};
use crate::error::ParseError;

pub const PARSE_FAILURE_NOTICE: &str =
    "Structured parsing of the pipeline output failed; showing the raw output instead.";

/// Markdown rendition of a briefing, same content as the on-screen report.
pub fn render_markdown(briefing: &Briefing) -> String {
    let mut md = format!("### Summary for: {}\n\n", briefing.topic);
    md.push_str(&briefing.record.final_summary);
    md.push_str("\n\n### Sources\n\n");

    if briefing.record.final_sources.is_empty() {
        md.push_str("No sources found.\n");
    }
    for source in &briefing.record.final_sources {
        md.push_str(&format!("- [{}]({})\n", link_title(source), source.url));
    }
    md
}

/// Report shown when the final stage's output couldn't be parsed.
pub fn render_partial(topic: &str, raw: &str, error: &ParseError) -> String {
    format!("### Summary for: {topic}\n\n> {PARSE_FAILURE_NOTICE} ({error})\n\n```\n{raw}\n```\n")
}

/// `Artificial Intelligence` -> `artificial_intelligence_summary.md`
pub fn download_filename(topic: &str) -> String {
    format!("{}_summary.md", topic.to_lowercase().replace(' ', "_"))
}

/// Sources worth rendering as links; entries without a URL are skipped.
pub fn linkable_sources(sources: &[Source]) -> Vec<&Source> {
    sources.iter().filter(|s| !s.url.trim().is_empty()).collect()
}

fn link_title(source: &Source) -> &str {
    if source.title.trim().is_empty() {
        "Source Link"
    } else {
        &source.title
    }
}
