use std::fmt;

use crate::data_models::SearchResult;
use crate::generator::GenerationRequest;
use crate::snippet::SnippetNormalizer;

/// Soft cap passed to the summarizer; the pipeline doesn't re-check it.
pub const SUMMARY_WORD_BUDGET: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Research,
    Summarize,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Summarize => "summarize",
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Stage::Research => "Senior Researcher",
            Stage::Summarize => "News Summarizer",
        }
    }

    fn backstory(&self) -> &'static str {
        match self {
            Stage::Research => {
                "You gather, analyze and condense the latest news about a topic, \
                 focusing on fresh developments and breakthroughs."
            }
            Stage::Summarize => {
                "You condense research findings into clear, factual and unbiased summaries."
            }
        }
    }

    pub fn system_instruction(&self) -> String {
        format!("You are a {}. {}", self.role(), self.backstory())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage 1 prompt. The model only sees what search returned; it is told to
/// cite from that list and nothing else.
pub fn research_request(
    topic: &str,
    results: &[SearchResult],
    normalizer: &SnippetNormalizer,
) -> GenerationRequest {
    let mut prompt = format!(
        "Collect and analyze the most relevant news from the past 24 hours about {topic}.\n\
         Synthesize your summary directly from the snippets below. \
         Cite only titles and URLs that appear in this list.\n\nSearch results:\n"
    );

    if results.is_empty() {
        prompt.push_str("(no results)\n");
    }
    for (idx, result) in results.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. title: {}\n   url: {}\n   snippet: {}\n",
            idx + 1,
            result.title,
            result.url,
            normalizer.normalize(&result.snippet)
        ));
    }

    prompt.push_str(
        "\nRespond with a single JSON object with two keys:\n\
         \"summary\": a synthesized report based only on the snippets,\n\
         \"sources\": a list of {\"title\", \"url\"} objects for each result used.\n",
    );

    GenerationRequest {
        system: Stage::Research.system_instruction(),
        prompt,
    }
}

/// Stage 2 prompt. Stage 1's raw text goes in verbatim as context, parsed or not.
pub fn summarize_request(topic: &str, research_output: &str) -> GenerationRequest {
    let prompt = format!(
        "Review the research report provided on {topic}.\n\
         Condense the report's \"summary\" into a clear, concise news summary \
         (under {SUMMARY_WORD_BUDGET} words).\n\
         You MUST pass along the report's \"sources\" list unmodified.\n\n\
         Research report:\n{research_output}\n\n\
         Respond with a single JSON object with two keys:\n\
         \"final_summary\": the concise news summary,\n\
         \"final_sources\": the original list of {{\"title\", \"url\"}} objects.\n"
    );

    GenerationRequest {
        system: Stage::Summarize.system_instruction(),
        prompt,
    }
}

#[test]
fn test_research_request_lists_results_in_order() {
    let results = vec![
        SearchResult::new("A".into(), "https://a.example".into(), "<b>alpha</b>".into()),
        SearchResult::new("B".into(), "https://b.example".into(), "beta".into()),
    ];
    let request = research_request("Finance", &results, &SnippetNormalizer::default());

    assert!(request.system.contains("Senior Researcher"));
    assert!(request.prompt.contains("about Finance"));
    let a = request.prompt.find("1. title: A").unwrap();
    let b = request.prompt.find("2. title: B").unwrap();
    assert!(a < b);
    assert!(request.prompt.contains("snippet: alpha\n"));
}

#[test]
fn test_summarize_request_carries_context_and_budget() {
    let request = summarize_request("Health", "raw research {\"summary\": \"x\"}");
    assert!(request.system.contains("News Summarizer"));
    assert!(request.prompt.contains("raw research {\"summary\": \"x\"}"));
    assert!(request.prompt.contains("under 250 words"));
    assert!(request.prompt.contains("{\"title\", \"url\"}"));
}
