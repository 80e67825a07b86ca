use std::sync::atomic::Ordering;

use briefing::cache::BriefingService;
use briefing::error::{ParseError, RunError, ServiceError};
use briefing::generator::StageOutput;
use briefing::pipeline::{Pipeline, PipelineOptions, RunOutcome};
use briefing::stages::Stage;

mod test_helpers;
use test_helpers::*;

fn pipeline(
    search: FakeSearch,
    generator: ScriptedGenerator,
) -> Pipeline<FakeSearch, ScriptedGenerator> {
    Pipeline::new(search, generator, PipelineOptions::default())
}

fn titles(sources: &[briefing::data_models::Source]) -> Vec<&str> {
    sources.iter().map(|s| s.title.as_str()).collect()
}

#[cfg(test)]
mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_finance_three_sources_flow_through() {
        let search = FakeSearch::returning(vec![result("A"), result("B"), result("C")]);
        let search_calls = search.calls.clone();
        let generator = ScriptedGenerator::texts(
            &research_text("Markets moved.", &["A", "B", "C"]),
            &final_text("Markets moved a bit.", &["A", "B", "C"]),
        );
        let requests = generator.requests.clone();

        let outcome = pipeline(search, generator).run("Finance").await.unwrap();

        let RunOutcome::Complete { briefing, research } = outcome else {
            panic!("expected a complete run");
        };
        let research = research.expect("research record should parse");
        assert_eq!(titles(&research.sources), vec!["A", "B", "C"]);
        assert_eq!(briefing.topic, "Finance");
        assert_eq!(briefing.record.final_sources, research.sources);
        assert_eq!(briefing.record.final_summary, "Markets moved a bit.");

        assert_eq!(search_calls.load(Ordering::SeqCst), 1);
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].prompt.contains("Snippet about A"));
        assert!(requests[1].prompt.contains("Markets moved."));
    }

    #[tokio::test]
    async fn test_search_timeout_fails_run() {
        let generator = ScriptedGenerator::texts("unused", "unused");
        let requests = generator.requests.clone();
        let search = FakeSearch::failing(ServiceError::Http("timeout".to_string()));

        let err = pipeline(search, generator).run("Finance").await.unwrap_err();

        assert!(matches!(err, RunError::Search(_)));
        assert!(err.to_string().contains("timeout"));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_final_output_is_partial() {
        let search = FakeSearch::returning(vec![result("A")]);
        let generator = ScriptedGenerator::texts(
            &research_text("Something happened.", &["A"]),
            "Here is the result: {not valid json}",
        );

        let outcome = pipeline(search, generator).run("Finance").await.unwrap();

        match outcome {
            RunOutcome::Partial { topic, raw, error } => {
                assert_eq!(topic, "Finance");
                assert_eq!(raw, "Here is the result: {not valid json}");
                assert!(matches!(error, ParseError::MalformedJson(_)));
            }
            other => panic!("expected partial, got {other:?}"),
        }
    }
}

#[cfg(test)]
mod contract {
    use super::*;

    #[tokio::test]
    async fn test_sources_are_stable_across_runs() {
        let search = FakeSearch::returning(vec![result("A"), result("B"), result("C")]);
        let generator = ScriptedGenerator::new(vec![
            Ok(StageOutput::Text(research_text("r1", &["A", "B", "C"]))),
            Ok(StageOutput::Text(final_text("first wording", &["A", "B", "C"]))),
            Ok(StageOutput::Text(research_text("r2", &["A", "B", "C"]))),
            Ok(StageOutput::Text(final_text("second wording", &["A", "B", "C"]))),
        ]);
        let pipeline = pipeline(search, generator);

        let first = pipeline.run("Finance").await.unwrap();
        let second = pipeline.run("Finance").await.unwrap();

        let first = first.briefing().unwrap();
        let second = second.briefing().unwrap();
        assert_eq!(first.record.final_sources, second.record.final_sources);
        assert_ne!(first.record.final_summary, second.record.final_summary);
    }

    #[tokio::test]
    async fn test_research_parse_failure_still_runs_summarize() {
        let search = FakeSearch::returning(vec![result("A")]);
        let generator = ScriptedGenerator::texts(
            "I found a few stories but forgot the format.",
            &final_text("Short take.", &["A"]),
        );
        let requests = generator.requests.clone();

        let outcome = pipeline(search, generator).run("Health").await.unwrap();

        let RunOutcome::Complete { briefing, research } = outcome else {
            panic!("expected a complete run");
        };
        assert!(research.is_none());
        assert_eq!(titles(&briefing.record.final_sources), vec!["A"]);
        assert!(
            requests.lock().unwrap()[1]
                .prompt
                .contains("forgot the format")
        );
    }

    #[tokio::test]
    async fn test_reordered_final_sources_are_restored() {
        let search = FakeSearch::returning(vec![result("A"), result("B")]);
        let generator = ScriptedGenerator::texts(
            &research_text("r", &["A", "B"]),
            &final_text("f", &["B"]),
        );

        let outcome = pipeline(search, generator).run("Sports").await.unwrap();

        let briefing = outcome.briefing().unwrap();
        assert_eq!(titles(&briefing.record.final_sources), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_lenient_mode_keeps_stage_two_sources() {
        let search = FakeSearch::returning(vec![result("A"), result("B")]);
        let generator = ScriptedGenerator::texts(
            &research_text("r", &["A", "B"]),
            &final_text("f", &["B"]),
        );
        let pipeline = Pipeline::new(
            search,
            generator,
            PipelineOptions {
                enforce_source_contract: false,
            },
        );

        let outcome = pipeline.run("Sports").await.unwrap();

        let briefing = outcome.briefing().unwrap();
        assert_eq!(titles(&briefing.record.final_sources), vec!["B"]);
    }

    #[tokio::test]
    async fn test_fabricated_research_sources_are_dropped() {
        let search = FakeSearch::returning(vec![result("A")]);
        // "Z" never came back from search
        let generator = ScriptedGenerator::texts(
            &research_text("r", &["A", "Z"]),
            &final_text("f", &["A", "Z"]),
        );

        let outcome = pipeline(search, generator).run("Economy").await.unwrap();

        let RunOutcome::Complete { briefing, research } = outcome else {
            panic!("expected a complete run");
        };
        assert_eq!(titles(&research.unwrap().sources), vec!["A"]);
        assert_eq!(titles(&briefing.record.final_sources), vec!["A"]);
    }
}

#[cfg(test)]
mod failures {
    use super::*;

    #[tokio::test]
    async fn test_empty_topic_is_rejected_before_search() {
        let search = FakeSearch::returning(vec![result("A")]);
        let search_calls = search.calls.clone();
        let generator = ScriptedGenerator::texts("", "");

        let err = pipeline(search, generator).run("   ").await.unwrap_err();

        assert!(matches!(err, RunError::InvalidTopic));
        assert_eq!(search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summarize_generation_error_names_stage() {
        let search = FakeSearch::returning(vec![result("A")]);
        let generator = ScriptedGenerator::new(vec![
            Ok(StageOutput::Text(research_text("r", &["A"]))),
            Err(ServiceError::Status {
                status: 503,
                body: "overloaded".to_string(),
            }),
        ]);

        let err = pipeline(search, generator).run("Finance").await.unwrap_err();

        match err {
            RunError::Generation { stage, source } => {
                assert_eq!(stage, Stage::Summarize);
                assert!(source.to_string().contains("overloaded"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_final_output_is_unexpected_shape() {
        let search = FakeSearch::returning(vec![result("A")]);
        let generator = ScriptedGenerator::new(vec![
            Ok(StageOutput::Text(research_text("r", &["A"]))),
            Ok(StageOutput::Empty),
        ]);

        let outcome = pipeline(search, generator).run("Finance").await.unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Partial {
                error: ParseError::UnexpectedShape(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_collaborator_panic_becomes_internal_error() {
        let pipeline = Pipeline::new(
            PanickingSearch,
            ScriptedGenerator::texts("", ""),
            PipelineOptions::default(),
        );

        let err = pipeline.run("Finance").await.unwrap_err();

        match err {
            RunError::Internal(msg) => assert!(msg.contains("search backend exploded")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

#[cfg(test)]
mod caching {
    use super::*;

    #[tokio::test]
    async fn test_cache_hit_skips_both_stages() {
        let search = FakeSearch::returning(vec![result("A")]);
        let search_calls = search.calls.clone();
        let generator = ScriptedGenerator::texts(
            &research_text("r", &["A"]),
            &final_text("f", &["A"]),
        );
        let requests = generator.requests.clone();
        let service = BriefingService::new(pipeline(search, generator));

        let (first, cached) = service.brief("Finance").await.unwrap();
        assert!(!cached);
        let (second, cached) = service.brief(" Finance ").await.unwrap();
        assert!(cached);

        assert_eq!(search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(requests.lock().unwrap().len(), 2);
        assert_eq!(first.briefing(), second.briefing());
    }

    #[tokio::test]
    async fn test_partial_runs_are_not_cached() {
        let search = FakeSearch::returning(vec![result("A")]);
        let search_calls = search.calls.clone();
        let generator = ScriptedGenerator::texts(&research_text("r", &["A"]), "no json here");
        let service = BriefingService::new(pipeline(search, generator));

        let (outcome, _) = service.brief("Finance").await.unwrap();
        assert!(!outcome.is_complete());
        let (_, cached) = service.brief("Finance").await.unwrap();
        assert!(!cached);

        assert_eq!(search_calls.load(Ordering::SeqCst), 2);
        assert!(service.cache().is_empty());
    }
}
