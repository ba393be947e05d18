use super::*;
use crate::providers::tests::{Call, CallLog, MockSource, MockTarget};

const MARKER: &str = "migrated-label";

fn migrator(source: MockSource, target: MockTarget) -> Migrator {
    Migrator::new(Box::new(source), Box::new(target))
}

fn calls_for(calls: &CallLog, item_id: &str) -> Vec<Call> {
    let title = format!("Task {item_id}");
    let link = format!("https://app.asana.com/0/1/{item_id}");
    calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| match c {
            Call::List(_) => false,
            Call::Detail(id) => id == item_id,
            Call::Comment { item_id: id, .. } | Call::Label { item_id: id, .. } => id == item_id,
            Call::Create { summary } => *summary == title,
            Call::Annotate { link: l, .. } => *l == link,
        })
        .cloned()
        .collect()
}

fn writes(calls: &[Call]) -> usize {
    calls
        .iter()
        .filter(|c| !matches!(c, Call::List(_) | Call::Detail(_)))
        .count()
}

#[tokio::test]
async fn marked_items_are_skipped_without_writes() {
    let calls = CallLog::default();
    let source = MockSource::new(calls.clone())
        .with_item("1", &[MARKER])
        .with_item("2", &[]);
    let target = MockTarget::new(calls.clone());

    let summary = migrator(source, target)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    assert!(matches!(summary.outcome_of("1"), Some(ItemOutcome::Skipped)));
    assert!(matches!(summary.outcome_of("2"), Some(ItemOutcome::Done { .. })));
    assert_eq!(writes(&calls_for(&calls, "1")), 0);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.done(), 1);
}

#[tokio::test]
async fn new_item_runs_every_step_in_order() {
    let calls = CallLog::default();
    let source = MockSource::new(calls.clone()).with_item("3", &[]);
    let target = MockTarget::new(calls.clone()).with_key("3", "PROJ-9");

    let summary = migrator(source, target)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    match summary.outcome_of("3") {
        Some(ItemOutcome::Done { issue_key }) => assert_eq!(issue_key, "PROJ-9"),
        other => panic!("unexpected outcome: {other:?}"),
    }

    let item_calls = calls_for(&calls, "3");
    assert_eq!(
        item_calls,
        vec![
            Call::Detail("3".into()),
            Call::Create {
                summary: "Task 3".into()
            },
            Call::Annotate {
                issue_key: "PROJ-9".into(),
                link: "https://app.asana.com/0/1/3".into()
            },
            Call::Comment {
                item_id: "3".into(),
                body: "<body>Migrated to Jira as <a href='https://jira.example.com/browse/PROJ-9'>PROJ-9</a></body>".into()
            },
            Call::Label {
                item_id: "3".into(),
                label_id: MARKER.into()
            },
        ]
    );
}

#[tokio::test]
async fn create_failure_stops_the_item_only() {
    let calls = CallLog::default();
    let source = MockSource::new(calls.clone())
        .with_item("4", &[])
        .with_item("5", &[]);
    let target = MockTarget::new(calls.clone()).failing_create("4");

    let summary = migrator(source, target)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    match summary.outcome_of("4") {
        Some(ItemOutcome::Failed { stage, error }) => {
            assert_eq!(*stage, Stage::CreatingTarget);
            assert_eq!(error.kind(), "target");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    let failed_calls = calls_for(&calls, "4");
    assert!(!failed_calls
        .iter()
        .any(|c| matches!(c, Call::Comment { .. } | Call::Label { .. } | Call::Annotate { .. })));

    assert!(matches!(summary.outcome_of("5"), Some(ItemOutcome::Done { .. })));
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.done(), 1);
}

#[tokio::test]
async fn vanished_item_is_reported_failed() {
    let calls = CallLog::default();
    let source = MockSource::new(calls.clone()).with_missing("5");
    let target = MockTarget::new(calls.clone());

    let summary = migrator(source, target)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    match summary.outcome_of("5") {
        Some(ItemOutcome::Failed { stage, error }) => {
            assert_eq!(*stage, Stage::Fetched);
            assert_eq!(error.kind(), "not_found");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(summary.failed_items().count(), 1);
}

#[tokio::test]
async fn source_comment_failure_leaves_item_unmarked() {
    let calls = CallLog::default();
    let source = MockSource::new(calls.clone())
        .with_item("6", &[])
        .failing_comment("6");
    let target = MockTarget::new(calls.clone());

    let summary = migrator(source, target)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    assert!(matches!(
        summary.outcome_of("6"),
        Some(ItemOutcome::Failed {
            stage: Stage::AnnotatingSource,
            ..
        })
    ));
    assert!(!calls_for(&calls, "6")
        .iter()
        .any(|c| matches!(c, Call::Label { .. })));
}

#[tokio::test]
async fn target_comment_failure_skips_source_writes() {
    let calls = CallLog::default();
    let source = MockSource::new(calls.clone()).with_item("7", &[]);
    let target = MockTarget::new(calls.clone()).failing_annotate();

    let summary = migrator(source, target)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    assert!(matches!(
        summary.outcome_of("7"),
        Some(ItemOutcome::Failed {
            stage: Stage::AnnotatingTarget,
            ..
        })
    ));
    let item_calls = calls_for(&calls, "7");
    assert!(!item_calls
        .iter()
        .any(|c| matches!(c, Call::Comment { .. } | Call::Label { .. })));
}

#[tokio::test]
async fn label_failure_is_reported_at_last_stage() {
    let calls = CallLog::default();
    let source = MockSource::new(calls.clone())
        .with_item("8", &[])
        .failing_label("8");
    let target = MockTarget::new(calls.clone());

    let summary = migrator(source, target)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    match summary.outcome_of("8") {
        Some(ItemOutcome::Failed { stage, error }) => {
            assert_eq!(*stage, Stage::LabelingSource);
            assert_eq!(error.kind(), "transport");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn listing_failure_aborts_the_run() {
    let calls = CallLog::default();
    let mut source = MockSource::new(calls.clone()).with_item("1", &[]);
    source.fail_listing = Some(|| MigrateError::Auth {
        system: "MockSource",
        message: "HTTP 401 Unauthorized".into(),
    });
    let target = MockTarget::new(calls.clone());

    let err = migrator(source, target)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "auth");
    assert_eq!(calls.lock().unwrap().as_slice(), &[Call::List("p".into())]);
}

#[tokio::test]
async fn every_done_item_was_created_and_annotated_once_before_labeling() {
    let calls = CallLog::default();
    let mut source = MockSource::new(calls.clone());
    for id in 10..30 {
        source = source.with_item(&id.to_string(), &[]);
    }
    let target = MockTarget::new(calls.clone());

    let summary = migrator(source, target)
        .with_max_concurrent(4)
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    assert_eq!(summary.done(), 20);
    for report in &summary.reports {
        let item_calls = calls_for(&calls, &report.item_id);
        let pos = |pred: fn(&Call) -> bool| {
            let hits: Vec<usize> = item_calls
                .iter()
                .enumerate()
                .filter(|(_, c)| pred(c))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(hits.len(), 1, "calls for {}: {item_calls:?}", report.item_id);
            hits[0]
        };
        let create = pos(|c| matches!(c, Call::Create { .. }));
        let annotate = pos(|c| matches!(c, Call::Annotate { .. }));
        let comment = pos(|c| matches!(c, Call::Comment { .. }));
        let label = pos(|c| matches!(c, Call::Label { .. }));
        assert!(create < annotate && annotate < comment && comment < label);
    }
}

#[tokio::test]
async fn empty_project_yields_empty_summary() {
    let calls = CallLog::default();
    let summary = migrator(MockSource::new(calls.clone()), MockTarget::new(calls))
        .migrate_project("p", "PROJ", MARKER)
        .await
        .unwrap();

    assert!(summary.reports.is_empty());
    assert_eq!(
        summary.to_string(),
        "0 migrated, 0 already migrated, 0 failed"
    );
}

#[test]
fn zero_concurrency_is_raised_to_one() {
    let calls = CallLog::default();
    let m = migrator(MockSource::new(calls.clone()), MockTarget::new(calls)).with_max_concurrent(0);
    assert_eq!(m.max_concurrent, 1);
}

#[test]
fn source_comment_escapes_markup() {
    let body = source_comment_html("https://jira/browse/A-1?x=1&y='2'", "A-1");
    assert_eq!(
        body,
        "<body>Migrated to Jira as <a href='https://jira/browse/A-1?x=1&amp;y=&#39;2&#39;'>A-1</a></body>"
    );
}

#[test]
fn stages_have_log_names() {
    assert_eq!(Stage::CreatingTarget.to_string(), "creating_target");
    assert_eq!(Stage::LabelingSource.as_str(), "labeling_source");
}
