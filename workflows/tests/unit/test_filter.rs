//! Filter unit tests

use carecrm_workflows::filter::{filter_workflows, status_counts, WorkflowFilters};
use carecrm_workflows::models::workflow::WorkflowStatus;
use carecrm_workflows::store::seed::sample_workflows;

fn ids(workflows: &[carecrm_workflows::Workflow]) -> Vec<&str> {
    workflows.iter().map(|w| w.id.as_str()).collect()
}

#[test]
fn test_empty_filter_is_identity() {
    let workflows = sample_workflows();
    let filtered = filter_workflows(&workflows, &WorkflowFilters::default());
    assert_eq!(filtered, workflows);
}

#[test]
fn test_filter_is_idempotent() {
    let workflows = sample_workflows();
    let filters = WorkflowFilters::default()
        .with_search("e")
        .with_status(WorkflowStatus::Paused);

    let once = filter_workflows(&workflows, &filters);
    let twice = filter_workflows(&once, &filters);
    assert_eq!(once, twice);
}

#[test]
fn test_search_and_status_are_anded() {
    let workflows = sample_workflows();

    let reminders = WorkflowFilters::default().with_search("reminder");
    assert_eq!(ids(&filter_workflows(&workflows, &reminders)), vec!["wf-2", "wf-4"]);

    let paused_reminders = reminders.clone().with_status(WorkflowStatus::Paused);
    assert_eq!(ids(&filter_workflows(&workflows, &paused_reminders)), vec!["wf-2", "wf-4"]);

    let draft_reminders = reminders.with_status(WorkflowStatus::Draft);
    assert!(filter_workflows(&workflows, &draft_reminders).is_empty());
}

#[test]
fn test_status_set_keeps_collection_order() {
    let workflows = sample_workflows();
    let filters = WorkflowFilters::default()
        .with_status(WorkflowStatus::Inactive)
        .with_status(WorkflowStatus::Draft);

    assert_eq!(ids(&filter_workflows(&workflows, &filters)), vec!["wf-1", "wf-3"]);
}

#[test]
fn test_no_match_yields_empty() {
    let workflows = sample_workflows();
    let filters = WorkflowFilters::default().with_search("billing");
    assert!(filter_workflows(&workflows, &filters).is_empty());
    assert!(filter_workflows(&[], &WorkflowFilters::default()).is_empty());
}

#[test]
fn test_status_counts_cover_every_status() {
    let counts = status_counts(&[]);
    assert_eq!(counts.len(), WorkflowStatus::ALL.len());
    assert!(counts.values().all(|n| *n == 0));
}

#[test]
fn test_surrounding_spaces_are_part_of_the_query() {
    let workflows = sample_workflows();

    let leading = filter_workflows(&workflows, &WorkflowFilters::default().with_search(" Reminder"));
    assert_eq!(ids(&leading), vec!["wf-2", "wf-4"]);

    let trailing = filter_workflows(&workflows, &WorkflowFilters::default().with_search("Reminder "));
    assert!(trailing.is_empty());

    let blank = WorkflowFilters::default().with_search("  ");
    assert_eq!(filter_workflows(&workflows, &blank), workflows);
}
