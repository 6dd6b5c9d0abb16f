use std::sync::Arc;

use listsync::domain::query::FilterValue;
use listsync::domain::state::FetchStatus;
use listsync::services::ListQueryController;
use listsync::test_helpers::{init_test_tracing, wait_until, ManualDataSource, SampleRow};

#[tokio::test]
async fn test_stale_page_response_never_overwrites_newer_page() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 20).unwrap();

    controller.refetch().unwrap(); // revision 1, page 1
    source.wait_for_call(1).await;
    controller.set_page(2).unwrap(); // revision 2, page 2
    source.wait_for_call(2).await;

    // Network race: the later request answers first
    let page_two = vec![SampleRow::named("from page 2")];
    assert!(source.resolve(2, page_two.clone(), 50));
    wait_until(|| controller.state().is_loaded()).await;

    // The slow page-1 response finally arrives and must be dropped
    assert!(source.resolve(1, vec![SampleRow::named("from page 1")], 50));
    wait_until(|| controller.stale_discards() == 1).await;

    let state = controller.state();
    assert_eq!(state.status, FetchStatus::Loaded);
    assert_eq!(state.items, page_two);
    assert_eq!(state.query.page, 2);
    controller.quiesce().await;
}

#[tokio::test]
async fn test_rapid_page_size_changes_settle_on_latest() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 10).unwrap();

    // User hammers the page-size selector before anything resolves
    controller.set_page_size(20).unwrap(); // revision 1
    controller.set_page_size(50).unwrap(); // revision 2
    controller.set_page_size(5).unwrap(); // revision 3
    source.wait_for_call(1).await;
    source.wait_for_call(2).await;
    source.wait_for_call(3).await;

    // Resolve out of order: newest first, then the two superseded ones
    let latest = vec![SampleRow::named("five per page")];
    assert!(source.resolve(3, latest.clone(), 99));
    assert!(source.resolve(1, vec![SampleRow::named("twenty per page")], 99));
    assert!(source.resolve(2, vec![SampleRow::named("fifty per page")], 99));
    controller.quiesce().await;

    let state = controller.state();
    assert_eq!(state.items, latest);
    assert_eq!(state.query.page_size, 5);
    assert_eq!(controller.stale_discards(), 2);
}

#[tokio::test]
async fn test_stale_failure_is_silently_dropped() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 10).unwrap();

    controller.refetch().unwrap(); // revision 1
    source.wait_for_call(1).await;
    controller
        .set_filters([("q".to_string(), Some(FilterValue::text("piano")))])
        .unwrap(); // revision 2
    source.wait_for_call(2).await;

    let rows = vec![SampleRow::named("piano course")];
    assert!(source.resolve(2, rows.clone(), 1));
    wait_until(|| controller.state().is_loaded()).await;

    // The superseded fetch fails; the error belongs to a dead revision
    assert!(source.fail(1, "gateway timeout"));
    wait_until(|| controller.stale_discards() == 1).await;

    let state = controller.state();
    assert_eq!(state.status, FetchStatus::Loaded);
    assert_eq!(state.items, rows);
    assert!(state.error.is_none());
    controller.quiesce().await;
}

#[tokio::test]
async fn test_mistagged_revision_is_rejected() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 10).unwrap();

    controller.refetch().unwrap(); // revision 1
    source.wait_for_call(1).await;

    // A broken source answers with a result tagged for a query it was
    // never asked about (revision 0, the never-issued default)
    let unissued = listsync::domain::query::QuerySpec::new(10);
    let wrong = listsync::domain::result::ListResult::answering(
        &unissued,
        vec![SampleRow::named("x")],
        1,
    );
    assert!(source.resolve_with(1, Ok(wrong)));
    controller.quiesce().await;

    let state = controller.state();
    assert_eq!(state.status, FetchStatus::Error);
    assert!(state.error.unwrap().contains("revision"));
}
