use std::sync::Arc;

use listsync::domain::query::FilterValue;
use listsync::services::ListQueryController;
use listsync::test_helpers::{init_test_tracing, ManualDataSource, SampleRow};

#[tokio::test]
async fn test_dispose_discards_in_flight_response() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 10).unwrap();

    controller.refetch().unwrap();
    source.wait_for_call(1).await;

    controller.dispose();
    let snapshot = controller.state();

    // The fetch resolves after the view unmounted
    assert!(source.resolve(1, vec![SampleRow::named("late")], 1));
    controller.quiesce().await;

    assert_eq!(controller.state(), snapshot);
    assert_eq!(controller.stale_discards(), 1);
}

#[tokio::test]
async fn test_dispose_discards_in_flight_failure() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 10).unwrap();

    controller.refetch().unwrap();
    source.wait_for_call(1).await;

    controller.dispose();
    let snapshot = controller.state();

    assert!(source.fail(1, "too late to matter"));
    controller.quiesce().await;

    assert_eq!(controller.state(), snapshot);
    assert!(controller.state().error.is_none());
}

#[tokio::test]
async fn test_operations_after_dispose_issue_no_fetches() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 10).unwrap();

    controller.dispose();
    controller.refetch().unwrap();
    controller.set_page(2).unwrap();
    controller
        .set_filters([("q".to_string(), Some(FilterValue::text("x")))])
        .unwrap();
    controller.set_page_size(50).unwrap();

    assert_eq!(source.call_count(), 0);
    assert_eq!(controller.current_revision(), 0);
}

#[tokio::test]
async fn test_refetch_reads_the_controllers_own_query() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 10).unwrap();

    // A mutation collaborator grabs its handle while the list is on page 1
    let after_save = controller.clone();

    controller.set_page(7).unwrap(); // revision 1
    source.wait_for_call(1).await;
    assert!(source.resolve(1, vec![SampleRow::named("row")], 70));
    controller.quiesce().await;

    // The modal saves and refetches; it must see page 7, not a page
    // captured when the handle was created
    after_save.refetch().unwrap(); // revision 2
    source.wait_for_call(2).await;
    let issued = source.pending_query(2).unwrap();
    assert_eq!(issued.page, 7);
    assert_eq!(issued.page_size, 10);

    assert!(source.resolve(2, vec![SampleRow::named("row")], 70));
    controller.quiesce().await;
    println!("✅ Refetch preserved the user's page context");
}

#[tokio::test]
async fn test_shared_handles_see_one_controller() {
    init_test_tracing();
    let source = ManualDataSource::<SampleRow>::new();
    let controller = ListQueryController::new(Arc::new(source.clone()), 10).unwrap();
    let view_handle = controller.clone();

    controller.set_page(2).unwrap();
    assert_eq!(view_handle.current_revision(), 1);
    assert_eq!(view_handle.state().query.page, 2);

    view_handle.dispose();
    assert!(controller.is_disposed());
}
