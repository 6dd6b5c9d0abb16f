use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use listsync::datasource::InMemoryDataSource;
use listsync::domain::query::{FilterValue, SortDirection, SortKey};
use listsync::services::ListQueryController;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CourseRow {
    id: Uuid,
    title: String,
    teacher: String,
    created_at: DateTime<Utc>,
}

fn demo_rows() -> Vec<CourseRow> {
    let teachers = ["Alice", "Bob", "Carol"];
    (0..57)
        .map(|i| CourseRow {
            id: Uuid::new_v4(),
            title: format!("Course {:02}", i),
            teacher: teachers[i % teachers.len()].to_string(),
            created_at: Utc::now() - ChronoDuration::days(i as i64),
        })
        .collect()
}

fn print_state(label: &str, controller: &ListQueryController<CourseRow>) {
    let state = controller.state();
    println!(
        "[{}] status={:?} page={} page_size={} total={} items={:?}",
        label,
        state.status,
        state.query.page,
        state.query.page_size,
        state.total,
        state
            .items
            .iter()
            .map(|row| row.title.as_str())
            .collect::<Vec<_>>()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let source = InMemoryDataSource::new(demo_rows(), |row: &CourseRow, filters| {
        let title_ok = match filters.get("title") {
            Some(FilterValue::Text(needle)) => {
                row.title.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => true,
        };
        let teacher_ok = match filters.get("teacher") {
            Some(FilterValue::Set(names)) => names.contains(&row.teacher),
            _ => true,
        };
        title_ok && teacher_ok
    })
    .with_comparator(|a, b, sort| {
        let ord = match sort[0].field.as_str() {
            "created_at" => a.created_at.cmp(&b.created_at),
            _ => a.title.cmp(&b.title),
        };
        match sort[0].direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    })
    .with_latency(Duration::from_millis(30));

    let controller = ListQueryController::new(Arc::new(source), 5)?;

    controller.refetch()?;
    controller.quiesce().await;
    print_state("initial load", &controller);

    controller.set_page(3)?;
    controller.quiesce().await;
    print_state("page 3", &controller);

    controller.set_filters([(
        "teacher".to_string(),
        Some(FilterValue::set(["Alice"])),
    )])?;
    controller.quiesce().await;
    print_state("teacher=Alice", &controller);

    controller.set_sort(vec![SortKey::descending("created_at")])?;
    controller.quiesce().await;
    print_state("newest first", &controller);

    // A modal just saved an edit: refetch keeps page and filters intact
    controller.refetch()?;
    controller.quiesce().await;
    print_state("after refetch", &controller);

    controller.dispose();
    Ok(())
}
