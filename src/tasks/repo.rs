use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
}

impl Task {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// One aggregate row of a worklog report. Hours and minutes are both
/// rounded from the same summed duration; minutes is the full duration in
/// minutes, not the remainder after hours.
#[derive(Debug, Clone, Serialize)]
pub struct Worklog {
    pub task_id: i64,
    pub description: String,
    pub hours: i64,
    pub minutes: i64,
}

impl Worklog {
    pub fn from_seconds(task_id: i64, description: String, seconds: f64) -> Self {
        Self {
            task_id,
            description,
            hours: (seconds / 3600.0).round() as i64,
            minutes: (seconds / 60.0).round() as i64,
        }
    }
}

/// Sorts report rows by hours descending, then minutes descending.
pub fn sort_worklogs(worklogs: &mut [Worklog]) {
    worklogs.sort_by(|a, b| b.hours.cmp(&a.hours).then(b.minutes.cmp(&a.minutes)));
}

#[derive(Debug, FromRow)]
struct WorklogRow {
    task_id: i64,
    description: String,
    seconds: f64,
}

pub async fn find(db: &PgPool, id: i64) -> Result<Option<Task>, ApiError> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, user_id, description, start_time, end_time
        FROM tasks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .map_err(ApiError::persistence("get task"))
}

/// True when the user already has a task with no end time.
pub async fn has_open_task(db: &PgPool, user_id: i64) -> Result<bool, ApiError> {
    let open: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM tasks WHERE user_id = $1 AND end_time IS NULL LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .map_err(ApiError::persistence("check open task"))?;
    Ok(open.is_some())
}

/// Creates a running task stamped with the current time.
pub async fn start(db: &PgPool, user_id: i64, description: &str) -> Result<Task, ApiError> {
    sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (user_id, description, start_time)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, description, start_time, end_time
        "#,
    )
    .bind(user_id)
    .bind(description)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db)
    .await
    .map_err(ApiError::persistence("start task"))
}

/// Stamps the end time. Callers check existence and state first.
pub async fn stop(db: &PgPool, id: i64) -> Result<(), ApiError> {
    sqlx::query("UPDATE tasks SET end_time = $1 WHERE id = $2")
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(db)
        .await
        .map_err(ApiError::persistence("stop task"))?;
    Ok(())
}

/// Per-task duration sums for one user over a closed time range. Open
/// tasks never match: a NULL end time cannot satisfy `end_time <= $3`.
pub async fn worklogs(
    db: &PgPool,
    user_id: i64,
    range_start: OffsetDateTime,
    range_end: OffsetDateTime,
) -> Result<Vec<Worklog>, ApiError> {
    let rows = sqlx::query_as::<_, WorklogRow>(
        r#"
        SELECT
            id AS task_id,
            description,
            CAST(SUM(EXTRACT(EPOCH FROM (end_time - start_time))) AS DOUBLE PRECISION) AS seconds
        FROM tasks
        WHERE user_id = $1 AND start_time >= $2 AND end_time <= $3
        GROUP BY id, description
        "#,
    )
    .bind(user_id)
    .bind(range_start)
    .bind(range_end)
    .fetch_all(db)
    .await
    .map_err(ApiError::persistence("aggregate worklogs"))?;

    let mut report: Vec<Worklog> = rows
        .into_iter()
        .map(|r| Worklog::from_seconds(r.task_id, r.description, r.seconds))
        .collect();
    sort_worklogs(&mut report);
    Ok(report)
}
