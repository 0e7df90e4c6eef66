use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

use crate::error::ApiError;
use crate::tasks::repo::Worklog;

#[derive(Debug, Deserialize)]
pub struct StartTaskRequest {
    pub user_id: i64,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct StartTaskResponse {
    pub res: &'static str,
    pub task_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct WorklogQuery {
    pub user_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorklogsResponse {
    pub worklogs: Vec<Worklog>,
}

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parses a `YYYY-MM-DD` query parameter into UTC midnight of that day,
/// mirroring how a bare date literal compares against a timestamp column.
pub fn parse_report_date(name: &str, value: Option<&str>) -> Result<OffsetDateTime, ApiError> {
    let raw = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{name} is required (YYYY-MM-DD)")))?;
    let date = Date::parse(raw, DATE_FORMAT)
        .map_err(|_| ApiError::validation(format!("{name} must be YYYY-MM-DD")))?;
    Ok(date.midnight().assume_utc())
}
