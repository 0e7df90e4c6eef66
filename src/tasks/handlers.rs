use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;
use crate::tasks::dto::{
    parse_report_date, StartTaskRequest, StartTaskResponse, WorklogQuery, WorklogsResponse,
};
use crate::tasks::repo;
use crate::users;
use crate::users::dto::ResultResponse;

#[instrument(skip(state, payload))]
pub async fn start_task(
    State(state): State<AppState>,
    Json(payload): Json<StartTaskRequest>,
) -> Result<Json<StartTaskResponse>, ApiError> {
    if payload.user_id <= 0 {
        return Err(ApiError::validation("user_id must be a positive integer"));
    }
    if payload.description.trim().is_empty() {
        return Err(ApiError::validation("description must not be empty"));
    }

    users::repo::get_by_id(&state.db, payload.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    // One running task per user; a second start is a state conflict.
    if repo::has_open_task(&state.db, payload.user_id).await? {
        return Err(ApiError::conflict("user already has an open task"));
    }

    let task = repo::start(&state.db, payload.user_id, payload.description.trim()).await?;

    info!(task_id = task.id, user_id = task.user_id, "task started");
    Ok(Json(StartTaskResponse {
        res: "task started",
        task_id: task.id,
    }))
}

#[instrument(skip(state))]
pub async fn stop_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ResultResponse>, ApiError> {
    let task = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("task not found"))?;

    if !task.is_open() {
        return Err(ApiError::conflict("task is already stopped"));
    }

    repo::stop(&state.db, id).await?;

    info!(task_id = id, "task stopped");
    Ok(Json(ResultResponse { res: "task stopped" }))
}

#[instrument(skip(state))]
pub async fn user_worklogs(
    State(state): State<AppState>,
    Query(params): Query<WorklogQuery>,
) -> Result<Json<WorklogsResponse>, ApiError> {
    let user_id = match params.user_id {
        Some(id) if id > 0 => id,
        _ => return Err(ApiError::validation("user_id must be a positive integer")),
    };
    let range_start = parse_report_date("start_date", params.start_date.as_deref())?;
    let range_end = parse_report_date("end_date", params.end_date.as_deref())?;

    let worklogs = repo::worklogs(&state.db, user_id, range_start, range_end).await?;
    Ok(Json(WorklogsResponse { worklogs }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn start_rejects_empty_description_before_any_io() {
        let state = AppState::fake();
        let err = start_task(
            State(state),
            Json(StartTaskRequest {
                user_id: 1,
                description: "   ".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn start_rejects_non_positive_user_id() {
        let state = AppState::fake();
        let err = start_task(
            State(state),
            Json(StartTaskRequest {
                user_id: 0,
                description: "work".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn worklogs_reject_bad_query_before_querying() {
        let state = AppState::fake();
        let err = user_worklogs(
            State(state.clone()),
            Query(WorklogQuery {
                user_id: None,
                start_date: Some("2024-07-01".into()),
                end_date: Some("2024-07-31".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = user_worklogs(
            State(state),
            Query(WorklogQuery {
                user_id: Some(1),
                start_date: Some("yesterday".into()),
                end_date: Some("2024-07-31".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
