use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    parse_passport, CreateUserRequest, ListUsersQuery, ResultResponse, UpdateUserRequest,
    UsersResponse,
};
use crate::users::query::UserQuery;
use crate::users::repo::{self, NewUser, User};

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<UsersResponse>, ApiError> {
    let page = params.page.unwrap_or(0);
    let page_size = params.page_size.unwrap_or(0);

    let query = UserQuery::new()
        .filter("passport_number", params.passport_number.as_deref())
        .filter("pass_serie", params.pass_serie.as_deref())
        .filter("surname", params.surname.as_deref())
        .filter("name", params.name.as_deref())
        .filter("patronymic", params.patronymic.as_deref())
        .filter("address", params.address.as_deref())
        .paginate(page, page_size)?;

    let users = repo::list(&state.db, &query).await?;
    if users.is_empty() {
        warn!(page, page_size, "no users matched the filter");
        return Err(ApiError::not_found("no users found"));
    }

    Ok(Json(UsersResponse { users }))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let (serie, number) = parse_passport(&payload.passport_number)?;

    let person = state.passport.resolve(&payload.passport_number).await?;

    let user = repo::insert(
        &state.db,
        &NewUser {
            passport_number: number.to_string(),
            pass_serie: serie.to_string(),
            surname: person.surname,
            name: person.name,
            patronymic: person.patronymic,
            address: person.address,
        },
    )
    .await?;

    info!(user_id = user.id, "user created");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = repo::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ResultResponse>, ApiError> {
    let mut user = repo::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    payload.apply_to(&mut user);
    repo::update(&state.db, &user).await?;

    info!(user_id = id, "user updated");
    Ok(Json(ResultResponse {
        res: "successfully updated",
    }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ResultResponse>, ApiError> {
    // Existence check happens before the transaction so a missing user is
    // a 404, not a vacuous successful delete.
    repo::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    repo::delete_with_tasks(&state.db, id).await?;

    info!(user_id = id, "user and tasks deleted");
    Ok(Json(ResultResponse {
        res: "successfully deleted",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Arc;

    use crate::passport::{test_support::StubLookup, LookupError};

    #[tokio::test]
    async fn list_rejects_missing_paging_before_querying() {
        // The fake state's pool connects lazily; reaching the database
        // would hang or error, so a clean Validation error proves the
        // request was rejected first.
        let state = AppState::fake();
        let params = ListUsersQuery {
            passport_number: None,
            pass_serie: None,
            surname: None,
            name: None,
            patronymic: None,
            address: None,
            page: None,
            page_size: None,
        };
        let err = list_users(State(state), Query(params)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rejects_malformed_passport_before_any_io() {
        let state = AppState::fake();
        let err = create_user(
            State(state),
            Json(CreateUserRequest {
                passport_number: "123456".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_maps_lookup_not_found_without_db_write() {
        let state = AppState::fake_with_lookup(Arc::new(StubLookup {
            miss: || LookupError::NotFound,
            ..StubLookup::default()
        }));
        let err = create_user(
            State(state),
            Json(CreateUserRequest {
                passport_number: "9999 000000".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_maps_upstream_failure_to_bad_gateway() {
        let state = AppState::fake_with_lookup(Arc::new(StubLookup {
            miss: || LookupError::Upstream("connection refused".into()),
            ..StubLookup::default()
        }));
        let err = create_user(
            State(state),
            Json(CreateUserRequest {
                passport_number: "9999 000000".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
