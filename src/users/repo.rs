use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;
use crate::users::query::BuiltQuery;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub passport_number: String,
    pub pass_serie: String,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub address: String,
}

/// Fields of a user not yet persisted; the id is assigned by the insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub passport_number: String,
    pub pass_serie: String,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub address: String,
}

/// Runs a built filter query and returns the page keyed by user id.
pub async fn list(db: &PgPool, query: &BuiltQuery) -> Result<BTreeMap<i64, User>, ApiError> {
    tracing::debug!(params = query.param_count(), "listing users");
    let mut q = sqlx::query_as::<_, User>(&query.sql);
    for param in &query.params {
        q = q.bind(param.as_str());
    }
    let rows = q
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(db)
        .await
        .map_err(ApiError::persistence("list users"))?;

    Ok(rows.into_iter().map(|u| (u.id, u)).collect())
}

pub async fn get_by_id(db: &PgPool, id: i64) -> Result<Option<User>, ApiError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, passport_number, pass_serie, surname, name, patronymic, address
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .map_err(ApiError::persistence("get user"))
}

pub async fn insert(db: &PgPool, new: &NewUser) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (passport_number, pass_serie, surname, name, patronymic, address)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, passport_number, pass_serie, surname, name, patronymic, address
        "#,
    )
    .bind(&new.passport_number)
    .bind(&new.pass_serie)
    .bind(&new.surname)
    .bind(&new.name)
    .bind(&new.patronymic)
    .bind(&new.address)
    .fetch_one(db)
    .await
    .map_err(ApiError::persistence("insert user"))
}

pub async fn update(db: &PgPool, user: &User) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE users
        SET surname = $1, name = $2, patronymic = $3, address = $4
        WHERE id = $5
        "#,
    )
    .bind(&user.surname)
    .bind(&user.name)
    .bind(&user.patronymic)
    .bind(&user.address)
    .bind(user.id)
    .execute(db)
    .await
    .map_err(ApiError::persistence("update user"))?;
    Ok(())
}

/// Removes the user and every one of their tasks in one transaction.
/// Either both deletes land or neither does.
pub async fn delete_with_tasks(db: &PgPool, id: i64) -> Result<(), ApiError> {
    let mut tx = db
        .begin()
        .await
        .map_err(ApiError::persistence("begin delete transaction"))?;

    sqlx::query("DELETE FROM tasks WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::persistence("delete user tasks"))?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::persistence("delete user"))?;

    // Dropping the tx without this rolls both deletes back.
    tx.commit()
        .await
        .map_err(ApiError::persistence("commit delete transaction"))
}
