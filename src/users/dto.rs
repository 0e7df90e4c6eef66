use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::users::repo::User;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub passport_number: Option<String>,
    pub pass_serie: Option<String>,
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub address: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: BTreeMap<i64, User>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub passport_number: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub address: Option<String>,
}

impl UpdateUserRequest {
    /// Merges only the fields present in the request onto the stored record.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(surname) = &self.surname {
            user.surname = surname.clone();
        }
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(patronymic) = &self.patronymic {
            user.patronymic = patronymic.clone();
        }
        if let Some(address) = &self.address {
            user.address = address.clone();
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub res: &'static str,
}

/// Splits a raw passport string into (series, number). The raw form is two
/// whitespace-separated tokens, series first.
pub fn parse_passport(raw: &str) -> Result<(&str, &str), ApiError> {
    let mut tokens = raw.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(serie), Some(number), None) => Ok((serie, number)),
        _ => Err(ApiError::validation(
            "passport_number must be \"<serie> <number>\"",
        )),
    }
}
