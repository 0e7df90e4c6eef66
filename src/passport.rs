use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PassportApiConfig;
use crate::error::ApiError;

/// Person fields resolved by the external passport service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPerson {
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub address: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("passport not found")]
    NotFound,
    #[error("passport number rejected by lookup service")]
    BadRequest,
    #[error("lookup service error: {0}")]
    Upstream(String),
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound => ApiError::not_found(err.to_string()),
            LookupError::BadRequest => ApiError::validation(err.to_string()),
            LookupError::Upstream(msg) => ApiError::Upstream(msg),
        }
    }
}

/// External passport-lookup collaborator. Trait so handlers can be tested
/// against a stub instead of a live service.
#[async_trait]
pub trait PassportLookup: Send + Sync {
    async fn resolve(&self, passport_number: &str) -> Result<ResolvedPerson, LookupError>;
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    passport_number: &'a str,
}

pub struct HttpPassportLookup {
    http: Client,
    base_url: String,
}

impl HttpPassportLookup {
    pub fn new(cfg: &PassportApiConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_info(&self, passport_number: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(format!("{}/info", self.base_url))
            .json(&LookupRequest { passport_number })
            .send()
            .await
    }
}

#[async_trait]
impl PassportLookup for HttpPassportLookup {
    async fn resolve(&self, passport_number: &str) -> Result<ResolvedPerson, LookupError> {
        debug!(url = %self.base_url, "resolving passport via external service");

        // Single retry budget, spent only on connect/timeout failures.
        let response = match self.post_info(passport_number).await {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                warn!(error = %e, "passport lookup unreachable, retrying once");
                self.post_info(passport_number)
                    .await
                    .map_err(|e| LookupError::Upstream(e.to_string()))?
            }
            Err(e) => return Err(LookupError::Upstream(e.to_string())),
        };

        match response.status() {
            StatusCode::OK => response
                .json::<ResolvedPerson>()
                .await
                .map_err(|e| LookupError::Upstream(format!("bad lookup payload: {e}"))),
            StatusCode::NOT_FOUND => Err(LookupError::NotFound),
            StatusCode::BAD_REQUEST => Err(LookupError::BadRequest),
            other => Err(LookupError::Upstream(format!(
                "lookup service returned {other}"
            ))),
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Stub collaborator that resolves exactly one passport string and
    /// returns a configurable error for everything else.
    pub struct StubLookup {
        pub known: String,
        pub person: ResolvedPerson,
        pub miss: fn() -> LookupError,
    }

    impl Default for StubLookup {
        fn default() -> Self {
            Self {
                known: "1234 567890".into(),
                person: ResolvedPerson {
                    name: "Ivan".into(),
                    surname: "Ivanov".into(),
                    patronymic: "Ivanovich".into(),
                    address: "Moscow".into(),
                },
                miss: || LookupError::NotFound,
            }
        }
    }

    #[async_trait]
    impl PassportLookup for StubLookup {
        async fn resolve(&self, passport_number: &str) -> Result<ResolvedPerson, LookupError> {
            if passport_number == self.known {
                Ok(self.person.clone())
            } else {
                Err((self.miss)())
            }
        }
    }
}
