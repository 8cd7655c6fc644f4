use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::admin::AdminState;
use crate::config::{parse_backend_url, ValidationError};
use crate::load_balancer::PoolStatus;

/// Body of `POST /backends` and `DELETE /backends`.
#[derive(Debug, Deserialize)]
pub struct BackendInput {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("invalid backend input")]
    InvalidInput,
    #[error("invalid url")]
    InvalidUrl(#[source] ValidationError),
    #[error("backend not found")]
    NotFound,
    #[error("failed to encode status")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match self {
            AdminError::InvalidInput | AdminError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound => StatusCode::NOT_FOUND,
            AdminError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

fn parse_input(body: &[u8]) -> Result<Url, AdminError> {
    let input: BackendInput = serde_json::from_slice(body).map_err(|_| AdminError::InvalidInput)?;
    if input.url.is_empty() {
        return Err(AdminError::InvalidInput);
    }
    parse_backend_url(&input.url).map_err(AdminError::InvalidUrl)
}

/// Pool snapshot as indented JSON.
pub async fn get_status(State(state): State<AdminState>) -> Result<Response, AdminError> {
    let body = render_status(&state.pool.status())?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

fn render_status(status: &PoolStatus) -> Result<String, AdminError> {
    Ok(serde_json::to_string_pretty(status)?)
}

/// Add a backend, then probe it in the background so it gets a verdict
/// before the next scheduled pass.
pub async fn add_backend(
    State(state): State<AdminState>,
    body: Bytes,
) -> Result<StatusCode, AdminError> {
    let url = parse_input(&body).inspect_err(|e| tracing::debug!(error = %e, "Rejected add request"))?;
    state.pool.add(url);
    state.checker.spawn_check();
    Ok(StatusCode::CREATED)
}

pub async fn remove_backend(
    State(state): State<AdminState>,
    body: Bytes,
) -> Result<StatusCode, AdminError> {
    let url = parse_input(&body).inspect_err(|e| tracing::debug!(error = %e, "Rejected remove request"))?;
    if state.pool.remove(&url) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AdminError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_accepts_valid_url() {
        let url = parse_input(br#"{"url": "http://127.0.0.1:9001"}"#).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9001/");
    }

    #[test]
    fn parse_input_rejects_bad_bodies() {
        assert!(matches!(parse_input(b"not json"), Err(AdminError::InvalidInput)));
        assert!(matches!(parse_input(b"{}"), Err(AdminError::InvalidInput)));
        assert!(matches!(parse_input(br#"{"url": ""}"#), Err(AdminError::InvalidInput)));
        assert!(matches!(parse_input(br#"{"url": "localhost:9001"}"#), Err(AdminError::InvalidUrl(_))));
    }

    #[test]
    fn status_is_indented() {
        let pool = crate::load_balancer::BackendPool::from_addresses([Url::parse("http://127.0.0.1:9001").unwrap()]);
        let body = render_status(&pool.status()).unwrap();
        assert!(body.starts_with("{\n  \"total_backends\": 1,"), "{}", body);
        assert!(body.contains("\n      \"url\": \"http://127.0.0.1:9001/\""), "{}", body);
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(AdminError::InvalidInput.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(AdminError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }
}
