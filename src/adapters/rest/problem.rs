//! Mapping of non-success responses to [`ApiError`].

use reqwest::{Response, StatusCode};
use serde::Deserialize;

use crate::ports::ApiError;

/// Problem-detail body (RFC 7807) or a plain `{ "message": ... }`.
#[derive(Debug, Default, Deserialize)]
struct ProblemBody {
    detail: Option<String>,
    message: Option<String>,
}

/// Message for a failed response: `detail`, else `message`, else `fallback`.
pub(super) fn problem_message(body: &str, fallback: String) -> String {
    let problem: ProblemBody = serde_json::from_str(body).unwrap_or_default();
    problem
        .detail
        .filter(|d| !d.trim().is_empty())
        .or(problem.message.filter(|m| !m.trim().is_empty()))
        .unwrap_or(fallback)
}

pub(super) fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

/// Consumes a non-success, non-401 response.
pub(super) async fn error_from_response(path: &str, response: Response) -> ApiError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound(path.to_string());
    }

    let body = response.text().await.unwrap_or_default();
    ApiError::Status {
        code: status.as_u16(),
        message: problem_message(&body, status_text(status)),
    }
}
