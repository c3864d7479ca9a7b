use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{CourseCatalog, CourseCode};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub course_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub ignore_duplicates: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<CourseCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_lab: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidateResponse {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            course_code: None,
            course_name: None,
            has_lab: None,
            message: Some(message.into()),
        }
    }
}

/// Check a prospective directory without creating anything.
pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Json(req): Json<ValidateRequest>,
) -> Result<impl IntoResponse, ValidateError> {
    let db = state.database();

    let code = match CourseCode::parse(&req.course_code) {
        Ok(code) => code,
        Err(e) => return Ok(Json(ValidateResponse::invalid(e.to_string())).into_response()),
    };
    let Some(course) = db.lookup(&code).await? else {
        return Ok(Json(ValidateResponse::invalid(format!(
            "{} is not a known course code",
            code
        )))
        .into_response());
    };

    if !req.ignore_duplicates {
        let title = req
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&course.name);
        if db.root_directory_exists(&requester.id, &code, title).await? {
            return Ok(Json(ValidateResponse::invalid(format!(
                "you already have a {} directory titled \"{}\"",
                code, title
            )))
            .into_response());
        }
    }

    Ok((
        StatusCode::OK,
        Json(ValidateResponse {
            valid: true,
            course_code: Some(course.code),
            course_name: Some(course.name),
            has_lab: Some(course.has_lab),
            message: None,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ValidateError {
    fn into_response(self) -> Response {
        match self {
            ValidateError::Database(e) => internal_error("failed to validate directory", &e),
        }
    }
}

impl ApiRequest for ValidateRequest {
    type Response = ValidateResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/directories/validate")?;
        Ok(client.post(full_url).json(&self))
    }
}
