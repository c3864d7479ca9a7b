use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
}

impl ApiError {
    /// The `msg` field of a JSON error body, or the raw body otherwise.
    pub fn message(&self) -> String {
        match self {
            ApiError::HttpStatus(_, body) => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("msg").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| body.clone()),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_reads_json_body() {
        let err = ApiError::HttpStatus(
            StatusCode::NOT_FOUND,
            r#"{"msg":"directory not found"}"#.to_string(),
        );
        assert_eq!(err.message(), "directory not found");

        let err = ApiError::HttpStatus(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert_eq!(err.message(), "upstream down");
    }
}
