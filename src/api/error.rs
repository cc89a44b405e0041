use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::service::ServiceError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidParameter(_) => "invalid_parameter",
            ApiError::NotFound(_) => "not_found",
            ApiError::UpstreamUnavailable(_) => "upstream_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidParameter(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::UpstreamUnavailable(detail) => {
                error!("Upstream failure: {}", detail);
                (StatusCode::BAD_GATEWAY, "Upstream service unavailable".to_string())
            }
            ApiError::Internal(detail) => {
                error!("Internal failure: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "kind": self.kind(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => ApiError::NotFound(what),
            ServiceError::UpstreamUnavailable(detail) => ApiError::UpstreamUnavailable(detail),
            ServiceError::InvalidParameter(e) => ApiError::InvalidParameter(e.to_string()),
            ServiceError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::InvalidParameter(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidParameter(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use serde_json::Value;

    async fn render(err: ServiceError) -> (StatusCode, Value) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_parameter_is_bad_request() {
        let (status, body) = render(ServiceError::InvalidParameter(ValidationError::UnsupportedChain(1))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_parameter");
        assert!(body["message"].as_str().unwrap().contains("Unsupported chain id: 1"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let (status, body) = render(ServiceError::NotFound("project 7 on chain 8453".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
        assert!(body["message"].as_str().unwrap().contains("project 7"));
    }

    #[tokio::test]
    async fn test_upstream_detail_is_hidden() {
        let (status, body) =
            render(ServiceError::UpstreamUnavailable("graphql at http://10.0.0.5:8000 refused".to_string())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "upstream_unavailable");
        assert_eq!(body["message"], "Upstream service unavailable");
        assert!(!body.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_storage_detail_is_hidden() {
        let (status, body) = render(ServiceError::Storage(StoreError::Corrupt("bad owner column".to_string()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "internal");
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("owner column"));
    }

    #[tokio::test]
    async fn test_body_has_only_kind_and_message() {
        let (_, body) = render(ServiceError::NotFound("x".to_string())).await;
        let fields: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(fields, vec!["kind", "message"]);
    }
}
