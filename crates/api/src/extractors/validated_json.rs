//! JSON body extractor that runs `validator` rules.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// A JSON body that has been deserialized and validated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection_to_error)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::Validation("Expected Content-Type: application/json".to_string())
        }
        other => ApiError::Validation(other.body_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::post, Router};
    use domain::models::group::CreateGroupRequest;
    use tower::ServiceExt;

    async fn handler(ValidatedJson(request): ValidatedJson<CreateGroupRequest>) -> String {
        request.name
    }

    async fn call(body: &str, content_type: Option<&str>) -> StatusCode {
        let app = Router::new().route("/", post(handler));
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let response = app
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_valid_body() {
        assert_eq!(
            call(r#"{"name":"Trek"}"#, Some("application/json")).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_rule_violation_is_bad_request() {
        assert_eq!(
            call(r#"{"name":"   "}"#, Some("application/json")).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        assert_eq!(
            call(r#"{"name":"#, Some("application/json")).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(call("{}", Some("application/json")).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        assert_eq!(call(r#"{"name":"Trek"}"#, None).await, StatusCode::BAD_REQUEST);
    }
}
