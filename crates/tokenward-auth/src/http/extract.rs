//! Request body extraction with JSON error responses.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AuthError;

/// JSON body extractor whose rejection is an `InvalidRequest` error.
///
/// Axum's `Json` rejects with plain-text bodies and a mix of 400/415/422;
/// this keeps every auth endpoint on the same error shape.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AuthError::invalid_request(rejection_message(&rejection))),
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        other => other.body_text(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header},
        routing::post,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Payload {
        name: String,
    }

    async fn echo(JsonBody(payload): JsonBody<Payload>) -> String {
        payload.name
    }

    async fn send(content_type: Option<&str>, body: &str) -> StatusCode {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(value) = content_type {
            builder = builder.header(header::CONTENT_TYPE, value);
        }
        Router::new()
            .route("/", post(echo))
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_body() {
        assert_eq!(
            send(Some("application/json"), r#"{"name":"x"}"#).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_invalid_bodies_are_400() {
        assert_eq!(send(Some("application/json"), "{").await, StatusCode::BAD_REQUEST);
        assert_eq!(send(Some("application/json"), "{}").await, StatusCode::BAD_REQUEST);
        assert_eq!(send(None, r#"{"name":"x"}"#).await, StatusCode::BAD_REQUEST);
    }
}
