use std::sync::Arc;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use crate::dal::extractor::FeatureExtractor;
use crate::dal::hub::HubSession;
use crate::handler::embedding_handler::handle_embedding_request;

pub const EMBEDDING_FAILED: &str = "Embedding vector calculation failed";

#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    pub post_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingResponse {
    pub post_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<HubSession>,
    pub extractor: Arc<dyn FeatureExtractor>,
}

/// Every internal failure maps to one opaque 500. The cause is logged by the
/// handler and never sent to the caller.
pub struct ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: EMBEDDING_FAILED.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/embed", post(embed_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn embed_handler(
    State(state): State<AppState>,
    Json(request): Json<EmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    handle_embedding_request(&state.hub, state.extractor.as_ref(), &request.post_id).await
        .map_err(|_| ApiError)?;
    Ok(Json(EmbeddingResponse {
        post_id: request.post_id,
        status: "completed".to_string(),
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubExtractor {
        calls: Mutex<Vec<String>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl FeatureExtractor for StubExtractor {
        async fn update_post_features(&self, post_id: &str) -> Result<()> {
            self.calls.lock().await.push(post_id.to_string());
            if let Some(message) = &self.fail_with {
                bail!("{}", message);
            }
            Ok(())
        }
    }

    fn app(extractor: Arc<StubExtractor>) -> Router {
        create_app(AppState {
            hub: Arc::new(HubSession::new(None, "http://127.0.0.1:1")),
            extractor,
        })
    }

    fn embed_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/embed")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn embed_calls_extractor_once() {
        let extractor = Arc::new(StubExtractor::default());
        let response = app(extractor.clone())
            .oneshot(embed_request(r#"{"post_id": "post-123"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: EmbeddingResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.post_id, "post-123");
        assert_eq!(body.status, "completed");
        assert_eq!(*extractor.calls.lock().await, vec!["post-123".to_string()]);
    }

    #[tokio::test]
    async fn extractor_failure_is_opaque() {
        let extractor = Arc::new(StubExtractor {
            fail_with: Some("psql: password authentication failed for user feed".to_string()),
            ..Default::default()
        });
        let response = app(extractor.clone())
            .oneshot(embed_request(r#"{"post_id": "post-9"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_string(response).await;
        assert!(!text.contains("password"));
        let body: ErrorBody = serde_json::from_str(&text).unwrap();
        assert_eq!(body.detail, EMBEDDING_FAILED);
        assert_eq!(extractor.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn hub_login_failure_is_opaque() {
        let extractor = Arc::new(StubExtractor::default());
        let state = AppState {
            hub: Arc::new(HubSession::new(
                Some(secrecy::SecretString::new("hf_token".to_string())),
                "http://127.0.0.1:1",
            )),
            extractor: extractor.clone(),
        };
        let response = create_app(state)
            .oneshot(embed_request(r#"{"post_id": "post-9"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.detail, EMBEDDING_FAILED);
        assert!(extractor.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn missing_post_id_is_rejected_before_extraction() {
        let extractor = Arc::new(StubExtractor::default());
        let response = app(extractor.clone())
            .oneshot(embed_request(r#"{"id": "post-1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(extractor.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn non_string_post_id_is_rejected() {
        let extractor = Arc::new(StubExtractor::default());
        let response = app(extractor.clone())
            .oneshot(embed_request(r#"{"post_id": 42}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(extractor.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn health_does_not_touch_extractor() {
        let extractor = Arc::new(StubExtractor::default());
        let response = app(extractor.clone())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
        assert!(extractor.calls.lock().await.is_empty());
    }
}
