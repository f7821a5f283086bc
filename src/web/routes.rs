//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Task page
        .route("/", get(handlers::index))
        // Bot Framework endpoint
        .route("/api/messages", post(handlers::messages))
        // API routes
        .route("/api/rag", post(handlers::rag))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Add state
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::metrics::Metrics;
    use crate::test_support::{orchestrator, FakeCompleter, RecordingTransport};
    use crate::web::handlers::RagResponse;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(completer: FakeCompleter, transport: Arc<RecordingTransport>) -> Router {
        let state = AppState::from_parts(
            Settings::default(),
            orchestrator(completer),
            transport,
            Arc::new(Metrics::new()),
        )
        .unwrap();
        create_router(state)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_rag_endpoint() {
        let app = app(FakeCompleter::echo(), Arc::new(RecordingTransport::default()));

        let response = app
            .oneshot(post_json(
                "/api/rag",
                serde_json::json!({
                    "query": "What's the weather like today?",
                    "llamacloudData": {"temperature": 25, "condition": "sunny"}
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: RagResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.response, "answer to: What's the weather like today?");
    }

    #[tokio::test]
    async fn test_rag_endpoint_apology_on_failure() {
        let app = app(FakeCompleter::failing(), Arc::new(RecordingTransport::default()));

        let response = app
            .oneshot(post_json("/api/rag", serde_json::json!({"query": "hi"})))
            .await
            .unwrap();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: RagResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.response, crate::APOLOGY_MESSAGE);
    }

    #[tokio::test]
    async fn test_rag_endpoint_rejects_empty_query() {
        let app = app(FakeCompleter::echo(), Arc::new(RecordingTransport::default()));

        let response = app
            .oneshot(post_json("/api/rag", serde_json::json!({"query": "  "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_messages_endpoint_replies_in_background() {
        let transport = Arc::new(RecordingTransport::default());
        let app = app(FakeCompleter::echo(), transport.clone());

        let response = app
            .oneshot(post_json(
                "/api/messages",
                serde_json::json!({
                    "type": "message",
                    "id": "act-1",
                    "serviceUrl": "https://smba.example.net",
                    "conversation": {"id": "conv-1"},
                    "text": "refund policy"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        for _ in 0..100 {
            if !transport.texts().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(transport.texts(), vec!["answer to: refund policy".to_string()]);
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let app = app(FakeCompleter::echo(), Arc::new(RecordingTransport::default()));

        let health = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let index = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(index.status(), StatusCode::OK);
        let body = to_bytes(index.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("RAG-Relay"));
    }
}
