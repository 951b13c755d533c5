//! HTTP surface over the pipeline orchestrator.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use truthguard_core::{Scope, VerifiedRecord};
use truthguard_runtime::{PipelineOrchestrator, PipelineStats, CHAT_FALLBACK_REPLY};

use crate::error::ApiError;

type AppState = Arc<PipelineOrchestrator>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub reply: String,
}

/// Build the router with CORS open to any origin.
pub fn router(orchestrator: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/verify-news", get(verify_news))
        .route("/api/global-news", get(global_news))
        .route("/api/chat-agent", post(chat_agent))
        .route("/api/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(orchestrator)
}

async fn health() -> &'static str {
    "OK"
}

async fn verify_news(State(orchestrator): State<AppState>) -> Result<Json<Vec<VerifiedRecord>>, ApiError> {
    Ok(Json(orchestrator.run(Scope::Local).await?))
}

async fn global_news(State(orchestrator): State<AppState>) -> Result<Json<Vec<VerifiedRecord>>, ApiError> {
    Ok(Json(orchestrator.run(Scope::Global).await?))
}

/// Chat never fails: an unusable body gets the same reply as a failed model call.
async fn chat_agent(
    State(orchestrator): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let message = match &payload {
        Ok(Json(request)) => request.message.trim(),
        Err(e) => {
            tracing::warn!(reason = %e.body_text(), "Unreadable chat request");
            ""
        }
    };

    let reply = if message.is_empty() {
        CHAT_FALLBACK_REPLY.to_string()
    } else {
        orchestrator.chat(message).await
    };

    Json(ChatResponse { reply })
}

async fn stats(State(orchestrator): State<AppState>) -> Json<PipelineStats> {
    Json(orchestrator.stats().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;
    use truthguard_core::{Claim, Evidence};
    use truthguard_runtime::providers::{
        ChatMessage, CompletionConfig, CompletionResponse, TokenUsage,
    };
    use truthguard_runtime::sources::{FeedItem, FeedTarget, SourceError};
    use truthguard_runtime::{
        EvidenceRetriever, FeedFetcher, InsertOutcome, LlmProvider, ProviderError, RecordStore,
        RuntimeConfig, SqliteRecordStore, StoreError,
    };

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            let is_chat = messages[0].content.contains("TruthGuard Nepal");
            let content = if is_chat {
                r#"{"explanation":"Check trusted outlets first."}"#
            } else {
                r#"{"verdict":"Fake","truthScore":10,"propagandaScore":80,"category":"Politics","explanation":"Fabricated."}"#
            };
            Ok(CompletionResponse {
                content: content.to_string(),
                usage: TokenUsage::default(),
                model: config.model.clone(),
                finish_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct NoEvidence;

    #[async_trait]
    impl EvidenceRetriever for NoEvidence {
        async fn retrieve(&self, _title: &str, _scope: Scope) -> Evidence {
            Evidence::NoMatch
        }
    }

    struct OneItemFeed;

    #[async_trait]
    impl FeedFetcher for OneItemFeed {
        async fn fetch(&self, target: &FeedTarget) -> Result<Vec<FeedItem>, SourceError> {
            Ok(vec![FeedItem::new(
                format!("Headline pulled from {}", target.label()),
                "https://reddit.test/1",
            )])
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn count(&self, _scope: Scope) -> Result<u64, StoreError> {
            Err(StoreError::Corrupt("disk gone".to_string()))
        }

        async fn recent(&self, _scope: Scope, _limit: u32) -> Result<Vec<VerifiedRecord>, StoreError> {
            Err(StoreError::Corrupt("disk gone".to_string()))
        }

        async fn filter_new(&self, _claims: Vec<Claim>) -> Result<Vec<Claim>, StoreError> {
            Err(StoreError::Corrupt("disk gone".to_string()))
        }

        async fn insert(&self, _record: &VerifiedRecord) -> Result<InsertOutcome, StoreError> {
            Err(StoreError::Corrupt("disk gone".to_string()))
        }
    }

    fn config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.pipeline.batch_pause = Duration::ZERO;
        config.pipeline.cache_ttl = Duration::ZERO;
        config
    }

    fn app_with_store(store: Arc<dyn RecordStore>) -> Router {
        let orchestrator = PipelineOrchestrator::builder(config())
            .provider(Arc::new(EchoProvider))
            .retriever(Arc::new(NoEvidence))
            .fetcher(Arc::new(OneItemFeed))
            .store(store)
            .build()
            .unwrap();
        router(Arc::new(orchestrator))
    }

    async fn app() -> Router {
        let store = SqliteRecordStore::connect("sqlite::memory:").await.unwrap();
        app_with_store(Arc::new(store))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat-agent")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_verify_news_returns_local_records() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/api/verify-news").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["verdict"], "Fake");
        assert_eq!(records[0]["scope"], "local");
        assert_eq!(records[0]["title"], "Headline pulled from r/newsnepal289");
        assert_eq!(records[0]["evidence"], "no-match");
    }

    #[tokio::test]
    async fn test_global_news_uses_global_targets() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/api/global-news").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body[0]["scope"], "global");
        assert_eq!(body[0]["sourceLabel"], "r/worldnews");
    }

    #[tokio::test]
    async fn test_store_failure_is_500_with_empty_list() {
        let response = app_with_store(Arc::new(BrokenStore))
            .oneshot(Request::builder().uri("/api/verify-news").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_chat_agent_replies() {
        let response = app()
            .await
            .oneshot(chat_request(r#"{"message":"Is the fuel price rumour true?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "reply": "Check trusted outlets first." })
        );
    }

    #[tokio::test]
    async fn test_malformed_chat_body_gets_fallback_reply() {
        let response = app().await.oneshot(chat_request("not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "reply": "System busy." }));
    }

    #[tokio::test]
    async fn test_blank_chat_message_gets_fallback_reply() {
        let response = app()
            .await
            .oneshot(chat_request(r#"{"message":"   "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "reply": CHAT_FALLBACK_REPLY })
        );
    }

    #[tokio::test]
    async fn test_stats_reports_cycles() {
        let app = app().await;
        app.clone()
            .oneshot(Request::builder().uri("/api/verify-news").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let response = app
            .oneshot(Request::builder().uri("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["provider"], "echo");
        assert_eq!(body["providerReady"], true);
        assert_eq!(body["usage"]["llmCalls"], 1);
        assert_eq!(body["recentCycles"][0]["persisted"], 1);
    }
}
