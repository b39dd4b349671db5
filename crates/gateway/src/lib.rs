//! HTTP API for LifeChat.
//!
//! Routes:
//! - `POST /lifeChat`: run a chat turn, persist what it produced
//! - `GET /getEvents`, `GET /getFeelings`: records in `[startTime, endTime)`
//! - `GET /getAdvice`, `GET /getMotivationalSpeech`: guidance for a period
//! - `POST /addEvent`, `POST /addFeeling`: manual entry
//! - `GET /health`
//!
//! Every failure is reported as `400 {"detail": "..."}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use lifechat_agent::{Advisor, ChatReply, Journal, Services, build_services, spawn_activity_log};
use lifechat_core::record::{Event, Feeling, parse_local_timestamp};

/// Shared application state for the gateway.
pub struct ApiState {
    pub journal: Arc<Journal>,
    pub advisor: Arc<Advisor>,
}

impl From<Services> for ApiState {
    fn from(services: Services) -> Self {
        Self {
            journal: services.journal,
            advisor: services.advisor,
        }
    }
}

pub type SharedState = Arc<ApiState>;

/// Build the Axum router with all routes.
pub fn build_router(state: SharedState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/lifeChat", post(life_chat_handler))
        .route("/getEvents", get(events_handler))
        .route("/getFeelings", get(feelings_handler))
        .route("/getAdvice", get(advice_handler))
        .route("/getMotivationalSpeech", get(motivation_handler))
        .route("/addEvent", post(add_event_handler))
        .route("/addFeeling", post(add_feeling_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    if allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(AllowOrigin::any());
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Start the HTTP server and run until Ctrl-C.
pub async fn start(config: lifechat_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let services = build_services(&config).await?;
    spawn_activity_log(&services.event_bus);
    let app = build_router(Arc::new(ApiState::from(services)), &config.gateway.allowed_origins);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

// --- Errors ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    let detail = err.to_string();
    warn!(detail = %detail, "Request failed");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { detail }))
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    chat: String,
}

async fn life_chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatReply> {
    let Json(request) = payload.map_err(bad_request)?;
    info!(chars = request.chat.len(), "Chat received");
    let reply = state.journal.log_chat(&request.chat).await.map_err(bad_request)?;
    Ok(Json(reply))
}

#[derive(Deserialize)]
struct RangeQuery {
    #[serde(rename = "startTime")]
    start_time: String,
    #[serde(rename = "endTime")]
    end_time: String,
}

impl RangeQuery {
    fn bounds(query: Result<Query<Self>, QueryRejection>) -> Result<(NaiveDateTime, NaiveDateTime), ApiError> {
        let Query(range) = query.map_err(bad_request)?;
        let start = parse_local_timestamp(&range.start_time).map_err(bad_request)?;
        let end = parse_local_timestamp(&range.end_time).map_err(bad_request)?;
        if end < start {
            return Err(bad_request("endTime must not be before startTime"));
        }
        Ok((start, end))
    }
}

async fn events_handler(
    State(state): State<SharedState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Vec<Event>> {
    let (start, end) = RangeQuery::bounds(query)?;
    let events = state.journal.events_between(start, end).await.map_err(bad_request)?;
    Ok(Json(events))
}

async fn feelings_handler(
    State(state): State<SharedState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Vec<Feeling>> {
    let (start, end) = RangeQuery::bounds(query)?;
    let feelings = state.journal.feelings_between(start, end).await.map_err(bad_request)?;
    Ok(Json(feelings))
}

async fn advice_handler(
    State(state): State<SharedState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<String> {
    let (start, end) = RangeQuery::bounds(query)?;
    let advice = state.advisor.advice(start, end).await.map_err(bad_request)?;
    Ok(Json(advice))
}

async fn motivation_handler(
    State(state): State<SharedState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<String> {
    let (start, end) = RangeQuery::bounds(query)?;
    let speech = state
        .advisor
        .motivational_speech(start, end)
        .await
        .map_err(bad_request)?;
    Ok(Json(speech))
}

async fn add_event_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Event>, JsonRejection>,
) -> ApiResult<Event> {
    let Json(event) = payload.map_err(bad_request)?;
    let event = state.journal.add_event(event).await.map_err(bad_request)?;
    Ok(Json(event))
}

#[derive(Deserialize)]
struct FeelingRequest {
    feelings: Vec<String>,
    score: i64,
}

async fn add_feeling_handler(
    State(state): State<SharedState>,
    payload: Result<Json<FeelingRequest>, JsonRejection>,
) -> ApiResult<Feeling> {
    let Json(request) = payload.map_err(bad_request)?;
    let feeling = state
        .journal
        .add_feeling(request.feelings, request.score)
        .await
        .map_err(bad_request)?;
    Ok(Json(feeling))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use lifechat_agent::TurnRunner;
    use lifechat_core::error::{ProviderError, ToolError};
    use lifechat_core::event::EventBus;
    use lifechat_core::message::{Message, MessageToolCall};
    use lifechat_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use lifechat_core::tool::ToolResult;
    use lifechat_providers::LlmGateway;
    use lifechat_store::InMemoryStore;
    use lifechat_tools::{CalendarBackend, ToolRegistry};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Replays scripted assistant messages in order.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Message>>,
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let message = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 500,
                    message: "script exhausted".into(),
                })?;
            Ok(ProviderResponse {
                message,
                usage: None,
                model: "scripted".into(),
            })
        }
    }

    struct OfflineCalendar;

    #[async_trait]
    impl CalendarBackend for OfflineCalendar {
        async fn execute(
            &self,
            _function: &str,
            _input: serde_json::Value,
            _account_id: &str,
        ) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::failed("calendar offline"))
        }
    }

    fn feeling_then_reply() -> Vec<Message> {
        let mut call = Message::assistant("");
        call.tool_calls.push(MessageToolCall {
            id: "call_1".into(),
            name: "feeling_extract".into(),
            arguments: r#"{"feelings":["relieved"],"score":7}"#.into(),
        });
        vec![call, Message::assistant("Glad the exam is over!")]
    }

    fn app(replies: Vec<Message>) -> Router {
        let provider = Arc::new(ScriptedProvider {
            replies: Mutex::new(replies.into()),
        });
        let gateway = Arc::new(LlmGateway::new(provider, "scripted"));
        let store = Arc::new(InMemoryStore::new());
        let bus = Arc::new(EventBus::default());
        let tools = Arc::new(ToolRegistry::with_calendar(Arc::new(OfflineCalendar), "primary"));
        let runner = TurnRunner::new(gateway.clone(), tools, bus.clone());

        let state = Arc::new(ApiState {
            journal: Arc::new(Journal::new(runner, store.clone(), bus)),
            advisor: Arc::new(Advisor::new(gateway, store)),
        });
        build_router(state, &["*".to_string()])
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    const WIDE_RANGE: &str = "startTime=2000-01-01T00:00:00&endTime=2100-01-01T00:00:00";

    #[tokio::test]
    async fn health_endpoint() {
        let response = app(vec![]).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn life_chat_returns_reply_and_records() {
        let response = app(feeling_then_reply())
            .oneshot(post_json("/lifeChat", serde_json::json!({"chat": "Exam done, so relieved"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["response"], "Glad the exam is over!");
        assert!(body["created_events"].as_array().unwrap().is_empty());
        assert_eq!(body["feeling"][0]["feelings"][0], "relieved");
        assert_eq!(body["feeling"][0]["score"], 7);
    }

    #[tokio::test]
    async fn life_chat_failures_are_400_with_detail() {
        let response = app(vec![])
            .oneshot(post_json("/lifeChat", serde_json::json!({"chat": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("empty"));

        let response = app(vec![])
            .oneshot(post_json("/lifeChat", serde_json::json!({"message": "wrong field"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn added_feeling_is_queryable() {
        let app = app(vec![]);
        let response = app
            .clone()
            .oneshot(post_json(
                "/addFeeling",
                serde_json::json!({"feelings": ["Calm"], "score": 6}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["feelings"][0], "calm");

        let response = app
            .oneshot(get(&format!("/getFeelings?{WIDE_RANGE}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected() {
        let response = app(vec![])
            .oneshot(post_json(
                "/addFeeling",
                serde_json::json!({"feelings": ["calm"], "score": 11}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["detail"].as_str().unwrap().contains("11"));
    }

    #[tokio::test]
    async fn added_event_is_queryable_by_start_time() {
        let app = app(vec![]);
        let response = app
            .clone()
            .oneshot(post_json(
                "/addEvent",
                serde_json::json!({
                    "date": "2025-06-15",
                    "startTime": "2025-06-15T08:00:00",
                    "endTime": "2025-06-15T09:00:00",
                    "description": "Morning run",
                    "tags": ["health"],
                    "name": "Run"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let inside = app
            .clone()
            .oneshot(get("/getEvents?startTime=2025-06-15T00:00:00&endTime=2025-06-16T00:00:00"))
            .await
            .unwrap();
        assert_eq!(json_body(inside).await.as_array().unwrap().len(), 1);

        // Half-open: an event starting exactly at endTime is excluded
        let boundary = app
            .oneshot(get("/getEvents?startTime=2025-06-14T00:00:00&endTime=2025-06-15T08:00:00"))
            .await
            .unwrap();
        assert!(json_body(boundary).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn inverted_event_is_rejected() {
        let response = app(vec![])
            .oneshot(post_json(
                "/addEvent",
                serde_json::json!({
                    "startTime": "2025-06-15T10:00:00",
                    "endTime": "2025-06-15T09:00:00",
                    "description": "Time travel",
                    "tags": []
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_range_is_400() {
        let response = app(vec![])
            .oneshot(get("/getEvents?startTime=yesterday&endTime=2025-06-16T00:00:00"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(vec![])
            .oneshot(get("/getMotivationalSpeech?startTime=2025-06-15T00:00:00"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn advice_for_empty_period() {
        let response = app(vec![])
            .oneshot(get(&format!("/getAdvice?{WIDE_RANGE}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!(lifechat_agent::EMPTY_PERIOD_MESSAGE)
        );
    }
}
