//! HTTP gateway for Pixie.
//!
//! Two routes:
//! - `POST /sms` — the carrier webhook (form-encoded `From`, `Body`,
//!   `NumMedia`, `MediaUrl0`). Replies go out through the channel, the HTTP
//!   response body is always empty: 200 when the sender is allowed, 403
//!   when not.
//! - `GET /health` — JSON liveness report with the day's image count.
//!
//! Built on Axum.

pub mod wiring;

use axum::extract::DefaultBodyLimit;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use pixie_agent::{Bridge, HealthReport, InboundMessage, Outcome};

pub use wiring::{build_bridge, open_log, Delivery};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub bridge: Bridge,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/sms", post(sms_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(
    config: pixie_config::AppConfig,
    delivery: Delivery,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let bridge = build_bridge(&config, delivery).await?;
    let state = Arc::new(GatewayState { bridge });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

/// The subset of the carrier's webhook form that the bridge reads.
/// Other fields are ignored.
#[derive(Debug, Deserialize)]
struct SmsWebhook {
    #[serde(rename = "From")]
    from: String,

    #[serde(rename = "Body", default)]
    body: String,

    #[serde(rename = "NumMedia", default)]
    num_media: Option<String>,

    #[serde(rename = "MediaUrl0", default)]
    media_url0: Option<String>,
}

impl SmsWebhook {
    fn into_inbound(self) -> InboundMessage {
        let has_media = self
            .num_media
            .as_deref()
            .and_then(|n| n.trim().parse::<u32>().ok())
            .is_none_or(|n| n > 0);
        let media_url = self
            .media_url0
            .filter(|url| has_media && !url.trim().is_empty());

        InboundMessage {
            from: self.from,
            body: self.body,
            media_url,
        }
    }
}

async fn sms_handler(
    State(state): State<SharedState>,
    Form(payload): Form<SmsWebhook>,
) -> StatusCode {
    match state.bridge.handle(payload.into_inbound()).await {
        Outcome::Rejected => StatusCode::FORBIDDEN,
        _ => StatusCode::OK,
    }
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthReport> {
    Json(state.bridge.health().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use pixie_agent::{BridgeSettings, Persona};
    use pixie_channels::RecordingChannel;
    use pixie_core::conversation::ConversationLog;
    use pixie_core::error::ProviderError;
    use pixie_core::identity::{Directory, Participant, ParticipantRole};
    use pixie_core::provider::{CompletionRequest, CompletionResponse, Provider};
    use pixie_memory::InMemoryLog;
    use tower::ServiceExt;

    const AVA: &str = "+17035550001";

    struct EchoProvider;

    #[async_trait::async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(CompletionResponse {
                text: format!("You said: {last}"),
                model: "echo".into(),
                usage: None,
            })
        }
    }

    fn test_state() -> (SharedState, InMemoryLog, RecordingChannel) {
        let log = InMemoryLog::new();
        let channel = RecordingChannel::new();
        let bridge = Bridge::new(
            Persona::new("Tooth Fairy", "You are the Tooth Fairy."),
            Arc::new(Directory::new([Participant::new(
                "ava",
                AVA,
                ParticipantRole::Primary,
            )])),
            Arc::new(log.clone()),
            Arc::new(EchoProvider),
            Arc::new(channel.clone()),
            BridgeSettings::default(),
        );
        (Arc::new(GatewayState { bridge }), log, channel)
    }

    fn sms(form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/sms")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn allowed_sender_gets_reply() {
        let (state, log, channel) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(sms("From=%2B17035550001&Body=Hi+fairy&SmsSid=SM1&NumMedia=0"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert_eq!(channel.bodies(), vec!["You said: Hi fairy".to_string()]);
        assert_eq!(log.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_sender_is_forbidden() {
        let (state, log, channel) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(sms("From=%2B19995550000&Body=hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(channel.sent().is_empty());
        assert_eq!(log.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_body_is_empty_text() {
        let (state, log, _channel) = test_state();
        let app = build_router(state);

        let response = app.oneshot(sms("From=%2B17035550001")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(log.all().await.unwrap()[0].message, "");
    }

    #[tokio::test]
    async fn missing_from_is_unprocessable() {
        let (state, _log, _channel) = test_state();
        let app = build_router(state);

        let response = app.oneshot(sms("Body=hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn mms_media_url_is_logged() {
        let (state, log, _channel) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(sms(
                "From=%2B17035550001&Body=my+tooth&NumMedia=1&MediaUrl0=https%3A%2F%2Fmms.example%2F1.jpg",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            log.all().await.unwrap()[0].image_url.as_deref(),
            Some("https://mms.example/1.jpg")
        );
    }

    #[test]
    fn zero_media_ignores_stray_url() {
        let inbound = SmsWebhook {
            from: AVA.into(),
            body: "hi".into(),
            num_media: Some("0".into()),
            media_url0: Some("https://mms.example/1.jpg".into()),
        }
        .into_inbound();
        assert_eq!(inbound.media_url, None);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (state, _log, _channel) = test_state();
        let app = build_router(state);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["message"], "Tooth Fairy is flying! ✨");
        assert_eq!(json["images_today"], 0);
        assert_eq!(json["daily_limit"], 5);
        assert_eq!(json["allowed_users"], serde_json::json!(["ava"]));
    }
}
