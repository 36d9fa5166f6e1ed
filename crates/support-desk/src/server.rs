//! HTTP server start-up and routing.

use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::Config,
    shared_state::AppState,
    ticket_db::TicketDatabase,
};

/// Open storage, build the clients and serve until the listener fails.
pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    crate::telemetry::init_tracing();
    crate::metrics::init_metrics();
    cfg.print_config();

    let database = match TicketDatabase::new(&cfg.database_path) {
        Ok(db) => {
            info!("Ticket database initialized at: {}", cfg.database_path.display());
            Arc::new(db)
        }
        Err(e) => {
            warn!("Failed to initialize ticket database: {}. Falling back to in-memory.", e);
            Arc::new(TicketDatabase::new_in_memory()?)
        }
    };

    let addr = cfg.api_addr()?;
    let state = AppState::from_config(cfg, database)?;

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = build_router(state);

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(state: AppState) -> axum::Router {
    use axum::{
        Router,
        routing::{get, post},
    };
    use tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
        timeout::TimeoutLayer,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let request_timeout = state.config.request_timeout();

    Router::new()
        .route("/greeting", get(crate::api::greeting_api::greeting))
        .route("/chat", post(crate::api::chat_api::chat))
        .route(
            "/tickets",
            post(crate::api::ticket_api::create_ticket).get(crate::api::ticket_api::list_tickets),
        )
        .route(
            "/tickets/",
            post(crate::api::ticket_api::create_ticket).get(crate::api::ticket_api::list_tickets),
        )
        .route("/tickets/:id", get(crate::api::ticket_api::get_ticket))
        .route("/healthz", get(healthz))
        .route("/metrics", get(crate::metrics::get_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

async fn healthz(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> (axum::http::StatusCode, &'static str) {
    match state.database.ping() {
        Ok(()) => (axum::http::StatusCode::OK, "OK"),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (axum::http::StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::chat_api::MODEL_NOT_CONFIGURED;
    use crate::api::DEFAULT_GREETING;
    use crate::config::test_config;
    use crate::llm::Agents;
    use crate::support::ESCALATION_ACK;
    use crate::test_support::{RecordingSearch, ScriptedModel};
    use crate::ticket_db::Ticket;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Harness {
        router: axum::Router,
        database: Arc<TicketDatabase>,
        search: Arc<RecordingSearch>,
    }

    fn harness(model: Option<Arc<ScriptedModel>>) -> Harness {
        let database = Arc::new(TicketDatabase::new_in_memory().unwrap());
        let search = Arc::new(RecordingSearch::new("Returns are accepted within 30 days."));
        let agents = model.map(|m| Arc::new(Agents::new(m)));
        let state = AppState::new(Arc::new(test_config()), database.clone(), agents, search.clone());
        Harness { router: build_router(state), database, search }
    }

    async fn send(router: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn greeting_falls_back_without_model() {
        let h = harness(None);
        let (status, body) = send(&h.router, "GET", "/greeting", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["greeting"], DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn greeting_uses_model_reply() {
        let h = harness(Some(Arc::new(ScriptedModel::replies(&["Hi there, what can I do for you?"]))));
        let (_, body) = send(&h.router, "GET", "/greeting", None).await;

        assert_eq!(body["greeting"], "Hi there, what can I do for you?");
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_any_model_call() {
        let model = Arc::new(ScriptedModel::replies(&["FRUSTRATED"]));
        let h = harness(Some(model.clone()));

        let (status, body) = send(&h.router, "POST", "/chat", Some(json!({ "question": "   " }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Question is required.");
        assert_eq!(model.call_count(), 0);
        assert_eq!(h.database.tickets.count_tickets().unwrap(), 0);
    }

    #[tokio::test]
    async fn chat_without_model_is_not_configured() {
        let h = harness(None);
        let (status, body) = send(&h.router, "POST", "/chat", Some(json!({ "question": "hi" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], MODEL_NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn frustrated_chat_files_a_ticket_with_history_as_sent() {
        let h = harness(Some(Arc::new(ScriptedModel::replies(&["FRUSTRATED", "User cannot get a refund."]))));
        let history = json!([
            { "user": "AI", "message": "Hello! How can I help you today?" },
            { "user": "You", "message": "I want a refund", "id": 3 }
        ]);

        let (status, body) = send(
            &h.router,
            "POST",
            "/chat",
            Some(json!({ "question": "That answer was wrong!", "chat_history": history.clone() })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], ESCALATION_ACK);

        let (_, tickets) = send(&h.router, "GET", "/tickets/", None).await;
        let tickets: Vec<Ticket> = serde_json::from_value(tickets).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].title, "I want a refund");
        assert_eq!(serde_json::to_value(&tickets[0].conversation_history).unwrap(), history);
    }

    #[tokio::test]
    async fn question_chat_searches_and_answers() {
        let h = harness(Some(Arc::new(ScriptedModel::replies(&[
            "QUESTION",
            "Action: search(return policy)",
            "Action: finish(You can return items within 30 days.)",
        ]))));

        let (_, body) = send(&h.router, "POST", "/chat", Some(json!({ "question": "Can I return this?" }))).await;

        assert!(body["response"].as_str().unwrap().contains("within 30 days"));
        assert_eq!(h.search.queries(), vec![("return policy".to_string(), 3)]);
        assert_eq!(h.database.tickets.count_tickets().unwrap(), 0);
    }

    #[tokio::test]
    async fn ticket_crud_over_http() {
        let h = harness(None);

        let (status, created) = send(
            &h.router,
            "POST",
            "/tickets/",
            Some(json!({
                "title": "Broken zipper",
                "conversation_history": [{ "role": "user", "content": "My zipper broke" }],
                "user_contact": "sam@example.com"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_i64().unwrap();

        let (status, fetched) = send(&h.router, "GET", &format!("/tickets/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Broken zipper");
        assert_eq!(fetched["summary"], Value::Null);

        let (status, body) = send(&h.router, "GET", "/tickets/9999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Ticket not found");
    }

    #[tokio::test]
    async fn empty_title_is_unprocessable() {
        let h = harness(None);
        let (status, _) = send(
            &h.router,
            "POST",
            "/tickets",
            Some(json!({ "title": "", "conversation_history": [] })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(h.database.tickets.count_tickets().unwrap(), 0);
    }

    #[tokio::test]
    async fn listing_honours_skip_and_limit() {
        let h = harness(None);
        for i in 0..4 {
            let body = json!({ "title": format!("t{}", i), "conversation_history": [] });
            send(&h.router, "POST", "/tickets/", Some(body)).await;
        }

        let (_, page) = send(&h.router, "GET", "/tickets/?skip=1&limit=2", None).await;
        let titles: Vec<&str> = page.as_array().unwrap().iter().map(|t| t["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let h = harness(None);
        let response = h
            .router
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
