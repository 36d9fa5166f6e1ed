use prometheus::{Encoder, TextEncoder, Registry, IntCounterVec, Histogram, HistogramOpts};
use lazy_static::lazy_static;
use std::sync::OnceLock;
use axum::response::IntoResponse;
use axum::http::StatusCode;
use tracing::error;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}

static REQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static INTENT_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static TICKET_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static RETRIEVAL_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static REACT_ROUNDS: OnceLock<Histogram> = OnceLock::new();

/// Register all collectors. Safe to call more than once; recording before this is a no-op.
pub fn init_metrics() {
    let req_counter = REQ_COUNTER.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("requests_total", "Total requests per route"),
            &["route", "status"]
        ).unwrap()
    });

    let intent_counter = INTENT_COUNTER.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("intent_total", "Classified chat messages per intent"),
            &["intent"]
        ).unwrap()
    });

    let ticket_counter = TICKET_COUNTER.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("tickets_created_total", "Tickets created, by escalation or direct API call"),
            &["source"]
        ).unwrap()
    });

    let retrieval_counter = RETRIEVAL_COUNTER.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("retrieval_total", "Knowledge searches per outcome"),
            &["outcome"]
        ).unwrap()
    });

    let react_rounds = REACT_ROUNDS.get_or_init(|| {
        Histogram::with_opts(
            HistogramOpts::new("react_rounds", "Model calls per ReAct loop")
                .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        ).unwrap()
    });

    REGISTRY.register(Box::new(req_counter.clone())).ok();
    REGISTRY.register(Box::new(intent_counter.clone())).ok();
    REGISTRY.register(Box::new(ticket_counter.clone())).ok();
    REGISTRY.register(Box::new(retrieval_counter.clone())).ok();
    REGISTRY.register(Box::new(react_rounds.clone())).ok();
}

pub fn inc_request(route: &str, status: &str) {
    if let Some(counter) = REQ_COUNTER.get() {
        counter.with_label_values(&[route, status]).inc();
    }
}

pub fn inc_intent(intent: &str) {
    if let Some(counter) = INTENT_COUNTER.get() {
        counter.with_label_values(&[intent]).inc();
    }
}

pub fn inc_ticket(source: &str) {
    if let Some(counter) = TICKET_COUNTER.get() {
        counter.with_label_values(&[source]).inc();
    }
}

pub fn inc_retrieval(outcome: &str) {
    if let Some(counter) = RETRIEVAL_COUNTER.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn observe_react_rounds(rounds: usize) {
    if let Some(histogram) = REACT_ROUNDS.get() {
        histogram.observe(rounds as f64);
    }
}

pub async fn get_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            b"failed to encode metrics".to_vec(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
}
