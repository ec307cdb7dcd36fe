//! `POST /ask` and `POST /remember`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use gatekeeper_core::types::{IngestOutcome, IngestRequest, QueryRequest};
use gatekeeper_rag::KnowledgeBase;

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub success: bool,
}

pub fn router(kb: Arc<KnowledgeBase>) -> Router {
    Router::new().route("/ask", post(ask)).route("/remember", post(remember)).with_state(kb)
}

pub async fn serve(kb: Arc<KnowledgeBase>, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("App running on port {}", port);
    axum::serve(listener, router(kb)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

async fn ask(State(kb): State<Arc<KnowledgeBase>>, Json(request): Json<QueryRequest>) -> (StatusCode, Json<AskResponse>) {
    match kb.query(&request).await {
        Ok(result) => (StatusCode::OK, Json(AskResponse { answer: result.answer, success: true })),
        Err(e) => {
            tracing::error!(error = %e, "query failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(AskResponse { answer: e.to_string(), success: false }))
        }
    }
}

/// `text/plain` bodies are raw text; anything else must be a JSON
/// `{"type":"file","filePath":..}` or `{"type":"text","data":..}`.
async fn remember(
    State(kb): State<Arc<KnowledgeBase>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<IngestOutcome>) {
    let is_plain_text = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/plain"));
    let request = if is_plain_text {
        IngestRequest::text(body)
    } else {
        match serde_json::from_str::<IngestRequest>(&body) {
            Ok(request) => request,
            Err(e) => return (StatusCode::BAD_REQUEST, Json(IngestOutcome::failed(format!("Invalid ingest request: {}", e)))),
        }
    };
    let outcome = kb.ingest(&request).await;
    let status = if outcome.success { StatusCode::OK } else { StatusCode::UNPROCESSABLE_ENTITY };
    (status, Json(outcome))
}
