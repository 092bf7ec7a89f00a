//! HTTP gateway for CampusDesk.
//!
//! Serves the chat page, one JSON endpoint per conversational turn, and
//! a health check. Conversants are told apart by a session cookie; their
//! dialog state stays on the server in a [`SessionStore`].
//!
//! Built on Axum.

pub mod frontend;
pub mod sessions;

pub use sessions::{SessionSlot, SessionStore};

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{Html, Json},
    routing::{get, post},
};
use campusdesk_config::AppConfig;
use campusdesk_core::catalog::IntentCatalog;
use campusdesk_core::session::SessionId;
use campusdesk_dialog::DialogMachine;
use campusdesk_security::{AuditLogger, WerkzeugVerifier};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Request bodies larger than this are refused with 413.
pub const BODY_LIMIT: usize = 64 * 1024;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state for the gateway.
pub struct GatewayState {
    pub machine: Arc<DialogMachine>,
    pub sessions: Arc<SessionStore>,
    pub cookie_name: String,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Assemble the dialog machine and its collaborators from configuration.
///
/// Used by the gateway and by the terminal chat, so both run the same
/// catalog, classifier and record store.
pub async fn build_machine(config: &AppConfig) -> campusdesk_core::Result<DialogMachine> {
    let catalog = Arc::new(IntentCatalog::load(Path::new(&config.intents_path))?);
    let classifier = campusdesk_classifier::build_from_config(config, &catalog)?;
    let records = campusdesk_records::build_from_config(config).await?;

    info!(
        intents = catalog.len(),
        classifier = classifier.name(),
        records = records.name(),
        threshold = config.dialog.confidence_threshold,
        "Dialog machine assembled"
    );

    Ok(
        DialogMachine::new(classifier, catalog, records, Arc::new(WerkzeugVerifier::new()))
            .configure(&config.dialog)
            .with_audit(Arc::new(AuditLogger::tracing())),
    )
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let machine = Arc::new(build_machine(&config).await?);
    let sessions = Arc::new(SessionStore::from_config(&config.gateway));
    let _sweeper = sessions.spawn_sweeper(SWEEP_INTERVAL);

    let state = Arc::new(GatewayState {
        machine,
        sessions,
        cookie_name: config.gateway.cookie_name.clone(),
    });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Cookies ---

/// The session id carried in the request's cookie, if well-formed.
fn session_from_cookie(headers: &HeaderMap, name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| SessionId(id.to_string()))
}

fn set_cookie(name: &str, id: &SessionId) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&format!("{name}={id}; Path=/; HttpOnly; SameSite=Lax")) {
        Ok(value) => {
            headers.insert(header::SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "Session cookie name is not a valid header value"),
    }
    headers
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

/// Serve the chat page. Loading the page starts a new conversation.
async fn index_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> (HeaderMap, Html<&'static str>) {
    if let Some(previous) = session_from_cookie(&headers, &state.cookie_name) {
        state.sessions.remove(&previous).await;
    }

    let id = SessionId::new();
    state.sessions.reset(&id).await;
    debug!(session = %id, "Session started");

    (set_cookie(&state.cookie_name, &id), frontend::index_page())
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> (HeaderMap, Json<ChatResponse>) {
    // Only ids this server issued and still holds are honoured.
    let known = match session_from_cookie(&headers, &state.cookie_name) {
        Some(id) => state.sessions.existing(&id).await.map(|slot| (id, slot)),
        None => None,
    };
    let (id, slot, fresh) = match known {
        Some((id, slot)) => (id, slot, false),
        None => {
            let id = SessionId::new();
            let slot = state.sessions.slot(&id).await;
            (id, slot, true)
        }
    };
    let message = payload.message.unwrap_or_default();

    let mut session = slot.lock().await;
    let turn = state.machine.respond(session.clone(), &message).await;
    *session = turn.session;
    drop(session);

    debug!(session = %id, outcome = ?turn.outcome, "Turn complete");

    let headers = if fresh {
        set_cookie(&state.cookie_name, &id)
    } else {
        HeaderMap::new()
    };
    (headers, Json(ChatResponse { reply: turn.reply }))
}
