//! Axum-based HTTP gateway for the four boundary operations.
//!
//! Every handler is a stateless composition of the auth and ledger
//! components; no mutable state lives in the process beyond the immutable
//! whitelist. Failures map onto a fixed taxonomy: 400 malformed request,
//! 401 missing/invalid/expired token, 403 forbidden, 405 wrong method
//! (axum's method routing), 500 misconfiguration or store I/O. Every
//! failure body is `{"error": "..."}` with no internal detail.

use crate::auth::{
    constant_time_eq, AuthError, CredentialError, CredentialStore, SessionAuthority, Whitelist,
};
use crate::config::Config;
use crate::ledger::{Entry, EntryLedger};
use crate::store::{self, BlobStore};
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB) — entry payloads are tiny.
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout — all work is a couple of key-value round trips.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub whitelist: Arc<Whitelist>,
    pub credentials: Arc<CredentialStore>,
    pub sessions: Arc<SessionAuthority>,
    pub ledger: Arc<EntryLedger>,
    /// SHA-256 hash of the admin secret (hex-encoded), never plaintext.
    /// `None` means admin initialization is not configured.
    pub admin_secret_hash: Option<Arc<str>>,
    pub store_name: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn BlobStore>,
        whitelist: Whitelist,
        admin_secret: Option<&str>,
        session_ttl_hours: i64,
        retention_days: i64,
    ) -> Self {
        let store_name = store.name().to_owned();
        Self {
            whitelist: Arc::new(whitelist),
            credentials: Arc::new(CredentialStore::new(store.clone())),
            sessions: Arc::new(SessionAuthority::new(store.clone(), session_ttl_hours)),
            ledger: Arc::new(EntryLedger::new(store, retention_days)),
            admin_secret_hash: admin_secret
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Arc::<str>::from(hash_secret(s))),
            store_name,
        }
    }
}

/// Build the route table. Wrong methods on these paths get 405 from axum.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/admin_init_player", post(handle_admin_init_player))
        .route("/api/login", post(handle_login))
        .route("/api/get_player", get(handle_get_player))
        .route("/api/save_entry", post(handle_save_entry))
        .with_state(state)
}

/// Run the HTTP gateway until the process is stopped.
pub async fn run(config: &Config) -> Result<()> {
    let whitelist = Whitelist::load(&config.auth.whitelist_path)?;
    if whitelist.is_empty() {
        tracing::warn!(
            "Whitelist at {} is empty — nobody can log in",
            config.auth.whitelist_path.display()
        );
    }

    let store: Arc<dyn BlobStore> = Arc::from(store::create_store(&config.store)?);
    let admin_secret = config.admin_secret();
    if admin_secret.is_none() {
        tracing::warn!("No admin secret configured — admin_init_player will answer 500");
    }

    let state = AppState::new(
        store,
        whitelist,
        admin_secret.as_deref(),
        config.auth.session_ttl_hours,
        config.ledger.retention_days,
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-admin-secret"),
        ])
        .max_age(Duration::from_secs(3600));

    let app = router(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ));

    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let display_addr = listener.local_addr()?;

    println!("🎯 aimtrack gateway listening on http://{display_addr}");
    println!("  POST /api/admin_init_player — initialize a player (X-Admin-Secret header)");
    println!("  POST /api/login             — {{pseudo, password}} → bearer token");
    println!("  GET  /api/get_player        — fetch the training ledger");
    println!("  POST /api/save_entry        — upsert today's entry");
    println!("  GET  /health                — health check");
    println!("  Press Ctrl+C to stop.\n");

    axum::serve(listener, app).await?;
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// Concrete return type for all handlers.
type ApiResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, message: &str) -> ApiResponse {
    (status, Json(serde_json::json!({ "error": message })))
}

fn hash_secret(value: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Extract the bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer token to a pseudo, or produce the 401/500 response.
async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<String, ApiResponse> {
    let result = match extract_bearer_token(headers) {
        Some(token) => state.sessions.validate(token).await,
        None => Err(AuthError::MissingToken),
    };
    result.map_err(|e| match e {
        AuthError::Store(err) => {
            tracing::error!("Session lookup failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
        other => error_response(StatusCode::UNAUTHORIZED, &other.to_string()),
    })
}

/// GET /health — always public.
async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "store": state.store_name,
        "players": state.whitelist.len(),
    }))
}

/// Request body for admin initialization and login.
#[derive(Debug, Deserialize)]
struct CredentialsBody {
    pseudo: String,
    password: String,
}

/// POST /api/admin_init_player — create or reset a player's credential.
///
/// Requires the shared admin secret in `X-Admin-Secret`. Re-initialization
/// is the supported reset path, not an error.
async fn handle_admin_init_player(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CredentialsBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let secret_hash = match state.admin_secret_hash.as_ref() {
        Some(h) => h,
        None => {
            tracing::error!("admin_init_player called but no admin secret is configured");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Admin secret not configured",
            );
        }
    };

    let supplied = headers
        .get("X-Admin-Secret")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(hash_secret);
    match supplied {
        Some(hash) if constant_time_eq(hash.as_bytes(), secret_hash.as_bytes()) => {}
        _ => {
            tracing::warn!("admin_init_player rejected — bad or missing X-Admin-Secret");
            return error_response(StatusCode::FORBIDDEN, "Forbidden");
        }
    }

    let body = match body {
        Ok(Json(b)) => b,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON"),
    };
    let pseudo = body.pseudo.trim();
    let password = body.password.trim();

    if pseudo.len() < crate::auth::credentials::MIN_PSEUDO_LEN
        || password.len() < crate::auth::credentials::MIN_PASSWORD_LEN
    {
        return error_response(
            StatusCode::BAD_REQUEST,
            "pseudo >=2 and password >=6 required",
        );
    }

    if !state.whitelist.is_allowed(pseudo) {
        return error_response(StatusCode::FORBIDDEN, "Pseudo not whitelisted");
    }

    match state.credentials.initialize(pseudo, password).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "ok": true }))),
        Err(CredentialError::InvalidInput) => error_response(
            StatusCode::BAD_REQUEST,
            "pseudo >=2 and password >=6 required",
        ),
        Err(e) => {
            tracing::error!("Credential initialization failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// POST /api/login — verify a credential and issue a bearer token.
async fn handle_login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON"),
    };
    let pseudo = body.pseudo.trim();
    let password = body.password.trim();

    if pseudo.len() < crate::auth::credentials::MIN_PSEUDO_LEN
        || password.len() < crate::auth::credentials::MIN_PASSWORD_LEN
    {
        return error_response(
            StatusCode::BAD_REQUEST,
            "pseudo >=2 and password >=6 required",
        );
    }

    if !state.whitelist.is_allowed(pseudo) {
        tracing::warn!(pseudo, "Login rejected — not whitelisted");
        return error_response(StatusCode::FORBIDDEN, "Pseudo not whitelisted");
    }

    match state.credentials.verify(pseudo, password).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(pseudo, "Login rejected — bad password");
            return error_response(StatusCode::FORBIDDEN, "Invalid credentials");
        }
        Err(CredentialError::NotInitialized) => {
            return error_response(
                StatusCode::FORBIDDEN,
                "Password not initialized for this pseudo. Use admin_init_player first.",
            );
        }
        Err(e) => {
            tracing::error!("Credential verification failed: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error");
        }
    }

    match state.sessions.issue(pseudo).await {
        Ok(session) => {
            tracing::info!(pseudo, "Login succeeded");
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "ok": true,
                    "token": session.token,
                    "pseudo": session.pseudo,
                    "expires_at": session.expires_at,
                })),
            )
        }
        Err(e) => {
            tracing::error!("Session issuance failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// GET /api/get_player — return the caller's ledger (empty default included).
async fn handle_get_player(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let pseudo = match require_session(&state, &headers).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match state.ledger.get(&pseudo).await {
        Ok(ledger) => match serde_json::to_value(&ledger) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(e) => {
                tracing::error!("Ledger serialization failed: {e}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        },
        Err(e) => {
            tracing::error!("Ledger fetch failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// Request body for saving a day's entry.
#[derive(Debug, Deserialize)]
struct SaveEntryBody {
    entry: Entry,
}

/// POST /api/save_entry — upsert the entry for its date.
async fn handle_save_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SaveEntryBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let pseudo = match require_session(&state, &headers).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let body = match body {
        Ok(Json(b)) => b,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid or missing entry"),
    };

    match state.ledger.upsert(&pseudo, body.entry).await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "ok": true }))),
        Err(e) => {
            tracing::error!("Ledger upsert failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}
