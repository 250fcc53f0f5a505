//! In-memory stand-in for the Open WebUI REST API, used by integration tests.
//!
//! Configuration via environment variables:
//!     MOCK_HTTP_ADDR    – listen address   (default: 127.0.0.1:9300)
//!     MOCK_REQUIRE_AUTH – when truthy, require `Authorization: Bearer`
//!     MOCK_API_KEY      – accepted bearer token (default: mock-key)

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Stores {
    chats: HashMap<String, Value>,
    models: HashMap<String, Value>,
    prompts: HashMap<String, Value>,
    knowledge: HashMap<String, Value>,
    users: HashMap<String, Value>,
}

#[derive(Clone)]
struct AppState {
    stores: Arc<Mutex<Stores>>,
    auth_token: Option<String>,
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn seeded() -> Stores {
    let mut stores = Stores::default();
    stores.models.insert(
        "llama3:8b".into(),
        json!({"id": "llama3:8b", "name": "Llama 3 8B", "active": true}),
    );
    stores.models.insert(
        "qwen2:7b".into(),
        json!({"id": "qwen2:7b", "name": "Qwen 2 7B", "active": false}),
    );
    stores.users.insert(
        "u-admin".into(),
        json!({"id": "u-admin", "name": "Admin", "email": "admin@example.com", "role": "admin"}),
    );
    stores
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": format!("{what} not found")}))).into_response()
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(token) = &state.auth_token {
        let authorized = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.strip_prefix("Bearer ").map(str::trim) == Some(token.as_str()))
            .unwrap_or(false);
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "not authenticated"})),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn health() -> &'static str {
    "ok"
}

// --- chats -----------------------------------------------------------------

fn chat_summary(chat: &Value) -> Value {
    json!({
        "id": chat["id"],
        "title": chat["title"],
        "created_at": chat["created_at"],
        "updated_at": chat["updated_at"],
    })
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default)]
    #[allow(dead_code)]
    page: Option<i64>,
}

async fn chats_list(State(state): State<AppState>, Query(_page): Query<PageQuery>) -> Json<Value> {
    let stores = state.stores.lock();
    let mut chats: Vec<Value> = stores.chats.values().map(chat_summary).collect();
    chats.sort_by_key(|c| c["id"].as_str().map(str::to_string));
    Json(Value::Array(chats))
}

#[derive(Deserialize)]
struct SearchQuery {
    text: String,
    #[serde(default)]
    #[allow(dead_code)]
    page: Option<i64>,
}

async fn chats_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Value> {
    let stores = state.stores.lock();
    let matches: Vec<Value> = stores
        .chats
        .values()
        .filter(|chat| {
            chat["title"]
                .as_str()
                .map(|title| title.contains(&query.text))
                .unwrap_or(false)
        })
        .map(chat_summary)
        .collect();
    Json(Value::Array(matches))
}

async fn chats_create(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_secs();
    let chat = json!({
        "id": id,
        "title": body.get("title").cloned().unwrap_or(json!("")),
        "tags": body.get("tags").cloned().unwrap_or(json!([])),
        "archived": body.get("archived").cloned().unwrap_or(json!(false)),
        "created_at": now,
        "updated_at": now,
    });
    state.stores.lock().chats.insert(id, chat.clone());
    Json(chat)
}

async fn chats_get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.stores.lock().chats.get(&id) {
        Some(chat) => Json(chat.clone()).into_response(),
        None => not_found("chat"),
    }
}

async fn chats_delete(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.stores.lock().chats.remove(&id) {
        Some(_) => Json(json!(true)).into_response(),
        None => not_found("chat"),
    }
}

// --- models ----------------------------------------------------------------

async fn models_list(State(state): State<AppState>) -> Json<Value> {
    let stores = state.stores.lock();
    let mut models: Vec<Value> = stores.models.values().cloned().collect();
    models.sort_by_key(|m| m["id"].as_str().map(str::to_string));
    Json(Value::Array(models))
}

async fn models_get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.stores.lock().models.get(&id) {
        Some(model) => Json(model.clone()).into_response(),
        None => not_found("model"),
    }
}

async fn models_delete(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.stores.lock().models.remove(&id) {
        Some(_) => Json(json!(true)).into_response(),
        None => not_found("model"),
    }
}

// --- prompts ---------------------------------------------------------------

async fn prompts_list(State(state): State<AppState>) -> Json<Value> {
    let stores = state.stores.lock();
    let mut prompts: Vec<Value> = stores.prompts.values().cloned().collect();
    prompts.sort_by_key(|p| p["command"].as_str().map(str::to_string));
    Json(Value::Array(prompts))
}

async fn prompts_create(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    let command = body
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string();
    let prompt = json!({
        "command": command,
        "title": body.get("title").cloned().unwrap_or(json!("")),
        "content": body.get("content").cloned().unwrap_or(json!("")),
        "access": body.get("access").cloned().unwrap_or(json!("private")),
    });
    state.stores.lock().prompts.insert(command, prompt.clone());
    Json(prompt)
}

async fn prompts_get(State(state): State<AppState>, Path(command): Path<String>) -> Response {
    match state.stores.lock().prompts.get(&command) {
        Some(prompt) => Json(prompt.clone()).into_response(),
        None => not_found("prompt"),
    }
}

async fn prompts_delete(State(state): State<AppState>, Path(command): Path<String>) -> Response {
    match state.stores.lock().prompts.remove(&command) {
        Some(_) => Json(json!(true)).into_response(),
        None => not_found("prompt"),
    }
}

// --- knowledge -------------------------------------------------------------

async fn knowledge_list(State(state): State<AppState>) -> Json<Value> {
    let stores = state.stores.lock();
    let mut entries: Vec<Value> = stores.knowledge.values().cloned().collect();
    entries.sort_by_key(|k| k["id"].as_str().map(str::to_string));
    Json(Value::Array(entries))
}

async fn knowledge_create(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    let id = uuid::Uuid::new_v4().to_string();
    let entry = json!({
        "id": id,
        "name": body.get("name").cloned().unwrap_or(json!("")),
        "description": body.get("description").cloned().unwrap_or(json!("")),
        "data": body.get("data").cloned().unwrap_or(Value::Null),
    });
    state.stores.lock().knowledge.insert(id, entry.clone());
    Json(entry)
}

async fn knowledge_get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.stores.lock().knowledge.get(&id) {
        Some(entry) => Json(entry.clone()).into_response(),
        None => not_found("knowledge base"),
    }
}

async fn knowledge_delete(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.stores.lock().knowledge.remove(&id) {
        Some(_) => Json(json!(true)).into_response(),
        None => not_found("knowledge base"),
    }
}

// --- users -----------------------------------------------------------------

async fn users_list(State(state): State<AppState>, Query(_page): Query<PageQuery>) -> Json<Value> {
    let stores = state.stores.lock();
    let mut users: Vec<Value> = stores.users.values().cloned().collect();
    users.sort_by_key(|u| u["id"].as_str().map(str::to_string));
    Json(Value::Array(users))
}

async fn users_get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.stores.lock().users.get(&id) {
        Some(user) => Json(user.clone()).into_response(),
        None => not_found("user"),
    }
}

#[derive(Deserialize)]
struct RoleUpdate {
    id: String,
    role: String,
}

async fn users_update_role(
    State(state): State<AppState>,
    Json(body): Json<RoleUpdate>,
) -> Response {
    let mut stores = state.stores.lock();
    match stores.users.get_mut(&body.id) {
        Some(user) => {
            user["role"] = json!(body.role);
            Json(user.clone()).into_response()
        }
        None => not_found("user"),
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chats/list", get(chats_list))
        .route("/chats/search", get(chats_search))
        .route("/chats/new", post(chats_create))
        .route("/chats/:id", get(chats_get).delete(chats_delete))
        .route("/models/list", get(models_list))
        .route("/models/:id", get(models_get).delete(models_delete))
        .route("/prompts/list", get(prompts_list))
        .route("/prompts/create", post(prompts_create))
        .route("/prompts/command/:command", get(prompts_get).delete(prompts_delete))
        .route("/knowledge/list", get(knowledge_list))
        .route("/knowledge/create", post(knowledge_create))
        .route("/knowledge/:id", get(knowledge_get).delete(knowledge_delete))
        .route("/users/list", get(users_list))
        .route("/users/update/role", post(users_update_role))
        .route("/users/:id", get(users_get))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let addr: SocketAddr = env::var("MOCK_HTTP_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9300".into())
        .parse()?;
    let require_auth = env::var("MOCK_REQUIRE_AUTH")
        .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "" | "0" | "false"))
        .unwrap_or(false);
    let auth_token = require_auth
        .then(|| env::var("MOCK_API_KEY").unwrap_or_else(|_| "mock-key".into()));

    let state = AppState {
        stores: Arc::new(Mutex::new(seeded())),
        auth_token,
    };

    let app = Router::new()
        .route("/health", get(health))
        .nest(
            "/api/v1",
            api_routes().layer(middleware::from_fn_with_state(
                state.clone(),
                require_bearer,
            )),
        )
        .with_state(state);

    tracing::info!(%addr, require_auth, "mock server starting");
    let listener = TcpListener::bind(addr).await?;

    let ct = CancellationToken::new();
    let shutdown = ct.clone();
    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        shutdown.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await?;
    tracing::info!("mock server stopped");
    Ok(())
}
