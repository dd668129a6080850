//! HTTP transport implementation.
//!
//! JSON-RPC over POST with synchronous JSON responses. `initialize` opens a
//! session whose identifier travels in the `Mcp-Session-Id` header; every
//! later request must carry it. `DELETE` on the RPC path closes the session.
//!
//! Malformed request bodies and handler panics become plain-text `500`
//! responses and never take the listener down.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{HttpConfig, TransportError, TransportResult};
use crate::core::McpServer;
use crate::core::server::INSTRUCTIONS;
use crate::domains::tools::ToolError;

/// Header carrying the session identifier.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Protocol versions this transport accepts, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

/// State of one negotiated session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub protocol_version: String,
    pub initialized: bool,
}

impl SessionState {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Option<Duration>) -> bool {
        match (ttl, (now - self.last_seen).to_std()) {
            (Some(ttl), Ok(idle)) => idle > ttl,
            _ => false,
        }
    }
}

/// Live sessions keyed by identifier.
///
/// Sessions idle for longer than the TTL are treated as closed. Expired
/// entries are swept whenever a new session is opened.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionState>>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    /// Create a store. `None` keeps sessions until they are closed.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Open a session and return its identifier.
    pub async fn create(&self, protocol_version: &str) -> String {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let state = SessionState {
            created_at: now,
            last_seen: now,
            protocol_version: protocol_version.to_string(),
            initialized: false,
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.ttl));
        if sessions.len() < before {
            debug!("Expired {} idle sessions", before - sessions.len());
        }
        sessions.insert(id.clone(), state);
        id
    }

    pub async fn get(&self, id: &str) -> Option<SessionState> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Record activity on a live session.
    ///
    /// Returns `false` for unknown ids and for sessions that have expired,
    /// which are dropped on the spot.
    pub async fn touch(&self, id: &str) -> bool {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) if session.is_expired(now, self.ttl) => {
                sessions.remove(id);
                info!("Session expired: {}", id);
                false
            }
            Some(session) => {
                session.last_seen = now;
                true
            }
            None => false,
        }
    }

    /// Record the client's `notifications/initialized`.
    pub async fn mark_initialized(&self, id: &str) -> bool {
        match self.sessions.write().await.get_mut(id) {
            Some(session) => {
                session.initialized = true;
                true
            }
            None => false,
        }
    }

    /// Close a session, returning its final state.
    pub async fn remove(&self, id: &str) -> Option<SessionState> {
        self.sessions.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
    /// Sessions negotiated on this listener.
    sessions: SessionStore,
    /// Path of the JSON-RPC endpoint.
    rpc_path: String,
    /// Browser origins allowed to reach the RPC endpoint.
    allowed_origins: Arc<[String]>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router serving `server`.
    pub fn router(&self, server: McpServer) -> Router {
        let state = AppState {
            server,
            sessions: SessionStore::new(self.config.session_ttl()),
            rpc_path: self.config.rpc_path.clone(),
            allowed_origins: self.config.allowed_origins.clone().into(),
        };

        let mut app = Router::new()
            .route(
                &self.config.rpc_path,
                post(handle_rpc).delete(handle_close).get(handle_stream),
            )
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(state);

        // CORS only for explicitly allowed origins
        if !self.config.allowed_origins.is_empty() {
            let origins = self
                .config
                .allowed_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring malformed allowed origin '{}'", origin);
                        None
                    }
                });
            let session_header = HeaderName::from_static(SESSION_HEADER);
            let cors = CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, session_header.clone()])
                .expose_headers([session_header]);
            app = app.layer(cors);
        }

        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
    }

    /// Run the HTTP transport until a shutdown signal arrives.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.allowed_origins.is_empty() {
            "disabled".to_string()
        } else {
            format!("for {}", self.config.allowed_origins.join(", "))
        };
        info!(
            "Symphony MCP server (HTTP) listening on http://{} (CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "endpoints": {
            "rpc": state.rpc_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "documentation": format!(
            "POST JSON-RPC messages to {}; send the Mcp-Session-Id header returned by initialize",
            state.rpc_path
        )
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Plain-text 500 for failures below the JSON-RPC layer.
fn transport_failure(error: &TransportError) -> Response {
    warn!("Transport error: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Transport error: {}", error),
    )
        .into_response()
}

fn handle_panic(_payload: Box<dyn std::any::Any + Send + 'static>) -> Response {
    transport_failure(&TransportError::protocol("request handler panicked"))
}

/// Browsers always send `Origin`; requests from pages not explicitly allowed
/// are refused before they reach a session or a tool.
fn reject_foreign_origin(state: &AppState, headers: &HeaderMap) -> Option<Response> {
    let origin = headers.get(header::ORIGIN)?;
    let allowed = origin
        .to_str()
        .map(|origin| state.allowed_origins.iter().any(|a| a == origin))
        .unwrap_or(false);

    if allowed {
        None
    } else {
        warn!("Rejected request from origin {:?}", origin);
        Some((StatusCode::FORBIDDEN, "Origin not allowed").into_response())
    }
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn with_session_header(mut response: Response, session_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

fn rpc_error(status: StatusCode, id: Option<Value>, code: i32, message: &str) -> Response {
    (status, Json(JsonRpcResponse::error(id, code, message))).into_response()
}

/// Handle JSON-RPC requests.
#[instrument(
    skip_all,
    fields(method = tracing::field::Empty, session = tracing::field::Empty)
)]
async fn handle_rpc(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(rejection) = reject_foreign_origin(&state, &headers) {
        return rejection;
    }

    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            return transport_failure(&TransportError::protocol(format!("invalid JSON: {}", e)));
        }
    };

    if message.is_array() {
        return rpc_error(
            StatusCode::BAD_REQUEST,
            None,
            -32600,
            "Invalid Request: batch requests are not supported",
        );
    }

    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            return transport_failure(&TransportError::protocol(format!(
                "invalid JSON-RPC message: {}",
                e
            )));
        }
    };

    tracing::Span::current().record("method", request.method.as_str());
    debug!("Received JSON-RPC request: {}", request.method);

    if request.jsonrpc != "2.0" {
        return Json(JsonRpcResponse::invalid_request(request.id)).into_response();
    }

    if request.method == "initialize" {
        return handle_initialize(&state, request).await;
    }

    let Some(session) = session_id(&headers) else {
        return rpc_error(
            StatusCode::BAD_REQUEST,
            request.id,
            -32000,
            "Bad Request: Mcp-Session-Id header is required",
        );
    };
    tracing::Span::current().record("session", session.as_str());

    if !state.sessions.touch(&session).await {
        warn!("Unknown or expired session: {}", session);
        return rpc_error(StatusCode::NOT_FOUND, request.id, -32001, "Session not found");
    }

    // Notifications carry no id and get no body
    if request.id.is_none() {
        handle_notification(&state, &session, &request).await;
        return StatusCode::ACCEPTED.into_response();
    }

    let response = process_request(&state, request).await;
    with_session_header(Json(response).into_response(), &session)
}

/// Process a JSON-RPC request within an established session.
async fn process_request(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    match request.method.as_str() {
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => handle_tools_list(state, request),
        "tools/call" => handle_tools_call(state, request).await,
        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id)
        }
    }
}

/// Pick the protocol version to speak with a client.
fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v))
        .copied()
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// Handle initialize request: open a session.
async fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> Response {
    let requested = request
        .params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);
    let protocol_version = negotiate_protocol_version(requested);

    let session = state.sessions.create(protocol_version).await;
    info!(session = %session, protocol_version, "Session created");

    let result = json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": state.server.name(),
            "version": state.server.version()
        },
        "instructions": INSTRUCTIONS
    });

    with_session_header(
        Json(JsonRpcResponse::success(request.id, result)).into_response(),
        &session,
    )
}

/// Handle tools/list request.
fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let tools = state.server.list_tools();
    JsonRpcResponse::success(request.id, json!({ "tools": tools }))
}

/// Handle tools/call request.
async fn handle_tools_call(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let params = match request.params {
        Some(p) => p,
        None => return JsonRpcResponse::invalid_params(request.id, "Missing params"),
    };

    let name = match params.get("name").and_then(Value::as_str) {
        Some(n) => n.to_string(),
        None => return JsonRpcResponse::invalid_params(request.id, "Missing tool name"),
    };

    let arguments = params.get("arguments").cloned();
    info!("Calling tool: {}", name);

    match state.server.call_tool(&name, arguments).await {
        Ok(envelope) => match serde_json::to_value(&envelope) {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        },
        Err(e @ ToolError::Backend(_)) => JsonRpcResponse::success(
            request.id,
            json!({
                "content": [{ "type": "text", "text": e.to_string() }],
                "isError": true
            }),
        ),
        Err(e) if e.is_caller_error() => JsonRpcResponse::invalid_params(request.id, e.to_string()),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

/// Handle notifications (no response body).
async fn handle_notification(state: &AppState, session: &str, request: &JsonRpcRequest) {
    match request.method.as_str() {
        "notifications/initialized" => {
            state.sessions.mark_initialized(session).await;
            info!("Client initialized session {}", session);
        }
        _ => debug!("Received notification: {}", request.method),
    }
}

/// Close a session.
async fn handle_close(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(rejection) = reject_foreign_origin(&state, &headers) {
        return rejection;
    }

    let Some(session) = session_id(&headers) else {
        return rpc_error(
            StatusCode::BAD_REQUEST,
            None,
            -32000,
            "Bad Request: Mcp-Session-Id header is required",
        );
    };

    match state.sessions.remove(&session).await {
        Some(closed) => {
            let open_for = Utc::now() - closed.created_at;
            info!(
                "Session closed: {} (open {}s)",
                session,
                open_for.num_seconds()
            );
            StatusCode::OK.into_response()
        }
        None => rpc_error(StatusCode::NOT_FOUND, None, -32001, "Session not found"),
    }
}

/// Server-initiated streams are not offered; every response is a JSON body.
async fn handle_stream() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
        "Server-sent event streams are not supported",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::core::backend::testing::RecordingBackend;
    use axum::body::Body;
    use http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    }

    impl Reply {
        fn json(&self) -> Value {
            serde_json::from_slice(&self.body).unwrap()
        }

        fn session(&self) -> Option<String> {
            session_id(&self.headers)
        }
    }

    fn test_app(backend: Arc<RecordingBackend>) -> Router {
        test_app_with(HttpConfig::default(), backend)
    }

    fn test_app_with(config: HttpConfig, backend: Arc<RecordingBackend>) -> Router {
        let server = McpServer::with_backend(Config::default(), backend).unwrap();
        HttpTransport::new(config).router(server)
    }

    fn rpc_request(method: Method, session: Option<&str>) -> http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder
    }

    async fn send_raw(app: &Router, method: Method, session: Option<&str>, body: Body) -> Reply {
        send(app, rpc_request(method, session).body(body).unwrap()).await
    }

    async fn send(app: &Router, request: Request<Body>) -> Reply {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn rpc(app: &Router, session: Option<&str>, message: Value) -> Reply {
        send_raw(app, Method::POST, session, Body::from(message.to_string())).await
    }

    async fn initialize(app: &Router) -> String {
        let reply = rpc(
            app,
            None,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": { "protocolVersion": "2025-03-26", "capabilities": {} }
            }),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.session().expect("initialize returns a session id")
    }

    fn call(id: u64, name: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        })
    }

    #[tokio::test]
    async fn test_initialize_creates_session() {
        let app = test_app(Arc::new(RecordingBackend::new()));
        let reply = rpc(
            &app,
            None,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": { "protocolVersion": "2024-11-05" }
            }),
        )
        .await;

        let session = reply.session().unwrap();
        assert!(Uuid::parse_str(&session).is_ok());

        let body = reply.json();
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(body["result"]["serverInfo"]["name"], "symphony-mcp");
        assert!(body["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_protocol_negotiation() {
        assert_eq!(negotiate_protocol_version(Some("2025-03-26")), "2025-03-26");
        assert_eq!(
            negotiate_protocol_version(Some("1999-01-01")),
            SUPPORTED_PROTOCOL_VERSIONS[0]
        );
        assert_eq!(negotiate_protocol_version(None), SUPPORTED_PROTOCOL_VERSIONS[0]);
    }

    #[tokio::test]
    async fn test_session_header_required() {
        let app = test_app(Arc::new(RecordingBackend::new()));
        let list = json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" });

        let missing = rpc(&app, None, list.clone()).await;
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);

        let unknown = rpc(&app, Some("not-a-session"), list).await;
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);
        assert_eq!(unknown.json()["error"]["code"], -32001);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let app = test_app(Arc::new(RecordingBackend::new()));
        let session = initialize(&app).await;

        let reply = rpc(
            &app,
            Some(&session),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.session().as_deref(), Some(session.as_str()));
        assert_eq!(reply.json()["result"]["tools"].as_array().unwrap().len(), 26);
    }

    #[tokio::test]
    async fn test_tools_call_returns_envelope() {
        let backend = Arc::new(RecordingBackend::new().respond("/agent/A1/fees", json!({ "rate": 0.01 })));
        let app = test_app(backend.clone());
        let session = initialize(&app).await;

        let reply = rpc(&app, Some(&session), call(3, "getAgentFees", json!({ "agentId": "A1" }))).await;
        let body = reply.json();
        assert_eq!(body["id"], 3);
        assert_eq!(
            body["result"],
            json!({ "content": [{ "type": "json", "json": { "rate": 0.01 } }] })
        );
        assert_eq!(backend.requests()[0].path, "/agent/A1/fees");
    }

    #[tokio::test]
    async fn test_tools_call_backend_failure_is_tool_error() {
        let backend = Arc::new(RecordingBackend::new().fail(
            "/withdraw/token",
            404,
            json!({ "message": "not found" }),
        ));
        let app = test_app(backend);
        let session = initialize(&app).await;

        let reply = rpc(
            &app,
            Some(&session),
            call(4, "withdrawToken", json!({ "payload": { "token": "USDC" } })),
        )
        .await;
        let body = reply.json();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(body["result"]["isError"], true);
        assert_eq!(
            body["result"]["content"][0]["text"],
            "Symphony POST /withdraw/token failed: not found"
        );
    }

    #[tokio::test]
    async fn test_tools_call_caller_errors() {
        let backend = Arc::new(RecordingBackend::new());
        let app = test_app(backend.clone());
        let session = initialize(&app).await;

        let unknown = rpc(&app, Some(&session), call(5, "launchRocket", json!({}))).await;
        assert_eq!(unknown.json()["error"]["code"], -32602);
        assert!(
            unknown.json()["error"]["message"]
                .as_str()
                .unwrap()
                .contains("launchRocket")
        );

        let invalid = rpc(&app, Some(&session), call(6, "registerAgent", json!({}))).await;
        assert_eq!(invalid.json()["error"]["code"], -32602);

        let no_params = rpc(
            &app,
            Some(&session),
            json!({ "jsonrpc": "2.0", "id": 7, "method": "tools/call" }),
        )
        .await;
        assert_eq!(no_params.json()["error"]["message"], "Missing params");

        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_method_and_bad_version() {
        let app = test_app(Arc::new(RecordingBackend::new()));
        let session = initialize(&app).await;

        let reply = rpc(
            &app,
            Some(&session),
            json!({ "jsonrpc": "2.0", "id": 8, "method": "resources/list" }),
        )
        .await;
        assert_eq!(reply.json()["error"]["code"], -32601);

        let reply = rpc(
            &app,
            Some(&session),
            json!({ "jsonrpc": "1.0", "id": 9, "method": "ping" }),
        )
        .await;
        assert_eq!(reply.json()["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_malformed_body_is_plain_text_500() {
        let app = test_app(Arc::new(RecordingBackend::new()));

        let reply = send_raw(&app, Method::POST, None, Body::from("{not json")).await;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            reply.headers[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        assert!(String::from_utf8_lossy(&reply.body).starts_with("Transport error"));

        // The listener keeps serving afterwards
        initialize(&app).await;
    }

    #[tokio::test]
    async fn test_batch_body_is_invalid_request() {
        let backend = Arc::new(RecordingBackend::new());
        let app = test_app(backend.clone());
        let session = initialize(&app).await;

        let batch = json!([
            { "jsonrpc": "2.0", "id": 1, "method": "ping" },
            call(2, "getAgentFees", json!({ "agentId": "A1" })),
        ]);
        let reply = rpc(&app, Some(&session), batch).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        let body = reply.json();
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["id"], Value::Null);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_notification_accepted() {
        let app = test_app(Arc::new(RecordingBackend::new()));
        let session = initialize(&app).await;

        let reply = rpc(
            &app,
            Some(&session),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        )
        .await;
        assert_eq!(reply.status, StatusCode::ACCEPTED);
        assert!(reply.body.is_empty());
    }

    #[tokio::test]
    async fn test_delete_closes_session() {
        let app = test_app(Arc::new(RecordingBackend::new()));
        let session = initialize(&app).await;

        let closed = send_raw(&app, Method::DELETE, Some(&session), Body::empty()).await;
        assert_eq!(closed.status, StatusCode::OK);

        let again = send_raw(&app, Method::DELETE, Some(&session), Body::empty()).await;
        assert_eq!(again.status, StatusCode::NOT_FOUND);

        let reply = rpc(
            &app,
            Some(&session),
            json!({ "jsonrpc": "2.0", "id": 10, "method": "ping" }),
        )
        .await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_stream_not_allowed() {
        let app = test_app(Arc::new(RecordingBackend::new()));
        let reply = send_raw(&app, Method::GET, None, Body::empty()).await;
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_do_not_interfere() {
        let backend = Arc::new(
            RecordingBackend::new()
                .respond("/agent/A1/fees", json!({ "rate": 0.01 }))
                .respond("/user/U9/agents", json!({ "agents": ["A1"] })),
        );
        let app = test_app(backend.clone());

        let (first, second) = tokio::join!(initialize(&app), initialize(&app));
        assert_ne!(first, second);

        let (fees, agents) = tokio::join!(
            rpc(&app, Some(&first), call(1, "getAgentFees", json!({ "agentId": "A1" }))),
            rpc(&app, Some(&second), call(1, "getSubscribedAgents", json!({ "userId": "U9" }))),
        );

        assert_eq!(fees.session().as_deref(), Some(first.as_str()));
        assert_eq!(agents.session().as_deref(), Some(second.as_str()));
        assert_eq!(fees.json()["result"]["content"][0]["json"], json!({ "rate": 0.01 }));
        assert_eq!(
            agents.json()["result"]["content"][0]["json"],
            json!({ "agents": ["A1"] })
        );
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_foreign_origin_rejected() {
        let backend = Arc::new(RecordingBackend::new().respond("/agent/A1/fees", json!({ "rate": 0.01 })));
        let app = test_app(backend.clone());
        let session = initialize(&app).await;

        let request = rpc_request(Method::POST, Some(&session))
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::from(
                call(1, "getAgentFees", json!({ "agentId": "A1" })).to_string(),
            ))
            .unwrap();
        let reply = send(&app, request).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(String::from_utf8_lossy(&reply.body), "Origin not allowed");

        let request = rpc_request(Method::DELETE, Some(&session))
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, request).await.status, StatusCode::FORBIDDEN);

        // Neither request reached the backend nor closed the session
        assert_eq!(backend.call_count(), 0);
        let ping = rpc(&app, Some(&session), json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" })).await;
        assert_eq!(ping.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_allowed_origin_gets_cors_headers() {
        let backend = Arc::new(RecordingBackend::new().respond("/agent/A1/fees", json!({ "rate": 0.01 })));
        let config = HttpConfig {
            allowed_origins: vec!["https://app.example.com".to_string()],
            ..HttpConfig::default()
        };
        let app = test_app_with(config, backend.clone());
        let session = initialize(&app).await;

        let request = rpc_request(Method::POST, Some(&session))
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::from(
                call(1, "getAgentFees", json!({ "agentId": "A1" })).to_string(),
            ))
            .unwrap();
        let reply = send(&app, request).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(
            reply.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
        assert_eq!(backend.call_count(), 1);

        let request = rpc_request(Method::POST, Some(&session))
            .header(header::ORIGIN, "https://other.example.com")
            .body(Body::from(json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" }).to_string()))
            .unwrap();
        let reply = send(&app, request).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert!(!reply.headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let store = SessionStore::new(Some(Duration::from_millis(50)));
        let id = store.create("2025-03-26").await;
        assert!(store.touch(&id).await);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!store.touch(&id).await);
        assert!(store.get(&id).await.is_none());
        assert_eq!(store.len().await, 0);

        // Opening a session sweeps the ones left idle
        let stale = store.create("2025-03-26").await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        let fresh = store.create("2025-03-26").await;
        assert!(store.get(&stale).await.is_none());
        assert!(store.get(&fresh).await.is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_session_is_not_found() {
        let config = HttpConfig {
            session_ttl_secs: 1,
            ..HttpConfig::default()
        };
        let app = test_app_with(config, Arc::new(RecordingBackend::new()));
        let session = initialize(&app).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let reply = rpc(&app, Some(&session), json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" })).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.json()["error"]["code"], -32001);
    }

    #[tokio::test]
    async fn test_session_store_lifecycle() {
        let store = SessionStore::new(None);
        let id = store.create("2025-03-26").await;
        assert_eq!(store.len().await, 1);
        assert!(!store.get(&id).await.unwrap().initialized);

        assert!(store.mark_initialized(&id).await);
        let session = store.get(&id).await.unwrap();
        assert!(session.initialized);
        assert_eq!(session.protocol_version, "2025-03-26");
        assert!(session.created_at <= Utc::now());

        assert!(store.remove(&id).await.is_some());
        assert!(!store.mark_initialized(&id).await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app(Arc::new(RecordingBackend::new()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
