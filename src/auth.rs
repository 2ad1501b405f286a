//! Access gate for the quiz
//!
//! Players and the Display join with the room access code, the Admin panel
//! needs the admin PIN. The PIN also opens every other role.

use crate::state::AppState;
use crate::types::{AccessCodes, Role};
use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

/// Header carrying the admin PIN on `/api/state/*`
pub const ADMIN_PIN_HEADER: &str = "x-admin-pin";

#[derive(Clone)]
pub struct AccessGate {
    pub state: Arc<AppState>,
    /// false = every check passes (local development)
    pub enabled: bool,
}

impl AccessGate {
    pub fn new(state: Arc<AppState>, enabled: bool) -> Self {
        if !enabled {
            tracing::warn!("Access gate DISABLED - anyone can connect as admin!");
        }
        Self { state, enabled }
    }
}

/// Check a code for a role
pub fn authorize(codes: &AccessCodes, role: Role, code: &str) -> bool {
    let is_admin_pin = constant_time_eq(codes.admin_pin.as_bytes(), code.as_bytes());
    match role {
        Role::Admin => is_admin_pin,
        Role::Display | Role::Player => {
            is_admin_pin || constant_time_eq(codes.access_code.as_bytes(), code.as_bytes())
        }
    }
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn query_param<'a>(request: &'a Request<Body>, key: &str) -> Option<&'a str> {
    request
        .uri()
        .query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

fn reject(status: StatusCode, msg: &'static str) -> Response<Body> {
    (status, msg).into_response()
}

/// Middleware guarding `/ws?role=<role>&code=<code>`
pub async fn ws_access_middleware(
    State(gate): State<AccessGate>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if request.uri().path() != "/ws" {
        return next.run(request).await;
    }

    let Some(role) = query_param(&request, "role").and_then(Role::parse) else {
        return reject(StatusCode::BAD_REQUEST, "Unknown role");
    };

    if !gate.enabled {
        return next.run(request).await;
    }

    let code = query_param(&request, "code").unwrap_or_default();
    let codes = gate.state.get_access_codes().await;
    if authorize(&codes, role, code) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected {:?} connection with wrong code", role);
    reject(StatusCode::UNAUTHORIZED, "Invalid access code")
}

/// Middleware requiring the admin PIN header on state export/import
pub async fn admin_api_middleware(
    State(gate): State<AccessGate>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !gate.enabled {
        return next.run(request).await;
    }

    let pin = request
        .headers()
        .get(ADMIN_PIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let codes = gate.state.get_access_codes().await;
    if authorize(&codes, Role::Admin, pin) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected admin API request for {}", request.uri().path());
    reject(StatusCode::UNAUTHORIZED, "Invalid admin PIN")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    fn codes() -> AccessCodes {
        AccessCodes {
            access_code: "5555".to_string(),
            admin_pin: "1230".to_string(),
        }
    }

    #[test]
    fn test_authorize_roles() {
        let codes = codes();
        assert!(authorize(&codes, Role::Admin, "1230"));
        assert!(!authorize(&codes, Role::Admin, "5555"));

        assert!(authorize(&codes, Role::Player, "5555"));
        assert!(authorize(&codes, Role::Player, "1230"));
        assert!(authorize(&codes, Role::Display, "5555"));
        assert!(!authorize(&codes, Role::Display, "0000"));
        assert!(!authorize(&codes, Role::Player, ""));
    }

    #[test]
    fn test_query_param() {
        let req = Request::builder()
            .uri("/ws?role=player&code=5555")
            .body(Body::empty())
            .unwrap();
        assert_eq!(query_param(&req, "role"), Some("player"));
        assert_eq!(query_param(&req, "code"), Some("5555"));
        assert_eq!(query_param(&req, "missing"), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }

    fn app(enabled: bool) -> Router {
        let gate = AccessGate::new(Arc::new(AppState::new()), enabled);
        let api = Router::new()
            .route("/api/state/export", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                gate.clone(),
                admin_api_middleware,
            ));
        Router::new()
            .route("/ws", get(|| async { "ok" }))
            .merge(api)
            .layer(middleware::from_fn_with_state(gate, ws_access_middleware))
    }

    async fn status(app: Router, request: Request<Body>) -> StatusCode {
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_ws_middleware() {
        let req = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

        assert_eq!(
            status(app(true), req("/ws?role=player&code=5555")).await,
            StatusCode::OK
        );
        assert_eq!(
            status(app(true), req("/ws?role=admin&code=5555")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(app(true), req("/ws?role=host&code=1230")).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(app(false), req("/ws?role=admin")).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_admin_api_middleware() {
        let with_pin = |pin: &str| {
            Request::builder()
                .uri("/api/state/export")
                .header(ADMIN_PIN_HEADER, pin)
                .body(Body::empty())
                .unwrap()
        };

        assert_eq!(status(app(true), with_pin("1230")).await, StatusCode::OK);
        assert_eq!(
            status(app(true), with_pin("5555")).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
