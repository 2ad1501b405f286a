//! HTTP API endpoints.
//!
//! The song list is public (without answers); export/import is used by the
//! Admin panel to back up and restore a running quiz.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::protocol::SongInfo;
use crate::state::export::GameStateExport;
use crate::state::AppState;

/// List the catalog without revealing titles or artists.
///
/// GET /api/songs
pub async fn list_songs(State(state): State<Arc<AppState>>) -> Json<Vec<SongInfo>> {
    let songs = state
        .get_songs()
        .await
        .iter()
        .map(|song| SongInfo::new(song, false))
        .collect();
    Json(songs)
}

/// Export the entire game state as JSON.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Json<GameStateExport> {
    Json(state.export_state().await)
}

/// Import a game state snapshot.
///
/// POST /api/state/import
///
/// Replaces all current state and pushes the refreshed state to every client.
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Json(export): Json<GameStateExport>,
) -> Response {
    match state.import_state(export).await {
        Ok(()) => (StatusCode::OK, "State imported successfully").into_response(),
        Err(e) => {
            tracing::error!("State import failed: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::Request,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/api/songs", get(list_songs))
            .route("/api/state/export", get(export_state))
            .route("/api/state/import", post(import_state))
            .with_state(state)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_songs_hides_answers() {
        let state = Arc::new(AppState::new());
        let response = app(state)
            .oneshot(Request::get("/api/songs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let songs = body_json(response).await;
        let songs = songs.as_array().unwrap();
        assert_eq!(songs.len(), 3);
        assert!(songs[0].get("title_original").is_none());
        assert_eq!(songs[0]["genre"], "80s Synthpop");
    }

    #[tokio::test]
    async fn test_export_then_import() {
        let source = Arc::new(AppState::new());
        source.create_game().await;
        source.add_team("Elves").await.unwrap();

        let response = app(source)
            .oneshot(
                Request::get("/api/state/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let export = body_json(response).await;
        assert_eq!(export["schema_version"], 1);

        let target = Arc::new(AppState::new());
        let response = app(target.clone())
            .oneshot(
                Request::post("/api/state/import")
                    .header("content-type", "application/json")
                    .body(Body::from(export.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(target.get_teams().await[0].name, "Elves");
    }

    #[tokio::test]
    async fn test_import_rejects_future_schema() {
        let state = Arc::new(AppState::new());
        let mut export = serde_json::to_value(state.export_state().await).unwrap();
        export["schema_version"] = serde_json::json!(99);

        let response = app(state)
            .oneshot(
                Request::post("/api/state/import")
                    .header("content-type", "application/json")
                    .body(Body::from(export.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
