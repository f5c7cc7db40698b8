use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use landing_core::{RoundSchedule, Scoreboard};
use tracing::debug;

use crate::{ApiError, ApiResult, AppState};

const CURRENT_SNAPSHOT: &str = "scoreboard.json";

/// Serves a scoreboard snapshot verbatim. Accepts `scoreboard.json`
/// for the current round or `scoreboard{round}.json` for history; the
/// round is validated as a number so no client input reaches the
/// filesystem.
pub async fn snapshot(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let file_name =
        snapshot_file_name(&file).ok_or_else(|| ApiError::NotFound(format!("no such snapshot: {file}")))?;

    let path = state.settings.scoreboard_dir.join(&file_name);
    let body = tokio::fs::read(&path).await.map_err(|e| {
        debug!(path = %path.display(), "snapshot read failed: {e}");
        ApiError::NotFound(format!("no such snapshot: {file_name}"))
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// Round countdown for the frontend: parses the current snapshot and
/// returns time left plus when to re-poll.
pub async fn schedule(State(state): State<AppState>) -> ApiResult<Json<RoundSchedule>> {
    let path = state.settings.scoreboard_dir.join(CURRENT_SNAPSHOT);
    let body = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::NotFound("no current scoreboard".to_string()))?;
    let scoreboard: Scoreboard = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Internal(format!("invalid scoreboard snapshot: {e}")))?;

    Ok(Json(RoundSchedule::from_scoreboard(&scoreboard, Utc::now())))
}

fn snapshot_file_name(raw: &str) -> Option<String> {
    if raw == CURRENT_SNAPSHOT {
        return Some(raw.to_string());
    }
    let round: u32 = raw
        .strip_prefix("scoreboard")?
        .strip_suffix(".json")?
        .parse()
        .ok()?;
    Some(format!("scoreboard{round}.json"))
}
