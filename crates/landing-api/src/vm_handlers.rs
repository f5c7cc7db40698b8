use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use tracing::info;

use crate::{auth::Session, hetzner::CloudCall, ApiResult, AppState};

/// Creates the team's vulnbox. 422 when the server already exists or
/// another lifecycle call for the team is still running.
pub async fn start_vulnbox(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<StatusCode> {
    info!(team_id = session.team_id, "start vulnbox requested");
    state
        .hetzner
        .call(session.team_id, CloudCall::Create, &state.store)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Power-cycles the team's vulnbox.
pub async fn reset_vulnbox(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<StatusCode> {
    info!(team_id = session.team_id, "reset vulnbox requested");
    state
        .hetzner
        .call(session.team_id, CloudCall::Reset, &state.store)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
