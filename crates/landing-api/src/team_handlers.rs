use axum::{extract::State, Json};
use landing_core::ConfirmedTeamMessage;

use crate::{ApiResult, AppState};

/// Public list of teams that completed check-in.
pub async fn confirmed(State(state): State<AppState>) -> ApiResult<Json<Vec<ConfirmedTeamMessage>>> {
    let teams = state.store.confirmed_teams().await?;
    Ok(Json(
        teams
            .into_iter()
            .map(|team| ConfirmedTeamMessage {
                name: team.name,
                ctftime_id: team.ctftime_id,
            })
            .collect(),
    ))
}
