use axum::{
    extract::{Extension, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect},
    Json,
};
use chrono::Utc;
use landing_core::{internal_address, TeamDetailsMessage};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    auth::{self, Session},
    ApiError, ApiResult, AppState,
};

const REGISTRATION_CLOSED_PAGE: &str = "/registrationclosed";

#[derive(Deserialize)]
pub struct LoginQuery {
    pub redirect_uri: Option<String>,
}

#[derive(Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: String,
}

/// Starts the OAuth login: remembers a CSRF nonce in a cookie and
/// sends the browser to the provider's authorization page. The final
/// redirect target travels inside the `state` parameter.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> ApiResult<impl IntoResponse> {
    let nonce = Uuid::new_v4().simple().to_string();
    let redirect = sanitize_redirect(query.redirect_uri.as_deref());
    let state_param = format!("{nonce}:{redirect}");

    let authorize_url = state.ctftime.authorize_url(&state_param)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, auth::oauth_state_cookie(&nonce))]),
        Redirect::to(&authorize_url),
    ))
}

/// OAuth callback: verifies the CSRF nonce, exchanges the code, looks
/// up the team on the provider and signs the browser in. A provider
/// profile fetch failure is logged and does not block the login.
pub async fn oauth2_redirect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OAuthCallbackQuery>,
) -> ApiResult<impl IntoResponse> {
    let (nonce, redirect) = query
        .state
        .split_once(':')
        .ok_or(ApiError::Unauthorized)?;
    let cookie_nonce =
        auth::cookie_value(&headers, auth::OAUTH_STATE_COOKIE).ok_or(ApiError::Unauthorized)?;
    if nonce != cookie_nonce {
        return Err(ApiError::Unauthorized);
    }
    let redirect = sanitize_redirect(Some(redirect));

    let access_token = state.ctftime.exchange_code(&query.code).await?;
    let login = state.ctftime.fetch_login(&access_token).await?;

    if !state.settings.registration_open(Utc::now())
        && !state.store.ctftime_team_exists(login.uid).await?
    {
        return Ok(Redirect::to(REGISTRATION_CLOSED_PAGE).into_response());
    }

    let profile = match state.ctftime.fetch_team_info(login.uid).await {
        Ok(profile) => Some(profile),
        Err(e) => {
            error!(ctftime_id = login.uid, "provider profile fetch failed: {e}");
            None
        }
    };
    let profile = profile.unwrap_or_default();
    let name = profile.name.clone().unwrap_or_else(|| login.team_name());

    let team = state
        .store
        .get_or_update_team(
            login.uid,
            &name,
            profile.logo.as_deref(),
            profile.country.as_deref(),
        )
        .await?;
    info!(team_id = team.id, ctftime_id = login.uid, "team logged in");

    let session = auth::session_cookie(team.id, &state.settings.session_secret)
        .map_err(|e| ApiError::Internal(format!("failed to issue session: {e}")))?;
    // Clearing the nonce cookie also invalidates replayed callbacks.
    let clear_state = format!("{}=; Path=/; Max-Age=0", auth::OAUTH_STATE_COOKIE);

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, session),
            (header::SET_COOKIE, clear_state),
        ]),
        Redirect::to(&redirect),
    )
        .into_response())
}

pub async fn info(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<TeamDetailsMessage>> {
    let (team, vulnbox) = state.store.get_team_and_vulnbox(session.team_id).await?;

    Ok(Json(TeamDetailsMessage {
        id: team.id,
        confirmed: team.confirmed,
        team_name: team.name,
        vpn_config_available: vulnbox.external_address.is_some(),
        root_password: vulnbox.root_password,
        external_ip_address: vulnbox.external_address,
        internal_ip_address: internal_address(team.id),
        vulnbox_status: vulnbox.status,
    }))
}

/// Serves the team's OpenVPN client config with the vulnbox address
/// substituted in. 404 until the vulnbox has an external address.
pub async fn vpn_config(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<impl IntoResponse> {
    let (team, vulnbox) = state.store.get_team_and_vulnbox(session.team_id).await?;
    let external_address = vulnbox
        .external_address
        .ok_or_else(|| ApiError::NotFound("vulnbox has no address yet".to_string()))?;

    let path = state
        .settings
        .team_data_dir
        .join("teamdata")
        .join(format!("team{}", team.id))
        .join("client.conf");
    let template = tokio::fs::read_to_string(&path).await.map_err(|e| {
        error!(team_id = team.id, path = %path.display(), "missing vpn config: {e}");
        ApiError::NotFound("vpn config not available".to_string())
    })?;
    let config = template.replace("REMOTE_IP_PLACEHOLDER", &external_address);

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"client.conf\"",
            ),
        ],
        config,
    ))
}

/// Marks the team as confirmed for the game. Only allowed inside the
/// configured check-in window.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<StatusCode> {
    if !state.settings.check_in_open(Utc::now()) {
        return Err(ApiError::Forbidden("check-in window is closed".to_string()));
    }

    state.store.check_in(session.team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Only same-origin paths survive; anything else falls back to `/`.
fn sanitize_redirect(redirect: Option<&str>) -> String {
    match redirect {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}
