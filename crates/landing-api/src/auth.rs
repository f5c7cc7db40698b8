use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AppState;

pub const SESSION_COOKIE: &str = "landing_session";
pub const OAUTH_STATE_COOKIE: &str = "landing_oauth_state";

const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    iat: usize,
    exp: usize,
}

/// Authenticated team, inserted into request extensions by
/// [`session_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub team_id: i64,
}

pub fn issue_token(team_id: i64, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: team_id,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Option<i64> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims.sub)
}

/// Session Set-Cookie value issued after a completed OAuth login.
pub fn session_cookie(team_id: i64, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let token = issue_token(team_id, secret)?;
    Ok(format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_TTL_DAYS * 24 * 60 * 60
    ))
}

/// Short-lived CSRF state cookie set when redirecting to the provider.
pub fn oauth_state_cookie(state: &str) -> String {
    format!("{OAUTH_STATE_COOKIE}={state}; Path=/; HttpOnly; SameSite=Lax; Max-Age=600")
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                (key == name).then_some(value)
            })
        })
}

/// Rejects with 401 unless the request carries a valid session cookie;
/// on success the [`Session`] is available via `Extension`.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let team_id = cookie_value(req.headers(), SESSION_COOKIE)
        .and_then(|token| verify_token(token, &state.settings.session_secret));

    match team_id {
        Some(team_id) => {
            req.extensions_mut().insert(Session { team_id });
            Ok(next.run(req).await)
        }
        None => {
            debug!("rejected request without valid session cookie");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
