use landing_core::OAuthConfig;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{ApiError, ApiResult};

/// Thin bindings to the ctftime.org OAuth endpoints and the public
/// team API. The handshake itself stays on the provider's side.
pub struct CtftimeClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

/// Identity delivered by the provider's user-info endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CtftimeLogin {
    /// The provider's team id.
    pub uid: i64,
    #[serde(default)]
    team: Option<TeamRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct TeamRef {
    #[allow(dead_code)]
    id: Option<i64>,
    name: Option<String>,
}

impl CtftimeLogin {
    pub fn team_name(&self) -> String {
        self.team
            .as_ref()
            .and_then(|team| team.name.clone())
            .unwrap_or_else(|| self.uid.to_string())
    }
}

/// Public profile of a team on ctftime.org. Optional everywhere; a
/// failed lookup never blocks login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CtftimeTeamInfo {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub country: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl CtftimeClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Provider URL the browser is sent to when logging in.
    pub fn authorize_url(&self, state: &str) -> ApiResult<String> {
        let mut url = Url::parse(&self.config.authorization_endpoint)
            .map_err(|e| ApiError::Internal(format!("bad authorization endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state)
            .append_pair("redirect_uri", &self.config.redirect_url);
        Ok(url.into())
    }

    pub async fn exchange_code(&self, code: &str) -> ApiResult<String> {
        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.config.redirect_url),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
            ])
            .send()
            .await?
            .error_for_status()?;

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    pub async fn fetch_login(&self, access_token: &str) -> ApiResult<CtftimeLogin> {
        let login = self
            .http
            .get(&self.config.user_info_endpoint)
            .bearer_auth(access_token)
            .header(http::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(?login, "fetched provider login");
        Ok(login)
    }

    /// Public team lookup for logo and country. Errors bubble up so the
    /// caller can log and continue without the profile.
    pub async fn fetch_team_info(&self, ctftime_id: i64) -> ApiResult<CtftimeTeamInfo> {
        let url = format!("{}/{}/", self.config.team_api_base, ctftime_id);
        let info = self
            .http
            .get(url)
            .header(http::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(info)
    }
}
