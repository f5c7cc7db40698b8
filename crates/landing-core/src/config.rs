use std::path::PathBuf;

use chrono::{DateTime, Duration, TimeZone, Utc};
use config as cfg;
use serde::{Deserialize, Serialize};

use crate::error::{LandingError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/landing.db".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    #[serde(default = "OAuthConfig::default_authorization_endpoint")]
    pub authorization_endpoint: String,
    #[serde(default = "OAuthConfig::default_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default = "OAuthConfig::default_user_info_endpoint")]
    pub user_info_endpoint: String,
    #[serde(default = "OAuthConfig::default_team_api_base")]
    pub team_api_base: String,
    #[serde(default = "OAuthConfig::default_scope")]
    pub scope: String,
    /// Absolute URL the provider redirects back to after authorization.
    pub redirect_url: String,
}

impl OAuthConfig {
    fn default_authorization_endpoint() -> String {
        "https://ctftime.org/oauth2/authorize".to_string()
    }

    fn default_token_endpoint() -> String {
        "https://ctftime.org/oauth2/token".to_string()
    }

    fn default_user_info_endpoint() -> String {
        "https://ctftime.org/api/v1/user".to_string()
    }

    fn default_team_api_base() -> String {
        "https://ctftime.org/api/v1/teams".to_string()
    }

    fn default_scope() -> String {
        "team:read".to_string()
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorization_endpoint: Self::default_authorization_endpoint(),
            token_endpoint: Self::default_token_endpoint(),
            user_info_endpoint: Self::default_user_info_endpoint(),
            team_api_base: Self::default_team_api_base(),
            scope: Self::default_scope(),
            redirect_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HetznerConfig {
    #[serde(skip_serializing)]
    pub api_token: String,
    #[serde(default = "HetznerConfig::default_server_type")]
    pub server_type: String,
    pub image: String,
    #[serde(default = "HetznerConfig::default_location")]
    pub location: String,
    #[serde(default)]
    pub ssh_key: Option<String>,
    /// Public key installed on every vulnbox for organizer access.
    #[serde(default)]
    pub vulnbox_pubkey: Option<String>,
}

impl HetznerConfig {
    fn default_server_type() -> String {
        "cx22".to_string()
    }

    fn default_location() -> String {
        "nbg1".to_string()
    }
}

impl Default for HetznerConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            server_type: Self::default_server_type(),
            image: String::new(),
            location: Self::default_location(),
            ssh_key: None,
            vulnbox_pubkey: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// CTF start, UTC. All registration and check-in windows derive from it.
    pub start_time: DateTime<Utc>,
    /// Hours before start at which new-team registration closes.
    pub registration_close_offset: i64,
    /// Hours before start at which the check-in window opens.
    pub check_in_begin_offset: i64,
    /// Hours before start at which the check-in window closes.
    pub check_in_end_offset: i64,
    pub oauth: OAuthConfig,
    pub session_secret: String,
    pub hetzner: HetznerConfig,
    pub scoreboard_dir: PathBuf,
    pub team_data_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Landing Page CTF".into(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            start_time: Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap(),
            registration_close_offset: 1,
            check_in_begin_offset: 24,
            check_in_end_offset: 1,
            oauth: OAuthConfig::default(),
            session_secret: String::new(),
            hetzner: HetznerConfig::default(),
            scoreboard_dir: "data/scoreboard".into(),
            team_data_dir: "data".into(),
            static_dir: "wwwroot".into(),
        }
    }
}

impl Settings {
    /// Layered load: `landing.toml` (optional) overridden by `LANDING_*`
    /// environment variables, e.g. `LANDING_SERVER__PORT=8080`.
    pub fn load() -> Result<Self> {
        Self::load_from("landing")
    }

    pub fn load_from(name: &str) -> Result<Self> {
        cfg::Config::builder()
            .add_source(cfg::File::with_name(name).required(false))
            .add_source(cfg::Environment::with_prefix("LANDING").separator("__"))
            .build()
            .map_err(|e| LandingError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| LandingError::Config(e.to_string()))
    }

    /// New teams may register until `registration_close_offset` hours
    /// before the CTF starts. Known teams can always log in.
    pub fn registration_open(&self, now: DateTime<Utc>) -> bool {
        now <= self.start_time - Duration::hours(self.registration_close_offset)
    }

    /// Check-in is open in `[start - begin_offset, start - end_offset]`.
    pub fn check_in_open(&self, now: DateTime<Utc>) -> bool {
        let begin = self.start_time - Duration::hours(self.check_in_begin_offset);
        let end = self.start_time - Duration::hours(self.check_in_end_offset);
        begin <= now && now <= end
    }
}
