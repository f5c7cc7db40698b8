use dashmap::DashMap;
use landing_core::{HetznerConfig, VulnboxStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{db::Store, ApiError, ApiResult};

const DEFAULT_BASE_URL: &str = "https://api.hetzner.cloud/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudCall {
    Create,
    Reset,
}

/// Hetzner cloud bindings for the per-team vulnbox lifecycle.
///
/// Calls are single-flight per team: while one is running, a second
/// request for the same team fails fast with [`ApiError::CallInProgress`].
pub struct HetznerClient {
    http: reqwest::Client,
    config: HetznerConfig,
    base_url: String,
    in_flight: DashMap<i64, ()>,
}

/// Releases the per-team single-flight slot on drop.
struct FlightGuard<'a> {
    in_flight: &'a DashMap<i64, ()>,
    team_id: i64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.team_id);
    }
}

#[derive(Debug, Deserialize)]
struct ServersResponse {
    servers: Vec<Server>,
}

#[derive(Debug, Deserialize)]
struct CreateServerResponse {
    server: Server,
}

#[derive(Debug, Deserialize)]
struct Server {
    id: i64,
    #[serde(default)]
    public_net: PublicNet,
}

#[derive(Debug, Default, Deserialize)]
struct PublicNet {
    #[serde(default)]
    ipv4: Option<Ipv4>,
}

#[derive(Debug, Deserialize)]
struct Ipv4 {
    ip: String,
}

#[derive(Debug, Serialize)]
struct CreateServerRequest {
    name: String,
    server_type: String,
    image: String,
    location: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ssh_keys: Vec<String>,
    user_data: String,
}

impl HetznerClient {
    pub fn new(config: HetznerConfig) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(config: HetznerConfig, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            base_url: base_url.into(),
            in_flight: DashMap::new(),
        }
    }

    pub async fn call(&self, team_id: i64, call: CloudCall, store: &Store) -> ApiResult<()> {
        let _guard = self.begin(team_id)?;
        match call {
            CloudCall::Create => self.create(team_id, store).await,
            CloudCall::Reset => self.reset(team_id).await,
        }
    }

    fn begin(&self, team_id: i64) -> ApiResult<FlightGuard<'_>> {
        if self.in_flight.insert(team_id, ()).is_some() {
            warn!(team_id, "rejected concurrent cloud call");
            return Err(ApiError::CallInProgress);
        }
        Ok(FlightGuard {
            in_flight: &self.in_flight,
            team_id,
        })
    }

    async fn create(&self, team_id: i64, store: &Store) -> ApiResult<()> {
        let name = server_name(team_id);
        if self.find_server(&name).await?.is_some() {
            return Err(ApiError::VulnboxExists);
        }

        let (_, vulnbox) = store.get_team_and_vulnbox(team_id).await?;
        let root_password = vulnbox
            .root_password
            .ok_or_else(|| ApiError::Internal(format!("team {team_id} has no root password")))?;

        store
            .set_vulnbox_status(team_id, VulnboxStatus::Provisioning)
            .await?;
        info!(team_id, "creating vulnbox");

        let request = CreateServerRequest {
            name,
            server_type: self.config.server_type.clone(),
            image: self.config.image.clone(),
            location: self.config.location.clone(),
            ssh_keys: self.config.ssh_key.iter().cloned().collect(),
            user_data: cloud_init(&root_password, self.config.vulnbox_pubkey.as_deref()),
        };

        let response: CreateServerResponse = self
            .http
            .post(format!("{}/servers", self.base_url))
            .bearer_auth(&self.config.api_token)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(ipv4) = response.server.public_net.ipv4 {
            store.set_external_address(team_id, Some(&ipv4.ip)).await?;
            store
                .set_vulnbox_status(team_id, VulnboxStatus::Running)
                .await?;
            info!(team_id, address = %ipv4.ip, "vulnbox running");
        }
        Ok(())
    }

    async fn reset(&self, team_id: i64) -> ApiResult<()> {
        let name = server_name(team_id);
        let server = self
            .find_server(&name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no server named {name}")))?;

        info!(team_id, server_id = server.id, "resetting vulnbox");
        self.http
            .post(format!("{}/servers/{}/actions/reset", self.base_url, server.id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn find_server(&self, name: &str) -> ApiResult<Option<Server>> {
        let response: ServersResponse = self
            .http
            .get(format!("{}/servers", self.base_url))
            .query(&[("name", name)])
            .bearer_auth(&self.config.api_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.servers.into_iter().next())
    }
}

fn server_name(team_id: i64) -> String {
    format!("team{team_id}")
}

fn cloud_init(root_password: &str, pubkey: Option<&str>) -> String {
    let mut user_data = format!(
        "#cloud-config\n\
        chpasswd:\n  expire: false\n  users:\n    - name: root\n      password: {root_password}\n      type: text\n\
        ssh_pwauth: true\n"
    );
    if let Some(pubkey) = pubkey {
        user_data.push_str(&format!("ssh_authorized_keys:\n  - {pubkey}\n"));
    }
    user_data
}
