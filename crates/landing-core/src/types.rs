use serde::{Deserialize, Serialize};

/// A registered team, keyed by the OAuth provider's team id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub ctftime_id: Option<i64>,
    pub name: String,
    pub confirmed: bool,
    pub logo_url: Option<String>,
    pub country_code: Option<String>,
}

/// Per-team vulnerable machine record. One row per team, created
/// together with the team itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vulnbox {
    pub team_id: i64,
    pub root_password: Option<String>,
    pub external_address: Option<String>,
    pub status: VulnboxStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VulnboxStatus {
    Uninitialized,
    Provisioning,
    Running,
}

impl VulnboxStatus {
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => Self::Provisioning,
            2 => Self::Running,
            _ => Self::Uninitialized,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Self::Uninitialized => 0,
            Self::Provisioning => 1,
            Self::Running => 2,
        }
    }
}

/// Address of a team inside the game network.
pub fn internal_address(team_id: i64) -> String {
    format!("10.0.0.{team_id}")
}
