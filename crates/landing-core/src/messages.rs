use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::VulnboxStatus;

/// Everything a logged-in team sees about itself on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetailsMessage {
    pub id: i64,
    pub confirmed: bool,
    pub team_name: String,
    pub vpn_config_available: bool,
    pub root_password: Option<String>,
    pub external_ip_address: Option<String>,
    pub internal_ip_address: String,
    pub vulnbox_status: VulnboxStatus,
}

/// Public entry in the confirmed-teams list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedTeamMessage {
    pub name: String,
    pub ctftime_id: Option<i64>,
}

/// Scoreboard snapshot as written by the game engine. Fields the
/// frontend does not consume are ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoreboard {
    pub current_round: u32,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    /// Round length in seconds.
    #[serde(default = "default_round_length")]
    pub round_length: u64,
    #[serde(default)]
    pub services: Vec<ScoreboardService>,
    #[serde(default)]
    pub teams: Vec<ScoreboardTeam>,
}

fn default_round_length() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardService {
    pub service_id: i64,
    pub service_name: String,
    #[serde(default)]
    pub max_stored_flags: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardTeam {
    pub team_id: i64,
    pub team_name: String,
    #[serde(default)]
    pub total_score: f64,
    #[serde(default)]
    pub attack_score: f64,
    #[serde(default)]
    pub defense_score: f64,
    #[serde(default)]
    pub service_level_agreement_score: f64,
    #[serde(default)]
    pub service_details: Vec<ScoreboardServiceDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardServiceDetails {
    pub service_id: i64,
    #[serde(default)]
    pub attack_score: f64,
    #[serde(default)]
    pub defense_score: f64,
    #[serde(default)]
    pub service_level_agreement_score: f64,
    #[serde(default)]
    pub service_status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoreboard_parses_engine_snapshot() {
        let json = r#"{
            "currentRound": 42,
            "startTimestamp": "2026-07-18T12:00:00Z",
            "endTimestamp": "2026-07-18T12:01:00Z",
            "roundLength": 60,
            "services": [
                {"serviceId": 1, "serviceName": "noter", "maxStoredFlags": 10}
            ],
            "teams": [
                {
                    "teamId": 7,
                    "teamName": "ENOFLAG",
                    "totalScore": 1234.5,
                    "serviceDetails": [
                        {"serviceId": 1, "attackScore": 100.0, "serviceStatus": "OK"}
                    ]
                }
            ]
        }"#;

        let scoreboard: Scoreboard = serde_json::from_str(json).unwrap();
        assert_eq!(scoreboard.current_round, 42);
        assert_eq!(scoreboard.round_length, 60);
        assert_eq!(scoreboard.services[0].service_name, "noter");
        assert_eq!(scoreboard.teams[0].service_details[0].service_id, 1);
    }

    #[test]
    fn round_length_defaults_when_absent() {
        let json = r#"{
            "currentRound": 0,
            "startTimestamp": "2026-07-18T12:00:00Z",
            "endTimestamp": "2026-07-18T12:01:00Z"
        }"#;

        let scoreboard: Scoreboard = serde_json::from_str(json).unwrap();
        assert_eq!(scoreboard.round_length, 60);
        assert!(scoreboard.teams.is_empty());
    }
}
