use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::messages::Scoreboard;

/// Extra delay after a round boundary before re-polling, so the engine
/// has time to publish the next snapshot.
const REFRESH_GRACE_SECS: f64 = 1.5;

/// Where the displayed round sits relative to the wall clock, and when
/// a client showing it should fetch again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSchedule {
    pub current_round: u32,
    /// Round length in seconds.
    pub round_length: u64,
    /// Seconds until the next round boundary. Negative once a newer
    /// snapshot should already exist.
    pub time_left_secs: f64,
    /// Seconds a client should wait before re-polling the current
    /// snapshot. Only meaningful while `is_current_round` holds.
    pub refresh_in_secs: f64,
    pub is_current_round: bool,
}

impl RoundSchedule {
    pub fn from_scoreboard(scoreboard: &Scoreboard, now: DateTime<Utc>) -> Self {
        let boundary =
            scoreboard.end_timestamp + Duration::seconds(scoreboard.round_length as i64);
        let time_left_secs = (boundary - now).num_milliseconds() as f64 / 1000.0;

        Self {
            current_round: scoreboard.current_round,
            round_length: scoreboard.round_length,
            time_left_secs,
            refresh_in_secs: time_left_secs.max(0.0) + REFRESH_GRACE_SECS,
            is_current_round: time_left_secs >= 0.0,
        }
    }
}
