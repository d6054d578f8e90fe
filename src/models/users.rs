use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Last check-in time per place id.
pub type PlaceCheckIns = HashMap<String, DateTime<Utc>>;

pub const CHECK_IN_HISTORY_TYPE: &str = "Place Check-in";

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsHistoryEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub place_id: String,
    pub points_earned: i32,
    pub timestamp: DateTime<Utc>,
}

/// Points and check-in state of a single user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserLedger {
    pub id: String,
    pub points: i32,
    pub checked_in_places: Vec<String>,
    pub place_check_ins: PlaceCheckIns,
    pub rewards: Vec<String>,
    pub points_history: Vec<PointsHistoryEntry>,
    pub push_token: Option<String>,
}

impl UserLedger {
    /// Fresh ledger as created at signup.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn last_check_in_at(&self, place_id: &str) -> Option<DateTime<Utc>> {
        self.place_check_ins.get(place_id).copied()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserLedgerRow {
    pub id: String,
    pub points: i32,
    pub checked_in_places: Vec<String>,
    pub place_check_ins: Json<PlaceCheckIns>,
    pub rewards: Vec<String>,
    pub points_history: Json<Vec<PointsHistoryEntry>>,
    pub push_token: Option<String>,
}

impl From<UserLedgerRow> for UserLedger {
    fn from(row: UserLedgerRow) -> Self {
        Self {
            id: row.id,
            points: row.points,
            checked_in_places: row.checked_in_places,
            place_check_ins: row.place_check_ins.0,
            rewards: row.rewards,
            points_history: row.points_history.0,
            push_token: row.push_token,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCheckIn {
    pub user_id: Option<String>,
    pub place_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckInOutcome {
    pub points_earned: i32,
    pub reward_given: bool,
    pub reward: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPoints {
    pub points: i32,
    pub points_history: Vec<PointsHistoryEntry>,
}

impl From<UserLedger> for UserPoints {
    fn from(ledger: UserLedger) -> Self {
        Self {
            points: ledger.points,
            points_history: ledger.points_history,
        }
    }
}
