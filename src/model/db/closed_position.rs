use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::position::Position;

/// A position an administrator has closed: no more ballots, and its tally is
/// hidden from the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub position: Position,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub closed_at: DateTime<Utc>,
}
