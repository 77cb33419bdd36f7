use serde::{Deserialize, Serialize};

use crate::model::common::{
    position::Position,
    schedule::{VotingDay, VotingStatus},
};

/// A position with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PositionSummary {
    pub position: Position,
    pub title: String,
}

impl From<&Position> for PositionSummary {
    fn from(position: &Position) -> Self {
        Self {
            position: position.clone(),
            title: position.title(),
        }
    }
}

/// Everything voted on during one day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScheduleDay {
    pub month: u32,
    pub day: u32,
    pub positions: Vec<PositionSummary>,
}

impl ScheduleDay {
    pub fn new(month: u32, voting_day: &VotingDay) -> Self {
        Self {
            month,
            day: voting_day.day,
            positions: voting_day.positions.iter().map(Into::into).collect(),
        }
    }
}

/// Whether a position is taking votes, and why not if it isn't.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PositionStatus {
    pub position: Position,
    pub title: String,
    pub day: Option<u32>,
    pub open: bool,
    pub status: VotingStatus,
    pub message: Option<String>,
}

impl PositionStatus {
    pub fn new(position: &Position, day: Option<u32>, status: VotingStatus) -> Self {
        Self {
            position: position.clone(),
            title: position.title(),
            day,
            open: status.is_open(),
            status,
            message: status.message(),
        }
    }
}

/// Request body for closing a position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClosePositionRequest {
    pub position: Position,
}
