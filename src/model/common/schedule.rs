//! When each position is open for voting.
//!
//! Every position is voted on during one day of the election month, within
//! fixed local opening hours. "Local" is UTC shifted by a configured offset,
//! so the server's own timezone never matters.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::position::Position;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The positions voted on during a single day of the election month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingDay {
    pub day: u32,
    pub positions: Vec<Position>,
}

/// The whole election timetable, as configured under `election` in `Rocket.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSchedule {
    /// Month of the election, 1-12.
    pub month: u32,
    /// First hour (local, inclusive) that ballots are accepted on a voting day.
    pub opens_at: u32,
    /// Hour (local, exclusive) that voting stops; 24 means midnight.
    pub closes_at: u32,
    /// Offset of local election time from UTC.
    pub utc_offset_minutes: i32,
    pub days: Vec<VotingDay>,
}

/// Where a position stands at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VotingStatus {
    UnknownPosition,
    Open,
    OutsideHours { opens_at: u32, closes_at: u32 },
    NotYetOpen { month: u32, day: u32 },
    Ended,
    Closed,
}

impl VotingStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Apply an administrator's closure on top of the timetable.
    /// Unknown positions stay unknown.
    pub fn closed_if(self, closed: bool) -> Self {
        match self {
            Self::UnknownPosition => self,
            _ if closed => Self::Closed,
            _ => self,
        }
    }

    /// Explanation shown to a voter who cannot vote right now.
    pub fn message(&self) -> Option<String> {
        match *self {
            Self::Open => None,
            Self::UnknownPosition => Some("Invalid position".to_string()),
            Self::OutsideHours {
                opens_at,
                closes_at,
            } => Some(format!(
                "Voting is only open from {} to {}",
                format_hour(opens_at),
                format_hour(closes_at)
            )),
            Self::NotYetOpen { month, day } => Some(format!(
                "Voting for this position opens on {} {day}",
                month_name(month)
            )),
            Self::Ended => Some("Voting for this position has ended".to_string()),
            Self::Closed => Some("Voting for this position has been closed".to_string()),
        }
    }
}

impl ElectionSchedule {
    pub fn days(&self) -> &[VotingDay] {
        &self.days
    }

    /// The day of the election month on which `position` is voted for.
    pub fn voting_day(&self, position: &Position) -> Option<u32> {
        self.days
            .iter()
            .find(|day| day.positions.contains(position))
            .map(|day| day.day)
    }

    /// Every scheduled position with its voting day, in timetable order.
    pub fn positions(&self) -> impl Iterator<Item = (&Position, u32)> {
        let mut days = self.days.iter().collect::<Vec<_>>();
        days.sort_by_key(|day| day.day);
        days.into_iter()
            .flat_map(|day| day.positions.iter().map(move |position| (position, day.day)))
    }

    /// Wall-clock time at the election's location.
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.naive_utc() + Duration::minutes(self.utc_offset_minutes.into())
    }

    /// Whether `position` can be voted for at `now`, going by the timetable alone.
    pub fn status(&self, position: &Position, now: DateTime<Utc>) -> VotingStatus {
        let day = match self.voting_day(position) {
            Some(day) => day,
            None => return VotingStatus::UnknownPosition,
        };

        let local = self.local_time(now);
        let today = local.date();
        if today.month() == self.month && today.day() == day {
            if (self.opens_at..self.closes_at).contains(&local.hour()) {
                VotingStatus::Open
            } else {
                VotingStatus::OutsideHours {
                    opens_at: self.opens_at,
                    closes_at: self.closes_at,
                }
            }
        } else {
            match NaiveDate::from_ymd_opt(today.year(), self.month, day) {
                Some(voting_date) if today < voting_date => VotingStatus::NotYetOpen {
                    month: self.month,
                    day,
                },
                _ => VotingStatus::Ended,
            }
        }
    }

    /// Reject timetables that could never open, or that schedule a position twice.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=12).contains(&self.month) {
            return Err(format!("month {} is not between 1 and 12", self.month));
        }
        if self.opens_at >= self.closes_at || self.closes_at > 24 {
            return Err(format!(
                "opening hours {}-{} are not a valid range within a day",
                self.opens_at, self.closes_at
            ));
        }
        let mut seen = HashSet::new();
        for voting_day in &self.days {
            // 2000 is a leap year, so February 29 is accepted.
            if NaiveDate::from_ymd_opt(2000, self.month, voting_day.day).is_none() {
                return Err(format!(
                    "day {} is not a day of {}",
                    voting_day.day,
                    month_name(self.month)
                ));
            }
            for position in &voting_day.positions {
                if !seen.insert(position) {
                    return Err(format!("position '{position}' is scheduled more than once"));
                }
            }
        }
        Ok(())
    }
}

fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("Month")
}

/// `8` -> `8 AM`, `20` -> `8 PM`, `0` and `24` -> `12 AM`.
fn format_hour(hour: u32) -> String {
    match hour % 24 {
        0 => "12 AM".to_string(),
        h @ 1..=11 => format!("{h} AM"),
        12 => "12 PM".to_string(),
        h => format!("{} PM", h - 12),
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl ElectionSchedule {
        /// The real timetable: January, 8 AM to 8 PM West Africa Time.
        pub fn january_example() -> Self {
            let day = |day, positions: &[&str]| VotingDay {
                day,
                positions: positions.iter().map(|p| p.parse().unwrap()).collect(),
            };
            Self {
                month: 1,
                opens_at: 8,
                closes_at: 20,
                utc_offset_minutes: 60,
                days: vec![
                    day(6, &["president", "vice-president"]),
                    day(7, &["secretary-general", "assistant-secretary-general"]),
                    day(8, &["treasurer", "financial-secretary"]),
                    day(9, &["organizing-secretary", "pro"]),
                    day(10, &["legal-adviser", "provost-marshal"]),
                ],
            }
        }

        /// Open all day today for president, vice-president and treasurer.
        /// Provost marshal is scheduled for a different day.
        pub fn open_today_example() -> Self {
            let now = Utc::now();
            let other_day = if now.day() == 1 { 2 } else { 1 };
            Self {
                month: now.month(),
                opens_at: 0,
                closes_at: 24,
                utc_offset_minutes: 0,
                days: vec![
                    VotingDay {
                        day: now.day(),
                        positions: vec![
                            Position::president(),
                            Position::vice_president(),
                            Position::treasurer(),
                        ],
                    },
                    VotingDay {
                        day: other_day,
                        positions: vec![Position::provost_marshal()],
                    },
                ],
            }
        }
    }
}
