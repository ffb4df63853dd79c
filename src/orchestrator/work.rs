use std::fmt;

use serde::{Deserialize, Serialize};
use time::Weekday;

use super::calendar::{label, WEEK_DAYS};

/// Which of the two parallel plans for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Alternative {
    Primary = 1,
    Substitute = 2,
}

impl Alternative {
    pub const ALL: [Alternative; 2] = [Alternative::Primary, Alternative::Substitute];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn other(self) -> Self {
        match self {
            Alternative::Primary => Alternative::Substitute,
            Alternative::Substitute => Alternative::Primary,
        }
    }

    /// Field name of this alternative's plan in the daily document.
    pub fn field(self) -> &'static str {
        match self {
            Alternative::Primary => "planos.1",
            Alternative::Substitute => "planos.2",
        }
    }
}

impl TryFrom<u8> for Alternative {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Alternative::Primary),
            2 => Ok(Alternative::Substitute),
            other => Err(format!("alternative must be 1 or 2, got {}", other)),
        }
    }
}

impl From<Alternative> for u8 {
    fn from(a: Alternative) -> u8 {
        a.index()
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    pub day: Weekday,
    pub alternative: Alternative,
}

impl WorkItem {
    pub fn day_name(&self) -> &'static str {
        label(self.day)
    }

    /// 0-based position in the plan week, Monday = 0.
    pub fn day_position(&self) -> u8 {
        self.day.number_days_from_monday()
    }

    /// 1-based completion index: `day_position * 2 + alternative`.
    pub fn job_index(&self) -> u8 {
        self.day_position() * 2 + self.alternative.index()
    }
}

/// Every (day, alternative) job of a run, Monday to Sunday, alternative 1 before 2.
pub fn work_items() -> Vec<WorkItem> {
    WEEK_DAYS
        .iter()
        .flat_map(|(day, _)| {
            Alternative::ALL.into_iter().map(move |alternative| WorkItem {
                day: *day,
                alternative,
            })
        })
        .collect()
}
