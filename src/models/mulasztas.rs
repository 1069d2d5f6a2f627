use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MulasztasKind {
    Absence,
    Late,
}

/// Absence entry as recorded by FTV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mulasztas {
    pub id: String,
    pub date: NaiveDate,
    pub period: u8,
    #[serde(default)]
    pub subject: Option<String>,
    pub kind: MulasztasKind,
    #[serde(default)]
    pub minutes_late: Option<u32>,
    #[serde(default)]
    pub excused: bool,
}

/// Which tier the backend should answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Cached,
    Live,
}

impl FetchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Cached => "cached",
            FetchMode::Live => "live",
        }
    }
}
