use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    Autumn,
    Winter,
    Spring,
    Summer,
    Graduation,
    RemoteInstruction,
    #[serde(other)]
    Other,
}

impl BreakType {
    /// Label used when a break carries no display name.
    pub fn label(&self) -> &'static str {
        match self {
            BreakType::Autumn => "autumn break",
            BreakType::Winter => "winter break",
            BreakType::Spring => "spring break",
            BreakType::Summer => "summer break",
            BreakType::Graduation => "graduation break",
            BreakType::RemoteInstruction => "remote instruction",
            BreakType::Other => "school break",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolBreak {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub break_type: BreakType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SchoolBreak {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from_date <= date && date <= self.to_date
    }

    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.break_type.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub date: NaiveDate,
    pub is_required: bool,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub reason: String,
}

impl Override {
    pub fn is_global(&self) -> bool {
        self.class_id.is_none()
    }
}

/// Breaks and overrides loaded for one query range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub breaks: Vec<SchoolBreak>,
    #[serde(default)]
    pub overrides: Vec<Override>,
}

impl ScheduleSnapshot {
    pub fn new(breaks: Vec<SchoolBreak>, overrides: Vec<Override>) -> Self {
        Self { breaks, overrides }
    }

    pub fn is_empty(&self) -> bool {
        self.breaks.is_empty() && self.overrides.is_empty()
    }

    pub fn class_override(&self, date: NaiveDate, class_id: i64) -> Option<&Override> {
        self.overrides
            .iter()
            .find(|o| o.date == date && o.class_id == Some(class_id))
    }

    pub fn global_override(&self, date: NaiveDate) -> Option<&Override> {
        self.overrides.iter().find(|o| o.date == date && o.is_global())
    }

    pub fn break_containing(&self, date: NaiveDate) -> Option<&SchoolBreak> {
        self.breaks.iter().find(|b| b.contains(date))
    }
}

/// Class descriptor; only the id takes part in resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentClass {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

impl StudentClass {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}
