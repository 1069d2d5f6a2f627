use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest span a single excuse request may cover.
pub const MAX_EXCUSE_DAYS: i64 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgazolasStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Igazolas {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    #[serde(default)]
    pub class_id: Option<i64>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub igazolas_type: String,
    pub reason: String,
    pub status: IgazolasStatus,
    #[serde(default)]
    pub teacher_note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIgazolasRequest {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub igazolas_type: String,
    pub reason: String,
}

impl NewIgazolasRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.reason.trim().is_empty() {
            return Err(AppError::Validation("reason must not be empty".to_string()));
        }
        if self.igazolas_type.trim().is_empty() {
            return Err(AppError::Validation("type must not be empty".to_string()));
        }
        validate_span(self.from_date, self.to_date)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIgazolasRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub igazolas_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UpdateIgazolasRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(reason) = &self.reason {
            if reason.trim().is_empty() {
                return Err(AppError::Validation("reason must not be empty".to_string()));
            }
        }
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            validate_span(from, to)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_note: Option<String>,
}

impl ReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        // rejections must tell the student why
        if self.decision == ReviewDecision::Reject
            && self.teacher_note.as_deref().map_or(true, |n| n.trim().is_empty())
        {
            return Err(AppError::Validation("a rejection needs a note".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IgazolasFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IgazolasStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
}

impl IgazolasFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            let value = match status {
                IgazolasStatus::Pending => "pending",
                IgazolasStatus::Approved => "approved",
                IgazolasStatus::Rejected => "rejected",
            };
            pairs.push(("status", value.to_string()));
        }
        if let Some(class_id) = self.class_id {
            pairs.push(("class_id", class_id.to_string()));
        }
        if let Some(student_id) = self.student_id {
            pairs.push(("student_id", student_id.to_string()));
        }
        pairs
    }
}

fn validate_span(from: NaiveDate, to: NaiveDate) -> Result<(), AppError> {
    if from > to {
        return Err(AppError::Validation(format!(
            "from_date {} is after to_date {}",
            from, to
        )));
    }
    let days = (to - from).num_days() + 1;
    if days > MAX_EXCUSE_DAYS {
        return Err(AppError::Validation(format!(
            "an excuse may cover at most {} days, got {}",
            MAX_EXCUSE_DAYS, days
        )));
    }
    Ok(())
}
