//! Attendance requirement resolution ("tanév rendje").
//!
//! A day is resolved by the first matching rule: an override for the student's
//! class, then a global override, then membership in a school break, and
//! finally the weekday default (Monday to Friday required).

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::{ScheduleSnapshot, StudentClass};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceReason {
    ClassOverride { reason: String },
    GlobalOverride { reason: String },
    Break { name: String },
    SchoolDay,
    Weekend,
}

impl fmt::Display for AttendanceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceReason::ClassOverride { reason } => with_detail(f, "class override", reason),
            AttendanceReason::GlobalOverride { reason } => with_detail(f, "global override", reason),
            AttendanceReason::Break { name } => f.write_str(name),
            AttendanceReason::SchoolDay => f.write_str("regular school day"),
            AttendanceReason::Weekend => f.write_str("weekend"),
        }
    }
}

fn with_detail(f: &mut fmt::Formatter<'_>, label: &str, detail: &str) -> fmt::Result {
    if detail.trim().is_empty() {
        f.write_str(label)
    } else {
        write!(f, "{}: {}", label, detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceDecision {
    pub required: bool,
    pub reason: AttendanceReason,
}

pub fn explain_attendance(
    date: NaiveDate,
    student_class: Option<&StudentClass>,
    schedule: &ScheduleSnapshot,
) -> AttendanceDecision {
    if let Some(class) = student_class {
        if let Some(o) = schedule.class_override(date, class.id) {
            return AttendanceDecision {
                required: o.is_required,
                reason: AttendanceReason::ClassOverride {
                    reason: o.reason.clone(),
                },
            };
        }
    }

    if let Some(o) = schedule.global_override(date) {
        return AttendanceDecision {
            required: o.is_required,
            reason: AttendanceReason::GlobalOverride {
                reason: o.reason.clone(),
            },
        };
    }

    if let Some(school_break) = schedule.break_containing(date) {
        return AttendanceDecision {
            required: false,
            reason: AttendanceReason::Break {
                name: school_break.display_name(),
            },
        };
    }

    if is_weekday(date) {
        AttendanceDecision {
            required: true,
            reason: AttendanceReason::SchoolDay,
        }
    } else {
        AttendanceDecision {
            required: false,
            reason: AttendanceReason::Weekend,
        }
    }
}

pub fn is_attendance_required(
    date: NaiveDate,
    student_class: Option<&StudentClass>,
    schedule: &ScheduleSnapshot,
) -> bool {
    explain_attendance(date, student_class, schedule).required
}

/// True when no day in `[from, to]` requires attendance. An inverted range has
/// no days and is therefore trivially free.
pub fn is_range_non_attendance(
    from: NaiveDate,
    to: NaiveDate,
    student_class: Option<&StudentClass>,
    schedule: &ScheduleSnapshot,
) -> bool {
    days_between(from, to).all(|day| !is_attendance_required(day, student_class, schedule))
}

pub fn required_days_in_range(
    from: NaiveDate,
    to: NaiveDate,
    student_class: Option<&StudentClass>,
    schedule: &ScheduleSnapshot,
) -> Vec<NaiveDate> {
    days_between(from, to)
        .filter(|day| is_attendance_required(*day, student_class, schedule))
        .collect()
}

/// Every calendar day from `from` to `to`, both inclusive.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |day| *day <= to)
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
