// src/delay.rs

//! Calendar-relative activation offsets.
//!
//! A [`Delay`] is an ordered list of calendar steps (years, months, days).
//! Applying a delay walks the steps in order, so "1 month" lands on a
//! different number of days depending on the base date. For the same reason
//! delays are compared by applying both to a reference date instead of by
//! comparing their components.
//!
//! Sums are kept as step lists rather than being folded into a single step:
//! `Jan 31 + 1 month + 1 month` is `Mar 28`, while `Jan 31 + 2 months` is
//! `Mar 31`.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Days, Local, Months, NaiveDate};
use serde::Deserialize;

/// Years used by [`Delay::max`]; far beyond any realistic offset while still
/// representable when applied to present-day dates.
const MAX_YEARS: i32 = 99_999;

/// Today's date in the local timezone; the reference point for "now".
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A single calendar step. Components may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarOffset {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl CalendarOffset {
    fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }

    /// Years first, then months, then days; month-ends clamp.
    fn apply_to(&self, date: NaiveDate) -> NaiveDate {
        let date = shift_months(date, self.years.saturating_mul(12));
        let date = shift_months(date, self.months);
        shift_days(date, self.days)
    }
}

impl fmt::Display for CalendarOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.years != 0 {
            parts.push(format!("{}y", self.years));
        }
        if self.months != 0 {
            parts.push(format!("{}m", self.months));
        }
        if self.days != 0 {
            parts.push(format!("{}d", self.days));
        }
        write!(f, "{}", parts.join(" "))
    }
}

fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(if months >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

fn shift_days(date: NaiveDate, days: i32) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(u64::from(days.unsigned_abs())))
    } else {
        date.checked_sub_days(Days::new(u64::from(days.unsigned_abs())))
    };
    shifted.unwrap_or(if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// A composable, calendar-relative time offset.
///
/// The empty step list is the zero delay. Zero steps are never stored, so
/// `Delay::new(0, 0, 0) == Delay::none()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "CalendarOffset")]
pub struct Delay {
    steps: Vec<CalendarOffset>,
}

impl From<CalendarOffset> for Delay {
    fn from(step: CalendarOffset) -> Self {
        Self::from_step(step)
    }
}

impl Delay {
    fn from_step(step: CalendarOffset) -> Self {
        let steps = if step.is_zero() { Vec::new() } else { vec![step] };
        Self { steps }
    }

    pub fn new(years: i32, months: i32, days: i32) -> Self {
        Self::from_step(CalendarOffset { years, months, days })
    }

    /// The zero offset.
    pub fn none() -> Self {
        Self::default()
    }

    /// Sentinel larger than any realistic offset.
    pub fn max() -> Self {
        Self::new(MAX_YEARS, 0, 0)
    }

    pub fn days(days: i32) -> Self {
        Self::new(0, 0, days)
    }

    pub fn months(months: i32) -> Self {
        Self::new(0, months, 0)
    }

    pub fn years(years: i32) -> Self {
        Self::new(years, 0, 0)
    }

    /// Whole days from `from` to `to` (negative when `to` is in the past).
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        let days = to.signed_duration_since(from).num_days();
        let days = days.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        Self::days(days)
    }

    /// Offset from today to `target`.
    pub fn until(target: NaiveDate) -> Self {
        Self::between(today(), target)
    }

    pub fn is_none(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[CalendarOffset] {
        &self.steps
    }

    /// `date` advanced by every step in order, saturating at the calendar
    /// bounds.
    pub fn apply_to(&self, date: NaiveDate) -> NaiveDate {
        self.steps.iter().fold(date, |acc, step| step.apply_to(acc))
    }

    /// Sequential application of `self` then `other`.
    pub fn add(&self, other: &Delay) -> Delay {
        let mut steps = self.steps.clone();
        steps.extend_from_slice(&other.steps);
        Delay { steps }
    }

    /// Compare by the dates both delays produce from `base`.
    pub fn compare_at(&self, other: &Delay, base: NaiveDate) -> Ordering {
        self.apply_to(base).cmp(&other.apply_to(base))
    }

    pub fn less_than(&self, other: &Delay) -> bool {
        self.compare_at(other, today()) == Ordering::Less
    }

    pub fn greater_than(&self, other: &Delay) -> bool {
        self.compare_at(other, today()) == Ordering::Greater
    }
}

impl std::ops::Add for Delay {
    type Output = Delay;

    fn add(mut self, rhs: Delay) -> Delay {
        self.steps.extend(rhs.steps);
        self
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        let parts: Vec<String> = self.steps.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join(" + "))
    }
}
