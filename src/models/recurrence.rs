//! Recurrence Model
//!
//! Describes how a recurring task repeats and generates its occurrence dates.
//! Occurrences are calendar dates; the caller decides the time of day.

use std::collections::VecDeque;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Upper bound on `interval`
pub const MAX_INTERVAL: u32 = 365;

/// Upper bound on `count`
pub const MAX_COUNT: u32 = 1000;

/// Upper bound on a preview request
pub const MAX_PREVIEW: usize = 100;

/// Default preview length
pub const DEFAULT_PREVIEW: usize = 10;

/// Periods scanned before an iterator gives up. Keeps a lookup for a date
/// far in the future from running unbounded.
const MAX_PERIODS: u64 = 100_000;

/// How often a task repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Day of the week, serialized as a three-letter lowercase name
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    /// Days since Monday (Monday = 0)
    pub fn offset(self) -> u64 {
        match self {
            DayOfWeek::Mon => 0,
            DayOfWeek::Tue => 1,
            DayOfWeek::Wed => 2,
            DayOfWeek::Thu => 3,
            DayOfWeek::Fri => 4,
            DayOfWeek::Sat => 5,
            DayOfWeek::Sun => 6,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Mon,
            Weekday::Tue => DayOfWeek::Tue,
            Weekday::Wed => DayOfWeek::Wed,
            Weekday::Thu => DayOfWeek::Thu,
            Weekday::Fri => DayOfWeek::Fri,
            Weekday::Sat => DayOfWeek::Sat,
            Weekday::Sun => DayOfWeek::Sun,
        }
    }
}

fn default_interval() -> u32 {
    1
}

/// Recurrence rule attached to a task or template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,

    /// Repeat every `interval` days / weeks / months / years
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Weekly only: the weekdays the task falls on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<DayOfWeek>,

    /// Monthly only: day of the month (1-31), clamped to short months
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,

    /// Last date an occurrence may fall on (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Total number of occurrences, the first one included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl RecurrenceRule {
    /// A rule repeating every `interval` units of `frequency`
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval,
            days_of_week: Vec::new(),
            day_of_month: None,
            end_date: None,
            count: None,
        }
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily, 1)
    }

    pub fn weekly_on(days: &[DayOfWeek]) -> Self {
        Self {
            days_of_week: days.to_vec(),
            ..Self::new(Frequency::Weekly, 1)
        }
    }

    pub fn monthly_on(day_of_month: u32) -> Self {
        Self {
            day_of_month: Some(day_of_month),
            ..Self::new(Frequency::Monthly, 1)
        }
    }

    /// Validate the rule on its own
    pub fn validate(&self) -> Result<(), RecurrenceError> {
        if self.interval == 0 || self.interval > MAX_INTERVAL {
            return Err(RecurrenceError::InvalidInterval(self.interval));
        }

        if !self.days_of_week.is_empty() && self.frequency != Frequency::Weekly {
            return Err(RecurrenceError::DaysOfWeekNotWeekly);
        }

        if let Some(day) = self.day_of_month {
            if self.frequency != Frequency::Monthly {
                return Err(RecurrenceError::DayOfMonthNotMonthly);
            }
            if !(1..=31).contains(&day) {
                return Err(RecurrenceError::InvalidDayOfMonth(day));
            }
        }

        if let Some(count) = self.count {
            if count == 0 || count > MAX_COUNT {
                return Err(RecurrenceError::InvalidCount(count));
            }
        }

        Ok(())
    }

    /// Validate the rule against the date the series starts on
    pub fn validate_for(&self, start: NaiveDate) -> Result<(), RecurrenceError> {
        self.validate()?;
        if let Some(end) = self.end_date {
            if end < start {
                return Err(RecurrenceError::EndBeforeStart { start, end });
            }
        }
        Ok(())
    }

    /// Iterate over the occurrence dates of a series starting at `start`
    pub fn occurrences(&self, start: NaiveDate) -> Occurrences<'_> {
        let mut days = self.days_of_week.clone();
        days.sort_unstable();
        days.dedup();

        Occurrences {
            rule: self,
            start,
            days,
            period: 0,
            pending: VecDeque::new(),
            emitted: 0,
            exhausted: false,
        }
    }

    /// The first `limit` occurrences of a series starting at `start`
    pub fn preview(&self, start: NaiveDate, limit: usize) -> Result<Vec<NaiveDate>, RecurrenceError> {
        self.validate_for(start)?;
        if limit == 0 || limit > MAX_PREVIEW {
            return Err(RecurrenceError::InvalidPreviewLimit(limit));
        }
        Ok(self.occurrences(start).take(limit).collect())
    }

    /// The first occurrence strictly after `after`, with its zero-based
    /// position in the series. `None` once the series has ended.
    pub fn occurrence_after(&self, start: NaiveDate, after: NaiveDate) -> Option<(u32, NaiveDate)> {
        self.occurrences(start)
            .enumerate()
            .find(|(_, date)| *date > after)
            .and_then(|(index, date)| u32::try_from(index).ok().map(|i| (i, date)))
    }

    /// Candidate dates contributed by period `k`, in calendar order
    fn candidates(&self, start: NaiveDate, days: &[DayOfWeek], k: u64) -> Option<Vec<NaiveDate>> {
        let step = k.checked_mul(u64::from(self.interval))?;

        let dates = match self.frequency {
            Frequency::Daily => vec![start.checked_add_days(Days::new(step))?],
            Frequency::Weekly if days.is_empty() => {
                vec![start.checked_add_days(Days::new(step.checked_mul(7)?))?]
            }
            Frequency::Weekly => {
                let monday = start
                    .checked_sub_days(Days::new(u64::from(start.weekday().num_days_from_monday())))?;
                let week = monday.checked_add_days(Days::new(step.checked_mul(7)?))?;
                days.iter()
                    .filter_map(|day| week.checked_add_days(Days::new(day.offset())))
                    .filter(|date| *date >= start)
                    .collect()
            }
            Frequency::Monthly => {
                let months = i64::from(start.month0()) + i64::try_from(step).ok()?;
                let year = i64::from(start.year()) + months.div_euclid(12);
                let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;
                let day = self.day_of_month.unwrap_or_else(|| start.day());
                let date = clamped_date(i32::try_from(year).ok()?, month, day)?;
                if date >= start {
                    vec![date]
                } else {
                    Vec::new()
                }
            }
            Frequency::Yearly => {
                let year = i64::from(start.year()) + i64::try_from(step).ok()?;
                vec![clamped_date(i32::try_from(year).ok()?, start.month(), start.day())?]
            }
        };

        Some(dates)
    }
}

/// Iterator over the occurrence dates of a rule
#[derive(Debug)]
pub struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    start: NaiveDate,
    days: Vec<DayOfWeek>,
    period: u64,
    pending: VecDeque<NaiveDate>,
    emitted: u32,
    exhausted: bool,
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            if self.rule.count.is_some_and(|count| self.emitted >= count) {
                return None;
            }

            if let Some(date) = self.pending.pop_front() {
                if self.rule.end_date.is_some_and(|end| date > end) {
                    self.exhausted = true;
                    self.pending.clear();
                    return None;
                }
                self.emitted += 1;
                return Some(date);
            }

            if self.exhausted || self.period >= MAX_PERIODS {
                return None;
            }

            match self.rule.candidates(self.start, &self.days, self.period) {
                Some(dates) => self.pending.extend(dates),
                None => self.exhausted = true,
            }
            self.period += 1;
        }
    }
}

/// Number of days in a month
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// `year-month-day`, with `day` clamped to the last day of the month
fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

/// Recurrence validation errors
#[derive(Debug, thiserror::Error)]
pub enum RecurrenceError {
    #[error("Recurrence interval {0} is invalid (must be 1-365)")]
    InvalidInterval(u32),

    #[error("days_of_week only applies to weekly recurrence")]
    DaysOfWeekNotWeekly,

    #[error("day_of_month only applies to monthly recurrence")]
    DayOfMonthNotMonthly,

    #[error("Day of month {0} is invalid (must be 1-31)")]
    InvalidDayOfMonth(u32),

    #[error("Occurrence count {0} is invalid (must be 1-1000)")]
    InvalidCount(u32),

    #[error("Recurrence ends on {end}, before it starts on {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Preview limit {0} is invalid (must be 1-100)")]
    InvalidPreviewLimit(usize),

    #[error("A recurring task needs a due date")]
    MissingDueDate,
}
