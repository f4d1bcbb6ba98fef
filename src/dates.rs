//! Calendar helpers shared by the collectors and the dataset tools.

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::{RailcastError, Result};

/// Parse a day given as `YYYY-MM-DD`, `YYYYMMDD` or an ISO date-time.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let s = input.trim();
    let parsed = if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        NaiveDate::parse_from_str(s, "%Y%m%d").ok()
    } else if s.len() == 10 {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    } else {
        parse_date_time(s).map(|dt| dt.date())
    };

    parsed.ok_or_else(|| {
        RailcastError::validation(format!(
            "Invalid date: {input}. Use YYYY-MM-DD or YYYYMMDD"
        ))
    })
}

fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone)]
pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn inclusive(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
        }
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current
            .checked_add_days(Days::new(1))
            .filter(|day| *day <= self.end);
        Some(current)
    }
}

/// Values a URL template may reference for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFields {
    pub date: String,
    pub yyyy: String,
    pub mm: String,
    pub dd: String,
}

impl TemplateFields {
    #[must_use]
    pub fn for_date(day: NaiveDate) -> Self {
        Self {
            date: day.format("%Y%m%d").to_string(),
            yyyy: day.format("%Y").to_string(),
            mm: day.format("%m").to_string(),
            dd: day.format("%d").to_string(),
        }
    }
}
