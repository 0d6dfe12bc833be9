use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

/// An optional inclusive date range, matched against a document's calendar
/// day (UTC). An absent bound leaves that side unbounded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidRange(String),
    InvalidDate(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidRange(r) => write!(f, "invalid range: {r}"),
            ParseError::InvalidDate(d) => write!(f, "invalid date: {d}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl FromStr for DateRange {
    type Err = ParseError;

    /// Accepts `START..END`, `START..`, `..END`, a bare `DATE` (that single
    /// day), or the empty string (unbounded). Dates are `%Y-%m-%d`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(DateRange::default());
        }
        if let Some((start, end)) = s.split_once("..") {
            if end.contains("..") {
                return Err(ParseError::InvalidRange(s.into()));
            }
            let mut range = DateRange::default();
            if !start.is_empty() {
                range.start = Some(parse_date(start)?);
            }
            if !end.is_empty() {
                range.end = Some(parse_date(end)?);
            }
            Ok(range)
        } else {
            let day = parse_date(s)?;
            Ok(DateRange {
                start: Some(day),
                end: Some(day),
            })
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ParseError::InvalidDate(s.into()))
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn matches(&self, timestamp: &DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}
