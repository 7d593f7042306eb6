//! Date-hour labels used as keys by the record endpoints.
//!
//! A label is either `"YYYY-MM-DD H"` (month and day zero-padded, hour
//! unpadded) or a bare hour `"H"`. Parsing also tolerates a clock-style
//! time portion such as `"2024-01-01 05:00:00"`; only the hour is kept.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::CoreError;

/// A calendar day as stored on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

impl CalendarDate {
    /// Build a date, rejecting days that do not exist on the calendar.
    pub fn new(year: i32, month: i32, day: i32) -> Result<Self, CoreError> {
        let valid = u32::try_from(month)
            .ok()
            .zip(u32::try_from(day).ok())
            .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
            .is_some();
        if !valid {
            return Err(CoreError::Validation(format!(
                "Invalid calendar date: {year}-{month}-{day}"
            )));
        }
        Ok(Self { year, month, day })
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for CalendarDate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("Invalid date '{s}', expected YYYY-MM-DD"));

        let mut parts = s.split('-');
        let (Some(y), Some(m), Some(d), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let year = y.trim().parse().map_err(|_| invalid())?;
        let month = m.trim().parse().map_err(|_| invalid())?;
        let day = d.trim().parse().map_err(|_| invalid())?;
        Self::new(year, month, day)
    }
}

/// A parsed date-hour key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateHourLabel {
    pub date: Option<CalendarDate>,
    pub hour: i32,
}

impl DateHourLabel {
    /// Label for an hour on a specific day.
    pub fn dated(date: CalendarDate, hour: i32) -> Self {
        Self {
            date: Some(date),
            hour,
        }
    }

    /// Label for an hour with no day attached.
    pub fn bare(hour: i32) -> Self {
        Self { date: None, hour }
    }
}

impl fmt::Display for DateHourLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.date {
            Some(date) => write!(f, "{date} {}", self.hour),
            None => write!(f, "{}", self.hour),
        }
    }
}

impl FromStr for DateHourLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(' ') {
            Some((date, time)) => Ok(Self::dated(date.parse()?, parse_hour(time)?)),
            None => Ok(Self::bare(parse_hour(s)?)),
        }
    }
}

/// Parse the hour out of `"H"`, `"HH"` or `"HH:MM[:SS]"`.
fn parse_hour(s: &str) -> Result<i32, CoreError> {
    let hour_part = s.trim().split(':').next().unwrap_or_default();
    match hour_part.parse::<i32>() {
        Ok(hour) if (0..=23).contains(&hour) => Ok(hour),
        _ => Err(CoreError::Validation(format!(
            "Invalid hour '{s}', expected 0-23"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn formats_dated_label_with_unpadded_hour() {
        let label = DateHourLabel::dated(CalendarDate::new(2024, 1, 2).unwrap(), 5);
        assert_eq!(label.to_string(), "2024-01-02 5");
    }

    #[test]
    fn formats_bare_hour() {
        assert_eq!(DateHourLabel::bare(17).to_string(), "17");
    }

    #[test]
    fn parses_dated_label() {
        let label: DateHourLabel = "2024-03-09 14".parse().unwrap();
        assert_eq!(label.date, Some(CalendarDate::new(2024, 3, 9).unwrap()));
        assert_eq!(label.hour, 14);
    }

    #[test]
    fn parses_padded_hour_and_clock_time() {
        let padded: DateHourLabel = "2024-03-09 05".parse().unwrap();
        assert_eq!(padded.hour, 5);

        let clock: DateHourLabel = "2024-03-09 05:00:00".parse().unwrap();
        assert_eq!(clock.hour, 5);
        assert_eq!(clock.to_string(), "2024-03-09 5");
    }

    #[test]
    fn parses_bare_hour() {
        let label: DateHourLabel = "7".parse().unwrap();
        assert_eq!(label, DateHourLabel::bare(7));
    }

    #[test]
    fn rejects_out_of_range_hour() {
        assert_matches!(
            "2024-01-01 24".parse::<DateHourLabel>(),
            Err(CoreError::Validation(_))
        );
        assert_matches!("-1".parse::<DateHourLabel>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert_matches!(
            "2023-02-29 1".parse::<DateHourLabel>(),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            "2024-13-01 1".parse::<DateHourLabel>(),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            "2024-01 1".parse::<DateHourLabel>(),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!("noon".parse::<DateHourLabel>(), Err(CoreError::Validation(_)));
        assert_matches!("".parse::<DateHourLabel>(), Err(CoreError::Validation(_)));
    }
}
