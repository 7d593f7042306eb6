//! Time-series records and their discriminators.
//!
//! Records sharing a [`DataType`] form one replaceable batch: writers always
//! delete every record of the discriminator and insert the new batch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::label::{CalendarDate, DateHourLabel};

/// Prefix of per-user prediction discriminators.
pub const USER_PREFIX: &str = "user-";

// ---------------------------------------------------------------------------
// Discriminator
// ---------------------------------------------------------------------------

/// The `dataType` discriminator partitioning the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DataType {
    /// Temperature readings (`temp`).
    Temp,
    /// Cached actual consumption (`act`).
    Actual,
    /// Cached average consumption (`avg`).
    Average,
    /// Prediction output for one user (`user-<name>`).
    User(String),
}

impl DataType {
    /// Discriminator for a user's prediction results.
    pub fn user(username: &str) -> Self {
        Self::User(username.to_string())
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Self::Temp => "temp".into(),
            Self::Actual => "act".into(),
            Self::Average => "avg".into(),
            Self::User(name) => format!("{USER_PREFIX}{name}").into(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temp" => Ok(Self::Temp),
            "act" => Ok(Self::Actual),
            "avg" => Ok(Self::Average),
            other => match other.strip_prefix(USER_PREFIX) {
                Some(name) if !name.is_empty() => Ok(Self::User(name.to_string())),
                _ => Err(CoreError::Validation(format!(
                    "Unknown data type '{other}'"
                ))),
            },
        }
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().into_owned()
    }
}

impl TryFrom<String> for DataType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One hourly value in the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesRecord {
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<i32>,
    pub hour: i32,
    pub value: f64,
}

impl TimeSeriesRecord {
    pub fn from_label(data_type: DataType, label: &DateHourLabel, value: f64) -> Self {
        Self {
            data_type,
            year: label.date.map(|d| d.year),
            month: label.date.map(|d| d.month),
            day: label.date.map(|d| d.day),
            hour: label.hour,
            value,
        }
    }

    /// The calendar day, if all three date components are present.
    pub fn date(&self) -> Option<CalendarDate> {
        match (self.year, self.month, self.day) {
            (Some(year), Some(month), Some(day)) => Some(CalendarDate { year, month, day }),
            _ => None,
        }
    }

    pub fn label(&self) -> DateHourLabel {
        DateHourLabel {
            date: self.date(),
            hour: self.hour,
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction views
// ---------------------------------------------------------------------------

/// A `{date, yhat}` point returned by the polling endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub date: String,
    pub yhat: f64,
}

/// One point per record, labelled `"YYYY-MM-DD H"`.
pub fn hourly_points(records: &[TimeSeriesRecord]) -> Vec<PredictionPoint> {
    records
        .iter()
        .map(|r| PredictionPoint {
            date: r.label().to_string(),
            yhat: r.value,
        })
        .collect()
}

/// Sum consecutive records of the same day, in iteration order.
///
/// Only adjacent records merge: a day interrupted by another day's record
/// yields two entries. Records without a full date are skipped.
pub fn aggregate_by_day(records: &[TimeSeriesRecord]) -> Vec<PredictionPoint> {
    let mut points: Vec<PredictionPoint> = Vec::new();
    for record in records {
        let Some(date) = record.date() else {
            continue;
        };
        let date = date.to_string();
        match points.last_mut() {
            Some(last) if last.date == date => last.yhat += record.value,
            _ => points.push(PredictionPoint {
                date,
                yhat: record.value,
            }),
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn user_record(day: i32, hour: i32, value: f64) -> TimeSeriesRecord {
        TimeSeriesRecord {
            data_type: DataType::user("alice"),
            year: Some(2024),
            month: Some(1),
            day: Some(day),
            hour,
            value,
        }
    }

    #[test]
    fn data_type_round_trips_through_strings() {
        for (s, dt) in [
            ("temp", DataType::Temp),
            ("act", DataType::Actual),
            ("avg", DataType::Average),
            ("user-bob", DataType::user("bob")),
        ] {
            assert_eq!(s.parse::<DataType>().unwrap(), dt);
            assert_eq!(dt.to_string(), s);
        }
    }

    #[test]
    fn data_type_rejects_unknown_and_empty_user() {
        assert_matches!("forecast".parse::<DataType>(), Err(CoreError::Validation(_)));
        assert_matches!("user-".parse::<DataType>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn record_serializes_camel_case_and_skips_missing_date() {
        let record = TimeSeriesRecord::from_label(DataType::Temp, &DateHourLabel::bare(3), 12.5);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "dataType": "temp", "hour": 3, "value": 12.5 })
        );
    }

    #[test]
    fn day_aggregation_sums_same_day_values() {
        let records = vec![user_record(1, 0, 3.0), user_record(1, 1, 4.0), user_record(1, 2, 5.0)];
        let points = aggregate_by_day(&records);
        assert_eq!(
            points,
            vec![PredictionPoint {
                date: "2024-01-01".into(),
                yhat: 12.0
            }]
        );
    }

    #[test]
    fn day_aggregation_only_merges_adjacent_records() {
        let records = vec![
            user_record(1, 0, 1.0),
            user_record(2, 0, 2.0),
            user_record(1, 1, 4.0),
        ];
        let dates: Vec<_> = aggregate_by_day(&records)
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(dates, ["2024-01-01", "2024-01-02", "2024-01-01"]);
    }

    #[test]
    fn hourly_points_label_each_record() {
        let points = hourly_points(&[user_record(9, 23, 1.5)]);
        assert_eq!(points[0].date, "2024-01-09 23");
        assert_eq!(points[0].yhat, 1.5);
    }
}
