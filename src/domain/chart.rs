// Chart domain models - inbound sales points and their axis labels
use crate::domain::query::Scale;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unexpected payload shape: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("unparseable timestamp '{0}'")]
    Timestamp(String),
}

/// One item of an inbound data-feed message
#[derive(Debug, Clone, Deserialize)]
pub struct SalesSample {
    pub timestamp: String,
    pub value: f64,
}

/// X-axis label: a month number for Monthly, `day/month` otherwise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScaleLabel {
    Month(u32),
    DayMonth(String),
}

/// Chart-ready point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub scale: ScaleLabel,
    pub value: f64,
}

/// Parse an ISO-8601 timestamp into `tz`.
///
/// Offsets are honoured; a date-time without offset is taken as wall time in `tz`;
/// a bare date is midnight UTC.
pub fn parse_timestamp<Tz: TimeZone>(
    timestamp: &str,
    tz: &Tz,
) -> Result<DateTime<Tz>, FeedError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Ok(dt.with_timezone(tz));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(timestamp, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive).with_timezone(tz));
        }
    }
    Err(FeedError::Timestamp(timestamp.to_string()))
}

pub fn scale_label<Tz: TimeZone>(
    timestamp: &str,
    scale: Scale,
    tz: &Tz,
) -> Result<ScaleLabel, FeedError> {
    let dt = parse_timestamp(timestamp, tz)?;
    Ok(match scale {
        Scale::Monthly => ScaleLabel::Month(dt.month()),
        Scale::Daily | Scale::Weekly => {
            ScaleLabel::DayMonth(format!("{}/{}", dt.day(), dt.month()))
        }
    })
}

/// Map a whole inbound data message into chart points, labelled in `tz`.
/// No grouping or reduction happens here; aggregation is the server's job.
pub fn to_data_points<Tz: TimeZone>(
    payload: &serde_json::Value,
    scale: Scale,
    tz: &Tz,
) -> Result<Vec<DataPoint>, FeedError> {
    let samples: Vec<SalesSample> = serde_json::from_value(payload.clone())?;
    samples
        .into_iter()
        .map(|s| -> Result<DataPoint, FeedError> {
            Ok(DataPoint {
                scale: scale_label(&s.timestamp, scale, tz)?,
                value: s.value,
            })
        })
        .collect()
}

/// Same as [`to_data_points`] in the machine's local time zone
pub fn to_local_data_points(
    payload: &serde_json::Value,
    scale: Scale,
) -> Result<Vec<DataPoint>, FeedError> {
    to_data_points(payload, scale, &Local)
}
