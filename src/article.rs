use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Time resolution used to bucket articles for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Year,
    Month,
    Week,
    Day,
}

impl Granularity {
    pub fn name(self) -> &'static str {
        match self {
            Granularity::Year => "year",
            Granularity::Month => "month",
            Granularity::Week => "week",
            Granularity::Day => "day",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" => Ok(Granularity::Year),
            "month" => Ok(Granularity::Month),
            "week" => Ok(Granularity::Week),
            "day" => Ok(Granularity::Day),
            other => Err(Error::InvalidCommand(format!(
                "unknown granularity '{}' (expected year, month, week or day)",
                other
            ))),
        }
    }
}

/// A discretized time value. Buckets of the same granularity order by time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Year(i32),
    /// First day of the month.
    Month(NaiveDate),
    /// Monday of the ISO week.
    Week(NaiveDate),
    Day(NaiveDate),
}

impl Bucket {
    pub fn label(&self) -> String {
        match self {
            Bucket::Year(year) => year.to_string(),
            Bucket::Month(start) => start.format("%Y-%m").to_string(),
            Bucket::Week(start) => start.format("%G-W%V").to_string(),
            Bucket::Day(day) => day.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// `published_at` as it arrives from a source, before parsing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::Millis(ms) => write!(f, "{}", ms),
            RawTimestamp::Text(text) => f.write_str(text),
        }
    }
}

/// One row as delivered by a dataset source. Unused columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArticle {
    pub agency: String,
    pub published_at: RawTimestamp,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A news article with its temporal buckets derived once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub agency: String,
    pub published_at: NaiveDateTime,
    pub title: String,
    pub url: String,
    pub year: i32,
    pub month: NaiveDate,
    pub week: NaiveDate,
    pub day: NaiveDate,
}

impl Article {
    pub fn new(
        agency: impl Into<String>,
        published_at: NaiveDateTime,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let day = published_at.date();
        Article {
            agency: agency.into(),
            published_at,
            title: title.into(),
            url: url.into(),
            year: day.year(),
            month: month_start(day),
            week: week_start(day),
            day,
        }
    }

    /// Builds an article from a source row; `row` is only used for error reporting.
    pub fn from_raw(row: usize, raw: RawArticle) -> Result<Self> {
        let published_at =
            parse_published_at(&raw.published_at).ok_or_else(|| Error::Timestamp {
                row,
                value: raw.published_at.to_string(),
            })?;

        Ok(Article::new(
            raw.agency,
            published_at,
            raw.title.unwrap_or_default(),
            raw.url.unwrap_or_default(),
        ))
    }

    pub fn bucket(&self, granularity: Granularity) -> Bucket {
        match granularity {
            Granularity::Year => Bucket::Year(self.year),
            Granularity::Month => Bucket::Month(self.month),
            Granularity::Week => Bucket::Week(self.week),
            Granularity::Day => Bucket::Day(self.day),
        }
    }

    /// Human-readable publish date (DD/MM/YYYY).
    pub fn published_date(&self) -> String {
        self.published_at.format("%d/%m/%Y").to_string()
    }
}

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
// `%#z` also takes hour-only offsets such as `+00`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

/// Parses a publish timestamp. Offsets are honored by keeping the wall-clock
/// time in that offset, so the day bucket matches the publisher's calendar.
pub fn parse_published_at(raw: &RawTimestamp) -> Option<NaiveDateTime> {
    match raw {
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms).map(|dt| dt.naive_utc()),
        RawTimestamp::Text(text) => {
            let text = text.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Some(dt.naive_local());
            }
            for format in OFFSET_FORMATS {
                if let Ok(dt) = DateTime::parse_from_str(text, format) {
                    return Some(dt.naive_local());
                }
            }
            for format in DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                    return Some(dt);
                }
            }
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        }
    }
}
