use chrono::NaiveDate;
use serde::Serialize;

use crate::article::Article;
use crate::selection::Selection;

/// Inclusive range of calendar days. Compared at day resolution regardless of
/// the aggregation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Pulls the bounds in to `[min, max]`. A range that misses `[min, max]`
    /// entirely comes out inverted, so it still selects nothing.
    pub fn clamp_to(self, min: NaiveDate, max: NaiveDate) -> Self {
        DateRange {
            start: self.start.max(min),
            end: self.end.min(max),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Articles whose agency is selected and whose day falls inside `range`.
pub fn filter_articles<'a>(
    articles: &'a [Article],
    selection: &Selection,
    range: &DateRange,
) -> Vec<&'a Article> {
    if selection.is_empty() || range.is_empty() {
        return Vec::new();
    }

    articles
        .iter()
        .filter(|a| range.contains(a.day) && selection.contains(&a.agency))
        .collect()
}
