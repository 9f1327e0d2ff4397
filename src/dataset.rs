use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

use crate::article::{Article, RawArticle};
use crate::error::{Error, Result};

/// Read-only snapshot of every article, with a few precomputed summaries.
#[derive(Debug, Clone)]
pub struct Dataset {
    articles: Vec<Article>,
    agencies: Vec<String>,
    min_day: NaiveDate,
    max_day: NaiveDate,
}

impl Dataset {
    pub fn new(articles: Vec<Article>) -> Result<Self> {
        let min_day = articles.iter().map(|a| a.day).min();
        let max_day = articles.iter().map(|a| a.day).max();
        let (Some(min_day), Some(max_day)) = (min_day, max_day) else {
            return Err(Error::EmptyDataset);
        };

        let mut agencies: Vec<String> = articles.iter().map(|a| a.agency.clone()).collect();
        agencies.sort();
        agencies.dedup();

        Ok(Dataset {
            articles,
            agencies,
            min_day,
            max_day,
        })
    }

    /// Parses source rows and derives temporal buckets on a bounded worker pool.
    /// Row order is preserved; the first unparseable timestamp fails the load.
    pub fn from_raw(rows: Vec<RawArticle>, workers: Option<usize>) -> Result<Self> {
        let start_time = Instant::now();
        let workers = workers.unwrap_or_else(|| std::cmp::min(num_cpus::get(), 8));
        info!(
            action = "start",
            component = "bucket_derivation",
            row_count = rows.len(),
            worker_count = workers,
            "Deriving temporal buckets"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;
        let articles = pool.install(|| {
            rows.into_par_iter()
                .enumerate()
                .map(|(row, raw)| Article::from_raw(row, raw))
                .collect::<Result<Vec<Article>>>()
        })?;

        let dataset = Dataset::new(articles)?;
        info!(
            action = "complete",
            component = "bucket_derivation",
            article_count = dataset.len(),
            agency_count = dataset.agencies.len(),
            min_day = %dataset.min_day,
            max_day = %dataset.max_day,
            duration_ms = start_time.elapsed().as_millis(),
            "Dataset ready"
        );
        Ok(dataset)
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Distinct agencies, sorted ascending.
    pub fn agencies(&self) -> &[String] {
        &self.agencies
    }

    pub fn min_day(&self) -> NaiveDate {
        self.min_day
    }

    pub fn max_day(&self) -> NaiveDate {
        self.max_day
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Article count per agency over the whole dataset, by agency name.
    pub fn agency_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for article in &self.articles {
            *counts.entry(article.agency.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn article(agency: &str, y: i32, m: u32, d: u32) -> Article {
        let published = day(y, m, d).and_hms_opt(12, 0, 0).unwrap();
        Article::new(
            agency,
            published,
            format!("{} news on {}", agency, published.date()),
            format!("https://www.gov.br/{}/{}", agency, published.date()),
        )
    }

    /// Three articles: A twice (2021-01-01, 2021-01-02), B once (2021-01-01).
    pub fn small() -> Dataset {
        Dataset::new(vec![
            article("A", 2021, 1, 1),
            article("A", 2021, 1, 2),
            article("B", 2021, 1, 1),
        ])
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::article::RawTimestamp;

    fn raw(agency: &str, published_at: &str) -> RawArticle {
        RawArticle {
            agency: agency.to_string(),
            published_at: RawTimestamp::Text(published_at.to_string()),
            title: Some("title".to_string()),
            url: Some("https://example.gov.br".to_string()),
        }
    }

    #[test]
    fn test_summaries() {
        let dataset = small();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.agencies(), ["A".to_string(), "B".to_string()]);
        assert_eq!(dataset.min_day(), day(2021, 1, 1));
        assert_eq!(dataset.max_day(), day(2021, 1, 2));
        assert_eq!(dataset.agency_counts().get("A"), Some(&2));
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        assert!(matches!(Dataset::new(Vec::new()), Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_from_raw_preserves_order() {
        let rows = (1..=20)
            .map(|d| raw(&format!("agency-{:02}", d), &format!("2022-03-{:02} 10:00:00", d)))
            .collect();
        let dataset = Dataset::from_raw(rows, Some(4)).unwrap();

        let agencies: Vec<&str> = dataset.articles().iter().map(|a| a.agency.as_str()).collect();
        let expected: Vec<String> = (1..=20).map(|d| format!("agency-{:02}", d)).collect();
        assert_eq!(agencies, expected);
    }

    #[test]
    fn test_from_raw_fails_on_bad_row() {
        let rows = vec![raw("a", "2022-01-01"), raw("b", "not a date")];
        assert!(matches!(
            Dataset::from_raw(rows, Some(2)),
            Err(Error::Timestamp { row: 1, .. })
        ));
    }
}
