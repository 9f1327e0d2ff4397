//! Article counts per time bucket.
//!
//! Buckets without articles are omitted rather than zero-filled; consumers
//! treat a missing bucket as a count of zero.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::article::{Article, Bucket, Granularity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalRow {
    pub bucket: Bucket,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgencyRow {
    pub bucket: Bucket,
    pub agency: String,
    pub count: usize,
}

/// Count per bucket, ascending by bucket.
pub fn aggregate_total(articles: &[&Article], granularity: Granularity) -> Vec<TotalRow> {
    let mut counts: BTreeMap<Bucket, usize> = BTreeMap::new();
    for article in articles {
        *counts.entry(article.bucket(granularity)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(bucket, count)| TotalRow { bucket, count })
        .collect()
}

/// Count per (bucket, agency), ordered by bucket then agency.
pub fn aggregate_by_agency(articles: &[&Article], granularity: Granularity) -> Vec<AgencyRow> {
    let mut counts: BTreeMap<(Bucket, &str), usize> = BTreeMap::new();
    for article in articles {
        let key = (article.bucket(granularity), article.agency.as_str());
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((bucket, agency), count)| AgencyRow {
            bucket,
            agency: agency.to_string(),
            count,
        })
        .collect()
}
