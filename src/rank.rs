//! Agency ranking by article count and rank-window slicing.
//!
//! Agencies are ordered by descending total; equal totals order by agency
//! name ascending so that every window is deterministic.

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::AgencyRow;
use crate::article::Article;

/// Inclusive, 1-based window over the agency ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankWindow {
    pub low: usize,
    pub high: usize,
}

impl RankWindow {
    pub const DEFAULT_SPAN: usize = 10;

    pub fn new(low: usize, high: usize) -> Self {
        RankWindow { low, high }
    }

    /// First ten ranks, or fewer when fewer agencies are ranked.
    pub fn default_for(ranked: usize) -> Self {
        RankWindow::new(1, Self::DEFAULT_SPAN).clamp(ranked)
    }

    /// Raises `low` to at least 1 and caps `high` at `ranked`. An inverted
    /// window stays inverted, and a window starting past `ranked` comes out
    /// empty. With nothing ranked the window is empty.
    pub fn clamp(self, ranked: usize) -> Self {
        if ranked == 0 {
            return RankWindow::new(1, 0);
        }
        RankWindow {
            low: self.low.max(1),
            high: self.high.min(ranked),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.low > self.high || self.high == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedAgency {
    pub rank: usize,
    pub agency: String,
    pub count: usize,
}

/// Total per agency, summed over every bucket.
pub fn totals_from_rows(rows: &[AgencyRow]) -> BTreeMap<&str, usize> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.agency.as_str()).or_insert(0) += row.count;
    }
    totals
}

/// Article count per agency.
pub fn totals_from_articles<'a>(articles: &[&'a Article]) -> BTreeMap<&'a str, usize> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for article in articles {
        *totals.entry(article.agency.as_str()).or_insert(0) += 1;
    }
    totals
}

fn ordered<'a>(totals: &BTreeMap<&'a str, usize>) -> Vec<(&'a str, usize)> {
    let mut ordered: Vec<(&'a str, usize)> = totals.iter().map(|(a, c)| (*a, *c)).collect();
    // Stable sort over name-ordered input keeps ties in name order.
    ordered.sort_by_key(|(_, count)| Reverse(*count));
    ordered
}

pub fn ranking(totals: &BTreeMap<&str, usize>) -> Vec<RankedAgency> {
    ordered(totals)
        .into_iter()
        .enumerate()
        .map(|(i, (agency, count))| RankedAgency {
            rank: i + 1,
            agency: agency.to_string(),
            count,
        })
        .collect()
}

/// Agencies ranked `low` through `high`: the top `high`, minus the first `low - 1`.
pub fn agencies_in_window<'a>(
    totals: &BTreeMap<&'a str, usize>,
    window: RankWindow,
) -> BTreeSet<&'a str> {
    if window.is_empty() {
        return BTreeSet::new();
    }

    ordered(totals)
        .into_iter()
        .take(window.high)
        .skip(window.low.saturating_sub(1))
        .map(|(agency, _)| agency)
        .collect()
}

/// By-agency rows whose agency falls inside the window, ranked by summed counts.
pub fn rows_in_window(rows: &[AgencyRow], window: RankWindow) -> Vec<AgencyRow> {
    let totals = totals_from_rows(rows);
    let keep = agencies_in_window(&totals, window);
    rows.iter()
        .filter(|row| keep.contains(row.agency.as_str()))
        .cloned()
        .collect()
}

/// Articles whose agency falls inside the window, ranked by article count.
pub fn articles_in_window<'a>(articles: &[&'a Article], window: RankWindow) -> Vec<&'a Article> {
    let totals = totals_from_articles(articles);
    let keep = agencies_in_window(&totals, window);
    articles
        .iter()
        .filter(|a| keep.contains(a.agency.as_str()))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_by_agency;
    use crate::article::Granularity;
    use crate::dataset::fixtures::{article, small};

    fn totals(pairs: &[(&'static str, usize)]) -> BTreeMap<&'static str, usize> {
        pairs.iter().copied().collect()
    }

    fn sample() -> BTreeMap<&'static str, usize> {
        totals(&[("agu", 3), ("mec", 9), ("mre", 5), ("saude", 7), ("casa-civil", 1)])
    }

    #[test]
    fn test_full_window_returns_all() {
        let t = sample();
        let all = agencies_in_window(&t, RankWindow::new(1, t.len()));
        assert_eq!(all.len(), t.len());
    }

    #[test]
    fn test_single_rank_window() {
        let t = sample();
        let expected = ["mec", "saude", "mre", "agu", "casa-civil"];
        for (k, agency) in expected.iter().enumerate() {
            let got = agencies_in_window(&t, RankWindow::new(k + 1, k + 1));
            assert_eq!(got.into_iter().collect::<Vec<_>>(), vec![*agency]);
        }
        assert!(agencies_in_window(&t, RankWindow::new(6, 6)).is_empty());
    }

    #[test]
    fn test_middle_window() {
        let got = agencies_in_window(&sample(), RankWindow::new(2, 3));
        assert_eq!(got, BTreeSet::from(["saude", "mre"]));
    }

    #[test]
    fn test_high_beyond_count_clamps() {
        let got = agencies_in_window(&sample(), RankWindow::new(4, 50));
        assert_eq!(got, BTreeSet::from(["agu", "casa-civil"]));
    }

    #[test]
    fn test_inverted_window_is_empty() {
        assert!(agencies_in_window(&sample(), RankWindow::new(4, 2)).is_empty());
        assert!(agencies_in_window(&sample(), RankWindow::new(1, 0)).is_empty());
    }

    #[test]
    fn test_ties_break_by_name() {
        let t = totals(&[("zeta", 4), ("alpha", 4), ("mid", 4), ("top", 8)]);
        let ranked: Vec<String> = ranking(&t).into_iter().map(|r| r.agency).collect();
        assert_eq!(ranked, vec!["top", "alpha", "mid", "zeta"]);

        let second = agencies_in_window(&t, RankWindow::new(2, 2));
        assert_eq!(second, BTreeSet::from(["alpha"]));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(RankWindow::new(0, 40).clamp(12), RankWindow::new(1, 12));
        assert_eq!(RankWindow::new(20, 30).clamp(12), RankWindow::new(20, 12));
        assert!(RankWindow::new(20, 30).clamp(12).is_empty());
        assert!(RankWindow::new(5, 5).clamp(2).is_empty());
        assert_eq!(RankWindow::new(12, 10).clamp(40), RankWindow::new(12, 10));
        assert!(RankWindow::new(12, 10).clamp(40).is_empty());
        assert!(RankWindow::new(1, 10).clamp(0).is_empty());
        assert_eq!(RankWindow::default_for(3), RankWindow::new(1, 3));
        assert_eq!(RankWindow::default_for(40), RankWindow::new(1, 10));
    }

    #[test]
    fn test_rows_in_window_picks_most_prolific() {
        let dataset = small();
        let refs: Vec<&Article> = dataset.articles().iter().collect();
        let rows = aggregate_by_agency(&refs, Granularity::Day);

        let top = rows_in_window(&rows, RankWindow::new(1, 1));
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|r| r.agency == "A"));
    }

    #[test]
    fn test_articles_in_window() {
        let articles = vec![
            article("A", 2021, 1, 1),
            article("B", 2021, 1, 1),
            article("B", 2021, 1, 2),
            article("C", 2021, 1, 3),
            article("C", 2021, 1, 4),
            article("C", 2021, 1, 5),
        ];
        let refs: Vec<&Article> = articles.iter().collect();

        let second: Vec<&str> = articles_in_window(&refs, RankWindow::new(2, 2))
            .iter()
            .map(|a| a.agency.as_str())
            .collect();
        assert_eq!(second, vec!["B", "B"]);
        assert_eq!(articles_in_window(&refs, RankWindow::new(1, 3)).len(), 6);
    }
}
