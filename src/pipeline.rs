//! One full evaluation of the dashboard: filter, aggregate, rank.
//!
//! `run` is a pure function of the dataset snapshot and the current query.
//! Whatever loop drives the program calls it once per interaction.

use chrono::NaiveDate;
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use crate::aggregate::{aggregate_by_agency, aggregate_total, AgencyRow, TotalRow};
use crate::article::{Article, Granularity};
use crate::dataset::Dataset;
use crate::filter::{filter_articles, DateRange};
use crate::rank::{self, RankWindow, RankedAgency};
use crate::selection::Selection;

/// The user's controls. Unset bounds fall back to dataset-derived defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub selection: Selection,
    pub granularity: Granularity,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub rank: Option<RankWindow>,
}

impl Query {
    pub fn new(dataset: &Dataset) -> Self {
        Query {
            selection: Selection::all(dataset.agencies().iter().cloned()),
            granularity: Granularity::default(),
            from: None,
            to: None,
            rank: None,
        }
    }

    /// Requested range clamped to the dataset. The default start is
    /// 2010-01-01 (or the first day, for older datasets) and the default end
    /// is the latest day in the dataset.
    pub fn date_range(&self, dataset: &Dataset) -> DateRange {
        let start = self.from.unwrap_or_else(|| {
            NaiveDate::from_ymd_opt(2010, 1, 1)
                .filter(|d| *d <= dataset.max_day())
                .unwrap_or_else(|| dataset.min_day())
        });
        let end = self.to.unwrap_or_else(|| dataset.max_day());
        DateRange::new(start, end).clamp_to(dataset.min_day(), dataset.max_day())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRow {
    pub published_date: String,
    pub agency: String,
    pub title: String,
    pub url: String,
}

impl From<&Article> for ArticleRow {
    fn from(article: &Article) -> Self {
        ArticleRow {
            published_date: article.published_date(),
            agency: article.agency.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
        }
    }
}

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub granularity: Granularity,
    pub date_range: DateRange,
    pub rank_window: RankWindow,
    pub selected_agencies: usize,
    pub available_agencies: usize,
    /// Agencies with at least one article after filtering.
    pub ranked_agencies: usize,
    pub total_articles: usize,
    pub totals: Vec<TotalRow>,
    /// By-agency counts restricted to the rank window.
    pub by_agency: Vec<AgencyRow>,
    /// The agencies inside the rank window, in rank order.
    pub ranking: Vec<RankedAgency>,
    /// Rank-window articles, newest first, then by agency.
    pub articles: Vec<ArticleRow>,
}

pub fn run(dataset: &Dataset, query: &Query) -> Dashboard {
    let start_time = Instant::now();

    let date_range = query.date_range(dataset);
    let filtered = filter_articles(dataset.articles(), &query.selection, &date_range);

    let totals = aggregate_total(&filtered, query.granularity);
    let by_agency_all = aggregate_by_agency(&filtered, query.granularity);

    let agency_totals = rank::totals_from_rows(&by_agency_all);
    let ranked_agencies = agency_totals.len();
    let rank_window = query
        .rank
        .map(|w| w.clamp(ranked_agencies))
        .unwrap_or_else(|| RankWindow::default_for(ranked_agencies));

    let ranking: Vec<RankedAgency> = if rank_window.is_empty() {
        Vec::new()
    } else {
        rank::ranking(&agency_totals)
            .into_iter()
            .filter(|r| r.rank >= rank_window.low && r.rank <= rank_window.high)
            .collect()
    };
    let by_agency = rank::rows_in_window(&by_agency_all, rank_window);

    let mut table = rank::articles_in_window(&filtered, rank_window);
    table.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.agency.cmp(&b.agency))
    });
    let articles: Vec<ArticleRow> = table.into_iter().map(ArticleRow::from).collect();

    debug!(
        action = "complete",
        component = "pipeline",
        granularity = %query.granularity,
        filtered = filtered.len(),
        buckets = totals.len(),
        ranked_agencies,
        duration_ms = start_time.elapsed().as_millis(),
        "Pipeline evaluated"
    );

    Dashboard {
        granularity: query.granularity,
        date_range,
        rank_window,
        selected_agencies: query.selection.len(),
        available_agencies: dataset.agencies().len(),
        ranked_agencies,
        total_articles: filtered.len(),
        totals,
        by_agency,
        ranking,
        articles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Bucket;
    use crate::dataset::fixtures::{article, day, small};

    fn day_query(dataset: &Dataset) -> Query {
        Query {
            granularity: Granularity::Day,
            from: Some(day(2021, 1, 1)),
            to: Some(day(2021, 1, 2)),
            ..Query::new(dataset)
        }
    }

    #[test]
    fn test_day_scenario() {
        let dataset = small();
        let dashboard = run(&dataset, &day_query(&dataset));

        assert_eq!(dashboard.total_articles, 3);
        assert_eq!(
            dashboard.totals,
            vec![
                TotalRow { bucket: Bucket::Day(day(2021, 1, 1)), count: 2 },
                TotalRow { bucket: Bucket::Day(day(2021, 1, 2)), count: 1 },
            ]
        );
        assert_eq!(dashboard.by_agency.len(), 3);
        assert_eq!(dashboard.ranked_agencies, 2);
        assert_eq!(dashboard.rank_window, RankWindow::new(1, 2));
    }

    #[test]
    fn test_top_rank_selects_most_prolific() {
        let dataset = small();
        let query = Query {
            rank: Some(RankWindow::new(1, 1)),
            ..day_query(&dataset)
        };
        let dashboard = run(&dataset, &query);

        assert!(dashboard.by_agency.iter().all(|r| r.agency == "A"));
        assert_eq!(dashboard.ranking.len(), 1);
        assert_eq!(dashboard.ranking[0].agency, "A");
        assert_eq!(dashboard.ranking[0].count, 2);
        assert!(dashboard.articles.iter().all(|a| a.agency == "A"));
        // totals are not rank-filtered
        assert_eq!(dashboard.total_articles, 3);
    }

    #[test]
    fn test_excluded_agency_is_absent() {
        let dataset = small();
        let mut query = day_query(&dataset);
        query.selection.set(["A"]);
        let dashboard = run(&dataset, &query);

        assert_eq!(dashboard.total_articles, 2);
        assert!(dashboard.by_agency.iter().all(|r| r.agency != "B"));
        assert!(dashboard.articles.iter().all(|a| a.agency != "B"));
    }

    #[test]
    fn test_range_outside_dataset_renders_empty() {
        let dataset = small();
        let query = Query {
            from: Some(day(2022, 1, 1)),
            to: Some(day(2022, 12, 31)),
            ..day_query(&dataset)
        };
        let dashboard = run(&dataset, &query);

        assert_eq!(dashboard.total_articles, 0);
        assert!(dashboard.totals.is_empty());
        assert!(dashboard.by_agency.is_empty());
        assert!(dashboard.ranking.is_empty());
        assert!(dashboard.articles.is_empty());
        assert!(dashboard.rank_window.is_empty());
    }

    #[test]
    fn test_inverted_rank_window_is_empty() {
        let dataset = small();
        let query = Query {
            rank: Some(RankWindow::new(2, 1)),
            ..day_query(&dataset)
        };
        let dashboard = run(&dataset, &query);

        assert!(dashboard.by_agency.is_empty());
        assert!(dashboard.articles.is_empty());
        assert_eq!(dashboard.total_articles, 3);
    }

    #[test]
    fn test_rank_window_past_agency_count_is_empty() {
        let dataset = small();
        for window in [RankWindow::new(5, 5), RankWindow::new(12, 10)] {
            let query = Query {
                rank: Some(window),
                ..day_query(&dataset)
            };
            let dashboard = run(&dataset, &query);

            assert!(dashboard.rank_window.is_empty(), "{:?}", window);
            assert!(dashboard.ranking.is_empty(), "{:?}", window);
            assert!(dashboard.by_agency.is_empty(), "{:?}", window);
            assert!(dashboard.articles.is_empty(), "{:?}", window);
            assert_eq!(dashboard.total_articles, 3);
        }
    }

    #[test]
    fn test_rank_window_high_is_capped() {
        let dataset = small();
        let query = Query {
            rank: Some(RankWindow::new(2, 10)),
            ..day_query(&dataset)
        };
        let dashboard = run(&dataset, &query);

        assert_eq!(dashboard.rank_window, RankWindow::new(2, 2));
        assert_eq!(dashboard.ranking.len(), 1);
        assert_eq!(dashboard.ranking[0].agency, "B");
        assert!(dashboard.articles.iter().all(|a| a.agency == "B"));
    }

    #[test]
    fn test_article_table_order() {
        let mut late_b = article("B", 2021, 3, 1);
        late_b.published_at = day(2021, 3, 1).and_hms_opt(9, 0, 0).unwrap();
        let mut late_a = article("A", 2021, 3, 1);
        late_a.published_at = late_b.published_at;
        let dataset = Dataset::new(vec![
            article("A", 2021, 1, 1),
            late_b,
            article("C", 2021, 2, 1),
            late_a,
        ])
        .unwrap();

        let dashboard = run(&dataset, &Query::new(&dataset));
        let order: Vec<(&str, &str)> = dashboard
            .articles
            .iter()
            .map(|a| (a.published_date.as_str(), a.agency.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("01/03/2021", "A"),
                ("01/03/2021", "B"),
                ("01/02/2021", "C"),
                ("01/01/2021", "A"),
            ]
        );
    }

    #[test]
    fn test_default_range_starts_in_2010() {
        let dataset = Dataset::new(vec![article("A", 2005, 6, 1), article("A", 2015, 6, 1)]).unwrap();
        let range = Query::new(&dataset).date_range(&dataset);
        assert_eq!(range, DateRange::new(day(2010, 1, 1), day(2015, 6, 1)));

        let old = Dataset::new(vec![article("A", 2001, 1, 1), article("A", 2002, 1, 1)]).unwrap();
        let range = Query::new(&old).date_range(&old);
        assert_eq!(range, DateRange::new(day(2001, 1, 1), day(2002, 1, 1)));
    }

    #[test]
    fn test_default_range_spans_dataset() {
        let dataset = small();
        let range = Query::new(&dataset).date_range(&dataset);
        assert_eq!(range, DateRange::new(day(2021, 1, 1), day(2021, 1, 2)));
    }
}
