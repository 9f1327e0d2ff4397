use std::io::Write;

use crate::args::OutputFormat;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::pipeline::Dashboard;
use crate::utils::format_number;

const BAR_WIDTH: usize = 40;

/// Renders dashboards to a writer, as text tables or JSON.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub format: OutputFormat,
    /// Article rows printed in text output; JSON always carries every row.
    pub limit: usize,
}

impl Renderer {
    pub fn new(format: OutputFormat, limit: usize) -> Self {
        Renderer { format, limit }
    }

    pub fn render<W: Write>(&self, dashboard: &Dashboard, out: &mut W) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, dashboard)?;
                writeln!(out)?;
            }
            OutputFormat::Text => print_dashboard(dashboard, self.limit, out)?,
        }
        Ok(())
    }

    pub fn render_agencies<W: Write>(&self, dataset: &Dataset, out: &mut W) -> Result<()> {
        let counts = dataset.agency_counts();
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, &counts)?;
                writeln!(out)?;
            }
            OutputFormat::Text => {
                writeln!(out, "{} agencies:", format_number(counts.len()))?;
                for (agency, count) in counts {
                    writeln!(out, "- {}: {} articles", agency, format_number(count))?;
                }
            }
        }
        Ok(())
    }
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let width = (count * BAR_WIDTH).div_ceil(max);
    "#".repeat(width)
}

fn print_dashboard<W: Write>(dashboard: &Dashboard, limit: usize, out: &mut W) -> Result<()> {
    let range = &dashboard.date_range;
    let granularity = dashboard.granularity;

    writeln!(out, "\n--- Government News by {} ---", granularity)?;
    if range.is_empty() {
        writeln!(out, "Date range: {} to {} (empty)", range.start, range.end)?;
    } else {
        let days = (range.end - range.start).num_days() + 1;
        writeln!(
            out,
            "Date range: {} to {} ({} days)",
            range.start,
            range.end,
            format_number(days as usize)
        )?;
    }
    writeln!(
        out,
        "Agencies selected: {} of {}",
        format_number(dashboard.selected_agencies),
        format_number(dashboard.available_agencies)
    )?;
    writeln!(
        out,
        "Total news articles: {}",
        format_number(dashboard.total_articles)
    )?;

    if dashboard.total_articles == 0 {
        writeln!(out, "\nNo articles match the current filters.")?;
        return Ok(());
    }

    writeln!(out, "\nArticles per {}:", granularity)?;
    let max = dashboard.totals.iter().map(|r| r.count).max().unwrap_or(0);
    let label_width = dashboard
        .totals
        .iter()
        .map(|r| r.bucket.label().len())
        .max()
        .unwrap_or(0);
    for row in &dashboard.totals {
        writeln!(
            out,
            "  {:<lw$}  {:>9}  {}",
            row.bucket.label(),
            format_number(row.count),
            bar(row.count, max),
            lw = label_width
        )?;
    }

    let window = dashboard.rank_window;
    writeln!(
        out,
        "\nAgencies ranked {} to {} of {}:",
        window.low,
        window.high,
        format_number(dashboard.ranked_agencies)
    )?;
    if dashboard.ranking.is_empty() {
        writeln!(out, "  (none in this rank range)")?;
    }
    for ranked in &dashboard.ranking {
        writeln!(
            out,
            "{:>4}. {}: {} articles",
            ranked.rank,
            ranked.agency,
            format_number(ranked.count)
        )?;
    }

    if !dashboard.by_agency.is_empty() {
        writeln!(out, "\nArticles per {} by agency:", granularity)?;
        let agency_width = dashboard
            .by_agency
            .iter()
            .map(|r| r.agency.len())
            .max()
            .unwrap_or(0);
        for row in &dashboard.by_agency {
            writeln!(
                out,
                "  {:<lw$}  {:<aw$}  {:>7}",
                row.bucket.label(),
                row.agency,
                format_number(row.count),
                lw = label_width,
                aw = agency_width
            )?;
        }
    }

    let shown = dashboard.articles.len().min(limit);
    writeln!(
        out,
        "\nFiltered articles (showing {} of {}):",
        format_number(shown),
        format_number(dashboard.articles.len())
    )?;
    for article in dashboard.articles.iter().take(limit) {
        writeln!(
            out,
            "  {}  {}  {}\n              {}",
            article.published_date, article.agency, article.title, article.url
        )?;
    }

    Ok(())
}
