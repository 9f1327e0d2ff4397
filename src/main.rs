use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

use govnews::config::SourceKind;
use govnews::pipeline;
use govnews::report::Renderer;
use govnews::session::{run_session, Session};
use govnews::utils::{setup_logging, validate_args};
use govnews::{
    init_default_config, load_config, Args, Config, Dataset, DatasetCache, DatasetSource,
    HubSource, Query, RankWindow, SqliteSource,
};

fn build_source(args: &Args, config: &Config) -> Result<Box<dyn DatasetSource>> {
    let source = &config.source;
    match args.source.unwrap_or(source.kind) {
        SourceKind::Hub => {
            let hub = HubSource::new(
                args.endpoint.as_deref().unwrap_or(&source.endpoint),
                args.dataset.as_deref().unwrap_or(&source.dataset),
                &source.config,
                &source.split,
                source.page_size,
                source.timeout(),
            )
            .context("Failed to configure hub source")?;
            Ok(Box::new(hub))
        }
        SourceKind::Sqlite => {
            let path = args
                .db
                .clone()
                .unwrap_or_else(|| PathBuf::from(&source.sqlite_path));
            let sqlite = SqliteSource::new(path, &source.sqlite_table)
                .context("Failed to configure SQLite source")?;
            Ok(Box::new(sqlite))
        }
    }
}

fn build_query(args: &Args, dataset: &Dataset) -> Query {
    let mut query = Query::new(dataset);
    if !args.agencies.is_empty() {
        query.selection.set(args.agencies.iter().cloned());
    }
    query.granularity = args.granularity;
    query.from = args.from;
    query.to = args.to;
    if args.rank_low.is_some() || args.rank_high.is_some() {
        query.rank = Some(RankWindow::new(
            args.rank_low.unwrap_or(1),
            args.rank_high.unwrap_or(RankWindow::DEFAULT_SPAN),
        ));
    }
    query
}

fn run_dashboard(args: &Args) -> Result<()> {
    let total_start_time = Instant::now();

    let config = load_config(args.config.as_deref())?;
    let source = build_source(args, &config)?;
    let ttl = args
        .cache_ttl
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.cache.ttl());

    let mut cache = DatasetCache::new(source, ttl, args.workers);
    let dataset = cache
        .get()
        .with_context(|| format!("Failed to load dataset from {}", cache.source().describe()))?;

    let renderer = Renderer::new(args.format, args.limit.unwrap_or(config.display.limit));
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.list_agencies {
        renderer.render_agencies(&dataset, &mut out)?;
        return Ok(());
    }

    let query = build_query(args, &dataset);
    if args.interactive {
        let mut session = Session::new(query);
        run_session(&mut session, &mut cache, &renderer, io::stdin().lock(), &mut out)?;
    } else {
        renderer.render(&pipeline::run(&dataset, &query), &mut out)?;
    }

    info!(
        action = "complete",
        component = "main",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Run completed"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.init {
        return init_default_config();
    }

    setup_logging(args.verbose);
    validate_args(&args)?;

    match run_dashboard(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(action = "fail", component = "main", error = %format!("{:#}", e), "Run failed");
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
