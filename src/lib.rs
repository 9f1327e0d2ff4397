pub mod aggregate;
pub mod args;
pub mod article;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod rank;
pub mod report;
pub mod selection;
pub mod session;
pub mod source;
pub mod utils;

pub use args::{Args, OutputFormat};
pub use article::{Article, Bucket, Granularity};
pub use cache::DatasetCache;
pub use config::{init_default_config, load_config, Config};
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use filter::DateRange;
pub use pipeline::{run, Dashboard, Query};
pub use rank::RankWindow;
pub use selection::Selection;
pub use source::{DatasetSource, HubSource, SqliteSource};
