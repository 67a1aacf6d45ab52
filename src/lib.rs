pub mod aggregator;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod metadata;
pub mod view;

pub use aggregator::{
    classify, classify_by, remaining, remaining_of, ClaimCounts, ProjectNftAggregator,
};
pub use client::{ApiClient, NftSource};
pub use config::Config;
pub use error::{FetchError, PaginationError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the stderr log subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
