//! `railcast` - Train running data collection and delay analysis
//!
//! This library gathers per-day train service records for a station,
//! merges them into datasets and describes the distribution of delays
//! and the services that stand out from it.

pub mod analysis;
pub mod cache;
pub mod collection;
pub mod config;
pub mod dataset;
pub mod dates;
pub mod error;
pub mod http;
pub mod logging;
pub mod realtime;

// Re-export core types for public API
pub use analysis::{BinRule, Distribution, OutlierReport, find_outliers, render_distribution};
pub use cache::ResponseCache;
pub use collection::{CollectSummary, CsvDownloader, DailySource, FileNaming, UrlTemplate, collect_range};
pub use config::RailcastConfig;
pub use dataset::Dataset;
pub use error::RailcastError;
pub use realtime::{RealtimeClient, ServiceRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, RailcastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
