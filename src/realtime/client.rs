//! Authenticated station searches with an optional response cache.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, info};

use super::api::SearchResponse;
use super::record::ServiceRecord;
use crate::cache::ResponseCache;
use crate::collection::DailySource;
use crate::config::{DownloadConfig, RealtimeConfig};
use crate::http::build_client;
use crate::{RailcastError, Result};

/// Realtime Trains station search client
pub struct RealtimeClient {
    client: ClientWithMiddleware,
    base_url: String,
    station: String,
    credentials: Option<(String, String)>,
    dest_dir: PathBuf,
    cache: Option<(ResponseCache, Duration)>,
}

impl RealtimeClient {
    /// Create a client for the station with CRS code `station`.
    pub fn new(
        station: &str,
        dest_dir: impl Into<PathBuf>,
        realtime: &RealtimeConfig,
        download: &DownloadConfig,
    ) -> Result<Self> {
        let station = station.trim().to_uppercase();
        if station.len() != 3 || !station.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(RailcastError::validation(format!(
                "Station must be a three-letter CRS code, got '{station}'"
            )));
        }

        let credentials = match (&realtime.username, &realtime.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };

        Ok(Self {
            client: build_client(download)?,
            base_url: realtime.base_url.trim_end_matches('/').to_string(),
            station,
            credentials,
            dest_dir: dest_dir.into(),
            cache: None,
        })
    }

    /// Serve past days from `cache` while entries are younger than `ttl`.
    #[must_use]
    pub fn with_cache(mut self, cache: ResponseCache, ttl: Duration) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    #[must_use]
    pub fn station(&self) -> &str {
        &self.station
    }

    fn search_url(&self, day: NaiveDate) -> String {
        format!(
            "{}/json/search/{}/{}",
            self.base_url,
            urlencoding::encode(&self.station),
            day.format("%Y/%m/%d")
        )
    }

    fn cache_key(&self, day: NaiveDate) -> String {
        format!("realtime:{}:{}", self.station, day)
    }

    /// Service rows for the station on `day`.
    #[tracing::instrument(level = "debug", skip(self), fields(station = %self.station))]
    pub async fn search(&self, day: NaiveDate) -> Result<Vec<ServiceRecord>> {
        // Only finished days are cached.
        let cacheable = day < Utc::now().date_naive();
        let key = self.cache_key(day);

        if let (Some((cache, _)), true) = (&self.cache, cacheable) {
            if let Some(records) = cache.get::<Vec<ServiceRecord>>(&key).await? {
                debug!("Using cached services for {}", key);
                return Ok(records);
            }
        }

        let response = self.fetch_search(day).await?;
        let records: Vec<ServiceRecord> = response
            .into_services()
            .iter()
            .map(|service| ServiceRecord::from_service(service, &self.station, day))
            .collect();

        info!("Found {} services at {} on {}", records.len(), self.station, day);

        if let (Some((cache, ttl)), true) = (&self.cache, cacheable) {
            cache.put(&key, records.clone(), *ttl).await?;
        }

        Ok(records)
    }

    async fn fetch_search(&self, day: NaiveDate) -> Result<SearchResponse> {
        let url = self.search_url(day);
        let mut request = self.client.get(&url);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RailcastError::api(
                    "Invalid or missing Realtime Trains API credentials",
                )),
                StatusCode::NOT_FOUND => Err(RailcastError::NotFound { url }),
                _ => Err(RailcastError::Http {
                    status: status.as_u16(),
                    url,
                }),
            };
        }

        response.json().await.map_err(|e| {
            RailcastError::api(format!("Failed to parse Realtime Trains response: {e}"))
        })
    }

    /// Write the day's rows to `path` with a header line.
    fn write_records(path: &std::path::Path, records: &[ServiceRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        if records.is_empty() {
            writer.write_record(super::COLUMNS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl DailySource for RealtimeClient {
    fn describe(&self) -> String {
        format!("{} ({})", self.base_url, self.station)
    }

    async fn fetch(&self, day: NaiveDate) -> Result<PathBuf> {
        let records = self.search(day).await?;
        tokio::fs::create_dir_all(&self.dest_dir).await?;
        let path = self.dest_dir.join(format!("{}_{}.csv", self.station, day));

        let target = path.clone();
        tokio::task::spawn_blocking(move || Self::write_records(&target, &records))
            .await
            .map_err(|e| RailcastError::general(format!("write task failed: {e}")))??;

        info!("Saved {} -> {}", day, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(station: &str) -> Result<RealtimeClient> {
        RealtimeClient::new(
            station,
            "data/raw",
            &RealtimeConfig::default(),
            &DownloadConfig::default(),
        )
    }

    #[test]
    fn test_station_is_normalised() {
        let client = client(" rdg ").unwrap();
        assert_eq!(client.station(), "RDG");
    }

    #[test]
    fn test_invalid_station() {
        assert!(matches!(
            client("READING").err(),
            Some(RailcastError::Validation { .. })
        ));
    }

    #[test]
    fn test_search_url() {
        let client = client("RDG").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            client.search_url(day),
            "https://api.rtt.io/api/v1/json/search/RDG/2024/06/01"
        );
        assert_eq!(client.cache_key(day), "realtime:RDG:2024-06-01");
    }
}
