//! Daily CSV downloads from a URL template.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, info, warn};

use super::DailySource;
use super::template::{FileNaming, UrlTemplate};
use crate::config::DownloadConfig;
use crate::http::build_client;
use crate::{RailcastError, Result};

/// Downloads one CSV per day from a templated URL.
pub struct CsvDownloader {
    client: ClientWithMiddleware,
    template: UrlTemplate,
    dest_dir: PathBuf,
    naming: FileNaming,
    attempts: u32,
    retry_delay: Duration,
    credentials: Option<(String, String)>,
}

enum AttemptFailure {
    NotFound,
    Status(StatusCode, Vec<u8>),
    Transport(String),
}

impl CsvDownloader {
    /// Create a downloader saving into `dest_dir`.
    pub fn new(template: UrlTemplate, dest_dir: impl Into<PathBuf>, config: &DownloadConfig) -> Result<Self> {
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };

        Ok(Self {
            client: build_client(config)?,
            template,
            dest_dir: dest_dir.into(),
            naming: FileNaming::Remote,
            attempts: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
            credentials,
        })
    }

    #[must_use]
    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.credentials = Some((username, password));
        self
    }

    /// Download the file for `day`, returning where it was saved.
    ///
    /// A 404 fails immediately; any other failure is retried with a growing pause.
    #[tracing::instrument(level = "debug", skip(self), fields(template = self.template.as_str()))]
    pub async fn download(&self, day: NaiveDate) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dest_dir).await?;

        let url = self.template.render(day);
        let dest_path = self.dest_dir.join(self.template.file_name_for(day, self.naming));
        let mut debug_file = None;

        for attempt in 1..=self.attempts {
            match self.attempt(&url).await {
                Ok(body) => {
                    tokio::fs::write(&dest_path, &body).await?;
                    debug!("Saved {} bytes to {}", body.len(), dest_path.display());
                    return Ok(dest_path);
                }
                Err(AttemptFailure::NotFound) => {
                    return Err(RailcastError::NotFound { url });
                }
                Err(AttemptFailure::Status(status, body)) => {
                    warn!("Attempt {}/{} for {} returned {}", attempt, self.attempts, url, status);
                    let path = self
                        .dest_dir
                        .join(format!("debug_{}.html", day.format("%Y%m%d")));
                    match tokio::fs::write(&path, &body).await {
                        Ok(()) => debug_file = Some(path),
                        Err(e) => warn!("Could not save debug response: {}", e),
                    }
                }
                Err(AttemptFailure::Transport(message)) => {
                    warn!("Attempt {}/{} for {} failed: {}", attempt, self.attempts, url, message);
                }
            }

            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay * (1 + attempt)).await;
            }
        }

        Err(RailcastError::RetriesExhausted {
            url,
            attempts: self.attempts,
            detail: debug_file
                .map(|path| format!(". Saved debug response: {}", path.display()))
                .unwrap_or_default(),
        })
    }

    async fn attempt(&self, url: &str) -> std::result::Result<Vec<u8>, AttemptFailure> {
        let mut request = self.client.get(url);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AttemptFailure::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AttemptFailure::NotFound);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AttemptFailure::Transport(e.to_string()))?
            .to_vec();

        if status.is_success() {
            Ok(body)
        } else {
            Err(AttemptFailure::Status(status, body))
        }
    }
}

#[async_trait]
impl DailySource for CsvDownloader {
    fn describe(&self) -> String {
        self.template.as_str().to_string()
    }

    async fn fetch(&self, day: NaiveDate) -> Result<PathBuf> {
        let path = self.download(day).await?;
        info!("Downloaded {} -> {}", day, path.display());
        Ok(path)
    }
}
