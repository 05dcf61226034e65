// src/services/fetcher.rs

//! Page fetcher for remote catalogs and local catalog files.
//!
//! One [`ContentFetcher`] is built per harvest run. Transport interceptors
//! customize the HTTP client at that point and are never consulted again
//! for individual pages.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Response, StatusCode};

use crate::error::{FailureKind, FetchError};
use crate::models::FetcherConfig;
use crate::utils::media::content_type_for_path;
use crate::utils::url::{is_remote, page_url};

/// Limits and identity used for every request in a run.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}

impl FetchSettings {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            request_timeout: Duration::from_secs(config.timeout_secs),
            max_bytes: config.max_bytes,
            user_agent: config.user_agent.clone(),
        }
    }

    /// Apply a per-source payload limit, if the source sets one.
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        if let Some(limit) = max_bytes {
            self.max_bytes = limit;
        }
        self
    }
}

/// Hook that adjusts the HTTP client before a run (auth headers, proxies...).
pub trait TransportInterceptor: Send + Sync {
    fn adjust_transport(&self, builder: ClientBuilder) -> ClientBuilder;
}

/// One page of catalog content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub content: String,
    pub content_type: Option<String>,
    /// Locator actually read, including any page parameter
    pub url: String,
}

/// Fetches catalog pages over HTTP or from disk.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    settings: FetchSettings,
}

impl ContentFetcher {
    /// Build the fetcher for one harvest run.
    pub fn for_run(
        settings: FetchSettings,
        interceptors: &[Arc<dyn TransportInterceptor>],
    ) -> Result<Self, FetchError> {
        let builder = Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout);
        let builder = interceptors
            .iter()
            .fold(builder, |builder, interceptor| interceptor.adjust_transport(builder));
        let client = builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Connection, "", err.to_string()))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetch one page. `content_type`, when given, overrides whatever the
    /// response or file extension says.
    pub async fn fetch(
        &self,
        locator: &str,
        page: u32,
        content_type: Option<&str>,
    ) -> Result<FetchedContent, FetchError> {
        if is_remote(locator) {
            let url = page_url(locator, page)
                .map_err(|err| FetchError::new(FailureKind::InvalidUrl, locator, err.to_string()))?;
            self.fetch_remote(url, content_type).await
        } else {
            self.fetch_local(locator, content_type).await
        }
    }

    async fn fetch_local(
        &self,
        path: &str,
        content_type: Option<&str>,
    ) -> Result<FetchedContent, FetchError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::new(
                    FailureKind::MissingLocalFile,
                    path,
                    "could not get content for this path",
                ));
            }
            Err(e) => return Err(FetchError::new(FailureKind::Io, path, e.to_string())),
        };

        let actual = bytes.len() as u64;
        if actual > self.settings.max_bytes {
            return Err(self.too_large(path, Some(actual)));
        }

        let content_type = content_type
            .map(str::to_string)
            .or_else(|| content_type_for_path(Path::new(path)).map(str::to_string));

        Ok(FetchedContent {
            content: decode(path, bytes)?,
            content_type,
            url: path.to_string(),
        })
    }

    async fn fetch_remote(
        &self,
        parsed: reqwest::Url,
        content_type: Option<&str>,
    ) -> Result<FetchedContent, FetchError> {
        let location = parsed.to_string();
        let url = location.as_str();
        log::debug!("Getting file {url}");

        // HEAD is optional for servers; some reject it outright.
        let probe = self
            .client
            .head(parsed.clone())
            .send()
            .await
            .map_err(|err| map_reqwest_error(url, err))?;
        let probe_unsupported = matches!(
            probe.status(),
            StatusCode::BAD_REQUEST | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        );
        if !probe_unsupported {
            check_status(url, &probe)?;
            self.check_advertised_length(url, &probe)?;
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|err| map_reqwest_error(url, err))?;
        check_status(url, &response)?;
        self.check_advertised_length(url, &response)?;

        let header_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(url, err))?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(url, None));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchedContent {
            content: decode(url, bytes)?,
            content_type: content_type.map(str::to_string).or(header_type),
            url: url.to_string(),
        })
    }

    fn check_advertised_length(&self, url: &str, response: &Response) -> Result<(), FetchError> {
        let advertised = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        match advertised {
            Some(len) if len > self.settings.max_bytes => Err(self.too_large(url, Some(len))),
            _ => Ok(()),
        }
    }

    fn too_large(&self, url: &str, actual: Option<u64>) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual,
            },
            url,
            "remote file is too big",
        )
    }
}

fn check_status(url: &str, response: &Response) -> Result<(), FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let kind = if status == StatusCode::NOT_FOUND {
        FailureKind::NotFound
    } else {
        FailureKind::HttpStatus(status.as_u16())
    };
    Err(FetchError::new(kind, url, status.to_string()))
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, url, err.to_string());
    }
    FetchError::new(FailureKind::Connection, url, err.to_string())
}

fn decode(url: &str, bytes: Vec<u8>) -> Result<String, FetchError> {
    String::from_utf8(bytes)
        .map_err(|err| FetchError::new(FailureKind::Io, url, format!("content is not UTF-8: {err}")))
}
