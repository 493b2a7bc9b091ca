// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strokemap_app::Dataset;
use time::OffsetDateTime;
use tracing::{debug, info};
use url::Url;

pub const APP_NAME: &str = "strokemap";
pub const DEFAULT_DATA_FILE: &str = "strokemap.csv";
pub const DEFAULT_LOG_FILE: &str = "strokemap.log";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Built-in dataset for `--demo`.
pub const DEMO_DATASET: &str = "\
Feed pump,Destination,Inhibitor,Drum,1-60%,61-65%,66-70%,71-80%,81-100%
CI-1 Feed Pump,Well 12 Annulus,Corrosion,D-201,8,10,11,13,16
CI-1 Feed Pump,Flowline North,Corrosion,D-201,5,6,7,9,11
SI-2 Feed Pump,Separator Inlet,Scale,D-214,12,14,15,18,22
SI-2 Feed Pump,Heater Treater,Scale,D-214,6,7,,9,12
PI-3 Booster,Tank Battery,Paraffin,D-230,15,17,19,22,26
BIO-4 Injection Pump,Produced Water Tank,Biocide,D-242,3,4,4,5,6
HI-5 Feed Pump,Compressor Suction,Hydrate,D-255,20,22,24,27,31
HI-5 Feed Pump,Flowline South,Hydrate,D-255,18,,21,24,28
EB-6 Transfer Pump,Free Water Knockout,Emulsion Breaker,D-263,9,11,12,14,
";

const MAX_ERROR_BODY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Http(Url),
    Demo,
}

impl DataSource {
    /// Reads a `--data` or config value. `http(s)://` values are fetched over
    /// the network, `file://` URLs and plain strings are filesystem paths.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            bail!("data source must not be empty; pass a file path or an http(s) URL");
        }

        if !looks_like_url(raw) {
            return Ok(Self::File(PathBuf::from(raw)));
        }

        let url = Url::parse(raw).with_context(|| format!("invalid data URL {raw:?}"))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Http(url)),
            "file" => url
                .to_file_path()
                .map(Self::File)
                .map_err(|()| anyhow!("file URL {raw:?} does not name a local path")),
            scheme => bail!(
                "unsupported data URL scheme {scheme:?} in {raw:?}; use http, https, or a filesystem path"
            ),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Http(url) => write!(f, "{url}"),
            Self::Demo => f.write_str("demo"),
        }
    }
}

fn looks_like_url(raw: &str) -> bool {
    match raw.find("://") {
        Some(index) if index > 0 => raw[..index]
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.')),
        _ => false,
    }
}

/// A parsed dataset plus where and when it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub source: DataSource,
    pub loaded_at: OffsetDateTime,
    pub bytes: usize,
}

impl LoadedDataset {
    pub fn summary(&self) -> String {
        let columns = self.dataset.headers().len();
        let rows = self.dataset.rows().len();
        format!("loaded {rows} rows x {columns} columns from {}", self.source)
    }
}

#[derive(Debug, Clone)]
pub struct Loader {
    timeout: Duration,
    http: HttpClient,
}

impl Loader {
    pub fn new(timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            bail!("source timeout must be positive");
        }
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { timeout, http })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fetch_text(&self, source: &DataSource) -> Result<String> {
        match source {
            DataSource::File(path) => read_file(path),
            DataSource::Http(url) => self.fetch_url(url),
            DataSource::Demo => Ok(DEMO_DATASET.to_owned()),
        }
    }

    pub fn load(&self, source: &DataSource) -> Result<LoadedDataset> {
        debug!(%source, "fetching dataset");
        let text = self.fetch_text(source)?;
        let dataset = Dataset::parse(&text);
        let loaded = LoadedDataset {
            dataset,
            source: source.clone(),
            loaded_at: OffsetDateTime::now_utc(),
            bytes: text.len(),
        };
        info!(
            source = %loaded.source,
            rows = loaded.dataset.rows().len(),
            columns = loaded.dataset.headers().len(),
            bytes = loaded.bytes,
            "dataset loaded"
        );
        Ok(loaded)
    }

    fn fetch_url(&self, url: &Url) -> Result<String> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|error| connection_error(url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(url, status, &body));
        }

        response
            .text()
            .with_context(|| format!("read response body from {url}"))
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| {
        format!(
            "read dataset {} -- set [source].path, STROKEMAP_DATA_PATH, or pass --data",
            path.display()
        )
    })
}

fn connection_error(url: &Url, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("timed out fetching {url}; raise [source].timeout or check the server");
    }
    anyhow!("cannot reach {url} -- check the URL and that the server is running ({error})")
}

fn clean_error_response(url: &Url, status: StatusCode, body: &str) -> anyhow::Error {
    let body = body.trim();
    if !body.is_empty() && body.len() < MAX_ERROR_BODY && !body.contains('<') {
        return anyhow!("fetch {url} failed ({}): {body}", status.as_u16());
    }
    anyhow!("fetch {url} failed with status {}", status.as_u16())
}

pub fn default_data_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("STROKEMAP_DATA_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    Ok(data_dir()?.join(DEFAULT_DATA_FILE))
}

pub fn default_log_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DEFAULT_LOG_FILE))
}

fn data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set STROKEMAP_DATA_PATH to the dataset file")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}
