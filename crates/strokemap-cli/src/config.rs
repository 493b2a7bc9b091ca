// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strokemap_app::{FieldMap, ViewMode, parse_load};
use strokemap_source::DataSource;
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub columns: Columns,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: Source::default(),
            columns: Columns::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub path: Option<String>,
    pub url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Columns {
    pub name: Option<String>,
    pub destination: Option<String>,
    pub inhibitor: Option<String>,
    pub drum: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub view_mode: Option<String>,
    pub default_load: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("STROKEMAP_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set STROKEMAP_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(strokemap_source::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` at the top and put values under [source], [columns], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.source.path.is_some() && self.source.url.is_some() {
            bail!(
                "source.path and source.url in {} are mutually exclusive; keep one",
                path.display()
            );
        }

        if let Some(url) = &self.source.url {
            match DataSource::parse(url)
                .with_context(|| format!("source.url in {}", path.display()))?
            {
                DataSource::Http(_) => {}
                _ => bail!(
                    "source.url in {} must be an http(s) URL, got {url:?}; use source.path for files",
                    path.display()
                ),
            }
        }

        if let Some(data_path) = &self.source.path
            && data_path.trim().is_empty()
        {
            bail!("source.path in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.source.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("source.timeout in {}", path.display()))?;
            if parsed.is_zero() {
                bail!(
                    "source.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        for (key, value) in [
            ("name", &self.columns.name),
            ("destination", &self.columns.destination),
            ("inhibitor", &self.columns.inhibitor),
            ("drum", &self.columns.drum),
        ] {
            if let Some(column) = value
                && column.trim().is_empty()
            {
                bail!(
                    "columns.{key} in {} must name a dataset column",
                    path.display()
                );
            }
        }

        if let Some(view_mode) = &self.ui.view_mode
            && ViewMode::parse(view_mode).is_none()
        {
            bail!(
                "ui.view_mode in {} must be \"wrapped\" or \"scrollable\", got {view_mode:?}",
                path.display()
            );
        }

        if let Some(load) = &self.ui.default_load
            && !load.trim().is_empty()
            && parse_load(load).is_err()
        {
            bail!(
                "ui.default_load in {} must be a number, got {load:?}",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level in {} is not a valid filter; use trace, debug, info, warn, or error",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    /// `--data` wins over `[source]`, which wins over `STROKEMAP_DATA_PATH`.
    pub fn data_source(&self, cli_override: Option<&str>) -> Result<DataSource> {
        if let Some(raw) = cli_override {
            return DataSource::parse(raw);
        }
        if let Some(url) = &self.source.url {
            return DataSource::parse(url);
        }
        match &self.source.path {
            Some(path) => Ok(DataSource::File(PathBuf::from(path))),
            None => strokemap_source::default_data_path().map(DataSource::File),
        }
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.source.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn field_map(&self) -> FieldMap {
        let defaults = FieldMap::default();
        FieldMap {
            name: self.columns.name.clone().unwrap_or(defaults.name),
            destination: self
                .columns
                .destination
                .clone()
                .unwrap_or(defaults.destination),
            inhibitor: self.columns.inhibitor.clone().unwrap_or(defaults.inhibitor),
            drum: self.columns.drum.clone().unwrap_or(defaults.drum),
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.ui
            .view_mode
            .as_deref()
            .and_then(ViewMode::parse)
            .unwrap_or_default()
    }

    pub fn default_load(&self) -> &str {
        self.ui.default_load.as_deref().unwrap_or("").trim()
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => strokemap_source::default_log_path(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        let fields = FieldMap::default();
        format!(
            "# strokemap config\n# Place this file at: {}\n\nversion = 1\n\n[source]\n# One of path or url. Default is the platform data dir (for example ~/.local/share/strokemap/strokemap.csv)\n# path = \"/absolute/path/to/MMA1.csv\"\n# url = \"https://example.com/data/MMA1.csv\"\ntimeout = \"{DEFAULT_TIMEOUT}\"\n\n[columns]\nname = \"{}\"\ndestination = \"{}\"\ninhibitor = \"{}\"\ndrum = \"{}\"\n\n[ui]\nview_mode = \"wrapped\"\n# default_load = \"75\"\n\n[log]\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# file = \"/absolute/path/to/strokemap.log\"\n",
            path.display(),
            fields.name,
            fields.destination,
            fields.inhibitor,
            fields.drum,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (digits, unit): (&str, fn(u64) -> Duration) = if let Some(value) = raw.strip_suffix("ms")
    {
        (value, Duration::from_millis)
    } else if let Some(value) = raw.strip_suffix('s') {
        (value, Duration::from_secs)
    } else if let Some(value) = raw.strip_suffix('m') {
        (value, |mins| Duration::from_secs(mins.saturating_mul(60)))
    } else {
        bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
    };

    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid timeout duration {raw:?}"))?;
    Ok(unit(value))
}
