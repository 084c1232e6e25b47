//! Configuration loading from TOML files and environment overrides
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! A missing or unreadable file falls back to `Config::default()`. After that,
//! environment variables (HOST, PORT, ZONE1_LAT, ...) override individual values.

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// A zone definition as written in configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneDefinition {
    pub id: String,
    pub name: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_meters: f64,
}

impl ZoneDefinition {
    pub fn new(id: &str, name: &str, center_lat: f64, center_lon: f64, radius_meters: f64) -> Self {
        Self { id: id.to_string(), name: name.to_string(), center_lat, center_lon, radius_meters }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for the web frontend
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Public base URL handed to the frontend (default: http://localhost:{port})
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            api_base_url: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> String {
    "static".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_map_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_map_center_lon")]
    pub center_lon: f64,
    #[serde(default = "default_map_zoom")]
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_map_center_lat(),
            center_lon: default_map_center_lon(),
            zoom: default_map_zoom(),
        }
    }
}

fn default_map_center_lat() -> f64 {
    37.7749
}

fn default_map_center_lon() -> f64 {
    -122.4194
}

fn default_map_zoom() -> u8 {
    12
}

/// Log line output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback log filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: LogFormat::default() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Interval between metrics summary log lines (0 to disable)
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Retained events per vehicle (0 = unbounded)
    #[serde(default = "default_max_events_per_vehicle")]
    pub max_events_per_vehicle: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_events_per_vehicle: default_max_events_per_vehicle() }
    }
}

fn default_max_events_per_vehicle() -> usize {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default = "Config::default_zones")]
    pub zones: Vec<ZoneDefinition>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    host: String,
    port: u16,
    static_dir: String,
    api_base_url: Option<String>,
    map_center_lat: f64,
    map_center_lon: f64,
    map_zoom: u8,
    log_level: String,
    log_format: LogFormat,
    metrics_interval_secs: u64,
    max_events_per_vehicle: usize,
    zones: Vec<ZoneDefinition>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            api_base_url: None,
            map_center_lat: default_map_center_lat(),
            map_center_lon: default_map_center_lon(),
            map_zoom: default_map_zoom(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_interval_secs: default_metrics_interval(),
            max_events_per_vehicle: default_max_events_per_vehicle(),
            zones: Self::default_zones(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    fn default_zones() -> Vec<ZoneDefinition> {
        vec![
            ZoneDefinition::new("zone1", "Downtown", 37.7749, -122.4194, 1000.0),
            ZoneDefinition::new("zone2", "Airport", 37.6213, -122.3790, 2000.0),
            ZoneDefinition::new("zone3", "Stadium", 37.7786, -122.3893, 500.0),
        ]
    }

    /// Determine config file path from the CLI flag or environment
    pub fn resolve_config_path(cli_path: Option<String>) -> String {
        Self::resolve_config_path_with(cli_path, |key| env::var(key).ok())
    }

    /// Same as `resolve_config_path` with an explicit variable lookup
    pub fn resolve_config_path_with<F>(cli_path: Option<String>, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        cli_path
            .or_else(|| lookup("CONFIG_FILE"))
            .unwrap_or_else(|| "config/dev.toml".to_string())
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            host: toml_config.server.host,
            port: toml_config.server.port,
            static_dir: toml_config.server.static_dir,
            api_base_url: toml_config.server.api_base_url,
            map_center_lat: toml_config.map.center_lat,
            map_center_lon: toml_config.map.center_lon,
            map_zoom: toml_config.map.zoom,
            log_level: toml_config.logging.level,
            log_format: toml_config.logging.format,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            max_events_per_vehicle: toml_config.history.max_events_per_vehicle,
            zones: toml_config.zones,
            config_file: path.display().to_string(),
        })
    }

    /// Apply environment overrides using the given variable lookup
    ///
    /// Recognised keys: HOST, PORT, API_BASE_URL, LOG_LEVEL, LOG_FORMAT,
    /// DEFAULT_MAP_CENTER_LAT, DEFAULT_MAP_CENTER_LON, DEFAULT_MAP_ZOOM and
    /// ZONE{n}_ID / _NAME / _LAT / _LON / _RADIUS for the n-th zone (1-based).
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        override_parsed(&lookup, "PORT", &mut self.port);
        if let Some(url) = lookup("API_BASE_URL") {
            self.api_base_url = Some(url);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        override_parsed(&lookup, "LOG_FORMAT", &mut self.log_format);
        override_parsed(&lookup, "DEFAULT_MAP_CENTER_LAT", &mut self.map_center_lat);
        override_parsed(&lookup, "DEFAULT_MAP_CENTER_LON", &mut self.map_center_lon);
        override_parsed(&lookup, "DEFAULT_MAP_ZOOM", &mut self.map_zoom);

        for (i, zone) in self.zones.iter_mut().enumerate() {
            let prefix = format!("ZONE{}", i + 1);
            if let Some(id) = lookup(&format!("{prefix}_ID")) {
                zone.id = id;
            }
            if let Some(name) = lookup(&format!("{prefix}_NAME")) {
                zone.name = name;
            }
            override_parsed(&lookup, &format!("{prefix}_LAT"), &mut zone.center_lat);
            override_parsed(&lookup, &format!("{prefix}_LON"), &mut zone.center_lon);
            override_parsed(&lookup, &format!("{prefix}_RADIUS"), &mut zone.radius_meters);
        }

        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn static_dir(&self) -> &str {
        &self.static_dir
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url.clone().unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }

    pub fn map_center_lat(&self) -> f64 {
        self.map_center_lat
    }

    pub fn map_center_lon(&self) -> f64 {
        self.map_center_lon
    }

    pub fn map_zoom(&self) -> u8 {
        self.map_zoom
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn max_events_per_vehicle(&self) -> usize {
        self.max_events_per_vehicle
    }

    pub fn zones(&self) -> &[ZoneDefinition] {
        &self.zones
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!(key = %key, value = %raw, "env_override_ignored"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.port(), 5000);
        assert_eq!(config.map_zoom(), 12);
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.api_base_url(), "http://localhost:5000");
        assert_eq!(config.zones().len(), 3);
        assert_eq!(config.zones()[0].id, "zone1");
        assert_eq!(config.zones()[1].name, "Airport");
        assert_eq!(config.zones()[2].radius_meters, 500.0);
    }

    #[test]
    fn test_resolve_config_path_prefers_cli() {
        assert_eq!(
            Config::resolve_config_path(Some("config/prod.toml".to_string())),
            "config/prod.toml"
        );
    }

    #[test]
    fn test_resolve_config_path_from_env() {
        assert_eq!(
            Config::resolve_config_path_with(None, lookup_from(&[("CONFIG_FILE", "/etc/fleet.toml")])),
            "/etc/fleet.toml"
        );
    }

    #[test]
    fn test_resolve_config_path_default() {
        assert_eq!(Config::resolve_config_path_with(None, lookup_from(&[])), "config/dev.toml");
    }

    #[test]
    fn test_resolve_config_path_cli_beats_env() {
        let lookup = lookup_from(&[("CONFIG_FILE", "/etc/fleet.toml")]);
        assert_eq!(
            Config::resolve_config_path_with(Some("local.toml".to_string()), lookup),
            "local.toml"
        );
    }

    #[test]
    fn test_log_format_override() {
        assert_eq!(Config::default().log_format(), LogFormat::Text);

        let config = Config::default().with_env_overrides(lookup_from(&[("LOG_FORMAT", "JSON")]));
        assert_eq!(config.log_format(), LogFormat::Json);

        let config = Config::default().with_env_overrides(lookup_from(&[("LOG_FORMAT", "xml")]));
        assert_eq!(config.log_format(), LogFormat::Text);
    }

    #[test]
    fn test_env_overrides_server_and_map() {
        let config = Config::default().with_env_overrides(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("LOG_LEVEL", "DEBUG"),
            ("DEFAULT_MAP_CENTER_LAT", "40.7128"),
            ("DEFAULT_MAP_ZOOM", "9"),
        ]));
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.map_center_lat(), 40.7128);
        assert_eq!(config.map_center_lon(), -122.4194);
        assert_eq!(config.map_zoom(), 9);
        assert_eq!(config.api_base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_env_overrides_zone_fields() {
        let config = Config::default().with_env_overrides(lookup_from(&[
            ("ZONE2_ID", "sfo"),
            ("ZONE2_NAME", "SFO Terminal"),
            ("ZONE2_RADIUS", "750"),
            ("ZONE3_LAT", "37.7800"),
        ]));
        assert_eq!(config.zones()[0].id, "zone1");
        assert_eq!(config.zones()[1].id, "sfo");
        assert_eq!(config.zones()[1].name, "SFO Terminal");
        assert_eq!(config.zones()[1].radius_meters, 750.0);
        assert_eq!(config.zones()[2].center_lat, 37.78);
    }

    #[test]
    fn test_unparsable_override_is_ignored() {
        let config = Config::default()
            .with_env_overrides(lookup_from(&[("PORT", "not-a-port"), ("ZONE1_RADIUS", "wide")]));
        assert_eq!(config.port(), 5000);
        assert_eq!(config.zones()[0].radius_meters, 1000.0);
    }

    #[test]
    fn test_explicit_api_base_url_wins() {
        let config = Config::default()
            .with_env_overrides(lookup_from(&[("API_BASE_URL", "https://fleet.example.com")]));
        assert_eq!(config.api_base_url(), "https://fleet.example.com");
    }
}
