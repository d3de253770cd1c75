use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::FilterWeights;

pub const ENV_PREFIX: &str = "ATELIER_";
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["atelier.toml", "config/atelier.toml"];
/// 30 days.
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub catalog: CatalogConfig,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

/// Durable cache tier.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub namespace: String,
    pub recommendation_ttl_secs: u64,
    pub trending_ttl_secs: u64,
    pub memory_capacity: usize,
    pub durable_max_bytes: usize,
    /// Total bytes the durable tier may hold across namespaces.
    pub durable_quota_bytes: usize,
    pub session_quota_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    /// Commerce API root. Unset means the CLI reads a catalog file instead.
    pub base_url: Option<String>,
    pub api_token: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringConfig {
    pub base_score: f64,
    pub text_relevance: f64,
    pub preference_match: f64,
    pub seasonal_match: f64,
    pub trending_boost: f64,
    pub value: f64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub cache_namespace: Option<String>,
    pub catalog_base_url: Option<String>,
    pub catalog_api_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://atelier-cache.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            cache: CacheConfig {
                namespace: "atelier".to_string(),
                recommendation_ttl_secs: 30 * 60,
                trending_ttl_secs: 60 * 60,
                memory_capacity: 256,
                durable_max_bytes: 64 * 1024,
                durable_quota_bytes: 16 * 1024 * 1024,
                session_quota_bytes: 1024 * 1024,
            },
            catalog: CatalogConfig { base_url: None, api_token: None, timeout_secs: 10 },
            scoring: ScoringConfig::from(FilterWeights::default()),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl From<FilterWeights> for ScoringConfig {
    fn from(weights: FilterWeights) -> Self {
        Self {
            base_score: weights.base_score,
            text_relevance: weights.text_relevance,
            preference_match: weights.preference_match,
            seasonal_match: weights.seasonal_match,
            trending_boost: weights.trending_boost,
            value: weights.value,
        }
    }
}

impl ScoringConfig {
    pub fn filter_weights(&self) -> FilterWeights {
        FilterWeights {
            base_score: self.base_score,
            text_relevance: self.text_relevance,
            preference_match: self.preference_match,
            seasonal_match: self.seasonal_match,
            trending_boost: self.trending_boost,
            value: self.value,
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(namespace) = cache.namespace {
                self.cache.namespace = namespace;
            }
            if let Some(ttl) = cache.recommendation_ttl_secs {
                self.cache.recommendation_ttl_secs = ttl;
            }
            if let Some(ttl) = cache.trending_ttl_secs {
                self.cache.trending_ttl_secs = ttl;
            }
            if let Some(memory_capacity) = cache.memory_capacity {
                self.cache.memory_capacity = memory_capacity;
            }
            if let Some(durable_max_bytes) = cache.durable_max_bytes {
                self.cache.durable_max_bytes = durable_max_bytes;
            }
            if let Some(durable_quota_bytes) = cache.durable_quota_bytes {
                self.cache.durable_quota_bytes = durable_quota_bytes;
            }
            if let Some(session_quota_bytes) = cache.session_quota_bytes {
                self.cache.session_quota_bytes = session_quota_bytes;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(base_url) = catalog.base_url {
                self.catalog.base_url = Some(base_url);
            }
            if let Some(catalog_api_token_value) = catalog.api_token {
                self.catalog.api_token = Some(secret_value(catalog_api_token_value));
            }
            if let Some(timeout_secs) = catalog.timeout_secs {
                self.catalog.timeout_secs = timeout_secs;
            }
        }

        if let Some(scoring) = patch.scoring {
            let current = &mut self.scoring;
            for (target, value) in [
                (&mut current.base_score, scoring.base_score),
                (&mut current.text_relevance, scoring.text_relevance),
                (&mut current.preference_match, scoring.preference_match),
                (&mut current.seasonal_match, scoring.seasonal_match),
                (&mut current.trending_boost, scoring.trending_boost),
                (&mut current.value, scoring.value),
            ] {
                if let Some(value) = value {
                    *target = value;
                }
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ATELIER_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ATELIER_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("ATELIER_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ATELIER_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ATELIER_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ATELIER_CACHE_NAMESPACE") {
            self.cache.namespace = value;
        }
        if let Some(value) = read_env("ATELIER_CACHE_RECOMMENDATION_TTL_SECS") {
            self.cache.recommendation_ttl_secs =
                parse_u64("ATELIER_CACHE_RECOMMENDATION_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("ATELIER_CACHE_TRENDING_TTL_SECS") {
            self.cache.trending_ttl_secs = parse_u64("ATELIER_CACHE_TRENDING_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("ATELIER_CACHE_MEMORY_CAPACITY") {
            self.cache.memory_capacity = parse_usize("ATELIER_CACHE_MEMORY_CAPACITY", &value)?;
        }
        if let Some(value) = read_env("ATELIER_CACHE_DURABLE_MAX_BYTES") {
            self.cache.durable_max_bytes = parse_usize("ATELIER_CACHE_DURABLE_MAX_BYTES", &value)?;
        }
        if let Some(value) = read_env("ATELIER_CACHE_DURABLE_QUOTA_BYTES") {
            self.cache.durable_quota_bytes =
                parse_usize("ATELIER_CACHE_DURABLE_QUOTA_BYTES", &value)?;
        }
        if let Some(value) = read_env("ATELIER_CACHE_SESSION_QUOTA_BYTES") {
            self.cache.session_quota_bytes =
                parse_usize("ATELIER_CACHE_SESSION_QUOTA_BYTES", &value)?;
        }

        if let Some(value) = read_env("ATELIER_CATALOG_BASE_URL") {
            self.catalog.base_url = Some(value);
        }
        if let Some(value) = read_env("ATELIER_CATALOG_API_TOKEN") {
            self.catalog.api_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("ATELIER_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_secs = parse_u64("ATELIER_CATALOG_TIMEOUT_SECS", &value)?;
        }

        for (key, target) in [
            ("ATELIER_SCORING_BASE_SCORE", &mut self.scoring.base_score),
            ("ATELIER_SCORING_TEXT_RELEVANCE", &mut self.scoring.text_relevance),
            ("ATELIER_SCORING_PREFERENCE_MATCH", &mut self.scoring.preference_match),
            ("ATELIER_SCORING_SEASONAL_MATCH", &mut self.scoring.seasonal_match),
            ("ATELIER_SCORING_TRENDING_BOOST", &mut self.scoring.trending_boost),
            ("ATELIER_SCORING_VALUE", &mut self.scoring.value),
        ] {
            if let Some(value) = read_env(key) {
                *target = parse_f64(key, &value)?;
            }
        }

        let log_level = read_env("ATELIER_LOGGING_LEVEL").or_else(|| read_env("ATELIER_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ATELIER_LOGGING_FORMAT").or_else(|| read_env("ATELIER_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(namespace) = overrides.cache_namespace {
            self.cache.namespace = namespace;
        }
        if let Some(base_url) = overrides.catalog_base_url {
            self.catalog.base_url = Some(base_url);
        }
        if let Some(catalog_api_token) = overrides.catalog_api_token {
            self.catalog.api_token = Some(secret_value(catalog_api_token));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_cache(&self.cache)?;
        validate_catalog(&self.catalog)?;
        validate_scoring(&self.scoring)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    let namespace = cache.namespace.trim();
    if namespace.is_empty() || namespace.contains(':') {
        return Err(ConfigError::Validation(
            "cache.namespace must be non-empty and must not contain `:`".to_string(),
        ));
    }

    let ttl_range = 1..=MAX_CACHE_TTL_SECS;
    if !ttl_range.contains(&cache.recommendation_ttl_secs)
        || !ttl_range.contains(&cache.trending_ttl_secs)
    {
        return Err(ConfigError::Validation(format!(
            "cache.recommendation_ttl_secs and cache.trending_ttl_secs must be in range \
             1..={MAX_CACHE_TTL_SECS}"
        )));
    }

    if cache.memory_capacity == 0 {
        return Err(ConfigError::Validation(
            "cache.memory_capacity must be greater than zero".to_string(),
        ));
    }

    if cache.durable_max_bytes == 0 || cache.session_quota_bytes == 0 {
        return Err(ConfigError::Validation(
            "cache.durable_max_bytes and cache.session_quota_bytes must be greater than zero"
                .to_string(),
        ));
    }

    if cache.durable_quota_bytes < cache.durable_max_bytes {
        return Err(ConfigError::Validation(
            "cache.durable_quota_bytes must be at least cache.durable_max_bytes".to_string(),
        ));
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &catalog.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "catalog.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    let blank_token =
        catalog.api_token.as_ref().is_some_and(|token| token.expose_secret().trim().is_empty());
    if blank_token {
        return Err(ConfigError::Validation(
            "catalog.api_token is set but empty; remove it or provide a token".to_string(),
        ));
    }

    if catalog.timeout_secs == 0 || catalog.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "catalog.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&scoring.base_score) {
        return Err(ConfigError::Validation(
            "scoring.base_score must be in range 0..=100".to_string(),
        ));
    }

    let weights = [
        ("text_relevance", scoring.text_relevance),
        ("preference_match", scoring.preference_match),
        ("seasonal_match", scoring.seasonal_match),
        ("trending_boost", scoring.trending_boost),
        ("value", scoring.value),
    ];
    let invalid = weights.iter().find(|(_, weight)| !weight.is_finite() || *weight < 0.0);
    if let Some((name, _)) = invalid {
        return Err(ConfigError::Validation(format!(
            "scoring.{name} must be a finite, non-negative number"
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    cache: Option<CachePatch>,
    catalog: Option<CatalogPatch>,
    scoring: Option<ScoringPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    namespace: Option<String>,
    recommendation_ttl_secs: Option<u64>,
    trending_ttl_secs: Option<u64>,
    memory_capacity: Option<usize>,
    durable_max_bytes: Option<usize>,
    durable_quota_bytes: Option<usize>,
    session_quota_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    base_score: Option<f64>,
    text_relevance: Option<f64>,
    preference_match: Option<f64>,
    seasonal_match: Option<f64>,
    trending_boost: Option<f64>,
    value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_and_match_engine_constants() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.cache.recommendation_ttl_secs == 1800, "recommendation ttl should be 30m")?;
        ensure(config.cache.trending_ttl_secs == 3600, "trending ttl should be 1h")?;
        ensure(
            config.scoring.filter_weights() == crate::scoring::DEFAULT_FILTER_WEIGHTS,
            "scoring defaults should mirror filter weights",
        )?;
        ensure(config.catalog.base_url.is_none(), "catalog base url should default to unset")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_ATELIER_CATALOG_TOKEN", "shpat-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("atelier.toml");
            fs::write(
                &path,
                r#"
[catalog]
base_url = "https://shop.example.com/api"
api_token = "${TEST_ATELIER_CATALOG_TOKEN}"

[scoring]
text_relevance = 25.0
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let token =
                config.catalog.api_token.as_ref().map(|token| token.expose_secret().to_string());
            ensure(
                token.as_deref() == Some("shpat-from-env"),
                "token should come from environment",
            )?;
            ensure(config.scoring.text_relevance == 25.0, "file weight should override default")?;
            ensure(config.scoring.preference_match == 15.0, "unset weights keep defaults")?;
            Ok(())
        })();

        clear_vars(&["TEST_ATELIER_CATALOG_TOKEN"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("atelier.toml");
        fs::write(&path, "[catalog]\napi_token = \"${ATELIER_TEST_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let options = LoadOptions { config_path: Some(path), ..LoadOptions::default() };
        let error = match AppConfig::load(options) {
            Ok(_) => return Err("expected interpolation failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(
                error,
                ConfigError::MissingEnvInterpolation { ref var } if var == "ATELIER_TEST_UNSET_VAR"
            ),
            "error should name the missing variable",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ATELIER_LOG_LEVEL", "warn");
        env::set_var("ATELIER_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["ATELIER_LOG_LEVEL", "ATELIER_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ATELIER_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("ATELIER_CACHE_NAMESPACE", "from-env");
        env::set_var("ATELIER_SCORING_VALUE", "7.5");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("atelier.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[cache]
namespace = "from-file"
memory_capacity = 32

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.cache.namespace == "from-env", "env namespace should win over file")?;
            ensure(config.cache.memory_capacity == 32, "file capacity should win over default")?;
            ensure(config.scoring.value == 7.5, "env weight should be parsed")?;
            Ok(())
        })();

        clear_vars(&["ATELIER_DATABASE_URL", "ATELIER_CACHE_NAMESPACE", "ATELIER_SCORING_VALUE"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ATELIER_CATALOG_BASE_URL", "shop.example.com");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("catalog.base_url")
            );
            ensure(has_message, "validation failure should mention catalog.base_url")
        })();

        clear_vars(&["ATELIER_CATALOG_BASE_URL"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ATELIER_CACHE_MEMORY_CAPACITY", "lots");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override failure".to_string()),
            Err(error) => ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "ATELIER_CACHE_MEMORY_CAPACITY"
                ),
                "error should name the offending key",
            ),
        };

        clear_vars(&["ATELIER_CACHE_MEMORY_CAPACITY"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ATELIER_CATALOG_API_TOKEN", "shpat-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("shpat-secret-value"),
                "debug output should not contain the token",
            )
        })();

        clear_vars(&["ATELIER_CATALOG_API_TOKEN"]);
        result
    }
}
