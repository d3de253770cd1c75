use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use atelier_core::config::{AppConfig, LoadOptions, CONFIG_FILE_CANDIDATES};
use secrecy::ExposeSecret;
use toml::Value;

/// Effective configuration, one line per field with where its value came from.
pub fn run(config_path: Option<&Path>) -> String {
    let options =
        LoadOptions { config_path: config_path.map(Path::to_path_buf), ..LoadOptions::default() };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file_path = detect_config_path(config_path);
    let file_doc = load_config_file_doc(file_path.as_deref());
    let catalog_token = match &config.catalog.api_token {
        Some(token) => redact_token(token.expose_secret()),
        None => "<unset>".to_string(),
    };

    let doc = file_doc.as_ref();
    let path = file_path.as_deref();
    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.push(field_line(
        "database.url",
        config.database.url.clone(),
        &["ATELIER_DATABASE_URL"],
        doc,
        path,
    ));
    lines.push(field_line(
        "database.max_connections",
        config.database.max_connections.to_string(),
        &["ATELIER_DATABASE_MAX_CONNECTIONS"],
        doc,
        path,
    ));
    lines.push(field_line(
        "database.timeout_secs",
        config.database.timeout_secs.to_string(),
        &["ATELIER_DATABASE_TIMEOUT_SECS"],
        doc,
        path,
    ));
    lines.push(field_line(
        "cache.namespace",
        config.cache.namespace.clone(),
        &["ATELIER_CACHE_NAMESPACE"],
        doc,
        path,
    ));
    lines.push(field_line(
        "cache.recommendation_ttl_secs",
        config.cache.recommendation_ttl_secs.to_string(),
        &["ATELIER_CACHE_RECOMMENDATION_TTL_SECS"],
        doc,
        path,
    ));
    lines.push(field_line(
        "cache.trending_ttl_secs",
        config.cache.trending_ttl_secs.to_string(),
        &["ATELIER_CACHE_TRENDING_TTL_SECS"],
        doc,
        path,
    ));
    lines.push(field_line(
        "cache.memory_capacity",
        config.cache.memory_capacity.to_string(),
        &["ATELIER_CACHE_MEMORY_CAPACITY"],
        doc,
        path,
    ));
    lines.push(field_line(
        "cache.durable_max_bytes",
        config.cache.durable_max_bytes.to_string(),
        &["ATELIER_CACHE_DURABLE_MAX_BYTES"],
        doc,
        path,
    ));
    lines.push(field_line(
        "cache.durable_quota_bytes",
        config.cache.durable_quota_bytes.to_string(),
        &["ATELIER_CACHE_DURABLE_QUOTA_BYTES"],
        doc,
        path,
    ));
    lines.push(field_line(
        "cache.session_quota_bytes",
        config.cache.session_quota_bytes.to_string(),
        &["ATELIER_CACHE_SESSION_QUOTA_BYTES"],
        doc,
        path,
    ));
    lines.push(field_line(
        "catalog.base_url",
        config.catalog.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
        &["ATELIER_CATALOG_BASE_URL"],
        doc,
        path,
    ));
    lines.push(field_line(
        "catalog.api_token",
        catalog_token,
        &["ATELIER_CATALOG_API_TOKEN"],
        doc,
        path,
    ));
    lines.push(field_line(
        "catalog.timeout_secs",
        config.catalog.timeout_secs.to_string(),
        &["ATELIER_CATALOG_TIMEOUT_SECS"],
        doc,
        path,
    ));
    lines.push(field_line(
        "scoring.base_score",
        config.scoring.base_score.to_string(),
        &["ATELIER_SCORING_BASE_SCORE"],
        doc,
        path,
    ));
    lines.push(field_line(
        "scoring.text_relevance",
        config.scoring.text_relevance.to_string(),
        &["ATELIER_SCORING_TEXT_RELEVANCE"],
        doc,
        path,
    ));
    lines.push(field_line(
        "scoring.preference_match",
        config.scoring.preference_match.to_string(),
        &["ATELIER_SCORING_PREFERENCE_MATCH"],
        doc,
        path,
    ));
    lines.push(field_line(
        "scoring.seasonal_match",
        config.scoring.seasonal_match.to_string(),
        &["ATELIER_SCORING_SEASONAL_MATCH"],
        doc,
        path,
    ));
    lines.push(field_line(
        "scoring.trending_boost",
        config.scoring.trending_boost.to_string(),
        &["ATELIER_SCORING_TRENDING_BOOST"],
        doc,
        path,
    ));
    lines.push(field_line(
        "scoring.value",
        config.scoring.value.to_string(),
        &["ATELIER_SCORING_VALUE"],
        doc,
        path,
    ));
    lines.push(field_line(
        "logging.level",
        config.logging.level.clone(),
        &["ATELIER_LOGGING_LEVEL", "ATELIER_LOG_LEVEL"],
        doc,
        path,
    ));
    lines.push(field_line(
        "logging.format",
        format!("{:?}", config.logging.format),
        &["ATELIER_LOGGING_FORMAT", "ATELIER_LOG_FORMAT"],
        doc,
        path,
    ));

    lines.join("\n")
}

fn field_line(
    key: &str,
    value: String,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    render_line(key, &value, field_source(key, env_keys, config_file_doc, config_file_path))
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a vendor prefix such as `shpat_` so operators can tell tokens apart.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once(['_', '-']) {
        return format!("{prefix}_***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn tokens_keep_only_their_prefix() {
        assert_eq!(redact_token("shpat_abc123"), "shpat_***");
        assert_eq!(redact_token("opaque"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
    }

    #[test]
    fn dotted_paths_walk_nested_tables() {
        let doc: toml::Value = "[cache]\nnamespace = \"shop\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "cache.namespace"));
        assert!(!contains_path(&doc, "cache.trending_ttl_secs"));
    }
}
