use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use atelier_cli::commands::filter::FilterArgs;
use atelier_cli::commands::look::LookArgs;
use atelier_cli::commands::recommend::RecommendArgs;
use atelier_cli::commands::{cache_prune, config, filter, look, migrate, recommend};
use serde_json::Value;
use tempfile::TempDir;

const IN_MEMORY_DATABASE: &[(&str, &str)] =
    &[("ATELIER_DATABASE_URL", "sqlite::memory:"), ("ATELIER_DATABASE_MAX_CONNECTIONS", "1")];

const CATALOG: &str = r#"{
  "products": [
    {"id": "s-navy", "name": "Navy Wool Suit", "price": 49900, "category": "Suits", "color": "navy",
     "occasions": ["business"], "variants": [{"size": "40R", "stock": 3}]},
    {"id": "s-charcoal", "name": "Charcoal Wool Suit", "price": 52900, "category": "Suits",
     "color": "charcoal", "occasions": ["business"], "variants": [{"size": "40R", "stock": 2}]},
    {"id": "s-tan", "name": "Tan Linen Suit", "price": 39900, "category": "Suits", "color": "tan",
     "variants": [{"size": "42R", "stock": 1}]},
    {"id": "sh-white", "name": "White Dress Shirt", "price": 7900, "category": "Shirts",
     "color": "white"},
    {"id": "t-burg", "name": "Burgundy Silk Tie", "price": 3900, "category": "Ties",
     "color": "burgundy"}
  ],
  "affinities": {
    "s-navy": {"relatedProducts": [{"productId": "sh-white", "score": 0.9, "cooccurrence": 21}]}
  }
}"#;

#[test]
fn filter_returns_scored_matches() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let args = FilterArgs {
            catalog: write_catalog(&dir),
            categories: vec!["suits".to_string()],
            colors: vec!["navy".to_string()],
            ..FilterArgs::default()
        };

        let result = filter::run(None, &args);
        assert_eq!(result.exit_code, 0, "expected successful filter run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "filter");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["products"][0]["product"]["id"], "s-navy");
        assert_eq!(payload["data"]["metadata"]["total_matches"], 1);
    });
}

#[test]
fn filter_rejects_missing_catalog_file() {
    with_env(&[], || {
        let args = FilterArgs {
            catalog: PathBuf::from("does-not-exist/catalog.json"),
            ..FilterArgs::default()
        };

        let result = filter::run(None, &args);
        assert_eq!(result.exit_code, 3, "expected invalid input code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn recommend_similar_products_from_catalog_file() {
    with_env(IN_MEMORY_DATABASE, || {
        let dir = TempDir::new().expect("tempdir");
        let args = RecommendArgs {
            kind: "similar-products".to_string(),
            catalog: Some(write_catalog(&dir)),
            product_id: Some("s-navy".to_string()),
            ..RecommendArgs::default()
        };

        let result = recommend::run(None, &args);
        assert_eq!(result.exit_code, 0, "expected successful recommend run");

        let payload = parse_payload(&result.output);
        let items = payload["data"].as_array().expect("recommendation list");
        assert!(!items.is_empty());
        assert!(items.iter().all(|item| item["product"]["id"] != "s-navy"));
        assert!(items.iter().all(|item| item["kind"] == "similar_products"));
    });
}

#[test]
fn recommend_also_bought_reports_cooccurrence() {
    with_env(IN_MEMORY_DATABASE, || {
        let dir = TempDir::new().expect("tempdir");
        let args = RecommendArgs {
            kind: "customers_also_bought".to_string(),
            catalog: Some(write_catalog(&dir)),
            product_id: Some("s-navy".to_string()),
            ..RecommendArgs::default()
        };

        let result = recommend::run(None, &args);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"][0]["product"]["id"], "sh-white");
        assert_eq!(payload["data"][0]["metadata"]["cooccurrence"], 21);
    });
}

#[test]
fn recommend_cache_database_keeps_catalogs_apart() {
    let dir = TempDir::new().expect("tempdir");
    let database_url = format!("sqlite://{}", dir.path().join("cache.db").display());
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    fs::write(
        &first,
        r#"{"products": [
            {"id": "s1", "name": "Navy Suit", "price": 50000, "category": "Suits"},
            {"id": "s2", "name": "Gray Suit", "price": 52000, "category": "Suits"}]}"#,
    )
    .expect("write first catalog");
    fs::write(
        &second,
        r#"{"products": [
            {"id": "s1", "name": "Navy Suit", "price": 50000, "category": "Suits"},
            {"id": "s9", "name": "Tan Suit", "price": 51000, "category": "Suits"}]}"#,
    )
    .expect("write second catalog");

    with_env(&[("ATELIER_DATABASE_URL", database_url.as_str())], || {
        let similar_ids = |catalog: PathBuf| {
            let args = RecommendArgs {
                kind: "similar-products".to_string(),
                catalog: Some(catalog),
                product_id: Some("s1".to_string()),
                ..RecommendArgs::default()
            };
            let result = recommend::run(None, &args);
            assert_eq!(result.exit_code, 0);
            let payload = parse_payload(&result.output);
            payload["data"]
                .as_array()
                .expect("recommendation list")
                .iter()
                .map(|item| item["product"]["id"].as_str().unwrap_or_default().to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(similar_ids(first.clone()), vec!["s2"]);
        assert_eq!(similar_ids(second), vec!["s9"]);
        assert_eq!(similar_ids(first.clone()), vec!["s2"]);

        let refreshed = RecommendArgs {
            kind: "similar-products".to_string(),
            catalog: Some(first),
            product_id: Some("s1".to_string()),
            refresh: true,
            ..RecommendArgs::default()
        };
        let result = recommend::run(None, &refreshed);
        assert_eq!(result.exit_code, 0);
        assert_eq!(parse_payload(&result.output)["data"][0]["product"]["id"], "s2");
    });
}

#[test]
fn recommend_without_any_catalog_is_a_config_failure() {
    with_env(&[], || {
        let args = RecommendArgs {
            kind: "trending-in-size".to_string(),
            size: Some("40R".to_string()),
            ..RecommendArgs::default()
        };

        let result = recommend::run(None, &args);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn recommend_rejects_unknown_type() {
    with_env(&[], || {
        let args =
            RecommendArgs { kind: "frequently-returned".to_string(), ..RecommendArgs::default() };

        let result = recommend::run(None, &args);
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn look_pairs_pieces_with_anchor() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let args = LookArgs { catalog: write_catalog(&dir), product_id: "s-navy".to_string() };

        let result = look::run(&args);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["anchor"]["id"], "s-navy");
        let pieces = payload["data"]["pieces"].as_array().expect("pieces");
        assert!(pieces.iter().any(|piece| piece["product"]["id"] == "sh-white"));
    });
}

#[test]
fn look_for_unknown_anchor_is_invalid_input() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let args = LookArgs { catalog: write_catalog(&dir), product_id: "ghost".to_string() };

        let result = look::run(&args);
        assert_eq!(result.exit_code, 3);
    });
}

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("ATELIER_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run(None);
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_invalid_log_level() {
    with_env(&[("ATELIER_LOGGING_LEVEL", "verbose")], || {
        let result = migrate::run(None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn cache_prune_reports_counts() {
    with_env(IN_MEMORY_DATABASE, || {
        let result = cache_prune::run(None, true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "cache-prune");
        assert_eq!(payload["data"]["expired_recommendations"], 0);
        assert_eq!(payload["data"]["purged"], 0);
    });
}

#[test]
fn config_output_redacts_catalog_token() {
    with_env(&[("ATELIER_CATALOG_API_TOKEN", "shpat_supersecret")], || {
        let output = config::run(None);

        assert!(output.contains("catalog.api_token = shpat_***"));
        assert!(output.contains("env (ATELIER_CATALOG_API_TOKEN)"));
        assert!(!output.contains("supersecret"));
        assert!(output.contains("- cache.recommendation_ttl_secs = 1800 (source: default)"));
    });
}

fn write_catalog(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("catalog.json");
    fs::write(&path, CATALOG).expect("write catalog");
    path
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ATELIER_DATABASE_URL",
        "ATELIER_DATABASE_MAX_CONNECTIONS",
        "ATELIER_DATABASE_TIMEOUT_SECS",
        "ATELIER_CACHE_NAMESPACE",
        "ATELIER_CACHE_RECOMMENDATION_TTL_SECS",
        "ATELIER_CACHE_TRENDING_TTL_SECS",
        "ATELIER_CACHE_MEMORY_CAPACITY",
        "ATELIER_CACHE_DURABLE_MAX_BYTES",
        "ATELIER_CACHE_DURABLE_QUOTA_BYTES",
        "ATELIER_CACHE_SESSION_QUOTA_BYTES",
        "ATELIER_CATALOG_BASE_URL",
        "ATELIER_CATALOG_API_TOKEN",
        "ATELIER_CATALOG_TIMEOUT_SECS",
        "ATELIER_SCORING_BASE_SCORE",
        "ATELIER_SCORING_TEXT_RELEVANCE",
        "ATELIER_SCORING_PREFERENCE_MATCH",
        "ATELIER_SCORING_SEASONAL_MATCH",
        "ATELIER_SCORING_TRENDING_BOOST",
        "ATELIER_SCORING_VALUE",
        "ATELIER_LOGGING_LEVEL",
        "ATELIER_LOGGING_FORMAT",
        "ATELIER_LOG_LEVEL",
        "ATELIER_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
