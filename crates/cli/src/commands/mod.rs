pub mod cache_prune;
pub mod config;
pub mod filter;
pub mod look;
pub mod migrate;
pub mod recommend;

use std::fs;
use std::path::Path;

use atelier_core::config::{AppConfig, LoadOptions};
use atelier_core::errors::ApplicationError;
use atelier_core::source::InMemoryCatalog;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_RUNTIME_INIT: u8 = 1;
pub const EXIT_DB_CONNECTIVITY: u8 = 4;
pub const EXIT_MIGRATION: u8 = 5;
pub const EXIT_CACHE_STORE: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: &T,
    ) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => {
                let payload = CommandOutcome {
                    command: command.to_string(),
                    status: "ok".to_string(),
                    error_class: None,
                    message: message.into(),
                    data: Some(data),
                };
                Self { exit_code: 0, output: serialize_payload(payload) }
            }
            Err(error) => Self::failure(
                command,
                "serialization",
                format!("could not encode result: {error}"),
                EXIT_RUNTIME_INIT,
            ),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(
            command,
            error.error_class(),
            format!("{} ({error})", error.user_message()),
            error.exit_code(),
        )
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\
             \"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(
    command: &str,
    config_path: Option<&Path>,
) -> Result<AppConfig, CommandResult> {
    let options =
        LoadOptions { config_path: config_path.map(Path::to_path_buf), ..LoadOptions::default() };
    AppConfig::load(options).map_err(|error| {
        CommandResult::from_error(command, &ApplicationError::Configuration(error.to_string()))
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME_INIT,
        )
    })
}

pub(crate) fn read_catalog(path: &Path) -> Result<InMemoryCatalog, ApplicationError> {
    read_fingerprinted_catalog(path).map(|(catalog, _)| catalog)
}

/// Catalog file plus `file:<blake3 of its bytes>`, used to scope cached results.
pub(crate) fn read_fingerprinted_catalog(
    path: &Path,
) -> Result<(InMemoryCatalog, String), ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        let path = path.display();
        ApplicationError::InvalidInput(format!("could not read catalog `{path}`: {error}"))
    })?;
    let catalog = InMemoryCatalog::from_json(&raw).map_err(|error| {
        let path = path.display();
        ApplicationError::InvalidInput(format!("catalog `{path}` is not valid: {error}"))
    })?;
    Ok((catalog, format!("file:{}", blake3::hash(raw.as_bytes()).to_hex())))
}

pub(crate) fn read_json_file<T: serde::de::DeserializeOwned>(
    path: &Path,
    what: &str,
) -> Result<T, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        let path = path.display();
        ApplicationError::InvalidInput(format!("could not read {what} `{path}`: {error}"))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        ApplicationError::InvalidInput(format!("{what} `{}` is not valid: {error}", path.display()))
    })
}
