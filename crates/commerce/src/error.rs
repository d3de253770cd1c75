use atelier_core::errors::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("invalid catalog base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("catalog request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("catalog returned status {status} for `{path}`")]
    Status { status: u16, path: String },
    #[error("catalog payload could not be decoded: {0}")]
    Decode(String),
    #[error("catalog has no {what} at `{path}`")]
    Missing { what: &'static str, path: String },
}

impl From<CommerceError> for SourceError {
    fn from(error: CommerceError) -> Self {
        match error {
            CommerceError::Status { status, .. } => SourceError::UpstreamStatus { status },
            CommerceError::Decode(message) => SourceError::Decode(message),
            other => SourceError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use atelier_core::errors::SourceError;

    use super::CommerceError;

    #[test]
    fn status_keeps_code_when_mapped() {
        let error = CommerceError::Status { status: 502, path: "/trending".to_string() };
        assert_eq!(SourceError::from(error), SourceError::UpstreamStatus { status: 502 });
    }

    #[test]
    fn missing_record_maps_to_unavailable() {
        let error = CommerceError::Missing { what: "trending", path: "/api/trending".to_string() };
        assert!(matches!(
            SourceError::from(error),
            SourceError::Unavailable(message) if message.contains("trending")
        ));
    }

    #[test]
    fn bad_base_url_maps_to_unavailable() {
        let error =
            CommerceError::InvalidBaseUrl {
                url: "nope".to_string(),
                reason: "relative".to_string(),
            };
        assert!(matches!(
            SourceError::from(error),
            SourceError::Unavailable(message) if message.contains("nope")
        ));
    }
}
