use std::time::Duration;

use async_trait::async_trait;
use atelier_core::config::CatalogConfig;
use atelier_core::domain::preferences::UserPreferences;
use atelier_core::domain::product::{Product, ProductId};
use atelier_core::errors::SourceError;
use atelier_core::source::{AffinityRecord, CatalogSource, TrendingSnapshot};
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::decode::{decode_list, decode_one, decode_record};
use crate::error::CommerceError;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Storefront JSON API client.
///
/// Routes, relative to the base URL:
/// `GET products[?category=]`, `GET products/{id}`, `GET products/{id}/affinity`,
/// `GET trending`, `GET customers/{id}/style-profile`. A 404 reads as no data
/// on the product routes and as an unavailable record everywhere else.
pub struct HttpCatalogSource {
    client: Client,
    base_url: Url,
    api_token: Option<SecretString>,
}

impl HttpCatalogSource {
    pub fn new(base_url: &str) -> Result<Self, CommerceError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, CommerceError> {
        let base_url = Url::parse(base_url).map_err(|error| CommerceError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: error.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CommerceError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        let client = Client::builder().timeout(timeout).build().map_err(CommerceError::Client)?;
        Ok(Self { client, base_url, api_token: None })
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.api_token = Some(token);
        self
    }

    /// Builds from the `[catalog]` config section; `None` when no base URL is set.
    pub fn from_config(config: &CatalogConfig) -> Result<Option<Self>, CommerceError> {
        let Some(base_url) = config.base_url.as_deref() else {
            return Ok(None);
        };
        let mut source = Self::with_timeout(base_url, Duration::from_secs(config.timeout_secs))?;
        source.api_token = config.api_token.clone();
        Ok(Some(source))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CommerceError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| CommerceError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// `None` on 404 or an empty body.
    async fn get_json(&self, url: Url) -> Result<Option<Value>, CommerceError> {
        let path = url.path().to_string();
        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(CommerceError::Transport)?;
        let status = response.status();
        debug!(
            event_name = "commerce.response",
            path = %path,
            status = status.as_u16(),
            "catalog response"
        );

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CommerceError::Status { status: status.as_u16(), path });
        }

        let body = response.text().await.map_err(CommerceError::Transport)?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|error| CommerceError::Decode(error.to_string()))
    }

    /// A record endpoint must answer with a record; absence is a failure.
    async fn get_record<T: DeserializeOwned>(
        &self,
        url: Url,
        what: &'static str,
    ) -> Result<T, CommerceError> {
        let path = url.path().to_string();
        match self.get_json(url).await? {
            None | Some(Value::Null) => Err(CommerceError::Missing { what, path }),
            Some(payload) => decode_record(payload, what),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_products(&self, category: Option<&str>) -> Result<Vec<Product>, SourceError> {
        let mut url = self.endpoint(&["products"])?;
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("category", category);
        }
        let payload = self.get_json(url).await?;
        Ok(payload.map(|payload| decode_list(payload, "products")).unwrap_or_default())
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, SourceError> {
        let payload = self.get_json(self.endpoint(&["products", id.as_str()])?).await?;
        Ok(payload.and_then(|payload| decode_one(payload, "product")))
    }

    async fn fetch_affinity(&self, id: &ProductId) -> Result<AffinityRecord, SourceError> {
        let url = self.endpoint(&["products", id.as_str(), "affinity"])?;
        self.get_record(url, "affinity").await.map_err(SourceError::from)
    }

    async fn fetch_trending(&self) -> Result<TrendingSnapshot, SourceError> {
        self.get_record(self.endpoint(&["trending"])?, "trending").await.map_err(SourceError::from)
    }

    async fn fetch_style_profile(&self, customer_id: &str) -> Result<UserPreferences, SourceError> {
        let url = self.endpoint(&["customers", customer_id, "style-profile"])?;
        self.get_record(url, "style_profile").await.map_err(SourceError::from)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use atelier_core::clock::SystemClock;
    use atelier_core::domain::product::ProductId;
    use atelier_core::errors::SourceError;
    use atelier_core::recommend::{RecommendationRequest, RecommendationService};
    use atelier_core::source::CatalogSource;
    use secrecy::SecretString;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::HttpCatalogSource;

    /// Serves canned `(status, body)` pairs keyed by request path and query.
    async fn serve(
        routes: BTreeMap<&'static str, (u16, &'static str)>,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buffer = vec![0_u8; 8192];
                let read = socket.read(&mut buffer).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buffer[..read]).to_string();
                let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                log.lock().await.push(request.clone());

                let (status, body) = routes.get(target.as_str()).copied().unwrap_or((404, ""));
                let reason = if status == 200 { "OK" } else { "Status" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{address}/api/"), seen)
    }

    #[tokio::test]
    async fn products_decode_from_envelope_with_category_query() {
        let routes = BTreeMap::from([(
            "/api/products?category=suits",
            (
                200,
                r#"{"products":[
                    {"id":"s-navy","name":"Navy Suit","price":49900,"category":"Suits"}
                ]}"#,
            ),
        )]);
        let (base, seen) = serve(routes).await;
        let source = HttpCatalogSource::new(&base)
            .expect("client")
            .with_token(SecretString::from("shpat-test".to_string()));

        let products = source.fetch_products(Some("suits")).await.expect("products");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "s-navy");

        let requests = seen.lock().await;
        assert!(requests[0].to_ascii_lowercase().contains("authorization: bearer shpat-test"));
    }

    #[tokio::test]
    async fn missing_products_mean_no_data() {
        let routes = BTreeMap::from([("/api/products", (200, "null"))]);
        let (base, _) = serve(routes).await;
        let source = HttpCatalogSource::new(&base).expect("client");

        assert_eq!(source.fetch_product(&ProductId::new("ghost")).await, Ok(None));
        assert_eq!(source.fetch_products(None).await, Ok(Vec::new()));
        assert_eq!(source.fetch_products(Some("ties")).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn missing_records_are_unavailable() {
        let routes = BTreeMap::from([
            ("/api/trending", (200, "null")),
            ("/api/customers/c-1/style-profile", (200, "")),
        ]);
        let (base, _) = serve(routes).await;
        let source = HttpCatalogSource::new(&base).expect("client");

        assert!(matches!(source.fetch_trending().await, Err(SourceError::Unavailable(_))));
        let profile = source.fetch_style_profile("c-1").await;
        assert!(matches!(profile, Err(SourceError::Unavailable(_))));
        assert!(matches!(
            source.fetch_affinity(&ProductId::new("ghost")).await,
            Err(SourceError::Unavailable(message)) if message.contains("affinity")
        ));
    }

    #[tokio::test]
    async fn malformed_records_are_decode_errors() {
        let routes = BTreeMap::from([
            ("/api/products/s-navy/affinity", (200, r#"{"relatedProducts":"garbage"}"#)),
            ("/api/trending", (200, r#"{"bySize":["not","a","map"]}"#)),
            ("/api/customers/c-1/style-profile", (200, r#"{"occasions":"wedding"}"#)),
        ]);
        let (base, _) = serve(routes).await;
        let source = HttpCatalogSource::new(&base).expect("client");

        let affinity = source.fetch_affinity(&ProductId::new("s-navy")).await;
        assert!(matches!(affinity, Err(SourceError::Decode(_))));
        assert!(matches!(source.fetch_trending().await, Err(SourceError::Decode(_))));
        assert!(matches!(source.fetch_style_profile("c-1").await, Err(SourceError::Decode(_))));
    }

    #[tokio::test]
    async fn malformed_upstream_records_take_the_fallback_path() {
        let routes = BTreeMap::from([
            ("/api/products/s-navy/affinity", (200, r#"{"relatedProducts":"garbage"}"#)),
            ("/api/trending", (200, r#"{"bySize":["not","a","map"]}"#)),
        ]);
        let (base, seen) = serve(routes).await;
        let source = Arc::new(HttpCatalogSource::new(&base).expect("client"));
        let service = RecommendationService::new(source, Arc::new(SystemClock));

        let also_bought = service
            .get_recommendations(&RecommendationRequest::CustomersAlsoBought {
                product_id: ProductId::new("s-navy"),
                limit: 3,
            })
            .await;
        assert_eq!(also_bought.len(), 3);
        assert!(also_bought.iter().all(|item| item.product.id.as_str().starts_with("fallback-")));

        let trending = service
            .get_recommendations(&RecommendationRequest::TrendingInSize {
                size: "40R".to_owned(),
                limit: 3,
            })
            .await;
        assert_eq!(trending.len(), 3);

        // The bad snapshot was not cached: a new size asks the API again.
        let before = requests_to(&seen, "/api/trending").await;
        service
            .get_recommendations(&RecommendationRequest::TrendingInSize {
                size: "42R".to_owned(),
                limit: 3,
            })
            .await;
        assert_eq!(requests_to(&seen, "/api/trending").await, before + 1);
    }

    async fn requests_to(seen: &Mutex<Vec<String>>, path: &str) -> usize {
        seen.lock().await.iter().filter(|request| request.contains(path)).count()
    }

    #[tokio::test]
    async fn upstream_errors_keep_their_status() {
        let routes = BTreeMap::from([("/api/trending", (503, "{}"))]);
        let (base, _) = serve(routes).await;
        let source = HttpCatalogSource::new(&base).expect("client");

        assert_eq!(source.fetch_trending().await, Err(SourceError::UpstreamStatus { status: 503 }));
    }

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(HttpCatalogSource::new("not a url").is_err());
        assert!(HttpCatalogSource::new("mailto:shop@example.com").is_err());
    }
}
