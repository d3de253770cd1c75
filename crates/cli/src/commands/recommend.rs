use std::path::{Path, PathBuf};
use std::sync::Arc;

use atelier_commerce::HttpCatalogSource;
use atelier_core::config::AppConfig;
use atelier_core::domain::preferences::UserPreferences;
use atelier_core::domain::product::ProductId;
use atelier_core::errors::{ApplicationError, SourceError};
use atelier_core::recommend::{RecommendationRequest, RecommendationType, DEFAULT_LIMIT};
use atelier_core::source::CatalogSource;
use clap::Args;

use crate::commands::{
    build_runtime, load_config, read_fingerprinted_catalog, read_json_file, CommandResult,
};
use crate::wiring;

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(
        value_name = "TYPE",
        help = "customers-also-bought | complete-the-look | based-on-style | trending-in-size | \
                similar-products | personalized"
    )]
    pub kind: String,
    #[arg(long, help = "Catalog JSON file; the commerce API from config is used when omitted")]
    pub catalog: Option<PathBuf>,
    #[arg(long)]
    pub product_id: Option<String>,
    #[arg(long)]
    pub customer_id: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub occasion: Option<String>,
    #[arg(long = "history", value_delimiter = ',', help = "Purchased product ids, comma separated")]
    pub purchase_history: Vec<String>,
    #[arg(long, help = "Shopper preferences JSON file for based-on-style")]
    pub preferences: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,
    #[arg(long, help = "Drop any cached result for this request before computing it")]
    pub refresh: bool,
}

impl Default for RecommendArgs {
    fn default() -> Self {
        Self {
            kind: String::new(),
            catalog: None,
            product_id: None,
            customer_id: None,
            size: None,
            occasion: None,
            purchase_history: Vec::new(),
            preferences: None,
            limit: DEFAULT_LIMIT,
            refresh: false,
        }
    }
}

impl RecommendArgs {
    pub fn to_request(&self) -> Result<RecommendationRequest, ApplicationError> {
        let kind = RecommendationType::parse(&self.kind).ok_or_else(|| {
            ApplicationError::InvalidInput(format!("unknown recommendation type `{}`", self.kind))
        })?;
        let limit = self.limit;
        let product_id = || ProductId::new(self.product_id.clone().unwrap_or_default());

        let request = match kind {
            RecommendationType::CustomersAlsoBought => {
                RecommendationRequest::CustomersAlsoBought { product_id: product_id(), limit }
            }
            RecommendationType::CompleteTheLook => {
                RecommendationRequest::CompleteTheLook { product_id: product_id(), limit }
            }
            RecommendationType::SimilarProducts => {
                RecommendationRequest::SimilarProducts { product_id: product_id(), limit }
            }
            RecommendationType::BasedOnStyle => {
                let preferences = match &self.preferences {
                    Some(path) => Some(read_json_file::<UserPreferences>(path, "preferences")?),
                    None => None,
                };
                RecommendationRequest::BasedOnStyle {
                    preferences,
                    customer_id: self.customer_id.clone(),
                    limit,
                }
            }
            RecommendationType::TrendingInSize => RecommendationRequest::TrendingInSize {
                size: self.size.clone().unwrap_or_default(),
                limit,
            },
            RecommendationType::Personalized => RecommendationRequest::Personalized {
                customer_id: self.customer_id.clone().unwrap_or_default(),
                size: self.size.clone(),
                purchase_history: self.purchase_history.iter().map(ProductId::new).collect(),
                occasion: self.occasion.clone(),
                limit,
            },
        };

        request.validate().map_err(ApplicationError::InvalidInput)?;
        Ok(request)
    }
}

/// The catalog to query and the cache scope that identifies it.
fn catalog_source(
    config: &AppConfig,
    args: &RecommendArgs,
) -> Result<(Arc<dyn CatalogSource>, String), ApplicationError> {
    if let Some(path) = &args.catalog {
        let (catalog, fingerprint) = read_fingerprinted_catalog(path)?;
        return Ok((Arc::new(catalog), fingerprint));
    }

    match HttpCatalogSource::from_config(&config.catalog) {
        Ok(Some(source)) => {
            let scope = format!("api:{}", config.catalog.base_url.as_deref().unwrap_or_default());
            Ok((Arc::new(source), scope))
        }
        Ok(None) => Err(ApplicationError::Configuration(
            "no catalog available: pass --catalog or set catalog.base_url".to_string(),
        )),
        Err(error) => Err(ApplicationError::Source(SourceError::from(error))),
    }
}

pub fn run(config_path: Option<&Path>, args: &RecommendArgs) -> CommandResult {
    let config = match load_config(COMMAND, config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let prepared = args
        .to_request()
        .and_then(|request| catalog_source(&config, args).map(|source| (request, source)));
    let (request, (source, scope)) = match prepared {
        Ok(parts) => parts,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let recommendations = runtime.block_on(async {
        let service = wiring::recommendation_service(&config, source, &scope).await;
        if args.refresh {
            service.invalidate(&request).await;
        }
        service.get_recommendations(&request).await
    });

    let message =
        format!("{} {} recommendations", recommendations.len(), request.kind().as_str());
    CommandResult::success_with_data(COMMAND, message, &recommendations)
}
