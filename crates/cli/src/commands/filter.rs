use std::path::{Path, PathBuf};

use atelier_core::domain::preferences::{PriceRange, UserPreferences};
use atelier_core::domain::product::Season;
use atelier_core::errors::ApplicationError;
use atelier_core::filter::{FilterConfig, SmartFilterEngine};
use atelier_core::scoring::ScoreCalculator;
use clap::Args;

use crate::commands::{load_config, read_catalog, read_json_file, CommandResult};

const COMMAND: &str = "filter";

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long, help = "Catalog JSON file (products, affinities, trending, profiles)")]
    pub catalog: PathBuf,
    #[arg(long = "category", help = "Category to include; repeatable")]
    pub categories: Vec<String>,
    #[arg(long = "color", help = "Color to include; repeatable")]
    pub colors: Vec<String>,
    #[arg(long = "size", help = "In-stock size to require; repeatable")]
    pub sizes: Vec<String>,
    #[arg(long = "occasion", help = "Occasion to include; repeatable")]
    pub occasions: Vec<String>,
    #[arg(long, help = "Minimum price in cents")]
    pub min_price: Option<i64>,
    #[arg(long, help = "Maximum price in cents")]
    pub max_price: Option<i64>,
    #[arg(long, help = "Free-text query")]
    pub query: Option<String>,
    #[arg(long, help = "Score against this season (spring|summer|fall|winter)")]
    pub season: Option<String>,
    #[arg(long, help = "Score against the current season")]
    pub seasonal: bool,
    #[arg(long)]
    pub trending_only: bool,
    #[arg(long, help = "Suggest shirts and ties for matching suits")]
    pub outfits: bool,
    #[arg(long)]
    pub no_alternatives: bool,
    #[arg(long)]
    pub max_results: Option<usize>,
    #[arg(long, help = "Shopper preferences JSON file")]
    pub preferences: Option<PathBuf>,
}

impl FilterArgs {
    fn to_filter_config(&self) -> Result<FilterConfig, ApplicationError> {
        let price_range = match (self.min_price, self.max_price) {
            (None, None) => None,
            (min, max) => {
                let range = PriceRange::new(min.unwrap_or(0), max.unwrap_or(i64::MAX));
                if range.min > range.max {
                    return Err(ApplicationError::InvalidInput(
                        "--min-price must not exceed --max-price".to_string(),
                    ));
                }
                Some(range)
            }
        };

        let season = match self.season.as_deref() {
            Some(value) => Some(Season::parse(value).ok_or_else(|| {
                ApplicationError::InvalidInput(format!("unknown season `{value}`"))
            })?),
            None => None,
        };

        let preferences = match &self.preferences {
            Some(path) => Some(read_json_file::<UserPreferences>(path, "preferences")?),
            None => None,
        };

        Ok(FilterConfig {
            categories: self.categories.clone(),
            colors: self.colors.clone(),
            sizes: self.sizes.clone(),
            occasions: self.occasions.clone(),
            price_range,
            query: self.query.clone(),
            preferences,
            seasonal_relevance: self.seasonal || season.is_some(),
            trending_only: self.trending_only,
            include_outfits: self.outfits,
            include_alternatives: !self.no_alternatives,
            max_results: self.max_results,
            season,
        })
    }
}

pub fn run(config_path: Option<&Path>, args: &FilterArgs) -> CommandResult {
    let config = match load_config(COMMAND, config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let outcome = read_catalog(&args.catalog)
        .and_then(|catalog| args.to_filter_config().map(|filter| (catalog, filter)));
    let (catalog, filter) = match outcome {
        Ok(parts) => parts,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let engine = SmartFilterEngine::new()
        .with_calculator(ScoreCalculator::with_weights(config.scoring.filter_weights()));
    let result = engine.apply(&catalog.products, &filter);

    let message = format!(
        "{} of {} matching products returned",
        result.products.len(),
        result.metadata.total_matches
    );
    CommandResult::success_with_data(COMMAND, message, &result)
}
