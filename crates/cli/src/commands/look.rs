use std::path::PathBuf;

use atelier_core::domain::product::ProductId;
use atelier_core::errors::ApplicationError;
use atelier_core::lookbook::LookBuilder;
use clap::Args;

use crate::commands::{read_catalog, CommandResult};

const COMMAND: &str = "look";

#[derive(Debug, Clone, Default, Args)]
pub struct LookArgs {
    #[arg(long, help = "Catalog JSON file")]
    pub catalog: PathBuf,
    #[arg(long, help = "Anchor product id")]
    pub product_id: String,
}

pub fn run(args: &LookArgs) -> CommandResult {
    let catalog = match read_catalog(&args.catalog) {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let Some(anchor) = catalog.find(&ProductId::new(args.product_id.as_str())) else {
        let error = ApplicationError::InvalidInput(format!(
            "product `{}` is not in the catalog",
            args.product_id
        ));
        return CommandResult::from_error(COMMAND, &error);
    };

    let look = LookBuilder::new().complete_the_look(anchor, &catalog.products);
    let message = format!(
        "{} pieces paired with {} (look score {:.2})",
        look.pieces.len(),
        anchor.name,
        look.look_score
    );
    CommandResult::success_with_data(COMMAND, message, &look)
}
