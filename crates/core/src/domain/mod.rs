pub mod preferences;
pub mod product;
