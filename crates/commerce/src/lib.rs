//! Commerce platform adapter: a [`CatalogSource`](atelier_core::source::CatalogSource)
//! backed by the storefront's JSON API.

pub mod decode;
pub mod error;
pub mod http;

pub use error::CommerceError;
pub use http::HttpCatalogSource;
