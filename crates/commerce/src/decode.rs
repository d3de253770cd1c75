//! Readers for storefront payloads.
//!
//! Product endpoints answer with a bare array, a single object, an envelope
//! object (`{"products": [...]}`), or `null` depending on endpoint and
//! version; anything else reads as "no data". Record endpoints (affinity,
//! trending, style profile) are strict: a shape that does not decode is an
//! error so callers can fall back instead of trusting an empty record.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::CommerceError;

const ENVELOPE_KEYS: [&str; 3] = ["products", "items", "data"];

/// Reads a list. Items that fail to decode are skipped and logged.
pub fn decode_list<T: DeserializeOwned>(payload: Value, what: &'static str) -> Vec<T> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let envelope = ENVELOPE_KEYS.iter().find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            });
            match envelope {
                Some(items) => items,
                None => vec![Value::Object(map)],
            }
        }
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                warn!(
                    event_name = "commerce.decode_skipped",
                    what,
                    error = %error,
                    "skipping undecodable item"
                );
                None
            }
        })
        .collect()
}

/// Reads one value. Arrays yield their first decodable element.
pub fn decode_one<T: DeserializeOwned>(payload: Value, what: &'static str) -> Option<T> {
    match payload {
        Value::Null => None,
        Value::Array(_) => decode_list(payload, what).into_iter().next(),
        other => match serde_json::from_value::<T>(other) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                warn!(
                    event_name = "commerce.decode_skipped",
                    what,
                    error = %error,
                    "payload shape not recognised"
                );
                None
            }
        },
    }
}

/// Reads one record: the object itself or the first element of an array.
pub fn decode_record<T: DeserializeOwned>(
    payload: Value,
    what: &'static str,
) -> Result<T, CommerceError> {
    let record = match payload {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| CommerceError::Decode(format!("{what}: empty array")))?,
        other => other,
    };
    serde_json::from_value(record)
        .map_err(|error| CommerceError::Decode(format!("{what}: {error}")))
}

#[cfg(test)]
mod tests {
    use atelier_core::domain::product::Product;
    use atelier_core::source::{AffinityRecord, TrendingSnapshot};
    use serde_json::json;

    use super::{decode_list, decode_one, decode_record};
    use crate::error::CommerceError;

    fn product_json(id: &str) -> serde_json::Value {
        json!({"id": id, "name": "Navy Suit", "price": 49900, "category": "Suits"})
    }

    #[test]
    fn list_accepts_array_object_envelope_and_null() {
        let array: Vec<Product> =
            decode_list(json!([product_json("a"), product_json("b")]), "products");
        assert_eq!(array.len(), 2);

        let single: Vec<Product> = decode_list(product_json("solo"), "products");
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].id.as_str(), "solo");

        let wrapped: Vec<Product> =
            decode_list(json!({"products": [product_json("w")]}), "products");
        assert_eq!(wrapped[0].id.as_str(), "w");

        let none: Vec<Product> = decode_list(serde_json::Value::Null, "products");
        assert!(none.is_empty());

        let scalar: Vec<Product> = decode_list(json!("unexpected"), "products");
        assert!(scalar.is_empty());
    }

    #[test]
    fn list_skips_malformed_items() {
        let products: Vec<Product> =
            decode_list(json!([product_json("ok"), {"id": "broken"}, 42]), "products");

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "ok");
    }

    #[test]
    fn one_reads_object_first_of_array_or_nothing() {
        let product: Option<Product> = decode_one(product_json("a"), "product");
        assert_eq!(product.map(|product| product.id.0), Some("a".to_string()));

        let first: Option<Product> =
            decode_one(json!([product_json("x"), product_json("y")]), "product");
        assert_eq!(first.map(|product| product.id.0), Some("x".to_string()));

        assert!(decode_one::<Product>(serde_json::Value::Null, "product").is_none());
        assert!(decode_one::<Product>(json!({"unexpected": true}), "product").is_none());
    }

    #[test]
    fn affinity_tolerates_missing_fields() {
        let record: AffinityRecord = decode_record(
            json!({"relatedProducts": [{"productId": "sh-white", "score": 0.9}]}),
            "affinity",
        )
        .expect("decodes");
        assert_eq!(record.related_products.len(), 1);
        assert_eq!(record.related_products[0].cooccurrence, 0);
    }

    #[test]
    fn records_with_the_wrong_shape_are_errors() {
        let affinity =
            decode_record::<AffinityRecord>(json!({"relatedProducts": "garbage"}), "affinity");
        assert!(matches!(
            affinity,
            Err(CommerceError::Decode(message)) if message.starts_with("affinity")
        ));

        let trending =
            decode_record::<TrendingSnapshot>(json!({"bySize": ["not", "a", "map"]}), "trending");
        assert!(matches!(trending, Err(CommerceError::Decode(_))));

        assert!(decode_record::<AffinityRecord>(json!([]), "affinity").is_err());
        assert!(decode_record::<AffinityRecord>(json!(42), "affinity").is_err());
    }
}
