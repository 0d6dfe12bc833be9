use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as DeError, ser::SerializeMap};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Last negotiated unit price per (customer, product) pair.
///
/// Written only as a side effect of a successful sale posting; lookups fall
/// back to the catalog price and never fail. Last write wins, no history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceBook {
    entries: BTreeMap<(Uuid, Uuid), i64>,
}

impl PriceBook {
    /// Returns the memorized price for the pair, or `catalog_default` when
    /// the pair has never been sold.
    pub fn resolve(&self, customer_id: Uuid, product_id: Uuid, catalog_default: i64) -> i64 {
        self.entries
            .get(&(customer_id, product_id))
            .copied()
            .unwrap_or(catalog_default)
    }

    /// Overwrites the memorized price for the pair unconditionally.
    pub fn remember(&mut self, customer_id: Uuid, product_id: Uuid, unit_price: i64) {
        self.entries.insert((customer_id, product_id), unit_price);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// The persisted form is a flat `"{customer_id}_{product_id}" -> price` map.
impl Serialize for PriceBook {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for ((customer, product), price) in &self.entries {
            map.serialize_entry(&format!("{customer}_{product}"), price)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PriceBook {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, i64>::deserialize(deserializer)?;
        let mut entries = BTreeMap::new();
        for (key, price) in raw {
            let (customer, product) = key
                .split_once('_')
                .ok_or_else(|| DeError::custom(format!("malformed price key: {key}")))?;
            let customer = Uuid::parse_str(customer).map_err(DeError::custom)?;
            let product = Uuid::parse_str(product).map_err(DeError::custom)?;
            entries.insert((customer, product), price);
        }
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_falls_back_to_catalog_price() {
        let book = PriceBook::default();
        assert_eq!(book.resolve(Uuid::new_v4(), Uuid::new_v4(), 45_000), 45_000);
    }

    #[test]
    fn remember_overwrites_unconditionally() {
        let mut book = PriceBook::default();
        let customer = Uuid::new_v4();
        let product = Uuid::new_v4();
        book.remember(customer, product, 15_000);
        book.remember(customer, product, 14_000);
        assert_eq!(book.resolve(customer, product, 45_000), 14_000);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn serializes_as_underscore_keyed_map() {
        let mut book = PriceBook::default();
        let customer = Uuid::new_v4();
        let product = Uuid::new_v4();
        book.remember(customer, product, 15_000);

        let json = serde_json::to_string(&book).unwrap();
        assert!(json.contains(&format!("\"{customer}_{product}\":15000")));

        let parsed: PriceBook = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, book);
    }

    #[test]
    fn malformed_key_is_rejected() {
        let err = serde_json::from_str::<PriceBook>("{\"not-a-pair\":1}").unwrap_err();
        assert!(err.to_string().contains("malformed price key"));
    }
}
