use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::offering::Offering;

pub const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// Read-only catalog of offerings, loaded once and shared by every service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Listing order of the marketplace bundle. Empty means "all offerings".
    #[serde(default)]
    pub bundled: Vec<String>,
    pub offerings: Vec<Offering>,
}

impl Catalog {
    pub fn new(offerings: Vec<Offering>) -> Result<Self, CatalogError> {
        let catalog = Self {
            bundled: Vec::new(),
            offerings,
        };
        catalog.check()?;
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            offerings = catalog.offerings.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn offering(&self, id: &str) -> Option<&Offering> {
        self.offerings.iter().find(|o| o.id == id)
    }

    pub fn offerings(&self) -> &[Offering] {
        &self.offerings
    }

    /// Offerings in bundle listing order; ids that do not resolve are skipped.
    pub fn bundled_offerings(&self) -> Vec<&Offering> {
        if self.bundled.is_empty() {
            return self.offerings.iter().collect();
        }
        self.bundled.iter().filter_map(|id| self.offering(id)).collect()
    }

    /// Billing currency: the currency of the first declared price.
    pub fn currency(&self) -> &str {
        self.offerings
            .iter()
            .find_map(|o| o.currency())
            .unwrap_or(DEFAULT_CURRENCY)
    }

    fn check(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for o in &self.offerings {
            if !seen.insert(o.id.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate offering id {}", o.id)));
            }
        }

        let currency = self.currency();
        for o in &self.offerings {
            if let Some(p) = o.prices.iter().find(|p| p.price.currency != currency) {
                return Err(CatalogError::Invalid(format!(
                    "offering {} price {} uses {} but catalog bills in {}",
                    o.id, p.id, p.price.currency, currency
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offering::OfferingKind;

    #[test]
    fn loads_json_catalog() {
        let json = r#"{
            "offerings": [{
                "id": "POSTER",
                "name": "Poster",
                "kind": "IMAGE",
                "prices": [{
                    "id": "P",
                    "price": {"amount": 500, "currency": "EUR"},
                    "oneTime": true
                }],
                "characteristics": [{
                    "id": "IMAGE_MAX_COUNT",
                    "values": [{"value": "3", "isDefault": true}]
                }]
            }]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        let poster = catalog.offering("POSTER").unwrap();
        assert_eq!(poster.kind, OfferingKind::Image);
        assert_eq!(poster.limit("IMAGE_MAX_COUNT"), Some(3));
        assert_eq!(catalog.currency(), "EUR");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"{"offerings": [{"id": "A", "name": "a"}, {"id": "A", "name": "b"}]}"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn rejects_mixed_currencies() {
        let json = r#"{"offerings": [
            {"id": "A", "name": "a",
             "prices": [{"id": "x", "price": {"amount": 1, "currency": "EUR"}}]},
            {"id": "B", "name": "b",
             "prices": [{"id": "y", "price": {"amount": 1, "currency": "USD"}}]}
        ]}"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn bundled_order_skips_unknown_ids() {
        let json = r#"{"offerings": [{"id": "A", "name": "a"}, {"id": "B", "name": "b"}]}"#;
        let mut catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.bundled_offerings().len(), 2);

        catalog.bundled = vec!["B".into(), "GONE".into()];
        let ids: Vec<&str> = catalog.bundled_offerings().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["B"]);
    }

    #[test]
    fn currency_defaults_without_prices() {
        let catalog = Catalog::new(vec![]).unwrap();
        assert_eq!(catalog.currency(), DEFAULT_CURRENCY);
    }
}
