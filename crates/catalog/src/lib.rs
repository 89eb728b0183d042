//! Catalog reference data.
//!
//! Offerings, their pricing rules and their constraint characteristics. The
//! catalog is immutable once loaded; every other module only reads it.

pub mod catalog;
pub mod listing;
pub mod marketplace;
pub mod offering;

pub use catalog::{Catalog, CatalogError, DEFAULT_CURRENCY};
pub use listing::{CatalogItem, MediaAllowance};
pub use offering::{
    Characteristic, CharacteristicValue, MediaKind, Offering, OfferingKind, PriceRule, ids,
};
