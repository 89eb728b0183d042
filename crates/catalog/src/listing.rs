//! Partner-facing catalog summary (what the storefront renders).

use serde::Serialize;

use crate::catalog::Catalog;
use crate::offering::{Offering, OfferingKind, ids};

/// Media allowances advertised for an offering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaAllowance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<u32>,
    #[serde(rename = "maxModels", skip_serializing_if = "Option::is_none")]
    pub max_models: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub subtitle: String,
    pub description: String,
    #[serde(rename = "ProductSpec")]
    pub product_spec: MediaAllowance,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_on_for: Vec<String>,
}

fn advertised(offering: &Offering, characteristic: &str, fallback: u32) -> u32 {
    offering
        .characteristic(characteristic)
        .and_then(|c| c.default_number())
        .unwrap_or(fallback)
}

impl CatalogItem {
    pub fn from_offering(offering: &Offering) -> Self {
        let product_spec = match offering.kind {
            OfferingKind::Image => MediaAllowance {
                images: Some(advertised(offering, ids::IMAGE_MAX_COUNT, 4)),
                ..MediaAllowance::default()
            },
            OfferingKind::Video => MediaAllowance {
                videos: Some(advertised(offering, ids::VIDEO_MAX_COUNT, 2)),
                ..MediaAllowance::default()
            },
            OfferingKind::Mixed => MediaAllowance {
                images: Some(advertised(offering, ids::MIXED_IMG_COUNT, 4)),
                videos: Some(advertised(offering, ids::MIXED_VIDEO_COUNT, 2)),
                max_models: None,
            },
            OfferingKind::Model3d => MediaAllowance {
                max_models: Some(advertised(offering, ids::MODEL_MAX_COUNT, 1)),
                ..MediaAllowance::default()
            },
            OfferingKind::Other => MediaAllowance::default(),
        };

        Self {
            id: offering.id.clone(),
            name: offering.display_name.clone().unwrap_or_else(|| offering.name.clone()),
            subtitle: offering.subtitle.clone().unwrap_or_else(|| offering.name.clone()),
            description: offering.description.clone(),
            product_spec,
            add_on_for: offering.add_on_for.clone(),
        }
    }
}

impl Catalog {
    /// Storefront listing of the bundled offerings.
    pub fn items(&self) -> Vec<CatalogItem> {
        self.bundled_offerings()
            .into_iter()
            .map(CatalogItem::from_offering)
            .collect()
    }
}
