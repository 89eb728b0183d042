//! Deterministic pricing of selections.
//!
//! Pure functions of the catalog: no mutation, no IO. Amounts are in the
//! smallest currency unit and all arithmetic is checked.

use std::sync::Arc;

use adsmarket_catalog::{Catalog, Offering, OfferingKind, PriceRule, ids};
use adsmarket_core::Money;

use crate::error::PricingError;
use crate::selection::Selection;

#[derive(Debug, Clone)]
pub struct PricingEngine {
    catalog: Arc<Catalog>,
}

impl PricingEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn currency(&self) -> &str {
        self.catalog.currency()
    }

    pub fn price(&self, selection: &Selection) -> Result<Money, PricingError> {
        let offering = self
            .catalog
            .offering(&selection.offering_id)
            .ok_or_else(|| PricingError::UnknownOffering(selection.offering_id.clone()))?;

        match offering.kind {
            OfferingKind::Image => {
                self.per_unit(offering, ids::IMG_PER_IMAGE_PRICE, selection.images)
            }
            OfferingKind::Video => {
                self.per_unit(offering, ids::VIDEO_FIXED_PRICE, selection.videos)
            }
            OfferingKind::Model3d => {
                self.per_unit(offering, ids::MODEL_FIXED_PRICE, selection.models)
            }
            OfferingKind::Mixed => self.mixed(offering, selection),
            OfferingKind::Other => Ok(self.amount(offering.one_time_rule_or_first())),
        }
    }

    /// `unit × quantity`, quantity defaulting to one.
    fn per_unit(
        &self,
        offering: &Offering,
        rule: &str,
        quantity: Option<u32>,
    ) -> Result<Money, PricingError> {
        let unit = self.amount(offering.price_rule_or_first(rule));
        unit.checked_mul(quantity.unwrap_or(1))
            .ok_or_else(|| PricingError::Overflow(offering.id.clone()))
    }

    /// `base + imageUnit × images + videoUnit × videos`; both quantities are mandatory.
    fn mixed(&self, offering: &Offering, selection: &Selection) -> Result<Money, PricingError> {
        let missing = |media: &'static str| PricingError::MissingQuantity {
            offering_id: offering.id.clone(),
            media,
        };
        let images = selection.images.ok_or_else(|| missing("images"))?;
        let videos = selection.videos.ok_or_else(|| missing("videos"))?;

        let base = self.amount(offering.price_rule(ids::MIXED_BASE_PRICE));
        let image_unit = self.amount(offering.price_rule(ids::MIXED_IMAGE_PRICE));
        let video_unit = self.amount(offering.price_rule(ids::MIXED_VIDEO_PRICE));

        image_unit
            .checked_mul(images)
            .and_then(|img| base.checked_add(&img))
            .and_then(|sum| video_unit.checked_mul(videos).and_then(|vid| sum.checked_add(&vid)))
            .ok_or_else(|| PricingError::Overflow(offering.id.clone()))
    }

    /// A rule's amount, or zero when the offering declares none.
    fn amount(&self, rule: Option<&PriceRule>) -> Money {
        rule.map(|r| r.price.clone())
            .unwrap_or_else(|| Money::zero(self.currency()))
    }
}
