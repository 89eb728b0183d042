//! Quotes: priced, validated-or-not snapshots of a set of selections.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adsmarket_catalog::Catalog;
use adsmarket_core::{Entity, EntityStore, KeyValueStore, Money, QuoteId};

use crate::error::{ErrorCode, QuoteError, ValidationError};
use crate::pricing::PricingEngine;
use crate::selection::Selection;
use crate::validation::SelectionValidator;

/// A stored quote. Immutable once created; invalid quotes are stored too so a
/// caller can look up why a quote failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub selections: Vec<Selection>,
    pub price: Money,
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Quote {
    type Id = QuoteId;

    fn id(&self) -> &QuoteId {
        &self.id
    }
}

pub type QuoteStore = Arc<dyn KeyValueStore<QuoteId, Quote>>;

pub struct QuoteService {
    validator: SelectionValidator,
    pricing: PricingEngine,
    quotes: QuoteStore,
}

impl QuoteService {
    pub fn new(catalog: Arc<Catalog>, quotes: QuoteStore) -> Self {
        Self {
            validator: SelectionValidator::new(catalog.clone()),
            pricing: PricingEngine::new(catalog),
            quotes,
        }
    }

    /// Validate and price `selections`, always minting and storing a quote.
    pub fn quote(
        &self,
        selections: Vec<Selection>,
        now: DateTime<Utc>,
    ) -> Result<Quote, QuoteError> {
        if selections.is_empty() {
            return Err(QuoteError::EmptySelections);
        }

        let mut errors = Vec::new();
        let mut price = Money::zero(self.pricing.currency());
        for selection in &selections {
            errors.extend(self.validator.validate(selection));

            let priced = self
                .pricing
                .price(selection)
                .map_err(|e| e.to_string())
                .and_then(|p| {
                    price
                        .checked_add(&p)
                        .ok_or_else(|| "quote total overflows".to_string())
                });
            match priced {
                Ok(total) => price = total,
                Err(reason) => errors.push(ValidationError::new(
                    ErrorCode::PriceError,
                    format!("Cannot compute price for {}: {reason}", selection.offering_id),
                )),
            }
        }

        let quote = Quote {
            id: QuoteId::new(),
            selections,
            price,
            valid: errors.is_empty(),
            errors,
            created_at: now,
        };
        self.quotes.save(quote.clone())?;

        tracing::info!(
            quote_id = %quote.id,
            valid = quote.valid,
            price = quote.price.amount,
            errors = quote.errors.len(),
            "quote issued"
        );
        Ok(quote)
    }

    pub fn get(&self, id: &QuoteId) -> Result<Option<Quote>, QuoteError> {
        Ok(self.quotes.get(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsmarket_catalog::marketplace::{IMAGE_OFFER, MIXED_OFFER, VIDEO_OFFER};
    use adsmarket_core::InMemoryStore;

    fn service() -> (QuoteService, Arc<InMemoryStore<QuoteId, Quote>>) {
        let store = Arc::new(InMemoryStore::<QuoteId, Quote>::new());
        let service = QuoteService::new(Arc::new(Catalog::marketplace()), store.clone());
        (service, store)
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn valid_quote_sums_prices() {
        let (service, _) = service();
        let quote = service
            .quote(
                vec![
                    Selection::new(IMAGE_OFFER).with_images(2),
                    Selection::new(VIDEO_OFFER).with_videos(1),
                ],
                test_time(),
            )
            .unwrap();
        assert!(quote.valid);
        assert!(quote.errors.is_empty());
        assert_eq!(quote.price, Money::new(2_000 + 5_000, "EUR"));
    }

    #[test]
    fn invalid_quote_is_still_stored() {
        let (service, store) = service();
        let quote = service
            .quote(vec![Selection::new(IMAGE_OFFER).with_images(9)], test_time())
            .unwrap();
        assert!(!quote.valid);
        assert_eq!(quote.errors[0].code, ErrorCode::ImageCountExceeded);
        // Over-quota selections are still priced.
        assert_eq!(quote.price.amount, 9_000);

        assert_eq!(store.get(&quote.id).unwrap(), Some(quote.clone()));
        assert_eq!(service.get(&quote.id).unwrap(), Some(quote));
    }

    #[test]
    fn unpriceable_selection_adds_price_error_and_contributes_zero() {
        let (service, _) = service();
        let quote = service
            .quote(
                vec![Selection::new("GONE"), Selection::new(IMAGE_OFFER).with_images(1)],
                test_time(),
            )
            .unwrap();
        let codes: Vec<ErrorCode> = quote.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::OfferNotFound, ErrorCode::PriceError]);
        assert_eq!(quote.price.amount, 1_000);
    }

    #[test]
    fn mixed_without_counts_is_a_price_error() {
        let (service, _) = service();
        let quote = service
            .quote(vec![Selection::new(MIXED_OFFER).with_images(1)], test_time())
            .unwrap();
        let codes: Vec<ErrorCode> = quote.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::MissingMediaCount, ErrorCode::PriceError]);
        assert_eq!(quote.price.amount, 0);
    }

    #[test]
    fn every_quote_gets_a_fresh_id() {
        let (service, store) = service();
        let sel = vec![Selection::new(IMAGE_OFFER).with_images(1)];
        let a = service.quote(sel.clone(), test_time()).unwrap();
        let b = service.quote(sel, test_time()).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn empty_selection_list_is_a_usage_error() {
        let (service, store) = service();
        assert_eq!(service.quote(vec![], test_time()), Err(QuoteError::EmptySelections));
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_quote_lookup() {
        let (service, _) = service();
        assert_eq!(service.get(&QuoteId::new()).unwrap(), None);
    }
}
