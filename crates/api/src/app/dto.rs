//! Request/response bodies of the partner API.

use serde::{Deserialize, Serialize};

use adsmarket_core::{Money, PartnerIdentity, QuoteId};
use adsmarket_ordering::{OrderConfirmation, OrderRequest, Quote, Selection, ValidationError};

/// `POST /order/validate`. `partner` is only read when no identity
/// service is configured.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub partner: Option<PartnerIdentity>,
}

/// `POST /order/confirm`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmRequest {
    #[serde(flatten)]
    pub order: OrderRequest,
    #[serde(default)]
    pub partner: Option<PartnerIdentity>,
}

/// Partner echo attached to validate/confirm responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerEcho {
    pub id: String,
    pub company_name: Option<String>,
}

impl From<&PartnerIdentity> for PartnerEcho {
    fn from(partner: &PartnerIdentity) -> Self {
        Self {
            id: partner.email.clone(),
            company_name: partner.company_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub quote_id: QuoteId,
    pub valid: bool,
    pub price: Money,
    pub errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<PartnerEcho>,
}

impl QuoteResponse {
    pub fn new(quote: Quote, partner: Option<&PartnerIdentity>) -> Self {
        Self {
            quote_id: quote.id,
            valid: quote.valid,
            price: quote.price,
            errors: quote.errors,
            partner: partner.map(PartnerEcho::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmResponse {
    #[serde(flatten)]
    pub confirmation: OrderConfirmation,
    pub partner: PartnerEcho,
}

/// `GET /subscriptions` query when partner identity is not token-derived.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionQuery {
    #[serde(default)]
    pub partner_email: Option<String>,
}
