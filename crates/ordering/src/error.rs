//! Error vocabulary of the ordering pipeline.
//!
//! Business outcomes (an over-quota selection, an unknown offering) are
//! reported as [`ValidationError`] values with a stable [`ErrorCode`].
//! `thiserror` enums cover the conditions that abort an operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use adsmarket_catalog::MediaKind;
use adsmarket_core::{QuoteId, StoreError};

/// Stable error codes callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    OfferNotFound,
    MissingImagesCount,
    MissingVideosCount,
    MissingModelsCount,
    MissingMediaCount,
    ImageCountExceeded,
    VideoCountExceeded,
    ModelCountExceeded,
    ImagesNotSupported,
    VideosNotSupported,
    ModelsNotSupported,
    PriceError,
    BadRequest,
    InvalidQuote,
    QuoteRedeemed,
}

impl ErrorCode {
    pub fn missing(media: MediaKind) -> Self {
        match media {
            MediaKind::Image => ErrorCode::MissingImagesCount,
            MediaKind::Video => ErrorCode::MissingVideosCount,
            MediaKind::Model => ErrorCode::MissingModelsCount,
        }
    }

    pub fn exceeded(media: MediaKind) -> Self {
        match media {
            MediaKind::Image => ErrorCode::ImageCountExceeded,
            MediaKind::Video => ErrorCode::VideoCountExceeded,
            MediaKind::Model => ErrorCode::ModelCountExceeded,
        }
    }

    pub fn not_supported(media: MediaKind) -> Self {
        match media {
            MediaKind::Image => ErrorCode::ImagesNotSupported,
            MediaKind::Video => ErrorCode::VideosNotSupported,
            MediaKind::Model => ErrorCode::ModelsNotSupported,
        }
    }

    pub fn is_count_exceeded(self) -> bool {
        matches!(
            self,
            ErrorCode::ImageCountExceeded
                | ErrorCode::VideoCountExceeded
                | ErrorCode::ModelCountExceeded
        )
    }
}

/// One reported problem with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Pricing failure. `UnknownOffering` is the only outcome for a well-formed
/// selection of an unknown product; the other variants are usage errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("offering {0} not found")]
    UnknownOffering(String),

    #[error("{offering_id} requires a {media} quantity to be priced")]
    MissingQuantity {
        offering_id: String,
        media: &'static str,
    },

    #[error("price of {0} overflows")]
    Overflow(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("selections[] array is required")]
    EmptySelections,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reasons a confirmation creates nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("quote {0} is invalid or has expired")]
    InvalidQuote(QuoteId),

    #[error("quote {0} has already been redeemed")]
    QuoteRedeemed(QuoteId),

    #[error("selections failed re-validation")]
    Rejected(Vec<ValidationError>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("subscription handoff failed: {0}")]
    Subscription(String),
}

impl ConfirmationError {
    /// The coded error list reported to the caller.
    pub fn errors(&self) -> Vec<ValidationError> {
        match self {
            ConfirmationError::BadRequest(msg) => {
                vec![ValidationError::new(ErrorCode::BadRequest, msg.clone())]
            }
            ConfirmationError::InvalidQuote(_) => {
                vec![ValidationError::new(ErrorCode::InvalidQuote, self.to_string())]
            }
            ConfirmationError::QuoteRedeemed(_) => {
                vec![ValidationError::new(ErrorCode::QuoteRedeemed, self.to_string())]
            }
            ConfirmationError::Rejected(errors) => errors.clone(),
            ConfirmationError::Store(_) | ConfirmationError::Subscription(_) => vec![],
        }
    }
}
