//! Selection validation against catalog constraints.
//!
//! Validation is exhaustive: every broken rule of a selection is reported,
//! except an unknown offering, which short-circuits with `OFFER_NOT_FOUND`.

use std::sync::Arc;

use adsmarket_catalog::{Catalog, MediaKind, Offering, OfferingKind, ids};

use crate::error::{ErrorCode, ValidationError};
use crate::selection::Selection;

#[derive(Debug, Clone)]
pub struct SelectionValidator {
    catalog: Arc<Catalog>,
}

impl SelectionValidator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn validate(&self, selection: &Selection) -> Vec<ValidationError> {
        let Some(offering) = self.catalog.offering(&selection.offering_id) else {
            return vec![ValidationError::new(
                ErrorCode::OfferNotFound,
                format!("Offering {} not found", selection.offering_id),
            )];
        };

        let mut errors = Vec::new();
        match offering.kind {
            OfferingKind::Image => {
                require(selection, MediaKind::Image, "image", &mut errors);
                enforce_limit(
                    offering,
                    selection,
                    MediaKind::Image,
                    ids::IMAGE_MAX_COUNT,
                    &mut errors,
                );
            }
            OfferingKind::Video => {
                require(selection, MediaKind::Video, "video", &mut errors);
                enforce_limit(
                    offering,
                    selection,
                    MediaKind::Video,
                    ids::VIDEO_MAX_COUNT,
                    &mut errors,
                );
            }
            OfferingKind::Mixed => {
                if selection.images.is_none() || selection.videos.is_none() {
                    errors.push(ValidationError::new(
                        ErrorCode::MissingMediaCount,
                        "Both selectedImagesCount and selectedVideosCount are required \
                         for mixed media offers",
                    ));
                }
                enforce_limit(
                    offering,
                    selection,
                    MediaKind::Image,
                    ids::MIXED_IMG_COUNT,
                    &mut errors,
                );
                enforce_limit(
                    offering,
                    selection,
                    MediaKind::Video,
                    ids::MIXED_VIDEO_COUNT,
                    &mut errors,
                );
            }
            OfferingKind::Model3d => {
                require(selection, MediaKind::Model, "3D model", &mut errors);
                enforce_limit(
                    offering,
                    selection,
                    MediaKind::Model,
                    ids::MODEL_MAX_COUNT,
                    &mut errors,
                );
                reject_unsupported(selection, MediaKind::Image, "3D model", &mut errors);
                reject_unsupported(selection, MediaKind::Video, "3D model", &mut errors);
            }
            OfferingKind::Other => {}
        }

        if !errors.is_empty() {
            tracing::debug!(
                offering_id = %selection.offering_id,
                errors = errors.len(),
                "selection rejected"
            );
        }
        errors
    }

    /// Validate every selection, concatenating the errors in order.
    pub fn validate_all(&self, selections: &[Selection]) -> Vec<ValidationError> {
        selections.iter().flat_map(|s| self.validate(s)).collect()
    }
}

fn require(
    selection: &Selection,
    media: MediaKind,
    offer_label: &str,
    errors: &mut Vec<ValidationError>,
) {
    if selection.quantity(media).is_none() {
        let field = match media {
            MediaKind::Image => "selectedImagesCount",
            MediaKind::Video => "selectedVideosCount",
            MediaKind::Model => "selectedModelsCount",
        };
        errors.push(ValidationError::new(
            ErrorCode::missing(media),
            format!("{field} is required for {offer_label} offers"),
        ));
    }
}

fn enforce_limit(
    offering: &Offering,
    selection: &Selection,
    media: MediaKind,
    characteristic: &str,
    errors: &mut Vec<ValidationError>,
) {
    let (Some(requested), Some(max)) =
        (selection.quantity(media), offering.limit(characteristic))
    else {
        return;
    };
    if requested > max {
        errors.push(ValidationError::new(
            ErrorCode::exceeded(media),
            format!("Requested {requested} {}, max allowed {max}", media.plural()),
        ));
    }
}

fn reject_unsupported(
    selection: &Selection,
    media: MediaKind,
    offer_label: &str,
    errors: &mut Vec<ValidationError>,
) {
    if selection.quantity(media).is_some_and(|n| n > 0) {
        let noun = media.plural();
        let mut capitalized = noun[..1].to_uppercase();
        capitalized.push_str(&noun[1..]);
        errors.push(ValidationError::new(
            ErrorCode::not_supported(media),
            format!("{capitalized} are not supported in {offer_label} offers"),
        ));
    }
}
