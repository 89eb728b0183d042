use serde::{Deserialize, Serialize};

use adsmarket_catalog::{MediaKind, OfferingKind};

/// A partner's requested purchase of one offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(alias = "productId")]
    pub offering_id: String,
    #[serde(rename = "selectedImagesCount", default, skip_serializing_if = "Option::is_none")]
    pub images: Option<u32>,
    #[serde(rename = "selectedVideosCount", default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<u32>,
    #[serde(rename = "selectedModelsCount", default, skip_serializing_if = "Option::is_none")]
    pub models: Option<u32>,
}

impl Selection {
    pub fn new(offering_id: impl Into<String>) -> Self {
        Self {
            offering_id: offering_id.into(),
            images: None,
            videos: None,
            models: None,
        }
    }

    pub fn with_images(mut self, n: u32) -> Self {
        self.images = Some(n);
        self
    }

    pub fn with_videos(mut self, n: u32) -> Self {
        self.videos = Some(n);
        self
    }

    pub fn with_models(mut self, n: u32) -> Self {
        self.models = Some(n);
        self
    }

    pub fn quantity(&self, media: MediaKind) -> Option<u32> {
        match media {
            MediaKind::Image => self.images,
            MediaKind::Video => self.videos,
            MediaKind::Model => self.models,
        }
    }
}

/// The offering actually provisioned by an order, with the quantities that
/// were requested for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedOffering {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_count: Option<u32>,
    /// Units for offerings without media quotas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl ProvisionedOffering {
    /// Quantities relevant to the offering's kind.
    pub fn from_selection(kind: OfferingKind, selection: &Selection) -> Self {
        let mut offering = Self {
            id: selection.offering_id.clone(),
            images_count: None,
            videos_count: None,
            models_count: None,
            count: None,
        };
        match kind {
            OfferingKind::Image => offering.images_count = selection.images,
            OfferingKind::Video => offering.videos_count = selection.videos,
            OfferingKind::Mixed => {
                offering.images_count = selection.images;
                offering.videos_count = selection.videos;
            }
            OfferingKind::Model3d => {
                offering.models_count = selection.models;
                offering.images_count = selection.images;
                offering.videos_count = selection.videos;
            }
            OfferingKind::Other => offering.count = Some(1),
        }
        offering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_partner_wire_names() {
        let json = r#"{"offeringId": "IMG_ADS_OFFER_001", "selectedImagesCount": 3}"#;
        let sel: Selection = serde_json::from_str(json).unwrap();
        assert_eq!(sel, Selection::new("IMG_ADS_OFFER_001").with_images(3));
        assert_eq!(sel.quantity(MediaKind::Image), Some(3));
        assert_eq!(sel.quantity(MediaKind::Video), None);
    }

    #[test]
    fn accepts_product_id_alias() {
        let sel: Selection = serde_json::from_str(r#"{"productId": "X"}"#).unwrap();
        assert_eq!(sel.offering_id, "X");
    }

    #[test]
    fn negative_quantities_are_rejected_at_the_boundary() {
        let json = r#"{"offeringId": "X", "selectedImagesCount": -1}"#;
        assert!(serde_json::from_str::<Selection>(json).is_err());
    }

    #[test]
    fn provisioned_counts_follow_kind() {
        let sel = Selection::new("M").with_images(2).with_videos(1).with_models(1);

        let mixed = ProvisionedOffering::from_selection(OfferingKind::Mixed, &sel);
        assert_eq!(
            (mixed.images_count, mixed.videos_count, mixed.models_count),
            (Some(2), Some(1), None)
        );

        let video = ProvisionedOffering::from_selection(OfferingKind::Video, &sel);
        assert_eq!((video.images_count, video.videos_count), (None, Some(1)));

        let other = ProvisionedOffering::from_selection(OfferingKind::Other, &sel);
        assert_eq!(other.count, Some(1));
    }
}
