//! Built-in metaverse marketplace catalog.

use adsmarket_core::Money;

use crate::catalog::{Catalog, DEFAULT_CURRENCY};
use crate::offering::{
    Characteristic, CharacteristicValue, Offering, OfferingKind, PriceRule, ids,
};

pub const IMAGE_OFFER: &str = "IMG_ADS_OFFER_001";
pub const VIDEO_OFFER: &str = "VIDEO_ADS_OFFER_001";
pub const MIXED_OFFER: &str = "MIXED_ADS_OFFER_001";
pub const MODEL_OFFER: &str = "3D_MODEL_ADS_OFFER_001";

fn one_time(id: &str, name: &str, amount: u64) -> PriceRule {
    PriceRule {
        id: id.to_string(),
        name: name.to_string(),
        price: Money::new(amount, DEFAULT_CURRENCY),
        one_time: true,
    }
}

fn point(id: &str, value_type: &str, value: &str) -> Characteristic {
    Characteristic::new(id, value_type, vec![CharacteristicValue::point(value)])
}

fn measured(id: &str, value: &str, unit: &str) -> Characteristic {
    let mut v = CharacteristicValue::point(value);
    v.unit_of_measure = Some(unit.to_string());
    Characteristic::new(id, "integer", vec![v])
}

fn formats(id: &str, default: &str, others: &[&str]) -> Characteristic {
    let mut values = vec![CharacteristicValue::point(default)];
    values.extend(others.iter().map(|f| CharacteristicValue {
        value: Some((*f).to_string()),
        ..CharacteristicValue::default()
    }));
    Characteristic::new(id, "string", values)
}

fn range(id: &str, from: &str, to: &str) -> Characteristic {
    Characteristic::new(id, "integer", vec![CharacteristicValue::range(from, to)])
}

impl Catalog {
    /// The metaverse partner-advertising bundle: image, video, mixed media and
    /// the 3D model add-on.
    pub fn marketplace() -> Self {
        let image = Offering {
            id: IMAGE_OFFER.into(),
            name: "Images Advertisement Offer".into(),
            description: "Advertise with up to 4 images to showcase your brand effectively.".into(),
            kind: OfferingKind::Image,
            display_name: Some("Advertise With Images".into()),
            subtitle: Some("Showcase Your Brand".into()),
            add_on_for: vec![],
            prices: vec![one_time(
                ids::IMG_PER_IMAGE_PRICE,
                "Image Fixed Price (per image)",
                1_000,
            )],
            characteristics: vec![
                formats("IMAGE_FORMAT", "image/png", &["image/jpeg"]),
                measured("IMAGE_MAX_SIZE", "5242880", "bytes"),
                point("IMAGE_MIN_DIMENSIONS", "string", "1080x1080"),
                point(ids::IMAGE_MAX_COUNT, "integer", "4"),
            ],
        };

        let video = Offering {
            id: VIDEO_OFFER.into(),
            name: "Video Advertisement Offer".into(),
            description: "Upload and display video advertisements in Orange Metaverse".into(),
            kind: OfferingKind::Video,
            display_name: Some("Advertise With Video".into()),
            subtitle: Some("Engage with Motion".into()),
            add_on_for: vec![],
            prices: vec![one_time(ids::VIDEO_FIXED_PRICE, "Video Fixed Price", 5_000)],
            characteristics: vec![
                formats("VIDEO_FORMAT", "video/mp4", &["video/quicktime"]),
                measured("VIDEO_MAX_SIZE", "419430400", "bytes"),
                measured("VIDEO_MAX_DURATION", "300", "seconds"),
                point(ids::VIDEO_MAX_COUNT, "integer", "2"),
            ],
        };

        let mixed = Offering {
            id: MIXED_OFFER.into(),
            name: "Mixed Advertisement Offer".into(),
            description: "Upload combination of images and videos for metaverse advertising".into(),
            kind: OfferingKind::Mixed,
            display_name: Some("Advertise with Mixed Media".into()),
            subtitle: Some("Best of Both Worlds".into()),
            add_on_for: vec![],
            prices: vec![
                one_time(ids::MIXED_BASE_PRICE, "Mixed Content Base Price", 1_500),
                one_time(ids::MIXED_IMAGE_PRICE, "Additional Image Price", 1_000),
                one_time(ids::MIXED_VIDEO_PRICE, "Video Addition Price", 2_500),
            ],
            characteristics: vec![
                range(ids::MIXED_IMG_COUNT, "0", "4"),
                range(ids::MIXED_VIDEO_COUNT, "0", "2"),
                point("MIXED_CONTENT_CONSTRAINT", "string", "MIN_ONE_CONTENT_TYPE"),
            ],
        };

        let model = Offering {
            id: MODEL_OFFER.into(),
            name: "3D Model Advertisement Offer".into(),
            description: "Upload and showcase 3D models in Orange Metaverse".into(),
            kind: OfferingKind::Model3d,
            display_name: Some("Showcase in 3D".into()),
            subtitle: Some("Immersive 3D Presence".into()),
            add_on_for: vec![MIXED_OFFER.into()],
            prices: vec![one_time(ids::MODEL_FIXED_PRICE, "3D Model Fixed Price", 10_000)],
            characteristics: vec![
                point("3D_MODEL_FORMAT", "string", "model/gltf-binary"),
                measured("3D_MODEL_MAX_SIZE", "104857600", "bytes"),
                measured("3D_MODEL_COMPLEXITY", "50000", "polygons"),
                point(ids::MODEL_MAX_COUNT, "integer", "1"),
                point("3D_MODEL_ONLY", "boolean", "true"),
            ],
        };

        Self {
            bundled: vec![
                IMAGE_OFFER.into(),
                VIDEO_OFFER.into(),
                MIXED_OFFER.into(),
                MODEL_OFFER.into(),
            ],
            offerings: vec![image, video, mixed, model],
        }
    }
}
