//! Product documents as stored by the marketplace, and their API views.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Moderation state of a product.
///
/// There is no transition out of `Accepted`; rejection deletes the document.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SelectionState {
    #[default]
    Pending,
    Accepted,
}

impl SelectionState {
    /// Stored flag values that count as accepted, including the legacy ones.
    pub const ACCEPTED_FLAGS: [&'static str; 3] = ["accepted", "1", "true"];
}

/// Base64 image embedded in the product document by the upload form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    pub data: String,
}

/// A product document in the `products` collection.
///
/// Field names follow the marketplace's storage schema. Numeric fields and
/// the selection flag are read leniently because older clients stored them
/// as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(rename = "product_name", default)]
    pub name: String,

    #[serde(rename = "product_mrp", default, deserialize_with = "lenient::price")]
    pub list_price: f64,

    /// Discount percentage, 0 to 100
    #[serde(default, deserialize_with = "lenient::offer")]
    pub offer: f64,

    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,

    #[serde(rename = "product_img", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(rename = "product_images", default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<InlineImage>,

    #[serde(default, deserialize_with = "lenient::selection")]
    pub selected: SelectionState,
}

impl Product {
    pub fn new(name: impl Into<String>, list_price: f64, offer: f64, quantity: u32) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            list_price,
            offer,
            quantity,
            image_url: None,
            images: Vec::new(),
            selected: SelectionState::Pending,
        }
    }

    /// List price less the offer, rounded to cents. Never stored.
    pub fn selling_price(&self) -> f64 {
        if self.offer == 0.0 {
            return self.list_price;
        }
        let discounted = self.list_price * (1.0 - self.offer / 100.0);
        (discounted * 100.0).round() / 100.0
    }

    /// The image URL if set, otherwise a data URI for the first inline image.
    pub fn image_link(&self) -> Option<String> {
        if let Some(url) = self.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(url.to_string());
        }

        self.images.first().map(|image| {
            if image.data.starts_with("data:") {
                image.data.clone()
            } else {
                format!("data:image/png;base64,{}", image.data)
            }
        })
    }
}

/// Product as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    /// 24-character hex ObjectId
    #[schema(example = "65a1f0c2e4b0a1b2c3d4e5f6")]
    pub id: String,
    #[schema(example = "Ceramic mug")]
    pub name: String,
    #[schema(example = 100.0)]
    pub list_price: f64,
    #[schema(example = 25.0)]
    pub offer: f64,
    pub quantity: u32,
    pub selected: SelectionState,
    /// `list_price * (1 - offer / 100)`, rounded to cents
    #[schema(example = 75.0)]
    pub selling_price: f64,
    /// Image URL or `data:` URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_hex(),
            name: product.name.clone(),
            list_price: product.list_price,
            offer: product.offer,
            quantity: product.quantity,
            selected: product.selected,
            selling_price: product.selling_price(),
            image: product.image_link(),
        }
    }
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self::from(&product)
    }
}

/// Body of the select endpoints. Only `true` (or the legacy `"1"`) is accepted.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SelectProduct {
    #[serde(deserialize_with = "lenient::flag")]
    #[validate(custom(function = "must_be_true"))]
    #[schema(example = true)]
    pub selected: bool,
}

fn must_be_true(selected: &bool) -> Result<(), ValidationError> {
    if *selected {
        Ok(())
    } else {
        let mut err = ValidationError::new("must_be_true");
        err.message = Some("only `selected: true` is accepted".into());
        Err(err)
    }
}

/// Counts behind the dashboard's pending badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModerationStats {
    pub pending: u64,
    pub accepted: u64,
    pub total: u64,
}

/// Deserializers for legacy document shapes.
pub(crate) mod lenient {
    use super::SelectionState;
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Float(f64),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Number>::deserialize(deserializer)? {
            None => Ok(0.0),
            Some(Number::Float(n)) => Ok(n),
            Some(Number::Text(s)) if s.trim().is_empty() => Ok(0.0),
            Some(Number::Text(s)) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("not a number: {s:?}"))),
        }
    }

    pub fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = number(deserializer)?;
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(D::Error::custom(format!("expected a non-negative amount, got {value}")))
        }
    }

    pub fn offer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = number(deserializer)?;
        if (0.0..=100.0).contains(&value) {
            Ok(value)
        } else {
            Err(D::Error::custom(format!("expected an offer between 0 and 100, got {value}")))
        }
    }

    pub fn quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = number(deserializer)?;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
            Ok(value as u32)
        } else {
            Err(D::Error::custom(format!("expected a non-negative integer, got {value}")))
        }
    }

    fn truthy(flag: Option<Flag>) -> Option<bool> {
        match flag {
            None => Some(false),
            Some(Flag::Bool(b)) => Some(b),
            Some(Flag::Int(n)) => Some(n != 0),
            Some(Flag::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "accepted" => Some(true),
                "" | "0" | "false" | "pending" => Some(false),
                _ => None,
            },
        }
    }

    pub fn selection<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<SelectionState, D::Error> {
        let flag = Option::<Flag>::deserialize(deserializer)?;
        match truthy(flag) {
            Some(true) => Ok(SelectionState::Accepted),
            Some(false) => Ok(SelectionState::Pending),
            None => Err(D::Error::custom("unrecognized selection flag")),
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let flag = Option::<Flag>::deserialize(deserializer)?;
        truthy(flag).ok_or_else(|| D::Error::custom("expected true, false, \"1\" or \"0\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc};

    #[test]
    fn test_selling_price_applies_offer() {
        let product = Product::new("Mug", 100.0, 25.0, 3);
        assert_eq!(product.selling_price(), 75.0);
    }

    #[test]
    fn test_offer_above_hundred_is_rejected() {
        let document = doc! { "_id": ObjectId::new(), "product_mrp": 100.0, "offer": 150 };
        assert!(bson::from_document::<Product>(document).is_err());

        let document = doc! { "_id": ObjectId::new(), "product_mrp": 100.0, "offer": "-5" };
        assert!(bson::from_document::<Product>(document).is_err());
    }

    #[test]
    fn test_full_offer_sells_for_nothing() {
        let document = doc! { "_id": ObjectId::new(), "product_mrp": 100.0, "offer": "100" };
        let product: Product = bson::from_document(document).unwrap();
        assert_eq!(product.offer, 100.0);
        assert_eq!(product.selling_price(), 0.0);
    }

    #[test]
    fn test_selling_price_without_offer_is_list_price() {
        let product = Product::new("Mug", 19.99, 0.0, 3);
        assert_eq!(product.selling_price(), 19.99);
    }

    #[test]
    fn test_selling_price_rounds_to_cents() {
        let product = Product::new("Lamp", 33.33, 10.0, 1);
        assert_eq!(product.selling_price(), 30.0);
    }

    #[test]
    fn test_legacy_document_is_read() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "product_name": "Desk",
            "product_mrp": "100.00",
            "offer": "25",
            "quantity": "4",
            "selected": "1",
            "address": "12 Market St",
        };

        let product: Product = bson::from_document(document).unwrap();
        assert_eq!(product.id, id);
        assert_eq!(product.list_price, 100.0);
        assert_eq!(product.offer, 25.0);
        assert_eq!(product.quantity, 4);
        assert_eq!(product.selected, SelectionState::Accepted);
    }

    #[test]
    fn test_missing_flag_is_pending() {
        let document = doc! {
            "_id": ObjectId::new(),
            "product_name": "Chair",
            "product_mrp": 40.5,
            "offer": 0,
            "quantity": 2,
        };

        let product: Product = bson::from_document(document).unwrap();
        assert_eq!(product.selected, SelectionState::Pending);
        assert_eq!(product.list_price, 40.5);
    }

    #[test]
    fn test_zero_flag_is_pending() {
        let document = doc! { "_id": ObjectId::new(), "selected": "0" };
        let product: Product = bson::from_document(document).unwrap();
        assert_eq!(product.selected, SelectionState::Pending);
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let document = doc! { "_id": ObjectId::new(), "quantity": -1 };
        assert!(bson::from_document::<Product>(document).is_err());
    }

    #[test]
    fn test_selection_written_canonically() {
        let mut product = Product::new("Mug", 10.0, 0.0, 1);
        product.selected = SelectionState::Accepted;
        let document = bson::to_document(&product).unwrap();
        assert_eq!(document.get_str("selected").unwrap(), "accepted");
        assert_eq!(SelectionState::Accepted.as_ref(), "accepted");
    }

    #[test]
    fn test_view_prefers_url_then_inline_image() {
        let mut product = Product::new("Mug", 10.0, 0.0, 1);
        product.images = vec![InlineImage {
            data: "iVBORw0KGgo=".to_string(),
        }];
        assert_eq!(
            ProductView::from(&product).image.as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );

        product.image_url = Some("https://cdn.example.com/mug.png".to_string());
        assert_eq!(
            ProductView::from(&product).image.as_deref(),
            Some("https://cdn.example.com/mug.png")
        );
    }

    #[test]
    fn test_view_carries_hex_id_and_selling_price() {
        let product = Product::new("Mug", 100.0, 25.0, 1);
        let view = ProductView::from(&product);
        assert_eq!(view.id, product.id.to_hex());
        assert_eq!(view.selling_price, 75.0);
        assert_eq!(view.selected, SelectionState::Pending);
    }

    #[test]
    fn test_select_body_accepts_legacy_flag() {
        let body: SelectProduct = serde_json::from_str(r#"{"selected":"1"}"#).unwrap();
        assert!(body.selected);
        assert!(body.validate().is_ok());

        let body: SelectProduct = serde_json::from_str(r#"{"selected":true}"#).unwrap();
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_select_body_rejects_false() {
        let body: SelectProduct = serde_json::from_str(r#"{"selected":false}"#).unwrap();
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("selected"));
    }
}
