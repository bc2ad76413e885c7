use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::money::Money;

/// Identity of a line: one product in one size and color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct LineKey {
    pub product_id: Uuid,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

impl LineKey {
    pub fn new(product_id: Uuid, size: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            product_id,
            size: size.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLineItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub image_url: Option<String>,
}

impl CartLineItem {
    pub fn new(product_id: Uuid, name: impl Into<String>, unit_price: Money, quantity: i64) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity,
            size: String::new(),
            color: String::new(),
            image_url: None,
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id, self.size.clone(), self.color.clone())
    }

    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }

    /// `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}
