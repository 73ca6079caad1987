//! Catalog data consumed by the cart.

use serde::{Deserialize, Serialize};

use crate::{Money, ProductId};

/// The slice of a catalog product the cart needs: price, stock and the
/// variant options a buyer can pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    pub base_price: Money,
    #[serde(default)]
    pub special_price: Option<Money>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
}

impl ProductSnapshot {
    /// Price a new cart line is captured at.
    ///
    /// A special price takes precedence over the base price unless it is
    /// unset or zero.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.special_price
            .filter(|price| !price.is_zero())
            .unwrap_or(self.base_price)
    }
}
