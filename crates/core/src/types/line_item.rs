//! Cart line items and subtotal arithmetic.

use serde::{Deserialize, Serialize};

use crate::{LineId, Money, ProductId};

/// Size, color and material picked for a line. Each is optional and
/// single-valued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl VariantSelection {
    /// Build a selection, treating empty strings as "not selected".
    #[must_use]
    pub fn new(size: Option<String>, color: Option<String>, material: Option<String>) -> Self {
        let keep = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            size: keep(size),
            color: keep(color),
            material: keep(material),
        }
    }

    /// The same selection with blank values dropped.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.size, self.color, self.material)
    }
}

/// Where an uploaded design sits on the product mockup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignPosition {
    pub x: f64,
    pub y: f64,
}

/// A buyer-uploaded design printed on the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDesign {
    pub image_url: String,
    #[serde(default)]
    pub position: DesignPosition,
}

/// One entry in a cart.
///
/// `unit_price` and `stock` are snapshots taken when the line was created;
/// `quantity` is always at least one.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: LineId,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub stock: u32,
    pub variant: VariantSelection,
    pub custom_design: Option<CustomDesign>,
}

impl LineItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// Whether adding `product_id` with this selection should merge into this
    /// line instead of creating a new one.
    #[must_use]
    pub fn is_same_selection(
        &self,
        product_id: &ProductId,
        variant: &VariantSelection,
        custom_design: Option<&CustomDesign>,
    ) -> bool {
        self.product_id == *product_id
            && self.variant == *variant
            && self.custom_design.as_ref() == custom_design
    }
}

/// Σ(unit price × quantity) over `items`, computed fresh on every call.
#[must_use]
pub fn subtotal(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::line_total).sum()
}

/// Total units of `product_id` across all lines, optionally skipping one line.
#[must_use]
pub fn product_quantity(items: &[LineItem], product_id: &ProductId, skip: Option<&LineId>) -> u64 {
    items
        .iter()
        .filter(|line| line.product_id == *product_id && Some(&line.id) != skip)
        .map(|line| u64::from(line.quantity))
        .sum()
}
