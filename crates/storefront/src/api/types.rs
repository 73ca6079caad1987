//! Wire types for the backend REST API.
//!
//! These types mirror the backend's JSON (camelCase, Mongo-style `_id`) and
//! convert into the domain types from `artprint-core`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use artprint_core::{
    CustomDesign, LineId, LineItem, Money, OrderId, OrderStatus, PaymentMethod, ProductId,
    ProductSnapshot, ShippingAddress, VariantSelection,
};

// =============================================================================
// Envelopes
// =============================================================================

/// Success envelope: `{ "data": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Error body carried by non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Cart document as stored by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerCart {
    #[serde(default)]
    pub items: Vec<ServerCartLine>,
}

impl ServerCart {
    /// Convert into domain line items, keeping server order.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items.into_iter().map(LineItem::from).collect()
    }
}

/// One line of a server cart. `product` is populated by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartLine {
    #[serde(rename = "_id")]
    pub id: LineId,
    pub product: ProductSnapshot,
    pub quantity: u32,
    /// Price captured when the line was added, if the backend stores one.
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub custom_design: Option<CustomDesign>,
}

impl From<ServerCartLine> for LineItem {
    fn from(line: ServerCartLine) -> Self {
        let unit_price = line.price.unwrap_or_else(|| line.product.unit_price());
        Self {
            id: line.id,
            product_id: line.product.id,
            name: line.product.name,
            quantity: line.quantity,
            unit_price,
            stock: line.product.stock,
            variant: VariantSelection::new(line.size, line.color, line.material),
            custom_design: line.custom_design,
        }
    }
}

/// Body of `POST cart`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(flatten)]
    pub variant: VariantSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_design: Option<CustomDesign>,
}

/// Body of `PUT cart/{lineId}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateLineRequest {
    pub quantity: u32,
}

// =============================================================================
// Order Types
// =============================================================================

/// Body of `POST orders` and `POST orders/guest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub items: Vec<OrderItemPayload>,
    pub shipping_address: ShippingAddress,
    pub delivery_charge: Money,
    pub payment_method: PaymentMethod,
}

/// One line of an order request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product: ProductId,
    pub quantity: u32,
    #[serde(flatten)]
    pub variant: VariantSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_design: Option<CustomDesign>,
}

impl From<&LineItem> for OrderItemPayload {
    fn from(line: &LineItem) -> Self {
        Self {
            product: line.product_id.clone(),
            quantity: line.quantity,
            variant: line.variant.clone(),
            custom_design: line.custom_design.clone(),
        }
    }
}

/// An order as returned by the backend. Read-only on this side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub delivery_charge: Option<Money>,
    #[serde(default)]
    pub total_amount: Option<Money>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One line of a placed order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product: OrderProduct,
    pub quantity: u32,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
}

/// Order lines reference their product either by ID or as a populated
/// document, depending on the endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrderProduct {
    Id(ProductId),
    Populated {
        #[serde(rename = "_id")]
        id: ProductId,
        #[serde(default)]
        name: String,
    },
}

impl OrderProduct {
    /// The referenced product's ID.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        match self {
            Self::Id(id) | Self::Populated { id, .. } => id,
        }
    }

    /// Product name, when the backend populated it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Populated { name, .. } => Some(name.as_str()).filter(|n| !n.is_empty()),
        }
    }
}
