//! In-memory cart for buyers without a session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use artprint_core::{CustomDesign, LineId, LineItem, ProductSnapshot, VariantSelection};

use super::{
    CartError, CartStatus, CartStore, ensure_quantity, ensure_stock_for_add,
    ensure_stock_for_update, new_line,
};
use crate::models::CartMode;

/// Ephemeral cart that never talks to the backend.
///
/// Clones share the same lines. Dropping the last clone discards the cart.
#[derive(Debug, Clone, Default)]
pub struct GuestCart {
    lines: Arc<Mutex<Vec<LineItem>>>,
}

impl GuestCart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-line cart for express checkout from a landing page.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` or `OutOfStock` if the product can't be
    /// bought in that quantity.
    pub fn express(
        product: &ProductSnapshot,
        quantity: u32,
        variant: VariantSelection,
    ) -> Result<Self, CartError> {
        let cart = Self::new();
        cart.insert(product, quantity, variant, None)?;
        Ok(cart)
    }

    fn lines(&self) -> MutexGuard<'_, Vec<LineItem>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
        variant: VariantSelection,
        custom_design: Option<CustomDesign>,
    ) -> Result<LineId, CartError> {
        ensure_quantity(quantity)?;
        let variant = variant.normalized();

        let mut lines = self.lines();
        ensure_stock_for_add(&lines, product, quantity)?;

        if let Some(line) = lines
            .iter_mut()
            .find(|line| line.is_same_selection(&product.id, &variant, custom_design.as_ref()))
        {
            line.quantity += quantity;
            line.stock = product.stock;
            debug!(line_id = %line.id, quantity = line.quantity, "Merged into existing line");
            return Ok(line.id.clone());
        }

        let line = new_line(product, quantity, variant, custom_design);
        let line_id = line.id.clone();
        debug!(line_id = %line_id, product_id = %product.id, quantity, "Added line");
        lines.push(line);
        Ok(line_id)
    }
}

impl CartStore for GuestCart {
    fn mode(&self) -> CartMode {
        CartMode::Guest
    }

    fn status(&self) -> CartStatus {
        CartStatus::Ready
    }

    fn items(&self) -> Vec<LineItem> {
        self.lines().clone()
    }

    async fn add_item(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
        variant: VariantSelection,
        custom_design: Option<CustomDesign>,
    ) -> Result<LineId, CartError> {
        self.insert(product, quantity, variant, custom_design)
    }

    async fn update_quantity(&self, line_id: &LineId, quantity: u32) -> Result<(), CartError> {
        ensure_quantity(quantity)?;

        let mut lines = self.lines();
        ensure_stock_for_update(&lines, line_id, quantity)?;
        if let Some(line) = lines.iter_mut().find(|line| line.id == *line_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    async fn remove_item(&self, line_id: &LineId) -> Result<(), CartError> {
        let mut lines = self.lines();
        let before = lines.len();
        lines.retain(|line| line.id != *line_id);
        if lines.len() == before {
            return Err(CartError::LineNotFound(line_id.clone()));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), CartError> {
        self.lines().clear();
        Ok(())
    }

    async fn fetch(&self) -> Result<(), CartError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use artprint_core::{DesignPosition, Money};

    use super::*;
    use crate::testing::product;

    fn a3() -> VariantSelection {
        VariantSelection::new(Some("A3".to_string()), None, None)
    }

    #[tokio::test]
    async fn test_same_selection_merges() {
        let cart = GuestCart::new();
        let poster = product("P1", 500, 10);

        let first = cart.add_item(&poster, 1, a3(), None).await.unwrap();
        let second = cart.add_item(&poster, 2, a3(), None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[tokio::test]
    async fn test_different_variant_or_design_adds_line() {
        let cart = GuestCart::new();
        let poster = product("P1", 500, 10);
        let design = CustomDesign {
            image_url: "https://cdn.example/upload.png".to_string(),
            position: DesignPosition { x: 1.0, y: 2.0 },
        };

        cart.add_item(&poster, 1, a3(), None).await.unwrap();
        cart.add_item(&poster, 1, VariantSelection::default(), None)
            .await
            .unwrap();
        cart.add_item(&poster, 1, a3(), Some(design)).await.unwrap();

        assert_eq!(cart.items().len(), 3);
    }

    #[tokio::test]
    async fn test_subtotal_tracks_mutations() {
        let cart = GuestCart::new();
        let poster = product("P1", 500, 10);
        let mug = product("P2", 350, 10);

        let line = cart
            .add_item(&poster, 2, VariantSelection::default(), None)
            .await
            .unwrap();
        cart.add_item(&mug, 1, VariantSelection::default(), None)
            .await
            .unwrap();
        assert_eq!(cart.subtotal(), Money::from_whole(1350));

        cart.update_quantity(&line, 3).await.unwrap();
        assert_eq!(cart.subtotal(), Money::from_whole(1850));

        cart.remove_item(&line).await.unwrap();
        assert_eq!(cart.subtotal(), Money::from_whole(350));
    }

    #[tokio::test]
    async fn test_out_of_stock_leaves_cart_unchanged() {
        let cart = GuestCart::new();
        let poster = product("P1", 500, 3);

        let line = cart
            .add_item(&poster, 2, VariantSelection::default(), None)
            .await
            .unwrap();
        let err = cart.add_item(&poster, 2, a3(), None).await.unwrap_err();
        assert!(matches!(err, CartError::OutOfStock { requested: 4, .. }));

        let err = cart.update_quantity(&line, 4).await.unwrap_err();
        assert!(matches!(err, CartError::OutOfStock { .. }));
        assert_eq!(cart.item_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_quantity_and_unknown_line() {
        let cart = GuestCart::new();
        let poster = product("P1", 500, 3);

        assert!(matches!(
            cart.add_item(&poster, 0, VariantSelection::default(), None)
                .await,
            Err(CartError::InvalidQuantity { quantity: 0 })
        ));

        let line = cart
            .add_item(&poster, 1, VariantSelection::default(), None)
            .await
            .unwrap();
        assert!(matches!(
            cart.update_quantity(&line, 0).await,
            Err(CartError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            cart.remove_item(&LineId::new("nope")).await,
            Err(CartError::LineNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_express_cart_and_clear() {
        let poster = product("P1", 500, 5);
        let cart = GuestCart::express(&poster, 2, a3()).unwrap();

        assert_eq!(cart.status(), CartStatus::Ready);
        assert_eq!(cart.mode(), CartMode::Guest);
        assert_eq!(cart.subtotal(), Money::from_whole(1000));

        let view = cart.clone();
        cart.clear().await.unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_express_rejects_excess_quantity() {
        let poster = product("P1", 500, 1);
        assert!(matches!(
            GuestCart::express(&poster, 2, VariantSelection::default()),
            Err(CartError::OutOfStock { .. })
        ));
    }
}
