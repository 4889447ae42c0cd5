//! Persistent cart store.
//!
//! The cart is a list of [`CartLine`]s, unique by `(product_id, unit_id)`.
//! Every mutation writes the whole list through to the [`Storage`] port
//! before returning, so a crash never loses more than the in-flight action.
//! On open, unreadable or corrupt state is discarded and the cart starts
//! empty.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalogue::{Catalogue, CatalogueError, CatalogueProduct};
use crate::order::order_total;
use crate::storage::{Storage, StorageError, keys};
use crate::types::{
    BusinessId, CatalogueId, CatalogueProductId, CurrencyCode, Money, PriceError, ProductId,
    UnitId,
};

/// One product (or product unit) in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalogue_product_id: Option<CatalogueProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalogue_id: Option<CatalogueId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<BusinessId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    pub name: String,
    /// Decimal string captured when the line was created.
    pub unit_price: String,
    pub quantity: u32,
}

impl CartLine {
    fn matches(&self, product_id: &ProductId, unit_id: Option<&UnitId>) -> bool {
        self.product_id == *product_id && self.unit_id.as_ref() == unit_id
    }

    /// Name including the unit, for display.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.unit_name {
            Some(unit) => format!("{} ({unit})", self.name),
            None => self.name.clone(),
        }
    }
}

/// What to add when the customer presses "add".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemInput {
    pub product_id: ProductId,
    pub catalogue_product_id: Option<CatalogueProductId>,
    pub catalogue_id: Option<CatalogueId>,
    pub business_id: Option<BusinessId>,
    pub unit_id: Option<UnitId>,
    pub unit_name: Option<String>,
    pub name: String,
    pub unit_price: String,
}

impl CartItemInput {
    /// Build the input for a catalogue listing and an optional unit.
    ///
    /// The price is the unit's effective price when a unit is selected and
    /// the catalogue base price otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::UnknownUnit`] if the unit is not sold for
    /// this product.
    pub fn from_listing(
        catalogue: &Catalogue,
        item: &CatalogueProduct,
        unit_id: Option<&UnitId>,
    ) -> Result<Self, CatalogueError> {
        let unit_price = item.price_for(unit_id)?.to_owned();
        let unit_name = unit_id
            .and_then(|id| item.unit(id))
            .map(|unit| unit.name.clone());

        Ok(Self {
            product_id: item.product_id.clone(),
            catalogue_product_id: Some(item.id.clone()),
            catalogue_id: Some(item.catalogue_id.clone()),
            business_id: Some(catalogue.business_id.clone()),
            unit_id: unit_id.cloned(),
            unit_name,
            name: item.product.name.clone(),
            unit_price,
        })
    }
}

impl From<CartItemInput> for CartLine {
    fn from(input: CartItemInput) -> Self {
        Self {
            product_id: input.product_id,
            catalogue_product_id: input.catalogue_product_id,
            catalogue_id: input.catalogue_id,
            business_id: input.business_id,
            unit_id: input.unit_id,
            unit_name: input.unit_name,
            name: input.name,
            unit_price: input.unit_price,
            quantity: 1,
        }
    }
}

/// Totals for the floating cart summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    /// Number of distinct lines.
    pub line_count: usize,
    /// Sum of quantities.
    pub item_count: u64,
    pub total: Money,
}

/// The cart, written through to storage on every mutation.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    lines: Vec<CartLine>,
}

impl<S: Storage> CartStore<S> {
    /// Open the cart persisted in `storage`.
    ///
    /// Missing, unreadable or corrupt state yields an empty cart. Lines with
    /// a zero quantity are dropped.
    pub fn open(storage: S) -> Self {
        let lines = match storage.load(keys::CART) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(mut lines) => {
                    lines.retain(|line| line.quantity > 0);
                    debug!(lines = lines.len(), "Restored cart");
                    lines
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cart state");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Cart storage unavailable, starting empty");
                Vec::new()
            }
        };

        Self { storage, lines }
    }

    /// Add one of a product/unit, creating the line if needed.
    ///
    /// Returns the line's new quantity. The in-memory cart is updated even if
    /// the write-through fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    pub fn add_or_increment(&mut self, input: CartItemInput) -> Result<u32, StorageError> {
        let quantity = if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(&input.product_id, input.unit_id.as_ref()))
        {
            line.quantity = line.quantity.saturating_add(1);
            line.quantity
        } else {
            self.lines.push(CartLine::from(input));
            1
        };

        self.persist()?;
        Ok(quantity)
    }

    /// Remove one of a product/unit, dropping the line when it reaches zero.
    ///
    /// Returns the remaining quantity. Decrementing an absent line does
    /// nothing and returns 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    pub fn decrement(
        &mut self,
        product_id: &ProductId,
        unit_id: Option<&UnitId>,
    ) -> Result<u32, StorageError> {
        let Some(index) = self
            .lines
            .iter()
            .position(|l| l.matches(product_id, unit_id))
        else {
            return Ok(0);
        };

        let remaining = match self.lines.get_mut(index) {
            Some(line) if line.quantity > 1 => {
                line.quantity -= 1;
                line.quantity
            }
            _ => {
                self.lines.remove(index);
                0
            }
        };

        self.persist()?;
        Ok(remaining)
    }

    /// Quantity of a product/unit in the cart, 0 when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId, unit_id: Option<&UnitId>) -> u32 {
        self.lines
            .iter()
            .find(|l| l.matches(product_id, unit_id))
            .map_or(0, |l| l.quantity)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.lines.clear();
        self.persist()
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Catalogue the cart is being filled from, if any line records one.
    #[must_use]
    pub fn catalogue_id(&self) -> Option<&CatalogueId> {
        self.lines.iter().find_map(|l| l.catalogue_id.as_ref())
    }

    /// Counts and total for display.
    ///
    /// # Errors
    ///
    /// Returns an error if a line's price is malformed or the total overflows.
    pub fn summary(&self, currency: CurrencyCode) -> Result<CartSummary, PriceError> {
        Ok(CartSummary {
            line_count: self.lines.len(),
            item_count: self.lines.iter().map(|l| u64::from(l.quantity)).sum(),
            total: order_total(&self.lines, currency)?,
        })
    }

    /// The backing storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&self.lines).map_err(|source| StorageError::Encode {
            key: keys::CART.to_string(),
            source,
        })?;
        self.storage.save(keys::CART, &encoded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn input(product: &str, unit: Option<&str>, price: &str) -> CartItemInput {
        CartItemInput {
            product_id: ProductId::new(product),
            catalogue_product_id: Some(CatalogueProductId::new(format!("cp-{product}"))),
            catalogue_id: Some(CatalogueId::new("c1")),
            business_id: Some(BusinessId::new("b1")),
            unit_id: unit.map(UnitId::new),
            unit_name: unit.map(str::to_uppercase),
            name: format!("Product {product}"),
            unit_price: price.to_string(),
        }
    }

    #[test]
    fn test_add_twice_makes_one_line() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_or_increment(input("p1", None, "1000")).unwrap();
        let quantity = cart.add_or_increment(input("p1", None, "1000")).unwrap();

        assert_eq!(quantity, 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(&ProductId::new("p1"), None), 2);
    }

    #[test]
    fn test_units_are_separate_lines() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_or_increment(input("p1", None, "1000")).unwrap();
        cart.add_or_increment(input("p1", Some("carton"), "11000"))
            .unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(
            cart.quantity_of(&ProductId::new("p1"), Some(&UnitId::new("carton"))),
            1
        );
    }

    #[test]
    fn test_decrement_removes_at_zero() {
        let mut cart = CartStore::open(MemoryStorage::new());
        let p1 = ProductId::new("p1");
        cart.add_or_increment(input("p1", None, "1000")).unwrap();
        cart.add_or_increment(input("p1", None, "1000")).unwrap();

        assert_eq!(cart.decrement(&p1, None).unwrap(), 1);
        assert_eq!(cart.decrement(&p1, None).unwrap(), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.decrement(&p1, None).unwrap(), 0);
    }

    #[test]
    fn test_quantity_of_absent_is_zero() {
        let cart = CartStore::open(MemoryStorage::new());
        assert_eq!(cart.quantity_of(&ProductId::new("nope"), None), 0);
    }

    #[test]
    fn test_write_through_and_reopen() {
        let storage = std::sync::Arc::new(MemoryStorage::new());
        let mut cart = CartStore::open(storage.clone());
        cart.add_or_increment(input("p1", None, "1000")).unwrap();
        cart.add_or_increment(input("p2", Some("pack"), "5800"))
            .unwrap();

        let reopened = CartStore::open(storage);
        assert_eq!(reopened.lines(), cart.lines());
    }

    #[test]
    fn test_corrupt_state_starts_empty() {
        let storage = MemoryStorage::new();
        storage.save(keys::CART, "{not json").unwrap();
        let cart = CartStore::open(storage);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_quantity_lines_dropped_on_open() {
        let storage = MemoryStorage::new();
        storage
            .save(
                keys::CART,
                r#"[{"productId":"p1","name":"A","unitPrice":"10","quantity":0},
                    {"productId":"p2","name":"B","unitPrice":"10","quantity":3}]"#,
            )
            .unwrap();
        let cart = CartStore::open(storage);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(&ProductId::new("p2"), None), 3);
    }

    #[test]
    fn test_clear() {
        let storage = std::sync::Arc::new(MemoryStorage::new());
        let mut cart = CartStore::open(storage.clone());
        cart.add_or_increment(input("p1", None, "1000")).unwrap();
        cart.clear().unwrap();

        assert!(cart.is_empty());
        assert_eq!(storage.load(keys::CART).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_summary() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_or_increment(input("p1", None, "1000")).unwrap();
        cart.add_or_increment(input("p1", None, "1000")).unwrap();
        cart.add_or_increment(input("p2", None, "250")).unwrap();

        let summary = cart.summary(CurrencyCode::XAF).unwrap();
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total.minor_units(), 2250);
    }

    #[test]
    fn test_display_name_includes_unit() {
        let line = CartLine::from(input("p1", Some("carton"), "1"));
        assert_eq!(line.display_name(), "Product p1 (CARTON)");
    }
}
