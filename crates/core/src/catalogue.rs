//! Catalogue, product and pricing model.
//!
//! These are the read-only records served by the catalogue endpoints. Field
//! names follow the API's camelCase JSON; snake_case aliases are accepted for
//! the fields older API versions sent that way.
//!
//! Prices stay as the decimal strings the API sent until something needs to
//! do arithmetic, at which point they are parsed into [`Money`].

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::types::{
    BusinessId, CatalogueId, CatalogueProductId, CatalogueType, CurrencyCode, CustomerCategoryId,
    Money, PriceError, ProductId, UnitId,
};

/// Errors raised while resolving catalogue pricing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogueError {
    /// The selected unit is not sold for this product.
    #[error("unit {unit} is not available for product {product}")]
    UnknownUnit {
        /// Product the unit was selected for.
        product: ProductId,
        /// Requested unit.
        unit: UnitId,
    },

    /// A price in the listing is malformed.
    #[error("invalid catalogue price: {0}")]
    Price(#[from] PriceError),
}

// =============================================================================
// Catalogue
// =============================================================================

/// A business's product catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogue {
    pub id: CatalogueId,
    #[serde(alias = "business_id")]
    pub business_id: BusinessId,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type", default)]
    pub kind: CatalogueType,
    #[serde(alias = "is_active", default = "default_true")]
    pub is_active: bool,
    #[serde(alias = "allow_cloning", default)]
    pub allow_cloning: bool,
    #[serde(alias = "cover_image", default)]
    pub cover_image: Option<String>,
    #[serde(alias = "customer_category_id", default)]
    pub customer_category_id: Option<CustomerCategoryId>,
    /// Set by the server when the viewer has not been granted access.
    #[serde(alias = "is_locked", default)]
    pub is_locked: Option<bool>,
    /// The server's own privacy mark.
    #[serde(alias = "is_private", default)]
    pub is_private: Option<bool>,
}

const fn default_true() -> bool {
    true
}

impl Catalogue {
    /// Whether the given business owns this catalogue.
    #[must_use]
    pub fn is_owned_by(&self, business_id: Option<&BusinessId>) -> bool {
        business_id.is_some_and(|id| *id == self.business_id)
    }
}

/// Decide whether a catalogue must be shown behind the access gate.
///
/// A catalogue is private when the server marks it private or locked, or when
/// its type is not public and the viewer is not the owning business.
///
/// This only decides what to render. The products endpoint enforces access
/// independently, so a wrong answer here can hide products but never expose
/// them.
#[must_use]
pub fn derive_privacy(catalogue: &Catalogue, viewer_business_id: Option<&BusinessId>) -> bool {
    if catalogue.is_locked == Some(true) || catalogue.is_private == Some(true) {
        return true;
    }
    !catalogue.kind.is_public() && !catalogue.is_owned_by(viewer_business_id)
}

// =============================================================================
// Products
// =============================================================================

/// A sellable packaging of a product (e.g. "carton of 12").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUnit {
    pub id: UnitId,
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_price")]
    pub price: Option<String>,
}

/// A catalogue-specific price override for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPrice {
    #[serde(alias = "unit_id")]
    pub unit_id: UnitId,
    #[serde(deserialize_with = "de_price")]
    pub price: String,
}

/// Product master data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub units: Vec<ProductUnit>,
}

/// A product as listed in one catalogue, with that catalogue's pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueProduct {
    /// Join record ID; this is what orders reference.
    pub id: CatalogueProductId,
    #[serde(alias = "catalogue_id")]
    pub catalogue_id: CatalogueId,
    #[serde(alias = "product_id")]
    pub product_id: ProductId,
    #[serde(alias = "base_price", deserialize_with = "de_price")]
    pub base_price: String,
    #[serde(alias = "compare_at_price", default, deserialize_with = "de_opt_price")]
    pub compare_at_price: Option<String>,
    #[serde(alias = "is_hidden", default)]
    pub is_hidden: bool,
    #[serde(alias = "unit_prices", default)]
    pub unit_prices: Vec<UnitPrice>,
    pub product: Product,
}

impl CatalogueProduct {
    /// Look up one of the product's units.
    #[must_use]
    pub fn unit(&self, unit_id: &UnitId) -> Option<&ProductUnit> {
        self.product.units.iter().find(|u| u.id == *unit_id)
    }

    /// Resolve the decimal price string for a selection.
    ///
    /// A catalogue override for the unit wins, then the unit's own price, then
    /// the catalogue base price.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::UnknownUnit`] if the unit is neither a unit
    /// of the product nor covered by an override.
    pub fn price_for(&self, unit_id: Option<&UnitId>) -> Result<&str, CatalogueError> {
        let Some(unit_id) = unit_id else {
            return Ok(&self.base_price);
        };

        if let Some(over) = self.unit_prices.iter().find(|p| p.unit_id == *unit_id) {
            return Ok(&over.price);
        }

        let unit = self.unit(unit_id).ok_or_else(|| CatalogueError::UnknownUnit {
            product: self.product_id.clone(),
            unit: unit_id.clone(),
        })?;

        Ok(unit.price.as_deref().unwrap_or(self.base_price.as_str()))
    }

    /// Resolve and parse the price for a selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit is unknown or the price is malformed.
    pub fn effective_price(
        &self,
        unit_id: Option<&UnitId>,
        currency: CurrencyCode,
    ) -> Result<Money, CatalogueError> {
        Ok(Money::parse(self.price_for(unit_id)?, currency)?)
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination metadata returned with list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    #[serde(alias = "totalItems", alias = "total_items", default)]
    pub total: u64,
    #[serde(alias = "total_pages", default)]
    pub total_pages: u32,
}

impl PaginationMeta {
    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "data")]
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

impl Page<CatalogueProduct> {
    /// Drop products the business hid from this catalogue.
    #[must_use]
    pub fn without_hidden(mut self) -> Self {
        self.items.retain(|item| !item.is_hidden);
        self
    }
}

// =============================================================================
// Price deserialization
// =============================================================================

/// Prices arrive as JSON strings from most endpoints and as numbers from a few.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawPrice> for String {
    fn from(raw: RawPrice) -> Self {
        match raw {
            RawPrice::Text(s) => s,
            RawPrice::Number(n) => n.to_string(),
        }
    }
}

fn de_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawPrice::deserialize(deserializer).map(String::from)
}

fn de_opt_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<RawPrice>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalogue(kind: CatalogueType, is_locked: Option<bool>) -> Catalogue {
        Catalogue {
            id: CatalogueId::new("c1"),
            business_id: BusinessId::new("b1"),
            name: "Spring".to_string(),
            slug: "spring".to_string(),
            kind,
            is_active: true,
            allow_cloning: false,
            cover_image: None,
            customer_category_id: None,
            is_locked,
            is_private: None,
        }
    }

    fn listing() -> CatalogueProduct {
        serde_json::from_value(json!({
            "id": "cp1",
            "catalogueId": "c1",
            "productId": "p1",
            "basePrice": 1000,
            "isHidden": false,
            "unitPrices": [{ "unitId": "carton", "price": "11000" }],
            "product": {
                "id": "p1",
                "name": "Jus de bissap",
                "units": [
                    { "id": "carton", "name": "Carton of 12", "price": "11500" },
                    { "id": "pack", "name": "Pack of 6", "price": "5800" },
                    { "id": "single", "name": "Bottle" }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_public_catalogue_is_not_private() {
        assert!(!derive_privacy(&catalogue(CatalogueType::Public, None), None));
    }

    #[test]
    fn test_locked_is_always_private() {
        let viewer = BusinessId::new("b1");
        for kind in [
            CatalogueType::Public,
            CatalogueType::Private,
            CatalogueType::Commission,
        ] {
            let c = catalogue(kind, Some(true));
            assert!(derive_privacy(&c, None));
            assert!(derive_privacy(&c, Some(&viewer)));
        }
    }

    #[test]
    fn test_server_private_mark() {
        let mut c = catalogue(CatalogueType::Public, Some(false));
        c.is_private = Some(true);
        assert!(derive_privacy(&c, None));
    }

    #[test]
    fn test_non_public_type_depends_on_owner() {
        let c = catalogue(CatalogueType::Private, None);
        assert!(derive_privacy(&c, None));
        assert!(derive_privacy(&c, Some(&BusinessId::new("someone-else"))));
        assert!(!derive_privacy(&c, Some(&BusinessId::new("b1"))));

        let commission = catalogue(CatalogueType::Commission, Some(false));
        assert!(!derive_privacy(&commission, Some(&BusinessId::new("b1"))));
    }

    #[test]
    fn test_catalogue_deserializes_with_defaults() {
        let c: Catalogue = serde_json::from_value(json!({
            "id": "c9",
            "business_id": "b9",
            "name": "Wholesale",
            "slug": "wholesale",
            "type": "private"
        }))
        .unwrap();
        assert_eq!(c.kind, CatalogueType::Private);
        assert!(c.is_active);
        assert_eq!(c.is_locked, None);
    }

    #[test]
    fn test_price_without_unit_is_base_price() {
        assert_eq!(listing().price_for(None).unwrap(), "1000");
    }

    #[test]
    fn test_unit_override_wins() {
        let item = listing();
        assert_eq!(item.price_for(Some(&UnitId::new("carton"))).unwrap(), "11000");
    }

    #[test]
    fn test_unit_own_price_then_base() {
        let item = listing();
        assert_eq!(item.price_for(Some(&UnitId::new("pack"))).unwrap(), "5800");
        assert_eq!(item.price_for(Some(&UnitId::new("single"))).unwrap(), "1000");
    }

    #[test]
    fn test_unknown_unit() {
        let err = listing().price_for(Some(&UnitId::new("pallet"))).unwrap_err();
        assert!(matches!(err, CatalogueError::UnknownUnit { .. }));
    }

    #[test]
    fn test_effective_price_parses() {
        let price = listing()
            .effective_price(Some(&UnitId::new("carton")), CurrencyCode::XAF)
            .unwrap();
        assert_eq!(price.minor_units(), 11_000);
    }

    #[test]
    fn test_without_hidden() {
        let mut hidden = listing();
        hidden.id = CatalogueProductId::new("cp2");
        hidden.is_hidden = true;

        let page = Page {
            items: vec![listing(), hidden],
            meta: PaginationMeta {
                page: 1,
                limit: 20,
                total: 2,
                total_pages: 1,
            },
        }
        .without_hidden();

        assert_eq!(page.items.len(), 1);
        assert!(!page.meta.has_next_page());
    }

    #[test]
    fn test_pagination_aliases() {
        let meta: PaginationMeta = serde_json::from_value(json!({
            "page": 1, "limit": 10, "totalItems": 35, "total_pages": 4
        }))
        .unwrap();
        assert_eq!(meta.total, 35);
        assert!(meta.has_next_page());
    }
}
