//! Cart-to-order assembly.
//!
//! Turns the cart's lines into the body of `POST /orders`. The checks run
//! before any network call and each failure tells the caller what the
//! customer can do about it: an empty cart cannot be checked out at all,
//! while a stale or mixed cart can be fixed by clearing it and starting over.

use serde::Serialize;
use thiserror::Error;

use crate::cart::CartLine;
use crate::types::money::serialize_as_decimal;
use crate::types::{
    BusinessId, CatalogueId, CatalogueProductId, CurrencyCode, Money, OrderType, PaymentMethod,
    PriceError, UnitId,
};

/// Reasons a cart cannot become an order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Nothing to order.
    #[error("your cart is empty")]
    EmptyCart,

    /// No line knows which catalogue it came from.
    #[error("your cart was saved by an older version; clear it and add the products again")]
    StaleCart,

    /// A line is missing its catalogue references.
    #[error("\"{0}\" is missing catalogue details; remove it or clear your cart")]
    IncompleteLine(String),

    /// Lines come from more than one catalogue.
    #[error("your cart mixes products from different catalogues; clear it and start again")]
    MixedCatalogues,

    /// A line's price is malformed.
    #[error("invalid price in cart: {0}")]
    Price(#[from] PriceError),
}

impl OrderError {
    /// Whether clearing the cart is the way out.
    ///
    /// A malformed price sits in a stored line the shopper cannot edit, so it
    /// counts too.
    #[must_use]
    pub const fn offers_cart_reset(&self) -> bool {
        matches!(
            self,
            Self::StaleCart | Self::IncompleteLine(_) | Self::MixedCatalogues | Self::Price(_)
        )
    }
}

/// Free-form details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutDetails {
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub currency: CurrencyCode,
}

/// One ordered catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub catalogue_product_id: CatalogueProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<UnitId>,
    pub quantity: u32,
    #[serde(serialize_with = "serialize_as_decimal")]
    pub unit_price: Money,
}

/// Body of the order creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(rename = "type")]
    pub kind: OrderType,
    pub catalogue_id: CatalogueId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_business_id: Option<BusinessId>,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Build the order body for a cart.
///
/// # Errors
///
/// In order of precedence: [`OrderError::EmptyCart`] for no lines,
/// [`OrderError::StaleCart`] when no line carries a catalogue ID,
/// [`OrderError::IncompleteLine`] for a line without a catalogue product ID
/// or catalogue ID, [`OrderError::MixedCatalogues`] when catalogue IDs
/// differ, and [`OrderError::Price`] for a malformed unit price.
pub fn build_order_payload(
    lines: &[CartLine],
    details: &CheckoutDetails,
) -> Result<OrderPayload, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let catalogue_id = lines
        .iter()
        .find_map(|l| l.catalogue_id.as_ref())
        .ok_or(OrderError::StaleCart)?;

    let items = lines
        .iter()
        .map(|line| {
            let (Some(catalogue_product_id), Some(line_catalogue)) =
                (&line.catalogue_product_id, &line.catalogue_id)
            else {
                return Err(OrderError::IncompleteLine(line.name.clone()));
            };
            if catalogue_product_id.is_blank() {
                return Err(OrderError::IncompleteLine(line.name.clone()));
            }
            if line_catalogue != catalogue_id {
                return Err(OrderError::MixedCatalogues);
            }

            Ok(OrderItem {
                catalogue_product_id: catalogue_product_id.clone(),
                unit_id: line.unit_id.clone(),
                quantity: line.quantity,
                unit_price: Money::parse(&line.unit_price, details.currency)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let notes = details
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned);

    Ok(OrderPayload {
        kind: OrderType::B2c,
        catalogue_id: catalogue_id.clone(),
        from_business_id: lines.iter().find_map(|l| l.business_id.clone()),
        items,
        notes,
        payment_method: details.payment_method,
    })
}

/// Sum of `quantity × unit price` over the lines, in minor units.
///
/// # Errors
///
/// Returns an error if a price is malformed or the sum overflows.
pub fn order_total(lines: &[CartLine], currency: CurrencyCode) -> Result<Money, PriceError> {
    lines.iter().try_fold(Money::zero(currency), |total, line| {
        let line_total = Money::parse(&line.unit_price, currency)?.checked_mul(line.quantity)?;
        total.checked_add(line_total)
    })
}
