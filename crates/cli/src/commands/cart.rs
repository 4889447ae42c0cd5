//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! vitrine cart add spring-wholesale cp_123 --unit carton
//! vitrine cart remove prod_9 --unit carton
//! vitrine cart show
//! vitrine cart clear
//! ```

use tracing::info;
use vitrine_core::{CartItemInput, CatalogueProductId, Money, ProductId, UnitId};

use super::{App, CliError, say};

/// Add one of a catalogue product to the cart.
///
/// # Errors
///
/// Returns an error if the catalogue is gated, the product is not listed,
/// the unit is unknown, or the cart cannot be saved.
pub async fn add(
    app: &mut App,
    slug: &str,
    catalogue_product_id: &str,
    unit: Option<UnitId>,
) -> Result<(), CliError> {
    let page_size = app.config.page_size;
    let id = CatalogueProductId::new(catalogue_product_id);

    let input = {
        let view = App::open_view(&app.client, &mut app.session, &app.shutdown, slug).await?;
        let item = view.find_product(&id, page_size).await?;
        CartItemInput::from_listing(view.catalogue(), &item, unit.as_ref())?
    };

    if let Some(existing) = app.cart.catalogue_id()
        && input.catalogue_id.as_ref() != Some(existing)
    {
        say("Your cart holds products from another catalogue; checkout will refuse mixed carts.");
    }

    let name = input.name.clone();
    let quantity = app.cart.add_or_increment(input)?;
    info!(catalogue_product_id = %id, quantity, "Added to cart");
    say(format!("{name}: {quantity} in cart"));
    Ok(())
}

/// Remove one of a product from the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn remove(app: &mut App, product_id: &ProductId, unit: Option<UnitId>) -> Result<(), CliError> {
    if app.cart.quantity_of(product_id, unit.as_ref()) == 0 {
        say("That product is not in your cart.");
        return Ok(());
    }
    let quantity = app.cart.decrement(product_id, unit.as_ref())?;
    if quantity == 0 {
        say("Removed from cart.");
    } else {
        say(format!("{quantity} left in cart."));
    }
    Ok(())
}

/// Show the cart lines and total.
///
/// # Errors
///
/// Returns an error if a stored price cannot be totalled.
pub fn show(app: &App) -> Result<(), CliError> {
    if app.cart.is_empty() {
        say("Your cart is empty.");
        return Ok(());
    }

    let currency = app.config.currency;
    for line in app.cart.lines() {
        let price = Money::parse(&line.unit_price, currency)
            .map_or_else(|_| line.unit_price.clone(), |m| m.to_string());
        say(format!(
            "{} x {} @ {}  [{}{}]",
            line.quantity,
            line.display_name(),
            price,
            line.product_id,
            line.unit_id
                .as_ref()
                .map_or_else(String::new, |u| format!(" / {u}"))
        ));
    }

    let summary = app.cart.summary(currency)?;
    say(format!(
        "{} items in {} lines, total {}",
        summary.item_count, summary.line_count, summary.total
    ));
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn clear(app: &mut App) -> Result<(), CliError> {
    app.cart.clear()?;
    say("Cart cleared.");
    Ok(())
}
