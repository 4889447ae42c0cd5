//! Catalogue browsing commands.
//!
//! # Usage
//!
//! ```bash
//! vitrine catalogue show spring-wholesale
//! vitrine catalogue products spring-wholesale --page 2 --limit 50
//! ```

use vitrine_core::{AccessState, CatalogueProduct, CurrencyCode, UnitId};

use super::{App, CliError, say};

/// Show catalogue details and whether access is required.
///
/// # Errors
///
/// Returns an error if the catalogue cannot be loaded.
pub async fn show(app: &mut App, slug: &str) -> Result<(), CliError> {
    let view = App::open_view(&app.client, &mut app.session, &app.shutdown, slug).await?;
    let catalogue = view.catalogue();

    say(format!("{} ({})", catalogue.name, catalogue.slug));
    say(format!("  id:       {}", catalogue.id));
    say(format!("  business: {}", catalogue.business_id));
    say(format!("  type:     {}", catalogue.kind));
    if !catalogue.is_active {
        say("  inactive");
    }
    match view.gate().state() {
        AccessState::Requesting => {
            say("  private:  yes, access required");
            say(format!("Run `vitrine access {slug}` to request access."));
        }
        AccessState::Hidden if view.is_private() => say("  private:  yes, access granted"),
        _ => say("  private:  no"),
    }
    Ok(())
}

/// List one page of visible products with their effective prices.
///
/// # Errors
///
/// Returns `AccessRequired` for a gated catalogue, or an error if loading
/// fails.
pub async fn products(
    app: &mut App,
    slug: &str,
    page: u32,
    limit: Option<u32>,
) -> Result<(), CliError> {
    let limit = limit.unwrap_or(app.config.page_size).clamp(1, 100);
    let currency = app.config.currency;

    let view = App::open_view(&app.client, &mut app.session, &app.shutdown, slug).await?;
    let listing = view.products(page, limit).await?;

    say(format!(
        "{}: page {} of {} ({} products)",
        view.catalogue().name,
        listing.meta.page,
        listing.meta.total_pages.max(1),
        listing.meta.total
    ));
    for item in &listing.items {
        let in_cart = app.cart.quantity_of(&item.product_id, None);
        say(format!(
            "- {} [{}] {}{}",
            item.product.name,
            item.id,
            format_price(item, None, currency),
            if in_cart > 0 {
                format!("  (in cart: {in_cart})")
            } else {
                String::new()
            }
        ));
        for unit in &item.product.units {
            let in_cart = app.cart.quantity_of(&item.product_id, Some(&unit.id));
            say(format!(
                "    {} [{}] {}{}",
                unit.name,
                unit.id,
                format_price(item, Some(&unit.id), currency),
                if in_cart > 0 {
                    format!("  (in cart: {in_cart})")
                } else {
                    String::new()
                }
            ));
        }
    }
    if listing.meta.has_next_page() {
        say(format!(
            "More products: `vitrine catalogue products {slug} --page {}`",
            listing.meta.page + 1
        ));
    }
    Ok(())
}

/// Render the effective price, or the reason it cannot be resolved.
fn format_price(item: &CatalogueProduct, unit: Option<&UnitId>, currency: CurrencyCode) -> String {
    item.effective_price(unit, currency)
        .map_or_else(|e| format!("(price unavailable: {e})"), |price| price.to_string())
}
