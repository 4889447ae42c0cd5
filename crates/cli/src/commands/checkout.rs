//! Checkout command.

use vitrine_client::checkout;
use vitrine_core::{CheckoutDetails, PaymentMethod};

use super::{App, CliError, say};

/// Submit the cart as an order.
///
/// With `clear_stale`, a cart that cannot be ordered as is (stale, mixed or
/// incomplete lines) is cleared so the customer can start over.
///
/// # Errors
///
/// Returns an error if the cart cannot be ordered or submission fails.
pub async fn run(
    app: &mut App,
    notes: Option<String>,
    payment_method: PaymentMethod,
    clear_stale: bool,
) -> Result<(), CliError> {
    let details = CheckoutDetails {
        notes,
        payment_method,
        currency: app.config.currency,
    };

    match checkout::submit(&app.client, &mut app.cart, &details).await {
        Ok(order) => {
            say(format!("Order {} placed.", order.id));
            if let Some(status) = &order.status {
                say(format!("  status: {status}"));
            }
            if let Some(total) = &order.total_amount {
                say(format!("  total:  {total} {}", details.currency));
            }
            if let Some(created_at) = order.created_at {
                say(format!("  placed: {}", created_at.format("%Y-%m-%d %H:%M UTC")));
            }
            Ok(())
        }
        Err(e) if clear_stale && e.offers_cart_reset() => {
            say(e.user_message());
            app.cart.clear()?;
            say("Cart cleared. Add the products again to order.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
