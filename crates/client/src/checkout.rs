//! Order submission.

use tracing::{instrument, warn};
use vitrine_core::{CartStore, CheckoutDetails, Storage, build_order_payload};

use crate::api::{ApiClient, CreatedOrder};
use crate::error::ClientError;

/// Turn the cart into an order and submit it.
///
/// The cart is checked before anything is sent and cleared once the server
/// accepts the order. A failure to persist the cleared cart is logged but
/// does not fail the checkout, since the order already exists.
///
/// # Errors
///
/// Returns `ClientError::Order` when the cart cannot be ordered (see
/// [`ClientError::offers_cart_reset`]), or the API error if submission fails.
/// The cart is left untouched on error.
#[instrument(skip_all, fields(lines = cart.lines().len()))]
pub async fn submit<S: Storage>(
    client: &ApiClient,
    cart: &mut CartStore<S>,
    details: &CheckoutDetails,
) -> Result<CreatedOrder, ClientError> {
    let payload = build_order_payload(cart.lines(), details)?;
    let order = client.create_order(&payload).await?;

    if let Err(e) = cart.clear() {
        warn!(order_id = %order.id, error = %e, "Order placed but the cart could not be cleared");
    }

    Ok(order)
}
