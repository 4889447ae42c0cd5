//! Order endpoints.

use tracing::{info, instrument};
use vitrine_core::OrderPayload;

use super::types::CreatedOrder;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is rejected or the request fails.
    #[instrument(skip(self, payload), fields(catalogue_id = %payload.catalogue_id, items = payload.items.len()))]
    pub async fn create_order(&self, payload: &OrderPayload) -> Result<CreatedOrder, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let order: CreatedOrder = self
            .execute(self.inner.client.post(url).json(payload))
            .await?;
        info!(order_id = %order.id, "Order created");
        Ok(order)
    }
}
