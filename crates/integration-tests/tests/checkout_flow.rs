//! Integration tests for filling the cart and submitting orders.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use tempfile::TempDir;
use vitrine_client::{
    ApiClient, ApiError, CatalogueView, ClientError, ErrorKind, FileStorage, Session, checkout,
};
use vitrine_core::{
    CartItemInput, CartStore, CatalogueId, CatalogueProductId, CheckoutDetails, CurrencyCode,
    OrderError, PaymentMethod, ProductId, Storage, UnitId, keys,
};
use vitrine_integration_tests::{MockBackend, PUBLIC_SLUG};

struct Harness {
    backend: MockBackend,
    client: ApiClient,
    storage: Arc<FileStorage>,
    _dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let backend = MockBackend::start().await.unwrap();
        let dir = TempDir::new().unwrap();
        let client = ApiClient::new(&backend.config(dir.path())).unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()));
        Self {
            backend,
            client,
            storage,
            _dir: dir,
        }
    }

    fn cart(&self) -> CartStore<Arc<FileStorage>> {
        CartStore::open(Arc::clone(&self.storage))
    }

    /// Add one of a listed product the way the storefront does.
    async fn add(&self, cart: &mut CartStore<Arc<FileStorage>>, id: &str, unit: Option<&str>) {
        let mut session = Session::load(Arc::clone(&self.storage));
        let view = CatalogueView::open(&self.client, &mut session, PUBLIC_SLUG)
            .await
            .unwrap();
        let item = view
            .find_product(&CatalogueProductId::new(id), 20)
            .await
            .unwrap();
        let unit = unit.map(UnitId::new);
        let input = CartItemInput::from_listing(view.catalogue(), &item, unit.as_ref()).unwrap();
        cart.add_or_increment(input).unwrap();
    }
}

fn details(payment_method: PaymentMethod) -> CheckoutDetails {
    CheckoutDetails {
        notes: Some("  Leave at the gate  ".to_string()),
        payment_method,
        currency: CurrencyCode::XAF,
    }
}

// =============================================================================
// Successful Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_submits_order_and_clears_cart() {
    let h = Harness::start().await;
    let mut cart = h.cart();
    h.add(&mut cart, "cp1", Some("carton")).await;
    h.add(&mut cart, "cp1", Some("carton")).await;
    h.add(&mut cart, "cp2", None).await;

    let summary = cart.summary(CurrencyCode::XAF).unwrap();
    assert_eq!(summary.item_count, 3);
    assert_eq!(summary.total.to_decimal_string(), "24500");

    let order = checkout::submit(&h.client, &mut cart, &details(PaymentMethod::MobileMoney))
        .await
        .unwrap();
    assert_eq!(order.id.as_str(), "order-1");
    assert_eq!(order.status.as_deref(), Some("pending"));
    assert_eq!(order.total_amount.as_deref(), Some("24500"));
    assert!(order.created_at.is_some());

    assert!(cart.is_empty());
    assert!(h.cart().is_empty());
}

#[tokio::test]
async fn test_order_body_shape() {
    let h = Harness::start().await;
    let mut cart = h.cart();
    h.add(&mut cart, "cp1", Some("carton")).await;
    h.add(&mut cart, "cp1", Some("carton")).await;
    h.add(&mut cart, "cp2", None).await;

    checkout::submit(&h.client, &mut cart, &details(PaymentMethod::MobileMoney))
        .await
        .unwrap();

    let orders = h.backend.orders();
    assert_eq!(orders.len(), 1);
    let body = &orders[0];
    assert_eq!(body["type"], "b2c");
    assert_eq!(body["catalogueId"], "c1");
    assert_eq!(body["fromBusinessId"], "b1");
    assert_eq!(body["notes"], "Leave at the gate");
    assert_eq!(body["paymentMethod"], "mobile_money");

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["catalogueProductId"], "cp1");
    assert_eq!(items[0]["unitId"], "carton");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["unitPrice"], "11000");
    assert_eq!(items[1]["catalogueProductId"], "cp2");
    assert!(items[1].get("unitId").is_none());
    assert_eq!(items[1]["unitPrice"], "2500");
}

#[tokio::test]
async fn test_unit_without_override_uses_unit_price() {
    let h = Harness::start().await;
    let mut cart = h.cart();
    h.add(&mut cart, "cp1", Some("crate")).await;
    h.add(&mut cart, "cp1", Some("bottle")).await;

    checkout::submit(&h.client, &mut cart, &CheckoutDetails::default())
        .await
        .unwrap();

    let body = &h.backend.orders()[0];
    assert_eq!(body["paymentMethod"], "cash_on_delivery");
    assert!(body.get("notes").is_none());
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["unitPrice"], "21000");
    assert_eq!(items[1]["unitPrice"], "1000");
}

// =============================================================================
// Refused Checkout
// =============================================================================

#[tokio::test]
async fn test_empty_cart_is_refused() {
    let h = Harness::start().await;
    let mut cart = h.cart();

    let err = checkout::submit(&h.client, &mut cart, &CheckoutDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Order(OrderError::EmptyCart)));
    assert!(!err.offers_cart_reset());
    assert!(h.backend.orders().is_empty());
}

#[tokio::test]
async fn test_stale_cart_never_reaches_server() {
    let h = Harness::start().await;
    h.storage
        .save(
            keys::CART,
            r#"[{"productId":"p1","name":"Palm oil 1L","unitPrice":"1000","quantity":3}]"#,
        )
        .unwrap();
    let mut cart = h.cart();
    assert_eq!(cart.lines().len(), 1);

    let err = checkout::submit(&h.client, &mut cart, &CheckoutDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Order(OrderError::StaleCart)));
    assert!(err.offers_cart_reset());
    assert!(h.backend.orders().is_empty());
    assert!(h.backend.request_ids().is_empty());
    assert_eq!(cart.lines().len(), 1);
}

#[tokio::test]
async fn test_mixed_catalogues_are_refused() {
    let h = Harness::start().await;
    let mut cart = h.cart();
    h.add(&mut cart, "cp2", None).await;
    cart.add_or_increment(CartItemInput {
        product_id: ProductId::new("p77"),
        catalogue_product_id: Some(CatalogueProductId::new("cp77")),
        catalogue_id: Some(CatalogueId::new("c9")),
        business_id: None,
        unit_id: None,
        unit_name: None,
        name: "Imported rice".to_string(),
        unit_price: "18000".to_string(),
    })
    .unwrap();

    let err = checkout::submit(&h.client, &mut cart, &CheckoutDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Order(OrderError::MixedCatalogues)));
    assert!(err.offers_cart_reset());
    assert!(h.backend.orders().is_empty());
}

#[tokio::test]
async fn test_server_rejection_keeps_cart() {
    let h = Harness::start().await;
    let mut cart = h.cart();
    h.add(&mut cart, "cp2", None).await;

    let err = checkout::submit(&h.client, &mut cart, &details(PaymentMethod::Card))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api(ApiError::Api { status: 422, ref message })
            if message == "card payments are not available for this business"
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!err.offers_cart_reset());

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(h.cart().lines().len(), 1);
}
