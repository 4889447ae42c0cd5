use std::sync::Arc;

use proptest::prelude::*;
use vitrine_core::{
    BusinessId, CartItemInput, CartStore, CatalogueId, CatalogueProductId, MemoryStorage,
    ProductId, UnitId,
};

#[derive(Debug, Clone)]
enum Action {
    Add { product: u8, unit: Option<u8> },
    Decrement { product: u8, unit: Option<u8> },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    let key = (0_u8..4, proptest::option::of(0_u8..3));
    prop_oneof![
        key.clone()
            .prop_map(|(product, unit)| Action::Add { product, unit }),
        key.prop_map(|(product, unit)| Action::Decrement { product, unit }),
    ]
}

fn input(product: u8, unit: Option<u8>) -> CartItemInput {
    CartItemInput {
        product_id: ProductId::new(format!("p{product}")),
        catalogue_product_id: Some(CatalogueProductId::new(format!("cp{product}"))),
        catalogue_id: Some(CatalogueId::new("c1")),
        business_id: Some(BusinessId::new("b1")),
        unit_id: unit.map(|u| UnitId::new(format!("u{u}"))),
        unit_name: None,
        name: format!("Product {product}"),
        unit_price: "500".to_string(),
    }
}

proptest! {
    #[test]
    fn cart_never_holds_non_positive_quantities(actions in proptest::collection::vec(action_strategy(), 0..64)) {
        let mut cart = CartStore::open(MemoryStorage::new());

        for action in actions {
            match action {
                Action::Add { product, unit } => {
                    cart.add_or_increment(input(product, unit)).unwrap();
                }
                Action::Decrement { product, unit } => {
                    let unit_id = unit.map(|u| UnitId::new(format!("u{u}")));
                    cart.decrement(&ProductId::new(format!("p{product}")), unit_id.as_ref()).unwrap();
                }
            }
            prop_assert!(cart.lines().iter().all(|line| line.quantity >= 1));
        }
    }

    #[test]
    fn cart_lines_are_unique_per_product_and_unit(actions in proptest::collection::vec(action_strategy(), 0..64)) {
        let mut cart = CartStore::open(MemoryStorage::new());

        for action in actions {
            if let Action::Add { product, unit } = action {
                cart.add_or_increment(input(product, unit)).unwrap();
            }
        }

        let mut keys: Vec<_> = cart
            .lines()
            .iter()
            .map(|line| (line.product_id.clone(), line.unit_id.clone()))
            .collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), before);
    }

    #[test]
    fn cart_survives_reopen(actions in proptest::collection::vec(action_strategy(), 0..32)) {
        let storage = Arc::new(MemoryStorage::new());
        let mut cart = CartStore::open(storage.clone());

        for action in actions {
            match action {
                Action::Add { product, unit } => {
                    cart.add_or_increment(input(product, unit)).unwrap();
                }
                Action::Decrement { product, unit } => {
                    let unit_id = unit.map(|u| UnitId::new(format!("u{u}")));
                    cart.decrement(&ProductId::new(format!("p{product}")), unit_id.as_ref()).unwrap();
                }
            }
        }

        let reopened = CartStore::open(storage);
        prop_assert_eq!(reopened.lines(), cart.lines());
    }
}
