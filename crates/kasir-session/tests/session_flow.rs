//! End-to-end cashier flow through the session commands.

use chrono::{Duration, Utc};
use serde_json::json;

use kasir_core::RequestedAddon;
use kasir_session::commands::cart::{
    add_to_cart, get_addon_options, set_customer, set_discount, set_payment_method,
    AddToCartRequest,
};
use kasir_session::commands::draft::{restore_draft, save_draft, DraftRestore};
use kasir_session::commands::order::prepare_order;
use kasir_session::error::ErrorCode;
use kasir_session::state::{CatalogSnapshot, SessionConfig};
use kasir_session::Session;

fn catalog() -> CatalogSnapshot {
    serde_json::from_value(json!({
        "menu": [
            { "id": "latte", "name": "Iced Latte", "price": 25000 },
            { "id": "croissant", "name": "Croissant", "price": 18000 }
        ],
        "addons": {
            "latte": [
                { "id": "sugar", "name": "Sugar level", "price": 0, "isRequired": true, "minQuantity": 1, "maxQuantity": 1 },
                { "id": "shot", "name": "Extra shot", "price": 5000, "maxQuantity": 2 },
                { "id": "oat", "name": "Oat milk", "price": 7000 }
            ]
        },
        "ingredients": [
            { "id": "beans", "netQuantity": 1000, "unitBuyPrice": 150000 }
        ]
    }))
    .unwrap()
}

fn latte(addons: &[(&str, u32)]) -> AddToCartRequest {
    AddToCartRequest {
        item_id: "latte".into(),
        addons: addons
            .iter()
            .map(|(id, qty)| RequestedAddon::new(*id, *qty))
            .collect(),
        ..Default::default()
    }
}

#[test]
fn cashier_builds_and_submits_an_order() {
    let session = Session::new(SessionConfig::default(), catalog()).unwrap();

    let options = get_addon_options(&session.catalog, "latte").unwrap();
    assert!(!options.skip.is_allowed());
    assert_eq!(options.defaults, vec![RequestedAddon::new("sugar", 1)]);

    let err = add_to_cart(
        &session.catalog,
        &session.cart,
        &session.config,
        latte(&[("shot", 3), ("boba", 1)]),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::AddonConstraint);
    assert_eq!(err.details.len(), 3);

    // order of choices does not matter
    add_to_cart(
        &session.catalog,
        &session.cart,
        &session.config,
        latte(&[("sugar", 1), ("shot", 2), ("oat", 1)]),
    )
    .unwrap();
    let cart = add_to_cart(
        &session.catalog,
        &session.cart,
        &session.config,
        latte(&[("oat", 1), ("shot", 2), ("sugar", 1)]),
    )
    .unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, 2);
    assert_eq!(cart.lines[0].unit_price.rupiah(), 42_000);

    add_to_cart(
        &session.catalog,
        &session.cart,
        &session.config,
        AddToCartRequest {
            item_id: "croissant".into(),
            ..Default::default()
        },
    )
    .unwrap();

    set_discount(&session.cart, &session.config, 2_000, 10.0).unwrap();
    set_customer(&session.cart, &session.config, "Budi", "0812", true).unwrap();
    set_payment_method(&session.cart, &session.config, "transfer").unwrap();

    let payload = prepare_order(&session.catalog, &session.cart, &session.config).unwrap();
    // 84000 + 18000 = 102000; 10% = 10200 + 2000
    assert_eq!(payload.subtotal.rupiah(), 102_000);
    assert_eq!(payload.discount.rupiah(), 12_200);
    assert_eq!(payload.total.rupiah(), 89_800);

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["paymentMethod"], "transfer");
    assert_eq!(json["customerName"], "Budi");
    assert_eq!(json["items"][0]["addons"].as_array().unwrap().len(), 3);
}

#[test]
fn draft_survives_a_restart() {
    let config = SessionConfig::default();
    let first = Session::new(config.clone(), catalog()).unwrap();
    add_to_cart(
        &first.catalog,
        &first.cart,
        &first.config,
        latte(&[("sugar", 1), ("shot", 1)]),
    )
    .unwrap();
    set_discount(&first.cart, &first.config, 0, 5.0).unwrap();

    let saved_at = Utc::now();
    let stored = serde_json::to_string(&save_draft(&first.cart, saved_at)).unwrap();

    let second = Session::new(config, catalog()).unwrap();
    let raw = serde_json::from_str(&stored).unwrap();
    match restore_draft(&second.cart, &second.config, &raw, saved_at + Duration::minutes(30))
        .unwrap()
    {
        DraftRestore::Restored { cart, dropped_lines } => {
            assert_eq!(dropped_lines, 0);
            assert_eq!(cart.lines[0].identity_key.as_str(), "latte|shot=1,sugar=1");
            assert_eq!(cart.discount_pct, 5.0);
        }
        other => panic!("expected restored draft, got {:?}", other),
    }

    let first_payload = prepare_order(&first.catalog, &first.cart, &first.config).unwrap();
    let second_payload = prepare_order(&second.catalog, &second.cart, &second.config).unwrap();
    assert_eq!(first_payload.total, second_payload.total);
    assert_ne!(first_payload.client_ref, second_payload.client_ref);
}
