//! Session wishlist through the HTTP surface.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use harbor_integration_tests::{TestApp, cookies, get, post_form, post_json};
use serde_json::{Value, json};

const SESSION_COOKIE: &str = "harbor_session";
const CURRENCY: &str = "harbor_currency=USD";

/// Add one item and return the `Cookie` header for the new session.
async fn start_session(app: &TestApp, form: &str) -> String {
    let resp = app
        .send(post_form("/wishlist/add", form, Some(CURRENCY)))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("HX-Trigger"), Some("wishlist-updated"));

    let session = resp.cookie_pair(SESSION_COOKIE).unwrap();
    cookies(&[&session, CURRENCY])
}

async fn export(app: &TestApp, cookie: &str) -> Value {
    let resp = app.send(get("/api/wishlist", Some(cookie), None)).await;
    assert_eq!(resp.status, StatusCode::OK);
    resp.json()
}

#[tokio::test]
async fn test_adding_same_key_twice_keeps_one_item_with_latest_price() {
    let app = TestApp::new();
    let cookie = start_session(
        &app,
        "product_id=P1&variant_id=V1&title=Mug&handle=mug&price=10.00",
    )
    .await;

    let resp = app
        .send(post_form(
            "/wishlist/add",
            "product_id=P1&variant_id=V1&title=Mug&handle=mug&price=12.50",
            Some(&cookie),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Saved"));

    let envelope = export(&app, &cookie).await;
    assert_eq!(envelope["version"], 2);

    let wishlist = &envelope["payload"]["wishlists"][0];
    assert_eq!(wishlist["name"], "My Wishlist");
    assert_eq!(wishlist["item_count"], 1);
    assert_eq!(wishlist["items"].as_array().unwrap().len(), 1);

    let item = &wishlist["items"][0];
    assert_eq!(item["price"]["amount"], "12.50");
    assert_eq!(item["price"]["currency_code"], "USD");
    assert_eq!(item["price_at_add"]["amount"], "10.00");
}

#[tokio::test]
async fn test_blank_variant_is_product_level_key() {
    let app = TestApp::new();
    let cookie = start_session(&app, "product_id=P1&variant_id=&title=Mug").await;

    let resp = app
        .send(get("/wishlist/status?product_id=P1", Some(&cookie), None))
        .await;
    assert!(resp.body.contains("Saved"));

    let resp = app
        .send(get(
            "/wishlist/status?product_id=P1&variant_id=V9",
            Some(&cookie),
            None,
        ))
        .await;
    assert!(resp.body.contains("Save to wishlist"));
}

#[tokio::test]
async fn test_remove_unknown_item_is_noop_then_remove_known() {
    let app = TestApp::new();
    let cookie = start_session(&app, "product_id=P1&title=Mug").await;

    let envelope = export(&app, &cookie).await;
    let wishlist_id = envelope["payload"]["wishlists"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let item_id = envelope["payload"]["wishlists"][0]["items"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .send(post_form(
            "/wishlist/remove",
            &format!("wishlist_id={wishlist_id}&item_id=local-missing"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        export(&app, &cookie).await["payload"]["wishlists"][0]["item_count"],
        1
    );

    let resp = app
        .send(post_form(
            "/wishlist/remove",
            &format!("wishlist_id={wishlist_id}&item_id={item_id}"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("My Wishlist"));

    let envelope = export(&app, &cookie).await;
    assert_eq!(envelope["payload"]["wishlists"][0]["item_count"], 0);
    assert!(
        envelope["payload"]["wishlists"][0]["items"]
            .as_array()
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_create_rename_and_delete_wishlists() {
    let app = TestApp::new();
    let cookie = start_session(&app, "product_id=P1&title=Mug").await;

    let resp = app
        .send(post_form("/wishlist/create", "name=Gifts", Some(&cookie)))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Gifts"));

    let envelope = export(&app, &cookie).await;
    let gifts_id = envelope["payload"]["wishlists"][1]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .send(post_form(
            "/wishlist/rename",
            &format!("wishlist_id={gifts_id}&name=Birthday"),
            Some(&cookie),
        ))
        .await;
    assert!(resp.body.contains("Birthday"));

    let resp = app
        .send(post_form(
            "/wishlist/delete",
            &format!("wishlist_id={gifts_id}"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        export(&app, &cookie).await["payload"]["wishlists"]
            .as_array()
            .unwrap()
            .len(),
        1
    );

    let resp = app
        .send(post_form(
            "/wishlist/delete",
            &format!("wishlist_id={gifts_id}"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_without_product_is_rejected() {
    let app = TestApp::new();
    let resp = app
        .send(post_form("/wishlist/add", "product_id=&title=Mug", Some(CURRENCY)))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_upgrades_v1_and_merges() {
    let app = TestApp::new();
    let cookie = start_session(&app, "product_id=P1&variant_id=V1&title=Mug").await;

    let v1 = json!({
        "version": 1,
        "payload": {
            "items": [
                {
                    "productId": "P2",
                    "variantId": null,
                    "title": "Kettle",
                    "handle": "kettle",
                    "imageUrl": null,
                    "price": "49.20",
                    "currencyCode": "PLN",
                    "addedAt": "2025-01-01T00:00:00Z"
                }
            ]
        }
    });

    let resp = app
        .send(post_json("/api/wishlist/import", &v1, None, Some(&cookie)))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let body = resp.json();
    assert_eq!(body["version"], 2);
    let items: usize = body["payload"]["wishlists"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["items"].as_array().unwrap().len())
        .sum();
    assert_eq!(items, 2);

    let resp = app
        .send(get("/wishlist/status?product_id=P2", Some(&cookie), None))
        .await;
    assert!(resp.body.contains("Saved"));
}

#[tokio::test]
async fn test_import_with_colliding_item_id_keeps_ids_unique() {
    let app = TestApp::new();
    let cookie = start_session(&app, "product_id=P1&title=Mug").await;

    let mut envelope = export(&app, &cookie).await;
    let wishlist_id = envelope["payload"]["wishlists"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let original_id = envelope["payload"]["wishlists"][0]["items"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    envelope["payload"]["wishlists"][0]["items"][0]["product_id"] = json!("P2");

    let resp = app
        .send(post_json("/api/wishlist/import", &envelope, None, Some(&cookie)))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let merged = export(&app, &cookie).await;
    let items = merged["payload"]["wishlists"][0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_ne!(items[0]["id"], items[1]["id"]);
    assert_eq!(merged["payload"]["wishlists"][0]["item_count"], 2);

    let resp = app
        .send(post_form(
            "/wishlist/remove",
            &format!("wishlist_id={wishlist_id}&item_id={original_id}"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let after = export(&app, &cookie).await;
    let items = after["payload"]["wishlists"][0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"], "P2");
    assert_eq!(after["payload"]["wishlists"][0]["item_count"], 1);
}

#[tokio::test]
async fn test_rename_to_blank_name_is_bad_request() {
    let app = TestApp::new();
    let cookie = start_session(&app, "product_id=P1&title=Mug").await;

    let envelope = export(&app, &cookie).await;
    let wishlist_id = envelope["payload"]["wishlists"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .send(post_form(
            "/wishlist/rename",
            &format!("wishlist_id={wishlist_id}&name=+"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        export(&app, &cookie).await["payload"]["wishlists"][0]["name"],
        "My Wishlist"
    );
}

#[tokio::test]
async fn test_import_rejects_unknown_version() {
    let app = TestApp::new();
    let resp = app
        .send(post_json(
            "/api/wishlist/import",
            &json!({"version": 99, "payload": {}}),
            None,
            None,
        ))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wishlist_page_renders_currency_menu() {
    let app = TestApp::new();
    let resp = app
        .send(get("/wishlist", Some("harbor_currency=PLN"), None))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Nothing saved yet"));
    assert!(resp.body.contains(r#"<option value="PLN" selected>"#));
}
