//! Product catalog tests driven through the full router.

mod common;

use axum::http::{Method, StatusCode, header};
use serde_json::json;

use common::{TestApp, app, product_json};

async fn create(app: &TestApp, token: &str, body: serde_json::Value) -> common::TestResponse {
    app.call(Method::POST, "/api/v1/products", Some(token), Some(body))
        .await
}

#[tokio::test]
async fn product_routes_require_auth() {
    let app = app();
    let res = app.call(Method::GET, "/api/v1/products", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["code"], "NO_AUTH_HEADER");
}

#[tokio::test]
async fn create_single_product_sanitizes_description() {
    let app = app();
    let (user, token) = app.signed_in("alice").await;

    let mut body = product_json("stoneware-mug");
    body["description"] =
        json!("<p onclick=\"steal()\">Great <strong>mug</strong></p><script>alert(1)</script>");
    body["createdBy"] = json!("someone-else");
    let res = create(&app, &token, body).await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["message"], "1 product(s) created successfully");
    let data = &res.body["data"];
    assert!(data.is_object());
    assert_eq!(data["slug"], "stoneware-mug");
    assert_eq!(data["price"], 24.5);
    assert_eq!(data["isActive"], true);
    assert_eq!(data["discountedPrice"], serde_json::Value::Null);
    assert_eq!(data["description"], "<p>Great <strong>mug</strong></p>");
    assert_eq!(data["createdBy"]["_id"], user.id.to_string());
    assert_eq!(data["createdBy"]["username"], "alice");
    assert_eq!(data["galleryImages"][0]["url"], "https://cdn.example.com/mug.jpg");
}

#[tokio::test]
async fn create_bulk_products() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;

    let res = create(
        &app,
        &token,
        json!([product_json("mug-one"), product_json("mug-two")]),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["message"], "2 product(s) created successfully");
    assert_eq!(res.body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(app.db.product_count().await, 2);
}

#[tokio::test]
async fn bulk_rejects_repeated_slugs_and_empty_arrays() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;

    let res = create(
        &app,
        &token,
        json!([product_json("same-slug"), product_json("same-slug")]),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Duplicate slugs found in request");

    let res = create(&app, &token, json!([])).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.db.product_count().await, 0);
}

#[tokio::test]
async fn bulk_validation_reports_index() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;

    let mut bad = product_json("second-mug");
    bad["price"] = json!(-5);
    let res = create(&app, &token, json!([product_json("first-mug"), bad])).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Price cannot be negative");
    assert_eq!(res.body["field"], "price");
    assert_eq!(res.body["index"], 1);
    assert_eq!(app.db.product_count().await, 0);
}

#[tokio::test]
async fn existing_slugs_are_listed() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;
    assert_eq!(
        create(&app, &token, product_json("taken-slug")).await.status,
        StatusCode::CREATED
    );

    let res = create(
        &app,
        &token,
        json!([product_json("fresh-slug"), product_json("taken-slug")]),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body["message"],
        "Product(s) with slug(s) already exist: taken-slug"
    );
    assert_eq!(app.db.product_count().await, 1);
}

#[tokio::test]
async fn create_reports_first_invalid_field() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;

    let mut body = product_json("mug");
    body["discountedPrice"] = json!(30);
    let res = create(&app, &token, body).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["field"], "discountedPrice");
    assert_eq!(
        res.body["message"],
        "Discounted price must be less than regular price"
    );

    let res = create(&app, &token, json!({ "slug": "Not Valid" })).await;
    assert_eq!(res.body["field"], "metaTitle");
    assert_eq!(res.body["message"], "Meta title is required");
}

#[tokio::test]
async fn wrong_field_types_report_the_field() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;

    let mut body = product_json("typed-mug");
    body["metaTitle"] = json!(12345);
    let res = create(&app, &token, body).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body,
        json!({
            "status": "fail",
            "message": "\"metaTitle\" must be a string",
            "field": "metaTitle"
        })
    );

    let mut body = product_json("typed-mug");
    body["isActive"] = json!("yes");
    let res = create(&app, &token, json!([product_json("fine-mug"), body])).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["field"], "isActive");
    assert_eq!(res.body["index"], 1);

    let created = create(&app, &token, product_json("patched-mug")).await;
    let uri = format!(
        "/api/v1/products/{}",
        created.body["data"]["_id"].as_str().unwrap()
    );
    let res = app
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "metaTitle": 12345 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["field"], "metaTitle");
    assert_eq!(res.body["message"], "\"metaTitle\" must be a string");
}

#[tokio::test]
async fn create_rejects_null_discount() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;

    let mut body = product_json("null-discount-mug");
    body["discountedPrice"] = json!(null);
    let res = create(&app, &token, body).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["field"], "discountedPrice");
    assert_eq!(
        res.body["message"],
        "Discounted price must be a valid number"
    );
    assert_eq!(app.db.product_count().await, 0);
}

#[tokio::test]
async fn slug_claimed_during_insert_is_a_client_error() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;
    assert_eq!(
        create(&app, &token, product_json("contested-mug")).await.status,
        StatusCode::CREATED
    );
    app.db.serve_stale_slug_checks();

    let res = create(
        &app,
        &token,
        json!([product_json("another-mug"), product_json("contested-mug")]),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body,
        json!({
            "status": "fail",
            "message": "A product with this slug already exists."
        })
    );
    assert_eq!(app.db.product_count().await, 1);
}

#[tokio::test]
async fn list_is_newest_first_and_uncached() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;
    create(&app, &token, product_json("older-mug")).await;
    create(&app, &token, product_json("newer-mug")).await;

    let res = app
        .call(Method::GET, "/api/v1/products", Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["results"], 2);
    assert_eq!(res.body["data"][0]["slug"], "newer-mug");
    assert_eq!(
        res.headers[header::CACHE_CONTROL],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(res.headers[header::PRAGMA], "no-cache");
    assert_eq!(res.headers[header::EXPIRES], "0");
}

#[tokio::test]
async fn get_by_id() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;
    let created = create(&app, &token, product_json("lookup-mug")).await;
    let id = created.body["data"]["_id"].as_str().unwrap().to_string();

    let res = app
        .call(Method::GET, &format!("/api/v1/products/{id}"), Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["slug"], "lookup-mug");

    let missing = app
        .call(
            Method::GET,
            &format!("/api/v1/products/{}", uuid::Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Product not found");

    let malformed = app
        .call(Method::GET, "/api/v1/products/not-an-id", Some(&token), None)
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["message"], "Invalid product ID format");
}

#[tokio::test]
async fn update_is_owner_only() {
    let app = app();
    let (_, owner) = app.signed_in("alice").await;
    let (_, stranger) = app.signed_in("mallory").await;
    let created = create(&app, &owner, product_json("owned-mug")).await;
    let uri = format!(
        "/api/v1/products/{}",
        created.body["data"]["_id"].as_str().unwrap()
    );

    let denied = app
        .call(
            Method::PATCH,
            &uri,
            Some(&stranger),
            Some(json!({ "price": 1 })),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(
        denied.body["message"],
        "You don't have permission to update this product"
    );

    let ok = app
        .call(
            Method::PATCH,
            &uri,
            Some(&owner),
            Some(json!({ "productName": "  Renamed Mug  ", "discountedPrice": 20 })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["message"], "Product updated successfully");
    assert_eq!(ok.body["data"]["productName"], "Renamed Mug");
    assert_eq!(ok.body["data"]["discountedPrice"], 20.0);
    assert_eq!(ok.body["data"]["price"], 24.5);
}

#[tokio::test]
async fn update_checks_effective_pricing_and_slugs() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;
    create(&app, &token, product_json("other-mug")).await;
    let mut body = product_json("discount-mug");
    body["discountedPrice"] = json!(20);
    let created = create(&app, &token, body).await;
    let uri = format!(
        "/api/v1/products/{}",
        created.body["data"]["_id"].as_str().unwrap()
    );

    // New price would fall below the stored discount.
    let res = app
        .call(Method::PATCH, &uri, Some(&token), Some(json!({ "price": 15 })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body["message"],
        "Discounted price must be less than regular price"
    );

    let res = app
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "price": 15, "discountedPrice": null })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["discountedPrice"], serde_json::Value::Null);

    let res = app
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "slug": "other-mug" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "A product with this slug already exists");

    let res = app
        .call(Method::PATCH, &uri, Some(&token), Some(json!({})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body["message"],
        "At least one field must be provided for update"
    );
}

#[tokio::test]
async fn update_rejects_invalid_description() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;
    let created = create(&app, &token, product_json("desc-mug")).await;
    let uri = format!(
        "/api/v1/products/{}",
        created.body["data"]["_id"].as_str().unwrap()
    );

    let res = app
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "description": "tiny" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["field"], "description");

    let stored = app.db.stored_product("desc-mug").await.unwrap();
    assert_eq!(stored.description, "<p>A sturdy mug glazed by hand.</p>");
}

#[tokio::test]
async fn delete_is_owner_only() {
    let app = app();
    let (_, owner) = app.signed_in("alice").await;
    let (_, stranger) = app.signed_in("mallory").await;
    let created = create(&app, &owner, product_json("doomed-mug")).await;
    let uri = format!(
        "/api/v1/products/{}",
        created.body["data"]["_id"].as_str().unwrap()
    );

    let denied = app
        .call(Method::DELETE, &uri, Some(&stranger), None)
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(
        denied.body["message"],
        "You don't have permission to delete this product"
    );

    let ok = app.call(Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["message"], "Product deleted successfully");
    assert_eq!(ok.body["data"], serde_json::Value::Null);

    let again = app.call(Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(app.db.product_count().await, 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = app();
    let (_, token) = app.signed_in("alice").await;
    let mut body = product_json("huge-mug");
    body["description"] = json!("x".repeat(20 * 1024));

    let res = create(&app, &token, body).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.body["status"], "fail");
}
