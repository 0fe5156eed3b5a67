//! Integration tests for the catalogue side of the dashboard API
//!
//! Products, orders and enquiries, plus the behaviour every list endpoint
//! shares: pagination, filtering and error bodies.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use common::{response_json, setup_test_app};

#[tokio::test]
async fn test_index_lists_resources() {
    let app = setup_test_app();

    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["products"], "/api/products");
    assert_eq!(body["endpoints"]["transactions"], "/api/transactions");
    assert_eq!(body["endpoints"]["geography"], "/api/geography");
}

#[tokio::test]
async fn test_product_lifecycle() {
    let app = setup_test_app();

    let (status, created) = app
        .post(
            "/api/products",
            json!({
                "name": "Desk Lamp",
                "description": "LED, dimmable",
                "price": 129.99,
                "category": "Lighting",
                "rating": 4.5,
                "stock_quantity": 12
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Desk Lamp");
    assert_eq!(created["supply"], 12);
    let id = created["_id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 24);

    let (status, fetched) = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["price"], 129.99);

    let (status, updated) = app
        .patch(
            &format!("/api/products/{id}"),
            json!({ "price": 99.5, "stock_quantity": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 99.5);
    assert_eq!(updated["supply"], 3);
    assert_eq!(updated["name"], "Desk Lamp");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_ne!(updated["updated_at"], created["updated_at"]);

    let (status, body) = app.delete(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");

    let (status, body) = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, _) = app.delete(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_validation() {
    let app = setup_test_app();

    let (status, body) = app
        .post("/api/products", json!({ "name": "Chair", "price": 40, "rating": 7 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "rating must be between 0 and 5");

    let (status, _) = app
        .post("/api/products", json!({ "name": " ", "price": 40 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = app
        .create("/api/products", json!({ "name": "Chair", "price": 40 }))
        .await;

    let (status, _) = app
        .put(&format!("/api/products/{id}"), json!({ "price": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // the rejected update left the product untouched
    let (_, product) = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(product["price"], 40.0);

    let (status, _) = app
        .put(&format!("/api/products/{id}"), json!({ "price": "free" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_cannot_change_id() {
    let app = setup_test_app();
    let id = app
        .create("/api/products", json!({ "name": "Mug", "price": 8 }))
        .await;

    let (status, body) = app
        .put(
            &format!("/api/products/{id}"),
            json!({ "_id": "something-else", "name": "Big Mug" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_id"], id.as_str());
    assert_eq!(body["name"], "Big Mug");
}

#[tokio::test]
async fn test_pagination() {
    let app = setup_test_app();
    for n in 0..25 {
        app.create(
            "/api/products",
            json!({ "name": format!("Product {n}"), "price": n }),
        )
        .await;
    }

    let (status, page) = app.get("/api/products?page=2&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 10);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["currentPage"], 2);
    // newest first: page 2 starts at the 11th most recent product
    assert_eq!(page["items"][0]["name"], "Product 14");

    let (_, last) = app.get("/api/products?page=3&limit=10").await;
    assert_eq!(last["items"].as_array().unwrap().len(), 5);
    assert_eq!(last["items"][4]["name"], "Product 0");

    let (_, beyond) = app.get("/api/products?page=9").await;
    assert!(beyond["items"].as_array().unwrap().is_empty());
    assert_eq!(beyond["totalPages"], 3);
    assert_eq!(beyond["currentPage"], 9);

    let (_, defaults) = app.get("/api/products").await;
    assert_eq!(defaults["items"].as_array().unwrap().len(), 10);
    assert_eq!(defaults["currentPage"], 1);
    assert_eq!(defaults["items"][0]["name"], "Product 24");
}

#[tokio::test]
async fn test_empty_collection_page() {
    let app = setup_test_app();

    let (status, page) = app.get("/api/orders").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page, json!({ "items": [], "totalPages": 0, "currentPage": 1 }));
}

#[tokio::test]
async fn test_invalid_pagination_params() {
    let app = setup_test_app();

    let (status, body) = app.get("/api/products?page=first").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_huge_page_number() {
    let app = setup_test_app();
    app.create("/api/products", json!({ "name": "Lamp", "price": 10 }))
        .await;

    let (status, page) = app
        .get(&format!("/api/products?page={}&limit=100", usize::MAX))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(page["items"].as_array().unwrap().is_empty());
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["currentPage"], usize::MAX as u64);
}

#[tokio::test]
async fn test_product_filters() {
    let app = setup_test_app();
    app.create(
        "/api/products",
        json!({ "name": "Desk Lamp", "price": 30, "category": "Lighting" }),
    )
    .await;
    app.create(
        "/api/products",
        json!({ "name": "Floor Lamp", "price": 80, "category": "Lighting" }),
    )
    .await;
    app.create(
        "/api/products",
        json!({ "name": "Desk", "price": 200, "category": "Furniture" }),
    )
    .await;

    let (_, lighting) = app.get("/api/products?category=Lighting").await;
    assert_eq!(lighting["items"].as_array().unwrap().len(), 2);
    assert_eq!(lighting["totalPages"], 1);

    let (_, desks) = app.get("/api/products?search=desk&limit=1").await;
    assert_eq!(desks["items"].as_array().unwrap().len(), 1);
    assert_eq!(desks["totalPages"], 2);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/products")
                .header("content-type", "application/json")
                .body(Body::from("{\"name\": \"Lamp\", "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response.into_body()).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_missing_required_field() {
    let app = setup_test_app();

    let (status, body) = app.post("/api/products", json!({ "price": 10 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_order_total_and_customer() {
    let app = setup_test_app();
    let user_id = app
        .create(
            "/api/users",
            json!({ "name": "Ada", "email": "ada@example.com", "password": "secret" }),
        )
        .await;

    let (status, order) = app
        .post(
            "/api/orders",
            json!({
                "user_id": user_id,
                "items": [
                    { "product_id": "p1", "quantity": 2, "price": 10.5 },
                    { "product_id": "p2", "quantity": 1, "price": 4.0 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total_amount"], 25.0);
    assert_eq!(order["status"], "pending");
    let id = order["_id"].as_str().unwrap().to_string();

    let (_, fetched) = app.get(&format!("/api/orders/{id}")).await;
    assert_eq!(fetched["user"]["name"], "Ada");
    assert_eq!(fetched["user"]["email"], "ada@example.com");
    assert!(fetched["user"].get("password").is_none());

    let (_, listed) = app.get("/api/orders").await;
    assert_eq!(listed["items"][0]["user"]["_id"], user_id.as_str());

    let (status, updated) = app
        .patch(
            &format!("/api/orders/{id}"),
            json!({
                "status": "shipped",
                "items": [{ "product_id": "p1", "quantity": 3, "price": 10.0 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "shipped");
    assert_eq!(updated["total_amount"], 30.0);

    let (_, shipped) = app.get("/api/orders?status=shipped").await;
    assert_eq!(shipped["items"].as_array().unwrap().len(), 1);
    let (_, pending) = app.get("/api/orders?status=pending").await;
    assert!(pending["items"].as_array().unwrap().is_empty());

    let (status, _) = app.delete(&format!("/api/orders/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/orders/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_with_unknown_customer() {
    let app = setup_test_app();
    let id = app
        .create(
            "/api/orders",
            json!({
                "user_id": "000000000000000000000000",
                "items": [{ "product_id": "p1", "quantity": 1, "price": 5 }],
                "total_amount": 4.5
            }),
        )
        .await;

    let (status, order) = app.get(&format!("/api/orders/{id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["total_amount"], 4.5);
    assert!(order["user"].is_null());
}

#[tokio::test]
async fn test_order_without_items() {
    let app = setup_test_app();

    let (status, body) = app
        .post("/api/orders", json!({ "user_id": "u1", "items": [] }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "an order needs at least one item");
}

#[tokio::test]
async fn test_transaction_lifecycle() {
    let app = setup_test_app();
    let user_id = app
        .create(
            "/api/users",
            json!({ "name": "Grace", "email": "grace@example.com", "password": "secret" }),
        )
        .await;

    let (status, transaction) = app
        .post(
            "/api/transactions",
            json!({ "userId": user_id, "cost": "129.99", "products": ["p1", "p2"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transaction["userId"], user_id.as_str());
    assert_eq!(transaction["products"].as_array().unwrap().len(), 2);
    let id = transaction["_id"].as_str().unwrap().to_string();
    app.create(
        "/api/transactions",
        json!({ "user_id": "someone-else", "cost": "5" }),
    )
    .await;

    let (_, fetched) = app.get(&format!("/api/transactions/{id}")).await;
    assert_eq!(fetched["cost"], "129.99");
    assert_eq!(fetched["user"]["name"], "Grace");

    let (_, by_cost) = app.get("/api/transactions?search=129").await;
    assert_eq!(by_cost["items"].as_array().unwrap().len(), 1);
    let (_, by_user) = app.get("/api/transactions?search=SOMEONE").await;
    assert_eq!(by_user["items"].as_array().unwrap().len(), 1);
    assert!(by_user["items"][0]["user"].is_null());

    let (status, updated) = app
        .put(
            &format!("/api/transactions/{id}"),
            json!({ "cost": "99.50", "_id": "hijacked" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["cost"], "99.50");
    assert_eq!(updated["_id"], id.as_str());
    assert_eq!(updated["products"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .patch(&format!("/api/transactions/{id}"), json!({ "cost": "free" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "cost must be a non-negative number");

    let (status, body) = app.delete(&format!("/api/transactions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transaction deleted successfully");
    let (status, _) = app.get(&format!("/api/transactions/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/transactions/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/api/transactions", json!({ "userId": "", "cost": "1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enquiry_lifecycle() {
    let app = setup_test_app();

    let (status, body) = app
        .post("/api/enquiries", json!({ "message": "Where is my parcel?" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "either user_id or email is required");

    let (status, enquiry) = app
        .post(
            "/api/enquiries",
            json!({
                "name": "Grace",
                "email": "grace@example.com",
                "subject": "Delivery",
                "message": "Where is my parcel?"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(enquiry["status"], "open");
    assert_eq!(enquiry["is_deleted"], false);
    let id = enquiry["_id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .put(&format!("/api/enquiries/{id}"), json!({ "status": "in progress" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in progress");

    let (_, in_progress) = app.get("/api/enquiries?status=in%20progress").await;
    assert_eq!(in_progress["items"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .put(&format!("/api/enquiries/{id}"), json!({ "status": "escalated" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_soft_deleted_enquiry_is_invisible() {
    let app = setup_test_app();
    let kept = app
        .create(
            "/api/enquiries",
            json!({ "user_id": "u1", "message": "First" }),
        )
        .await;
    let removed = app
        .create(
            "/api/enquiries",
            json!({ "user_id": "u1", "message": "Second" }),
        )
        .await;

    let (status, body) = app.delete(&format!("/api/enquiries/{removed}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Enquiry deleted successfully");

    let (status, _) = app.get(&format!("/api/enquiries/{removed}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .put(&format!("/api/enquiries/{removed}"), json!({ "status": "closed" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/enquiries/{removed}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = app.get("/api/enquiries").await;
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["_id"], kept.as_str());
    assert_eq!(page["totalPages"], 1);
}
