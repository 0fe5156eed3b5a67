//! Integration tests for the activity tracking endpoints
//!
//! Visitors, sessions, page-view statistics and notifications.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use common::setup_test_app;

#[tokio::test]
async fn test_repeat_visit_updates_single_visitor() {
    let app = setup_test_app();
    let visit = json!({
        "ip_address": "203.0.113.7",
        "location": { "country": "US", "city": "Austin" }
    });

    let (status, first) = app.post("/api/visitors", visit.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["visit_count"], 1);

    let (status, second) = app.post("/api/visitors", visit).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["visit_count"], 2);
    assert_eq!(second["_id"], first["_id"]);
    assert_eq!(second["location"]["city"], "Austin");
    assert_ne!(second["last_visited_at"], first["last_visited_at"]);

    let (_, page) = app.get("/api/visitors").await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (status, by_ip) = app.get("/api/visitors/ip/203.0.113.7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_ip["visit_count"], 2);

    let (status, body) = app.get("/api/visitors/ip/198.51.100.1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Visitor not found");
}

#[tokio::test]
async fn test_ip_lookup_ignores_surrounding_spaces() {
    let app = setup_test_app();

    let (status, _) = app
        .post("/api/visitors", json!({ "ip_address": " 198.51.100.4 " }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, plain) = app.get("/api/visitors/ip/198.51.100.4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plain["ip_address"], "198.51.100.4");

    let (status, padded) = app.get("/api/visitors/ip/%20198.51.100.4%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(padded["_id"], plain["_id"]);
}

#[tokio::test]
async fn test_visit_requires_ip() {
    let app = setup_test_app();

    let (status, body) = app.post("/api/visitors", json!({ "ip_address": "  " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ip_address is required");
}

#[tokio::test]
async fn test_visitor_statistics() {
    let app = setup_test_app();
    let us = json!({ "country": "US" });
    app.post("/api/visitors", json!({ "ip_address": "10.0.0.1", "location": us }))
        .await;
    app.post("/api/visitors", json!({ "ip_address": "10.0.0.1" }))
        .await;
    app.post("/api/visitors", json!({ "ip_address": "10.0.0.2", "location": us }))
        .await;
    app.post(
        "/api/visitors",
        json!({ "ip_address": "10.0.0.3", "location": { "country": "GB" } }),
    )
    .await;

    let (status, stats) = app.get("/api/visitors/statistics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUniqueVisitors"], 3);
    assert_eq!(stats["totalVisits"], 4);
    assert_eq!(
        stats["visitorsByCountry"],
        json!([
            { "_id": "US", "count": 2, "totalVisits": 3 },
            { "_id": "GB", "count": 1, "totalVisits": 1 }
        ])
    );
}

#[tokio::test]
async fn test_deleted_visitor_starts_over() {
    let app = setup_test_app();
    let (_, visitor) = app
        .post("/api/visitors", json!({ "ip_address": "10.1.1.1" }))
        .await;
    let id = visitor["_id"].as_str().unwrap();

    let (status, _) = app.delete(&format!("/api/visitors/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/visitors/ip/10.1.1.1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, fresh) = app
        .post("/api/visitors", json!({ "ip_address": "10.1.1.1" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fresh["visit_count"], 1);
    assert_ne!(fresh["_id"], visitor["_id"]);
}

#[tokio::test]
async fn test_concurrent_visits_share_one_visitor() {
    let app = setup_test_app();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let router = app.router.clone();
        tasks.push(tokio::spawn(async move {
            router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/visitors")
                        .header("content-type", "application/json")
                        .body(Body::from(r#"{"ip_address": "192.0.2.9"}"#))
                        .unwrap(),
                )
                .await
                .unwrap()
                .status()
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_success());
    }

    let (_, page) = app.get("/api/visitors").await;
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["visit_count"], 8);
}

#[tokio::test]
async fn test_active_user_statistics() {
    let app = setup_test_app();

    let (status, empty) = app.get("/api/active-users/statistics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["totalActive"], 0);
    assert_eq!(empty["averageSessionDuration"].as_f64(), Some(0.0));

    let short = app
        .create(
            "/api/active-users",
            json!({ "user_id": "u1", "session_duration": 100, "Location": "Berlin" }),
        )
        .await;
    let long = app
        .create(
            "/api/active-users",
            json!({ "user_id": "u2", "session_duration": 300, "Location": "Lisbon" }),
        )
        .await;

    let (_, stats) = app.get("/api/active-users/statistics").await;
    assert_eq!(stats["totalActive"], 2);
    assert_eq!(stats["averageSessionDuration"].as_f64(), Some(200.0));

    let (status, body) = app.delete(&format!("/api/active-users/{long}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session ended successfully");

    let (_, stats) = app.get("/api/active-users/statistics").await;
    assert_eq!(stats["totalActive"], 1);
    assert_eq!(stats["averageSessionDuration"].as_f64(), Some(100.0));

    let (status, updated) = app
        .patch(
            &format!("/api/active-users/{short}"),
            json!({ "session_duration": 160 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["Location"], "Berlin");
    assert_eq!(updated["session_duration"].as_f64(), Some(160.0));

    let (status, _) = app
        .patch(
            &format!("/api/active-users/{long}"),
            json!({ "session_duration": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_requires_location() {
    let app = setup_test_app();

    let (status, _) = app
        .post("/api/active-users", json!({ "user_id": "u1", "Location": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/active-users",
            json!({ "user_id": "u1", "session_duration": -5, "Location": "Oslo" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_page_views_accumulate_per_user() {
    let app = setup_test_app();

    let (status, first) = app
        .post(
            "/api/user-statistics",
            json!({ "user_id": "u1", "page_name": "dashboard", "time_spent": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["pages_visited"], json!([{ "page_name": "dashboard", "visit_count": 1 }]));

    let (status, _) = app
        .post(
            "/api/user-statistics",
            json!({ "user_id": "u1", "page_name": "dashboard", "time_spent": 20 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, latest) = app
        .post(
            "/api/user-statistics",
            json!({ "user_id": "u1", "page_name": "orders" }),
        )
        .await;
    assert_eq!(latest["_id"], first["_id"]);
    assert_eq!(
        latest["pages_visited"],
        json!([
            { "page_name": "dashboard", "visit_count": 2 },
            { "page_name": "orders", "visit_count": 1 }
        ])
    );
    assert_eq!(latest["total_time_spent"].as_f64(), Some(50.0));

    let (status, by_user) = app.get("/api/user-statistics/user/u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_user["_id"], first["_id"]);
    assert!(by_user["user"].is_null());

    let (status, _) = app.get("/api/user-statistics/user/u2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = app.get("/api/user-statistics").await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_page_view_validation() {
    let app = setup_test_app();

    let (status, body) = app
        .post("/api/user-statistics", json!({ "user_id": "u1", "page_name": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "page_name is required");

    let (status, _) = app
        .post(
            "/api/user-statistics",
            json!({ "user_id": "u1", "page_name": "home", "time_spent": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page) = app.get("/api/user-statistics").await;
    assert!(page["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_overall_statistics() {
    let app = setup_test_app();

    let (_, empty) = app.get("/api/user-statistics/overall").await;
    assert_eq!(empty["totalUsers"], 0);
    assert_eq!(empty["mostVisitedPages"], json!([]));
    assert_eq!(empty["averageTimeSpent"].as_f64(), Some(0.0));

    for (user, page, seconds) in [
        ("u1", "home", 10),
        ("u1", "orders", 10),
        ("u2", "home", 40),
        ("u3", "home", 0),
        ("u3", "reports", 0),
    ] {
        app.post(
            "/api/user-statistics",
            json!({ "user_id": user, "page_name": page, "time_spent": seconds }),
        )
        .await;
    }

    let (status, overall) = app.get("/api/user-statistics/overall").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(overall["totalUsers"], 3);
    assert_eq!(overall["averageTimeSpent"].as_f64(), Some(20.0));
    assert_eq!(
        overall["mostVisitedPages"],
        json!([
            { "_id": "home", "totalVisits": 3 },
            { "_id": "orders", "totalVisits": 1 },
            { "_id": "reports", "totalVisits": 1 }
        ])
    );
}

#[tokio::test]
async fn test_notifications_mark_read_and_filter() {
    let app = setup_test_app();
    let user_id = app
        .create(
            "/api/users",
            json!({ "name": "Lin", "email": "lin@example.com", "password": "pw" }),
        )
        .await;

    let (status, created) = app
        .post(
            "/api/notifications",
            json!({ "user_id": user_id, "message": "Order shipped", "type": "order" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_read"], false);
    assert_eq!(created["type"], "order");
    let first = created["_id"].as_str().unwrap().to_string();

    app.create(
        "/api/notifications",
        json!({ "user_id": user_id, "message": "Welcome" }),
    )
    .await;
    app.create(
        "/api/notifications",
        json!({ "user_id": "someone-else", "message": "Hello" }),
    )
    .await;

    let (status, read) = app.patch(&format!("/api/notifications/{first}"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["is_read"], true);

    let (_, unread) = app
        .get(&format!("/api/notifications?user_id={user_id}&is_read=false"))
        .await;
    let items = unread["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["message"], "Welcome");
    assert_eq!(items[0]["type"], "info");
    assert_eq!(items[0]["user"]["name"], "Lin");

    let (_, fetched) = app.get(&format!("/api/notifications/{first}")).await;
    assert_eq!(fetched["user"]["email"], "lin@example.com");

    let (status, _) = app.delete(&format!("/api/notifications/{first}")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, remaining) = app.get(&format!("/api/notifications?user_id={user_id}")).await;
    assert_eq!(remaining["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_notifications_are_all_or_nothing() {
    let app = setup_test_app();

    let (status, body) = app
        .post(
            "/api/notifications/bulk",
            json!({ "notifications": [
                { "user_id": "u1", "message": "One" },
                { "user_id": "u2", "message": "" }
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "item 1: message is required");

    let (_, page) = app.get("/api/notifications").await;
    assert!(page["items"].as_array().unwrap().is_empty());

    let (status, _) = app
        .post("/api/notifications/bulk", json!({ "notifications": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = app
        .post(
            "/api/notifications/bulk",
            json!({ "notifications": [
                { "user_id": "u1", "message": "One" },
                { "user_id": "u2", "message": "Two", "type": "alert" }
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.as_array().unwrap().len(), 2);

    let (_, page) = app.get("/api/notifications").await;
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
}
