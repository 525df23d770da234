mod common;

use acton_jsonapi::prelude::*;
use axum::http::StatusCode;
use common::*;
use serde_json::{json, Value};

async fn paginated_app(store: &Arc<UserStore>, config: Config, users: usize) -> Router {
    let paginator = PageSizePagination::from_config(&config.pagination);
    let app = app_with(config, user_resource(store).with_paginator(paginator));
    for n in 0..users {
        create_user(&app, &format!("user-{}", n), n as i64).await;
    }
    app
}

#[tokio::test]
async fn test_get_many_without_pagination() {
    let store = UserStore::new();
    let app = app(&store);
    create_user(&app, "Carl", 30).await;
    create_user(&app, "Dana", 41).await;

    let response = send(&app, get("/user")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.ids(), vec!["1", "2"]);
    assert_eq!(response.body["links"], json!({"self": "https://example.com/user"}));
    assert_eq!(response.body["meta"], json!({"total_count": 2}));
    assert_eq!(response.body["data"][1]["attributes"], json!({"name": "Dana", "age": 41}));
}

#[tokio::test]
async fn test_get_many_empty_collection() {
    let store = UserStore::new();
    let app = paginated_app(&store, Config::default(), 0).await;

    let response = send(&app, get("/user")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], json!([]));
    assert_eq!(response.body["meta"]["total_count"], 0);
    assert_eq!(response.body["links"]["next"], Value::Null);
    assert_eq!(response.body["links"]["first"], Value::Null);
}

#[tokio::test]
async fn test_walk_pages_with_next_links() {
    let store = UserStore::new();
    let app = paginated_app(&store, Config::default(), 3).await;

    let first = send(&app, get("/user?page%5Bsize%5D=2")).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.ids(), vec!["1", "2"]);
    assert_eq!(first.body["meta"]["total_count"], 3);
    assert_eq!(first.body["meta"]["extra"], json!({"page": 1, "size": 2}));
    assert_eq!(first.body["links"]["prev"], Value::Null);
    assert!(first.body["links"]["next"].is_string());

    let second = send(&app, get(&path_of(&first.body["links"]["next"]))).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.ids(), vec!["3"]);
    assert_eq!(second.body["links"]["next"], Value::Null);
    assert_eq!(second.body["links"]["last"], second.body["links"]["self"]);

    let back = send(&app, get(&path_of(&second.body["links"]["prev"]))).await;
    assert_eq!(back.ids(), first.ids());
}

#[tokio::test]
async fn test_links_keep_other_query_parameters() {
    let store = UserStore::new();
    let app = paginated_app(&store, Config::default(), 3).await;

    let response = send(&app, get("/user?fields%5Buser%5D=name&page%5Bsize%5D=1")).await;

    assert_eq!(response.ids(), vec!["1"]);
    assert_eq!(response.body["data"][0]["attributes"], json!({"name": "user-0"}));
    assert_eq!(
        response.body["links"]["last"],
        "https://example.com/user?fields%5Buser%5D=name&page%5Bnumber%5D=3&page%5Bsize%5D=1"
    );

    let last = send(&app, get(&path_of(&response.body["links"]["last"]))).await;
    assert_eq!(last.ids(), vec!["3"]);
    assert_eq!(last.body["data"][0]["attributes"], json!({"name": "user-2"}));
}

#[tokio::test]
async fn test_page_beyond_last_is_empty() {
    let store = UserStore::new();
    let app = paginated_app(&store, Config::default(), 2).await;

    let response = send(&app, get("/user?page%5Bnumber%5D=5&page%5Bsize%5D=2")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.ids().is_empty());
    assert_eq!(response.body["meta"]["total_count"], 2);
    assert_eq!(response.body["links"]["next"], Value::Null);
}

#[tokio::test]
async fn test_invalid_page_parameters() {
    let store = UserStore::new();
    let app = paginated_app(&store, Config::default(), 1).await;

    for (query, message) in [
        ("page%5Bsize%5D=0", "Both page[number] and page[size] must be at least 1"),
        ("page%5Bnumber%5D=-1", "Both page[number] and page[size] must be at least 1"),
        ("page%5Bnumber%5D=two", "page[number] and page[size] must be integers"),
        ("page%5Bsize%5D=1.5", "page[number] and page[size] must be integers"),
    ] {
        let response = send(&app, get(&format!("/user?{}", query))).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "query {}", query);
        assert_eq!(response.body, json!({"message": message}), "query {}", query);
    }
}

#[tokio::test]
async fn test_page_size_is_clamped_to_configured_maximum() {
    let store = UserStore::new();
    let mut config = Config::default();
    config.pagination.default_size = 2;
    config.pagination.max_size = 3;
    let app = paginated_app(&store, config, 5).await;

    let default = send(&app, get("/user")).await;
    assert_eq!(default.ids(), vec!["1", "2"]);

    let clamped = send(&app, get("/user?page%5Bsize%5D=50")).await;
    assert_eq!(clamped.ids(), vec!["1", "2", "3"]);
    assert_eq!(clamped.body["meta"]["extra"], json!({"page": 1, "size": 3}));
}

#[tokio::test]
async fn test_overflowing_page_size_is_clamped() {
    let store = UserStore::new();
    let app = paginated_app(&store, Config::default(), 3).await;

    let response = send(&app, get("/user?page%5Bsize%5D=99999999999999999999")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.ids(), vec!["1", "2", "3"]);
    assert_eq!(response.body["meta"]["extra"], json!({"page": 1, "size": 100}));
}
