mod common;

use reqwest::{
    multipart::{Form, Part},
    StatusCode,
};
use serde_json::{json, Value};

use common::{product_service, token_for, TestServer};

async fn create_chair(client: &reqwest::Client, server: &TestServer, token: &str) -> Value {
    let res = client
        .post(server.url("/products"))
        .bearer_auth(token)
        .json(&json!({ "title": "Chair", "price": 20.0, "category": "furniture" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["product"].clone()
}

fn image_form(file_name: &str, bytes: &'static [u8]) -> Form {
    Form::new().part("image", Part::bytes(bytes).file_name(file_name.to_string()))
}

#[tokio::test]
async fn create_then_fetch_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();
    let token = token_for(1, "alice");

    let created = create_chair(&client, &server, &token).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["user_id"], 1);

    let res = client
        .get(server.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let fetched = &body["product"];
    assert_eq!(fetched["title"], "Chair");
    assert_eq!(fetched["price"], 20.0);
    assert_eq!(fetched["category"], "furniture");
    assert_eq!(fetched["id"], id);
    assert!(fetched["image_url"].is_null());
    assert!(fetched.get("deleted_at").is_none());
}

#[tokio::test]
async fn protected_endpoints_reject_missing_token_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let (server, store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/products"))
        .json(&json!({ "title": "Chair", "price": 20.0, "category": "furniture" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "authorization header is required");

    for res in [
        client.put(server.url("/products/1")).json(&json!({})).send().await.unwrap(),
        client.delete(server.url("/products/1")).send().await.unwrap(),
        client.get(server.url("/my-products")).send().await.unwrap(),
        client
            .post(server.url("/products/1/image"))
            .multipart(image_form("a.png", b"png"))
            .send()
            .await
            .unwrap(),
    ] {
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    let res = client
        .post(server.url("/products"))
        .bearer_auth("not-a-jwt")
        .json(&json!({ "title": "Chair", "price": 20.0, "category": "furniture" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(store.row_count().await, 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn non_owner_gets_not_found_and_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();
    let owner = token_for(1, "alice");
    let intruder = token_for(2, "mallory");

    let created = create_chair(&client, &server, &owner).await;
    let id = created["id"].as_i64().unwrap();
    let path = format!("/products/{id}");

    let res = client
        .put(server.url(&path))
        .bearer_auth(&intruder)
        .json(&json!({ "title": "Stolen chair", "price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let foreign: Value = res.json().await.unwrap();

    let res = client
        .put(server.url("/products/424242"))
        .bearer_auth(&intruder)
        .json(&json!({ "title": "Ghost chair" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let missing: Value = res.json().await.unwrap();
    assert_eq!(foreign, missing);

    let res = client
        .delete(server.url(&path))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(server.url(&format!("{path}/image")))
        .bearer_auth(&intruder)
        .multipart(image_form("x.png", b"png"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = client
        .get(server.url(&path))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["product"]["title"], "Chair");
    assert_eq!(body["product"]["price"], 20.0);
    assert!(body["product"]["image_url"].is_null());
}

#[tokio::test]
async fn owner_updates_partially_and_soft_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let (server, store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();
    let token = token_for(1, "alice");

    let created = create_chair(&client, &server, &token).await;
    let path = format!("/products/{}", created["id"]);

    let res = client
        .put(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "price": 0.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "product updated");
    assert_eq!(body["product"]["price"], 0.0);
    assert_eq!(body["product"]["title"], "Chair");

    let res = client
        .put(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(server.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url(&path)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client
        .delete(server.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let list: Value = client
        .get(server.url("/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total"], 0);
    // Tombstoned, not removed.
    assert_eq!(store.row_count().await, 1);
}

#[tokio::test]
async fn listing_paginates_filters_and_scopes_to_owner() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();
    let alice = token_for(1, "alice");
    let bob = token_for(2, "bob");

    for i in 0..3 {
        let res = client
            .post(server.url("/products"))
            .bearer_auth(&alice)
            .json(&json!({ "title": format!("Lamp {i}"), "price": 5.0, "category": "lighting" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }
    create_chair(&client, &server, &bob).await;

    let page: Value = client
        .get(server.url("/products?page=0&limit=0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 10);
    assert_eq!(page["total"], 4);
    assert_eq!(page["products"].as_array().unwrap().len(), 4);

    let page: Value = client
        .get(server.url("/products?limit=1000&page=abc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["limit"], 100);
    assert_eq!(page["page"], 1);

    let page: Value = client
        .get(server.url("/products?page=2&limit=3"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["products"].as_array().unwrap().len(), 1);

    let page: Value = client
        .get(server.url("/products?category=lighting"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 3);

    let mine: Value = client
        .get(server.url("/my-products"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["products"][0]["title"], "Chair");
}

#[tokio::test]
async fn image_upload_stores_serves_and_replaces() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();
    let token = token_for(1, "alice");

    let created = create_chair(&client, &server, &token).await;
    let id = created["id"].as_i64().unwrap();
    let image_path = format!("/products/{id}/image");

    let res = client
        .post(server.url(&image_path))
        .bearer_auth(&token)
        .multipart(image_form("notes.txt", b"hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(server.url(&image_path))
        .bearer_auth(&token)
        .multipart(Form::new().text("other", "value"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(server.url(&image_path))
        .bearer_auth(&token)
        .multipart(image_form("Chair.PNG", b"first-image"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let first_url = body["image_url"].as_str().unwrap().to_string();
    assert!(first_url.starts_with(&format!("/uploads/{id}_")));
    assert!(first_url.ends_with(".png"));

    let served = client.get(server.url(&first_url)).send().await.unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.bytes().await.unwrap().as_ref(), b"first-image");

    let res = client
        .post(server.url(&image_path))
        .bearer_auth(&token)
        .multipart(image_form("chair.webp", b"second-image"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let second_url = body["image_url"].as_str().unwrap().to_string();

    let product: Value = client
        .get(server.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(product["product"]["image_url"], second_url.as_str());

    // The replaced file is gone, only the current one remains.
    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(second_url.ends_with(&files[0]));

    let res = client
        .delete(server.url(&format!("/products/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn malformed_path_and_body_are_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();
    let token = token_for(1, "alice");

    let res = client.get(server.url("/products/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(server.url("/products"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Chair", "price": -1.0, "category": "furniture" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn delete_tombstones_even_when_image_file_is_already_gone() {
    let dir = tempfile::tempdir().unwrap();
    let (server, store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();
    let token = token_for(1, "alice");

    let created = create_chair(&client, &server, &token).await;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .post(server.url(&format!("/products/{id}/image")))
        .bearer_auth(&token)
        .multipart(image_form("chair.png", b"image"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let image_url = body["image_url"].as_str().unwrap().to_string();
    let file_name = image_url.rsplit('/').next().unwrap();
    std::fs::remove_file(dir.path().join(file_name)).unwrap();

    let res = client
        .delete(server.url(&format!("/products/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(store.row_count().await, 1);
}

#[tokio::test]
async fn image_upload_without_multipart_body_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _store) = product_service(dir.path()).await;
    let client = reqwest::Client::new();
    let token = token_for(1, "alice");

    let created = create_chair(&client, &server, &token).await;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .post(server.url(&format!("/products/{id}/image")))
        .bearer_auth(&token)
        .json(&json!({ "image": "chair.png" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());

    let product: Value = client
        .get(server.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(product["product"]["image_url"].is_null());
}
