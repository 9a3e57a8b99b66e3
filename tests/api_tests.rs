//! API integration tests against a running server
//!
//! Start the server with a bootstrap admin first:
//! LECTERN__AUTH__BOOTSTRAP_ADMIN_EMAIL=admin@example.org
//! LECTERN__AUTH__BOOTSTRAP_ADMIN_PASSWORD=admin-password

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ADMIN_EMAIL: &str = "admin@example.org";
const ADMIN_PASSWORD: &str = "admin-password";

async fn login(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh member and return its token
async fn new_member(client: &Client) -> String {
    let email = format!("member-{}@example.org", Uuid::new_v4());
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({ "email": email, "name": "Test Member", "password": "password123" }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(response.status(), StatusCode::CREATED);

    login(client, &email, "password123").await
}

async fn create_book(client: &Client, admin: &str, copies: i32) -> Value {
    let response = client
        .post(format!("{}/admin/books", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "name": format!("Test Book {}", Uuid::new_v4()),
            "author": "Test Author",
            "categories": ["test"],
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse book")
}

async fn request_borrow(client: &Client, member: &str, book_id: i64) -> Value {
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .bearer_auth(member)
        .json(&json!({ "book_id": book_id, "days": 7 }))
        .send()
        .await
        .expect("Failed to request borrow");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse borrow record")
}

async fn get_book(client: &Client, token: &str, id: i64) -> Value {
    client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to get book")
        .json()
        .await
        .expect("Failed to parse book")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_borrow_lifecycle() {
    let client = Client::new();
    let admin = login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let member = new_member(&client).await;

    let book = create_book(&client, &admin, 2).await;
    let book_id = book["id"].as_i64().unwrap();
    assert_eq!(book["available_copies"], 2);

    // requesting does not reserve a copy
    let record = request_borrow(&client, &member, book_id).await;
    assert_eq!(record["status"], "pending");
    assert_eq!(get_book(&client, &admin, book_id).await["available_copies"], 2);

    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, record["id"]))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let approved: Value = response.json().await.unwrap();
    assert_eq!(approved["status"], "borrowed");
    assert_eq!(get_book(&client, &admin, book_id).await["available_copies"], 1);

    // cancelling a borrowed record keeps it
    let response = client
        .delete(format!("{}/borrows/{}", BASE_URL, record["id"]))
        .bearer_auth(&member)
        .send()
        .await
        .unwrap();
    let cancel: Value = response.json().await.unwrap();
    assert_eq!(cancel["cancelled"], false);

    // on-time return: no fine
    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, record["id"]))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt: Value = response.json().await.unwrap();
    assert_eq!(receipt["record"]["status"], "returned");
    assert!(receipt["fine"].is_null());
    assert_eq!(get_book(&client, &admin, book_id).await["available_copies"], 2);

    // returning twice is refused
    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, record["id"]))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_reject_and_cancel() {
    let client = Client::new();
    let admin = login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let member = new_member(&client).await;

    let book = create_book(&client, &admin, 1).await;
    let book_id = book["id"].as_i64().unwrap();

    let rejected = request_borrow(&client, &member, book_id).await;
    let response = client
        .post(format!("{}/borrows/{}/reject", BASE_URL, rejected["id"]))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "rejected");
    assert_eq!(get_book(&client, &admin, book_id).await["available_copies"], 1);

    let pending = request_borrow(&client, &member, book_id).await;
    let response = client
        .delete(format!("{}/borrows/{}", BASE_URL, pending["id"]))
        .bearer_auth(&member)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["cancelled"], true);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_approvals_of_last_copy() {
    let client = Client::new();
    let admin = login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let first = new_member(&client).await;
    let second = new_member(&client).await;

    let book = create_book(&client, &admin, 1).await;
    let book_id = book["id"].as_i64().unwrap();

    let a = request_borrow(&client, &first, book_id).await;
    let b = request_borrow(&client, &second, book_id).await;

    let approve = |id: Value| {
        let client = client.clone();
        let admin = admin.clone();
        async move {
            client
                .post(format!("{}/borrows/{}/approve", BASE_URL, id))
                .bearer_auth(&admin)
                .send()
                .await
                .unwrap()
                .status()
        }
    };

    let (ra, rb) = tokio::join!(approve(a["id"].clone()), approve(b["id"].clone()));
    let mut statuses = vec![ra, rb];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(get_book(&client, &admin, book_id).await["available_copies"], 0);
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_reach_admin_routes() {
    let client = Client::new();
    let member = new_member(&client).await;

    for path in ["/borrows", "/fines", "/members", "/reports/summary"] {
        let response = client
            .get(format!("{}{}", BASE_URL, path))
            .bearer_auth(&member)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", path);
    }
}

#[tokio::test]
#[ignore]
async fn test_export_popular_books_csv() {
    let client = Client::new();
    let admin = login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = client
        .get(format!("{}/reports/popular-books/export", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
}
