//! API integration tests
//!
//! Need a running server on localhost:8080 with a fresh database and the
//! bootstrap admin `admin` / `admin-password`:
//!
//! ```sh
//! CATALOG_AUTH__BOOTSTRAP_ADMIN__USERNAME=admin \
//! CATALOG_AUTH__BOOTSTRAP_ADMIN__PASSWORD=admin-password cargo run
//! cargo test -- --ignored
//! ```

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    get_auth_token(client, "admin", "admin-password").await
}

/// Registers a fresh patron and returns (user id, token)
async fn register_patron(client: &Client) -> (i64, String) {
    let username = format!("patron_{}", &Uuid::new_v4().simple().to_string()[..8]);
    let response = client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "correct-horse-battery",
            "password_confirmation": "correct-horse-battery"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["redirect_to"], "/api/v1/");
    (
        body["user"]["id"].as_i64().expect("No user id"),
        body["token"].as_str().expect("No token").to_string(),
    )
}

async fn create_author(client: &Client, token: &str) -> Value {
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "first_name": "Frank",
            "last_name": "Herbert",
            "date_of_birth": "1920-10-08",
            "date_of_death": "1986-02-11"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn create_book(client: &Client, token: &str, author_id: Option<i64>) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "Dune",
            "summary": "A desert planet and its spice.",
            "isbn": "9780441172719",
            "author_id": author_id
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
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
async fn test_dashboard_counts_visits_per_session() {
    let client = Client::builder().cookie_store(true).build().unwrap();

    for expected in 0..3 {
        let body: Value = client
            .get(format!("{}/", BASE_URL))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        assert_eq!(body["num_visits"], expected);
    }

    // A client without the session cookie starts over
    let body: Value = Client::new()
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["num_visits"], 0);
}

#[tokio::test]
#[ignore]
async fn test_register_and_login() {
    let client = Client::new();
    let (user_id, token) = register_patron(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["permissions"], json!([]));
}

#[tokio::test]
#[ignore]
async fn test_register_mismatched_passwords() {
    let client = Client::new();

    let response = client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({
            "username": "mismatch",
            "password": "correct-horse-battery",
            "password_confirmation": "wrong-horse-battery"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["fields"]["password_confirmation"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_mutations_require_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/authors", BASE_URL))
        .json(&json!({ "first_name": "Anne", "last_name": "McCaffrey" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap().contains("/api/v1/auth/login"));
}

#[tokio::test]
#[ignore]
async fn test_deleting_author_keeps_books() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let author = create_author(&client, &token).await;
    let book = create_book(&client, &token, author["id"].as_i64()).await;
    assert_eq!(book["author"]["last_name"], "Herbert");

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["author"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_invalid_isbn_is_field_error() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Dune",
            "summary": "Spice",
            "isbn": "12345"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["fields"]["isbn"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_borrowed_requires_permission() {
    let client = Client::new();
    let (_, patron_token) = register_patron(&client).await;

    let response = client
        .get(format!("{}/borrowed", BASE_URL))
        .bearer_auth(&patron_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(format!("{}/borrowed", BASE_URL))
        .bearer_auth(admin_token(&client).await)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_loan_and_renewal_flow() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (patron_id, patron_token) = register_patron(&client).await;

    let book = create_book(&client, &admin, None).await;
    let response = client
        .post(format!("{}/bookinstances", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({
            "book_id": book["id"],
            "status": "on_loan",
            "due_back": "2000-01-01",
            "borrower_id": patron_id
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let instance: Value = response.json().await.expect("Failed to parse response");
    let instance_id = instance["id"].as_str().unwrap().to_string();

    // The patron sees the overdue copy in their loans
    let body: Value = client
        .get(format!("{}/mybooks", BASE_URL))
        .bearer_auth(&patron_token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], instance_id.as_str());
    assert_eq!(body["items"][0]["is_overdue"], true);

    // Patrons cannot renew
    let response = client
        .get(format!("{}/book/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&patron_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A date in the past is rejected
    let response = client
        .post(format!("{}/book/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&admin)
        .json(&json!({ "renewal_date": "2000-01-02" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The proposed date is accepted and clears the overdue flag
    let proposal: Value = client
        .get(format!("{}/book/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let response = client
        .post(format!("{}/book/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&admin)
        .json(&json!({ "renewal_date": proposal["proposed_renewal_date"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let renewed: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(renewed["due_back"], proposal["proposed_renewal_date"]);
    assert_eq!(renewed["is_overdue"], false);

    // Returned copies leave the patron's list
    let response = client
        .post(format!("{}/bookinstances/{}/return", BASE_URL, instance_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = client
        .get(format!("{}/mybooks", BASE_URL))
        .bearer_auth(&patron_token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["total"], 0);
}
