use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use storefront_api::mailer::{HttpMailer, Mailer, Outbox};
use storefront_api::tokens::TokenService;
use storefront_api::{AppState, AppStateInner, Site, router};
use storefront_db::Database;
use storefront_db::models::UserRow;

const PASSWORD: &str = "s3cret-pass";

struct TestApp {
    app: Router,
    state: AppState,
    outbox: Outbox,
    uploads: TempDir,
}

fn test_app() -> TestApp {
    let outbox = Outbox::new();
    test_app_with_mailer(Mailer::Memory(outbox.clone()), outbox)
}

fn test_app_with_mailer(mailer: Mailer, outbox: Outbox) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        tokens: TokenService::new("test-secret", None),
        mailer,
        site: Site {
            url: "http://localhost:8000".into(),
            name: "Nice shop".into(),
        },
        upload_dir: uploads.path().to_path_buf(),
    });

    TestApp {
        app: router(state.clone()),
        state,
        outbox,
        uploads,
    }
}

struct Reply {
    status: StatusCode,
    headers: header::HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> Reply {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        Reply { status, headers, body }
    }

    async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Value) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.bodyless("GET", uri, token).await
    }

    async fn bodyless(&self, method: &str, uri: &str, token: Option<&str>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Reply {
        self.json(
            "POST",
            "/users/",
            None,
            json!({ "username": username, "email": email, "password": password }),
        )
        .await
    }

    async fn login(&self, username: &str, password: &str) -> Reply {
        let req = Request::builder()
            .method("POST")
            .uri("/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={username}&password={password}")))
            .unwrap();
        self.send(req).await
    }

    /// Token from the most recent verification mail sent to `email`.
    fn mailed_token(&self, email: &str) -> String {
        let mail = self.outbox.last_to(email).expect("verification mail sent");
        let start = mail.html.find("?token=").expect("link in mail") + "?token=".len();
        let rest = &mail.html[start..];
        let end = rest.find('"').expect("end of link");
        rest[..end].to_string()
    }

    async fn verify(&self, token: &str) -> Reply {
        self.get(&format!("/verification/email?token={token}"), None).await
    }

    /// Register, verify and log in; returns the bearer token.
    async fn verified_user(&self, username: &str, email: &str) -> String {
        assert_eq!(self.register(username, email, PASSWORD).await.status, StatusCode::CREATED);
        let token = self.mailed_token(email);
        assert_eq!(self.verify(&token).await.status, StatusCode::OK);
        let reply = self.login(username, PASSWORD).await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.json()["access_token"].as_str().unwrap().to_string()
    }

    async fn upload(&self, uri: &str, token: &str, filename: &str, bytes: &[u8]) -> Reply {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    async fn create_product(&self, token: &str, original: f64, new: f64) -> Reply {
        self.json(
            "POST",
            "/products/",
            Some(token),
            json!({
                "name": "Widget",
                "category": "tools",
                "original_price": original,
                "new_price": new,
                "offer_expiration_date": "2030-01-31"
            }),
        )
        .await
    }
}

// -- Registration / verification lifecycle --

#[tokio::test]
async fn new_user_is_unverified_until_link_redeemed() {
    let t = test_app();

    let reply = t.register("alice1", "alice@example.com", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let user = reply.json();
    assert_eq!(user["username"], "alice1");
    assert_eq!(user["is_verified"], false);
    assert!(user.get("password").is_none());

    // Login is refused until the email is confirmed.
    let reply = t.login("alice1", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["detail"], "Email not verified");

    let token = t.mailed_token("alice@example.com");
    let reply = t.verify(&token).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.text().contains("alice1"));

    let reply = t.login("alice1", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["token_type"], "bearer");
}

#[tokio::test]
async fn verification_is_idempotent() {
    let t = test_app();
    t.register("alice1", "alice@example.com", PASSWORD).await;
    let token = t.mailed_token("alice@example.com");

    assert_eq!(t.verify(&token).await.status, StatusCode::OK);
    assert_eq!(t.verify(&token).await.status, StatusCode::OK);
}

#[tokio::test]
async fn verification_mail_links_back_to_site() {
    let t = test_app();
    t.register("alice1", "alice@example.com", PASSWORD).await;

    let mail = t.outbox.last_to("alice@example.com").unwrap();
    assert_eq!(mail.subject, "Nice shop");
    assert!(mail.html.contains("http://localhost:8000/verification/email?token="));
}

#[tokio::test]
async fn one_users_link_never_verifies_another() {
    let t = test_app();
    t.register("alice1", "alice@example.com", PASSWORD).await;
    t.register("bobby", "bob@example.com", PASSWORD).await;

    let alice_token = t.mailed_token("alice@example.com");
    assert_eq!(t.verify(&alice_token).await.status, StatusCode::OK);

    let bob = t.state.db.get_user_by_username("bobby").unwrap().unwrap();
    assert!(!bob.is_verified);
    assert_eq!(t.login("bobby", PASSWORD).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_or_mismatched_verification_token_rejected() {
    let t = test_app();
    t.register("alice1", "alice@example.com", PASSWORD).await;
    let alice = t.state.db.get_user_by_username("alice1").unwrap().unwrap();

    let reply = t.verify("garbage").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["detail"], "Invalid Token or expired token");

    // Right id, wrong email: the claims do not describe the stored row.
    let mismatched = t
        .state
        .tokens
        .issue(&UserRow {
            email: "someone-else@example.com".into(),
            ..alice.clone()
        })
        .unwrap();
    assert_eq!(t.verify(&mismatched).await.status, StatusCode::UNAUTHORIZED);

    let other_secret = TokenService::new("other-secret", None).issue(&alice).unwrap();
    assert_eq!(t.verify(&other_secret).await.status, StatusCode::UNAUTHORIZED);

    assert!(!t.state.db.get_user_by_id(alice.id).unwrap().unwrap().is_verified);
}

#[tokio::test]
async fn duplicate_username_or_email_rejected() {
    let t = test_app();
    assert_eq!(
        t.register("alice1", "alice@example.com", PASSWORD).await.status,
        StatusCode::CREATED
    );

    let reply = t.register("alice1", "other@example.com", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Username already exists");

    let reply = t.register("alice2", "alice@example.com", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Email already exists");
}

#[tokio::test]
async fn short_credentials_and_bad_email_rejected() {
    let t = test_app();

    let reply = t.register("alice1", "alice@example.com", "short").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Password must be longer than 8 characters");

    let reply = t.register("abcd", "alice@example.com", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Username must be longer than 5 characters");

    let reply = t.register("alice1", "not-an-email", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "This is not a valid email");

    assert!(t.outbox.messages().is_empty());
}

#[tokio::test]
async fn mail_failure_leaves_account_created_and_unverified() {
    // Nothing listens on the discard port, so every send fails.
    let mailer = Mailer::Http(HttpMailer::new(
        "http://127.0.0.1:9/send".into(),
        "key".into(),
        "shop@example.com".into(),
        None,
    ));
    let t = test_app_with_mailer(mailer, Outbox::new());

    let reply = t.register("alice1", "alice@example.com", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let alice = t.state.db.get_user_by_username("alice1").unwrap().unwrap();
    assert!(!alice.is_verified);
}

#[tokio::test]
async fn wrong_password_rejected() {
    let t = test_app();
    t.verified_user("alice1", "alice@example.com").await;

    let reply = t.login("alice1", "wrong-password").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["detail"], "Invalid username or password");

    assert_eq!(t.login("nobody", PASSWORD).await.status, StatusCode::UNAUTHORIZED);
}

// -- Bearer authentication --

#[tokio::test]
async fn protected_routes_require_bearer() {
    let t = test_app();

    let reply = t.bodyless("POST", "/users/me", None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.headers[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(reply.json()["detail"], "Not authenticated");

    let reply = t.bodyless("POST", "/users/me", Some("not-a-token")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["detail"], "Invalid token");
}

#[tokio::test]
async fn token_for_one_user_cannot_act_as_another() {
    let t = test_app();
    t.verified_user("alice1", "alice@example.com").await;
    t.verified_user("bobby", "bob@example.com").await;

    let alice = t.state.db.get_user_by_username("alice1").unwrap().unwrap();
    let bob = t.state.db.get_user_by_username("bobby").unwrap().unwrap();

    // Alice's name on Bob's id.
    let forged = t
        .state
        .tokens
        .issue(&UserRow {
            id: bob.id,
            ..alice.clone()
        })
        .unwrap();
    let reply = t.bodyless("POST", "/users/me", Some(&forged)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["detail"], "Invalid token");
}

// -- Profile & users --

#[tokio::test]
async fn registration_creates_storefront_shown_on_profile() {
    let t = test_app();
    let token = t.verified_user("alice1", "alice@example.com").await;

    let reply = t.bodyless("POST", "/users/me", Some(&token)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"]["username"], "alice1");
    assert_eq!(body["data"]["is_verified"], true);
    assert_eq!(body["data"]["business"]["business_name"], "alice1");
    assert_eq!(body["data"]["logo"], "http://localhost:8000/default.jpg");
}

#[tokio::test]
async fn user_listing_pages_by_id_window() {
    let t = test_app();
    let token = t.verified_user("alice1", "alice@example.com").await;
    t.register("bobby", "bob@example.com", PASSWORD).await;
    t.register("carol", "carol@example.com", PASSWORD).await;

    let reply = t.get("/users/", Some(&token)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json().as_array().unwrap().len(), 3);

    let reply = t.get("/users/?skip=1&limit=1", Some(&token)).await;
    let users = reply.json();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["username"], "bobby");

    let reply = t.get("/users/?limit=101", Some(&token)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    assert_eq!(t.get("/users/", None).await.status, StatusCode::UNAUTHORIZED);
}

// -- Business --

#[tokio::test]
async fn only_owner_updates_business() {
    let t = test_app();
    let alice_token = t.verified_user("alice1", "alice@example.com").await;
    let bob_token = t.verified_user("bobby", "bob@example.com").await;

    let alice = t.state.db.get_user_by_username("alice1").unwrap().unwrap();
    let business = t.state.db.get_business_by_owner(alice.id).unwrap().unwrap();
    let uri = format!("/business/{}", business.id);

    let update = json!({ "business_name": "Alice Tools", "city": "Lyon", "region": "ARA" });

    let reply = t.json("PUT", &uri, Some(&bob_token), update.clone()).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["detail"], "Not authenticated to perform this action");

    let reply = t
        .json("PUT", &uri, Some(&alice_token), json!({ "business_name": "bobby" }))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = t.json("PUT", &uri, Some(&alice_token), update).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["business_name"], "Alice Tools");
    assert_eq!(body["city"], "Lyon");
    assert_eq!(body["logo"], "default.jpg");

    let reply = t
        .json("PUT", "/business/9999", Some(&alice_token), json!({ "business_name": "x" }))
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storefront_name_taken_by_rename_does_not_block_registration() {
    let t = test_app();
    let alice_token = t.verified_user("alice1", "alice@example.com").await;
    let alice = t.state.db.get_user_by_username("alice1").unwrap().unwrap();
    let business = t.state.db.get_business_by_owner(alice.id).unwrap().unwrap();
    let uri = format!("/business/{}", business.id);

    let reply = t
        .json("PUT", &uri, Some(&alice_token), json!({ "business_name": "carol1" }))
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let carol_token = t.verified_user("carol1", "carol@example.com").await;
    let reply = t.bodyless("POST", "/users/me", Some(&carol_token)).await;
    assert_eq!(reply.json()["data"]["business"]["business_name"], "carol1-2");
}

#[tokio::test]
async fn business_cannot_take_another_users_name() {
    let t = test_app();
    let alice_token = t.verified_user("alice1", "alice@example.com").await;
    let bob_token = t.verified_user("bobby", "bob@example.com").await;

    let bob = t.state.db.get_user_by_username("bobby").unwrap().unwrap();
    let bob_shop = t.state.db.get_business_by_owner(bob.id).unwrap().unwrap();
    let reply = t
        .json(
            "PUT",
            &format!("/business/{}", bob_shop.id),
            Some(&bob_token),
            json!({ "business_name": "Bob Tools" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    // "bobby" is free as a business name now, but still bob's username.
    let alice = t.state.db.get_user_by_username("alice1").unwrap().unwrap();
    let alice_shop = t.state.db.get_business_by_owner(alice.id).unwrap().unwrap();
    let reply = t
        .json(
            "PUT",
            &format!("/business/{}", alice_shop.id),
            Some(&alice_token),
            json!({ "business_name": "bobby" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Business name already exists");
}

#[tokio::test]
async fn business_location_length_is_bounded() {
    let t = test_app();
    let token = t.verified_user("alice1", "alice@example.com").await;
    let alice = t.state.db.get_user_by_username("alice1").unwrap().unwrap();
    let business = t.state.db.get_business_by_owner(alice.id).unwrap().unwrap();

    let reply = t
        .json(
            "PUT",
            &format!("/business/{}", business.id),
            Some(&token),
            json!({ "business_name": "Alice Tools", "city": "c".repeat(101) }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "City must be at most 100 characters");
}

// -- Products --

#[tokio::test]
async fn product_lifecycle_with_ownership() {
    let t = test_app();
    let alice_token = t.verified_user("alice1", "alice@example.com").await;
    let bob_token = t.verified_user("bobby", "bob@example.com").await;

    let reply = t.create_product(&alice_token, 40.0, 30.0).await;
    assert_eq!(reply.status, StatusCode::OK);
    let product = reply.json();
    assert_eq!(product["percentage_discount"], 25);
    assert_eq!(product["product_image"], "productDefault.jpg");
    let id = product["id"].as_i64().unwrap();
    let uri = format!("/products/{id}");

    // Public listing and detail.
    let reply = t.get("/products", None).await;
    assert_eq!(reply.json().as_array().unwrap().len(), 1);

    let reply = t.get(&uri, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let detail = reply.json();
    assert_eq!(
        detail["product_details"]["product_image"],
        "http://localhost:8000/productDefault.jpg"
    );
    assert_eq!(detail["business_details"]["name"], "alice1");
    assert_eq!(detail["business_details"]["email"], "alice@example.com");

    let change = json!({
        "name": "Widget",
        "category": "tools",
        "original_price": 40.0,
        "new_price": 20.0
    });

    // Bob may neither edit nor delete Alice's product.
    assert_eq!(
        t.json("PUT", &uri, Some(&bob_token), change.clone()).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        t.bodyless("DELETE", &uri, Some(&bob_token)).await.status,
        StatusCode::UNAUTHORIZED
    );

    let reply = t.json("PUT", &uri, Some(&alice_token), change).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["percentage_discount"], 50);

    let reply = t.bodyless("DELETE", &uri, Some(&alice_token)).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    assert_eq!(t.get(&uri, None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        t.bodyless("DELETE", &uri, Some(&alice_token)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn non_positive_original_price_rejected() {
    let t = test_app();
    let token = t.verified_user("alice1", "alice@example.com").await;

    let reply = t.create_product(&token, 0.0, 10.0).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "The original price must be greater than 0");
}

#[tokio::test]
async fn product_text_fields_are_bounded() {
    let t = test_app();
    let token = t.verified_user("alice1", "alice@example.com").await;

    let product = |name: String, category: &str| {
        json!({ "name": name, "category": category, "original_price": 10.0, "new_price": 8.0 })
    };

    let reply = t.json("POST", "/products/", Some(&token), product("n".repeat(101), "tools")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Product name must be 1 to 100 characters");

    let reply = t
        .json("POST", "/products/", Some(&token), product("Widget".into(), &"c".repeat(31)))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Category must be at most 30 characters");

    let reply = t.json("POST", "/products/", Some(&token), product("n".repeat(100), "tools")).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn product_mutations_need_auth() {
    let t = test_app();
    let reply = t
        .json("POST", "/products/", None, json!({ "name": "x", "category": "y", "original_price": 1.0, "new_price": 1.0 }))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

// -- Uploads --

#[tokio::test]
async fn logo_upload_updates_business() {
    let t = test_app();
    let token = t.verified_user("alice1", "alice@example.com").await;

    let reply = t.upload("/uploadfile/profile", &token, "me.PNG", b"\x89PNG\r\n").await;
    assert_eq!(reply.status, StatusCode::OK);
    let logo = reply.json()["logo"].as_str().unwrap().to_string();
    assert!(logo.ends_with(".png"));
    assert!(std::path::Path::new(&logo).starts_with(t.uploads.path()));
    assert_eq!(std::fs::read(&logo).unwrap(), b"\x89PNG\r\n");
}

#[tokio::test]
async fn upload_rejects_disallowed_extension() {
    let t = test_app();
    let token = t.verified_user("alice1", "alice@example.com").await;

    let reply = t.upload("/uploadfile/profile", &token, "evil.exe", b"MZ").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "File extension not allowed");
}

#[tokio::test]
async fn product_image_upload_checks_product_and_owner() {
    let t = test_app();
    let alice_token = t.verified_user("alice1", "alice@example.com").await;
    let bob_token = t.verified_user("bobby", "bob@example.com").await;

    let product = t.create_product(&alice_token, 10.0, 8.0).await.json();
    let uri = format!("/uploadfile/product/{}", product["id"]);

    let reply = t.upload("/uploadfile/product/9999", &alice_token, "p.jpg", b"jpg").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["detail"], "Product Not Found");

    let reply = t.upload(&uri, &bob_token, "p.jpg", b"jpg").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = t.upload(&uri, &alice_token, "p.jpeg", b"jpg").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.json()["product_image"].as_str().unwrap().ends_with(".jpeg"));
}

// -- Malformed requests --

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let t = test_app();

    let reply = t.json("POST", "/users/", None, json!({ "username": "alice1" })).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Invalid request body");

    let req = Request::builder()
        .method("POST")
        .uri("/users/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let reply = t.send(req).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Invalid request body");

    let reply = t.get("/products?limit=-1", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Invalid query parameters");

    let reply = t.get("/products/abc", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Invalid path parameter");

    let reply = t.get("/verification/email", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Invalid query parameters");

    let req = Request::builder()
        .method("POST")
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=alice1"))
        .unwrap();
    let reply = t.send(req).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["detail"], "Invalid form data");
}

#[tokio::test]
async fn health_is_public() {
    let t = test_app();
    let reply = t.get("/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["status"], "ok");
}
