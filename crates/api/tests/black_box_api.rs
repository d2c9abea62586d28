//! Black-box API tests: a real server on an ephemeral port, driven over
//! HTTP with in-memory stores behind it.

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use filehaven_api::config::{AdminSeed, AppConfig};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(config: AppConfig) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = filehaven_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn spawn_default() -> Self {
        Self::spawn(AppConfig::for_tests(JWT_SECRET)).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

const JWT_SECRET: &str = "test-secret";

/// Register an account and return (user_id, token).
async fn register(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
    name: &str,
) -> (Uuid, String) {
    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "email": email, "full_name": name, "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.unwrap();
    let user_id = body["user"]["id"].as_str().unwrap().parse().unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// Upload a file as the given user and return its id.
async fn upload(client: &reqwest::Client, base_url: &str, token: &str, name: &str) -> Uuid {
    let res = client
        .post(format!("{}/files?file_name={}", base_url, name))
        .bearer_auth(token)
        .header("content-type", "text/plain")
        .body("file content for tests")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn auth_is_required_for_protected_endpoints() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/files/{}", srv.base_url, Uuid::now_v7()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_login_and_whoami() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (user_id, _) = register(&client, &srv.base_url, "alice@example.com", "Alice").await;

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "ALICE@example.com", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: serde_json::Value = res.json().await.unwrap();
    assert_eq!(me["id"].as_str().unwrap(), user_id.to_string());
    assert_eq!(me["roles"], json!(["user"]));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();
    register(&client, &srv.base_url, "bob@example.com", "Bob").await;

    let wrong = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "bob@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    let unknown = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "nobody@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let wrong_body: serde_json::Value = wrong.json().await.unwrap();
    let unknown_body: serde_json::Value = unknown.json().await.unwrap();
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (user_id, _) = register(&client, &srv.base_url, "carol@example.com", "Carol").await;

    // Well-formed, unexpired claims for a real account, but signed with the
    // wrong secret.
    #[derive(serde::Serialize)]
    struct Claims {
        sub: Uuid,
        email: String,
        name: String,
        roles: Vec<String>,
        iat: i64,
        exp: i64,
    }
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: "carol@example.com".to_string(),
        name: "Carol".to_string(),
        roles: vec!["user".to_string()],
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };
    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/auth/validate", srv.base_url))
        .json(&json!({ "token": forged }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["valid"], json!(false));
}

#[tokio::test]
async fn validate_accepts_a_fresh_token() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (_, token) = register(&client, &srv.base_url, "dave@example.com", "Dave").await;

    let res = client
        .post(format!("{}/auth/validate", srv.base_url))
        .json(&json!({ "token": token }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["valid"], json!(true));
}

/// The grant/revoke round trip: A cannot see B's file, can after a grant,
/// cannot again after the revoke.
#[tokio::test]
async fn grant_and_revoke_round_trip() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (a_id, a_token) = register(&client, &srv.base_url, "a@example.com", "User A").await;
    let (_b_id, b_token) = register(&client, &srv.base_url, "b@example.com", "User B").await;

    // B uploads; creation is always allowed for authenticated users.
    let file_id = upload(&client, &srv.base_url, &b_token, "shared.txt").await;

    // A has no access.
    let res = client
        .get(format!("{}/files/{}", srv.base_url, file_id))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // B grants A read.
    let res = client
        .post(format!("{}/files/{}/permissions", srv.base_url, file_id))
        .bearer_auth(&b_token)
        .json(&json!({ "target_user_id": a_id, "permission": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Now A can download and sees exactly one ledger entry.
    let res = client
        .get(format!("{}/files/{}", srv.base_url, file_id))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "file content for tests");

    let res = client
        .get(format!("{}/files/{}/permissions", srv.base_url, file_id))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    let entries: serde_json::Value = res.json().await.unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["permission"], json!(1));

    // B revokes; A is locked out again and the entry is gone.
    let res = client
        .delete(format!("{}/files/{}/permissions", srv.base_url, file_id))
        .bearer_auth(&b_token)
        .json(&json!({ "target_user_id": a_id, "permission": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/files/{}", srv.base_url, file_id))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // With the read bit gone, the interception adapter now blocks even the
    // listing call (GET derives the read requirement from the method).
    let res = client
        .get(format!("{}/files/{}/permissions", srv.base_url, file_id))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_has_full_access_and_outsiders_cannot_grant_themselves() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (_, owner_token) = register(&client, &srv.base_url, "owner@example.com", "Owner").await;
    let (thief_id, thief_token) =
        register(&client, &srv.base_url, "thief@example.com", "Thief").await;

    let file_id = upload(&client, &srv.base_url, &owner_token, "private.txt").await;

    // Owner: metadata, update, download all work with zero ledger entries.
    let res = client
        .get(format!("{}/files/{}/metadata", srv.base_url, file_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(format!("{}/files/{}/metadata", srv.base_url, file_id))
        .bearer_auth(&owner_token)
        .json(&json!({ "metadata": { "label": "secret" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["custom_metadata"]["label"], json!("secret"));

    // An outsider cannot grant themselves access.
    let res = client
        .post(format!("{}/files/{}/permissions", srv.base_url, file_id))
        .bearer_auth(&thief_token)
        .json(&json!({ "target_user_id": thief_id, "permission": 15 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // And still cannot read the file.
    let res = client
        .get(format!("{}/files/{}", srv.base_url, file_id))
        .bearer_auth(&thief_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn administrator_has_blanket_access() {
    let mut config = AppConfig::for_tests(JWT_SECRET);
    config.admin = Some(AdminSeed {
        email: "admin@example.com".to_string(),
        password: "Admin@12345".to_string(),
    });
    let srv = TestServer::spawn(config).await;
    let client = reqwest::Client::new();

    let (_, user_token) = register(&client, &srv.base_url, "worker@example.com", "Worker").await;
    let file_id = upload(&client, &srv.base_url, &user_token, "somefile.txt").await;

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "admin@example.com", "password": "Admin@12345" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let admin_token = body["token"].as_str().unwrap().to_string();

    // Admin reads someone else's file without any grant.
    let res = client
        .get(format!("{}/files/{}", srv.base_url, file_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Resource-less search is blanket-allowed for admins...
    let res = client
        .get(format!("{}/files?search=somefile", srv.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let results: serde_json::Value = res.json().await.unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);

    // ...and for an unknown id the admin sees not-found, not forbidden.
    let res = client
        .get(format!("{}/files/{}", srv.base_url, Uuid::now_v7()))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Admin can soft-delete; the file then disappears from search.
    let res = client
        .delete(format!("{}/files/{}", srv.base_url, file_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/files?search=somefile", srv.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let results: serde_json::Value = res.json().await.unwrap();
    assert!(results.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_is_not_available_to_base_users() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (_, token) = register(&client, &srv.base_url, "plain@example.com", "Plain").await;
    upload(&client, &srv.base_url, &token, "mine.txt").await;

    // Resource-less view is not the upload capability, so it is denied for
    // the base role.
    let res = client
        .get(format!("{}/files?search=mine", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unparsable_file_id_is_treated_as_resource_less() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (_, token) = register(&client, &srv.base_url, "eve@example.com", "Eve").await;

    // "not-a-uuid" does not parse, so the guard evaluates a resource-less
    // download, which only blanket roles pass.
    let res = client
        .get(format!("{}/files/not-a-uuid", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn accessible_listing_follows_grants_and_soft_deletes() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (a_id, a_token) = register(&client, &srv.base_url, "lista@example.com", "A").await;
    let (_, b_token) = register(&client, &srv.base_url, "listb@example.com", "B").await;

    let file_id = upload(&client, &srv.base_url, &b_token, "visible.txt").await;

    let accessible = |token: String| {
        let client = client.clone();
        let url = format!("{}/files/accessible?capability=file.view", srv.base_url);
        async move {
            let res = client.get(url).bearer_auth(token).send().await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            res.json::<serde_json::Value>().await.unwrap()
        }
    };

    // Nothing granted yet.
    let body = accessible(a_token.clone()).await;
    assert!(body.as_array().unwrap().is_empty());

    let res = client
        .post(format!("{}/files/{}/permissions", srv.base_url, file_id))
        .bearer_auth(&b_token)
        .json(&json!({ "target_user_id": a_id, "permission": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = accessible(a_token.clone()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"].as_str().unwrap(), file_id.to_string());

    // Soft-deleting the file removes it from the listing without touching
    // the ledger.
    let res = client
        .delete(format!("{}/files/{}", srv.base_url, file_id))
        .bearer_auth(&b_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = accessible(a_token).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_mask_values_are_rejected() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let (owner_id, owner_token) =
        register(&client, &srv.base_url, "mask@example.com", "Masker").await;
    let file_id = upload(&client, &srv.base_url, &owner_token, "bits.txt").await;

    for bad in [0u8, 16, 255] {
        let res = client
            .post(format!("{}/files/{}/permissions", srv.base_url, file_id))
            .bearer_auth(&owner_token)
            .json(&json!({ "target_user_id": owner_id, "permission": bad }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "mask {bad}");
    }
}
