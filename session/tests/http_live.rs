//! End-to-end tests over the production HTTP transport against a local
//! mock server.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bookteria_api::identity::LoginRequest;
use bookteria_session::{ApiError, Client, ClientConfig};
use chrono::{Duration, Utc};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jwt(sub: &str, scope: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({"sub": sub, "userId": "u-1", "scope": scope})
            .to_string()
            .as_bytes(),
    );
    format!("{header}.{payload}.sig")
}

fn grant_body(token: &str) -> serde_json::Value {
    serde_json::json!({
        "result": {
            "token": token,
            "expiryTime": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        }
    })
}

#[tokio::test]
async fn login_attaches_bearer_header_and_installs_identity() {
    let server = MockServer::start().await;
    let token = jwt("alice", "ROLE_USER ROLE_ADMIN");

    Mock::given(method("POST"))
        .and(path("/identity/auth/token"))
        .and(body_json(
            serde_json::json!({"username": "alice", "password": "s3cret"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body(&token)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/identity/users/my-info"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {
                "id": "u-1",
                "username": "alice",
                "roles": ["USER", "ADMIN"],
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig::new(server.uri())).unwrap();
    let user = client
        .login(LoginRequest::new("alice", "s3cret"))
        .await
        .unwrap();

    assert_eq!(user.username, "alice");
    assert!(client.session().is_authenticated());
    assert!(client.session().has_role("ADMIN"));
    assert_eq!(client.session().credential().as_deref(), Some(token.as_str()));
    assert!(!client.loading().busy());
}

#[tokio::test]
async fn server_error_message_surfaces_in_typed_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/auth/token"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"message": "identity service down"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig::new(server.uri())).unwrap();
    let outcome = client.login(LoginRequest::new("alice", "s3cret")).await;

    match outcome {
        Err(ApiError::Server {
            status, message, ..
        }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "identity service down");
        }
        other => panic!("expected server error, got {other:?}"),
    }
    assert!(!client.session().is_authenticated());
    assert_eq!(client.notifier().shown_count(), 1);
}

#[tokio::test]
async fn logout_clears_locally_and_invalidates_remotely() {
    let server = MockServer::start().await;
    let token = jwt("alice", "ROLE_USER");

    Mock::given(method("POST"))
        .and(path("/identity/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body(&token)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/identity/users/my-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {"id": "u-1", "username": "alice", "roles": ["USER"]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identity/auth/logout"))
        .and(body_json(serde_json::json!({"token": token})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig::new(server.uri())).unwrap();
    client
        .login(LoginRequest::new("alice", "s3cret"))
        .await
        .unwrap();
    assert!(client.session().is_authenticated());

    client.logout().await;
    assert!(!client.session().is_authenticated());
    assert!(client.session().credential().is_none());
    // Remote invalidation stays silent in the UI.
    assert!(!client.loading().busy());
}
