//! Session operations outside the happy login path: startup hydration of a
//! persisted credential and account registration.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bookteria_api::identity::{self, RegistrationRequest};
use bookteria_session::mocks::{MockTransport, envelope_response, status_response};
use bookteria_session::{Client, ClientConfig};
use chrono::{Duration, Utc};

fn jwt(sub: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({"sub": sub, "userId": "u-1", "scope": "ROLE_USER"})
            .to_string()
            .as_bytes(),
    );
    format!("{header}.{payload}.sig")
}

fn test_config() -> ClientConfig {
    ClientConfig::new("http://test".to_string())
}

#[tokio::test]
async fn hydrate_installs_grant_and_fetches_identity_in_background() {
    let mock = MockTransport::respond_with(|request| {
        if request.path == identity::MY_INFO {
            Ok(envelope_response(serde_json::json!({
                "id": "u-1",
                "username": "alice",
                "roles": ["USER", "ADMIN"],
            })))
        } else {
            Ok(status_response(404, &serde_json::json!({})))
        }
    });
    let client = Client::with_transport(mock.clone(), test_config());

    client.hydrate(jwt("alice"), Some(Utc::now() + Duration::hours(1)));

    // The provisional token-decoded identity is usable immediately; the
    // identity fetch has not blocked hydration.
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().roles(), vec!["USER"]);

    // The background fetch eventually replaces it with the server record.
    while client.session().roles() != vec!["USER", "ADMIN"] {
        tokio::task::yield_now().await;
    }
    assert_eq!(mock.request_count(), 1);
    assert_eq!(mock.requests()[0].path, identity::MY_INFO);
}

#[tokio::test]
async fn hydrate_discards_expired_grant() {
    let mock = MockTransport::fixed(200, serde_json::json!({"result": {}}));
    let client = Client::with_transport(mock.clone(), test_config());

    client.hydrate(jwt("alice"), Some(Utc::now() - Duration::hours(1)));
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }

    assert!(client.session().credential().is_none());
    assert!(!client.session().is_authenticated());
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn hydrate_discards_undecodable_credential() {
    let mock = MockTransport::fixed(200, serde_json::json!({"result": {}}));
    let client = Client::with_transport(mock.clone(), test_config());

    client.hydrate("not-a-jwt".to_string(), None);
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }

    assert!(client.session().credential().is_none());
    assert!(!client.session().is_authenticated());
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn hydrate_keeps_provisional_identity_when_fetch_fails() {
    let mock = MockTransport::fixed(503, serde_json::json!({"message": "maintenance"}));
    let client = Client::with_transport(mock.clone(), test_config());

    client.hydrate(jwt("alice"), Some(Utc::now() + Duration::hours(1)));
    while mock.request_count() == 0 {
        tokio::task::yield_now().await;
    }
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }

    // The failed fetch is contained: the session stays usable off the
    // token-decoded identity.
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().identity().unwrap().username, "alice");
}

#[tokio::test]
async fn register_creates_account_without_logging_in() {
    let mock = MockTransport::respond_with(|request| {
        if request.path == identity::REGISTRATION {
            Ok(envelope_response(serde_json::json!({
                "id": "u-2",
                "username": "bob",
                "roles": ["USER"],
            })))
        } else {
            Ok(status_response(404, &serde_json::json!({})))
        }
    });
    let client = Client::with_transport(mock.clone(), test_config());

    let registration = RegistrationRequest::new("bob", "s3cret")
        .with_first_name("Bob")
        .with_dob("1990-05-01");
    let user = client.register(registration).await.unwrap();

    assert_eq!(user.username, "bob");
    assert_eq!(user.id, "u-2");
    // Registration does not start a session.
    assert!(!client.session().is_authenticated());
    assert!(client.session().credential().is_none());

    let sent = mock.requests();
    assert_eq!(sent.len(), 1);
    let body = sent[0].body.clone().unwrap();
    assert_eq!(body["username"], "bob");
    assert_eq!(body["firstName"], "Bob");
    assert_eq!(body["dob"], "1990-05-01");
    assert!(body.get("lastName").is_none());
}
