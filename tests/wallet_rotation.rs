// Wallet key rotation: the admin credential is only ever judged by the agent.

use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;

use meteora_lp_console::agent::{AgentClient, ROTATE_KEY_PATH};
use meteora_lp_console::errors::CommandError;

fn client(url: &str) -> AgentClient {
    AgentClient::new(url, "X-Admin-Key", Duration::from_secs(5))
        .unwrap()
        .with_secret(Some("s3cret".to_string()))
}

fn new_keypair() -> String {
    bs58::encode([7u8; 64]).into_string()
}

fn public_key() -> String {
    bs58::encode([9u8; 32]).into_string()
}

#[tokio::test]
async fn rotation_returns_new_public_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", ROTATE_KEY_PATH)
        .match_header("X-Admin-Key", "s3cret")
        .match_body(Matcher::Json(json!({
            "newKey": new_keypair(),
            "adminCredential": "operator-passphrase"
        })))
        .with_status(200)
        .with_body(json!({ "success": true, "publicKey": public_key() }).to_string())
        .create_async()
        .await;

    let key = client(&server.url())
        .rotate_wallet_key(&new_keypair(), "operator-passphrase")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(key, public_key());
}

#[tokio::test]
async fn rejected_credential_is_reported_from_server() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", ROTATE_KEY_PATH)
        .with_status(403)
        .with_body(json!({ "success": false, "error": "invalid admin credential" }).to_string())
        .create_async()
        .await;

    let err = client(&server.url())
        .rotate_wallet_key(&new_keypair(), "guess")
        .await
        .unwrap_err();

    match err {
        CommandError::KeyRotationRejected(reason) => assert_eq!(reason, "invalid admin credential"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn missing_shared_secret_is_an_auth_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", ROTATE_KEY_PATH)
        .with_status(401)
        .create_async()
        .await;

    let err = client(&server.url())
        .rotate_wallet_key(&new_keypair(), "operator-passphrase")
        .await
        .unwrap_err();

    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn malformed_key_is_refused_locally() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", ROTATE_KEY_PATH)
        .expect(0)
        .create_async()
        .await;

    let client = client(&server.url());
    let short_key = bs58::encode([1u8; 32]).into_string();

    assert!(matches!(
        client.rotate_wallet_key(&short_key, "operator-passphrase").await,
        Err(CommandError::InvalidInput(_))
    ));
    assert!(matches!(
        client.rotate_wallet_key("not base58 0OIl", "operator-passphrase").await,
        Err(CommandError::InvalidInput(_))
    ));
    assert!(matches!(
        client.rotate_wallet_key(&new_keypair(), "").await,
        Err(CommandError::InvalidInput(_))
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn success_without_valid_public_key_is_a_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", ROTATE_KEY_PATH)
        .with_status(200)
        .with_body(json!({ "success": true, "publicKey": "short" }).to_string())
        .create_async()
        .await;

    let err = client(&server.url())
        .rotate_wallet_key(&new_keypair(), "operator-passphrase")
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::Decode(_)));
}
