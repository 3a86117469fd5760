//! End-to-end find and put operations over an in-memory provider

#![allow(clippy::unwrap_used)]

mod common;

use common::{MemoryConnector, TOKEN, token};
use shipyard_1password::secrets::{
    CREATED_ON, EXPIRES_ON, Field, Item, ROTATION_FUNCTION, ROTATION_SPECS_SECRET, Section,
    VaultOverview,
};
use shipyard_1password::{
    FindSecretRequest, OnePassword, PutSecretRequest, RotationSpec, RotationSpecRequest,
};
use shipyard_secrets::{SecretError, SecureSecret};
use std::time::Duration;

fn db_creds() -> Item {
    Item::new("i-db", "db-creds", "v-prod")
        .with_section(Section::new("s-rot", "rotation"))
        .with_section(Section::new("s-stg", "staging"))
        .with_field(Field::new("username", "admin"))
        .with_field(Field::new("password", "xyz"))
        .with_field(Field::new("password", "stg-pw").in_section("s-stg"))
        .with_field(Field::new(EXPIRES_ON, "2025-01-01").in_section("s-rot"))
        .with_field(Field::new(CREATED_ON, "2024-01-01").in_section("s-rot"))
        .with_field(Field::new(ROTATION_FUNCTION, "rotateDbPassword").in_section("s-rot"))
}

fn connector() -> MemoryConnector {
    MemoryConnector::new(
        vec![
            vec![VaultOverview::new("v-dev", "dev")],
            vec![
                VaultOverview::new("v-stg", "staging"),
                VaultOverview::new("v-prod", "prod"),
            ],
        ],
        vec![
            Item::new("i-other", "db-creds", "v-stg").with_field(Field::new("password", "wrong")),
            db_creds(),
        ],
    )
}

#[tokio::test]
async fn find_secret_returns_field_named_handle() {
    let op = OnePassword::new(connector());
    let handle = op
        .find_secret(&token(), &FindSecretRequest::new("prod", "db-creds", "password"))
        .await
        .unwrap();

    assert_eq!(handle.name(), "password");
    assert_eq!(handle.expose(), "xyz");
}

#[tokio::test]
async fn find_secret_json_request_with_empty_section_is_unscoped() {
    let item = Item::new("i-db", "db-creds", "v-prod")
        .with_section(Section::new("add more", ""))
        .with_field(Field::new("password", "xyz"));
    let op = OnePassword::new(MemoryConnector::new(
        vec![vec![VaultOverview::new("v-prod", "prod")]],
        vec![item],
    ));
    let request: FindSecretRequest = serde_json::from_str(
        r#"{"vault":"prod","item":"db-creds","field":"password","section":""}"#,
    )
    .unwrap();

    let handle = op.find_secret(&token(), &request).await.unwrap();
    assert_eq!(handle.expose(), "xyz");
}

#[tokio::test]
async fn find_secret_scoped_to_section() {
    let op = OnePassword::new(connector());
    let request = FindSecretRequest::new("prod", "db-creds", "password").with_section("staging");
    let handle = op.find_secret(&token(), &request).await.unwrap();
    assert_eq!(handle.expose(), "stg-pw");
}

#[tokio::test]
async fn find_secret_unknown_section_fails() {
    let op = OnePassword::new(connector());
    let request =
        FindSecretRequest::new("prod", "db-creds", "password").with_section("nonexistent");
    let err = op.find_secret(&token(), &request).await.unwrap_err();
    assert!(matches!(err, SecretError::SectionNotFound { ref section, .. } if section == "nonexistent"));
}

#[tokio::test]
async fn find_secret_unknown_field_fails() {
    let op = OnePassword::new(connector());
    let err = op
        .find_secret(&token(), &FindSecretRequest::new("prod", "db-creds", "api-key"))
        .await
        .unwrap_err();
    assert!(matches!(err, SecretError::FieldNotFound { .. }));
    assert!(err.is_lookup_failure());
}

#[tokio::test]
async fn vault_not_found_after_exhausting_all_pages() {
    let connector = connector();
    let op = OnePassword::new(connector.clone());
    let err = op
        .find_secret(&token(), &FindSecretRequest::new("qa", "db-creds", "password"))
        .await
        .unwrap_err();

    assert!(matches!(err, SecretError::VaultNotFound { ref vault } if vault == "qa"));
    assert_eq!(connector.with(|s| s.pages_fetched), 2);
}

#[tokio::test]
async fn vault_scan_stops_at_first_match() {
    let connector = connector();
    let op = OnePassword::new(connector.clone());
    op.find_secret(&token(), &FindSecretRequest::new("dev", "db-creds", "password"))
        .await
        .unwrap_err();
    assert_eq!(connector.with(|s| s.pages_fetched), 1);
}

#[tokio::test]
async fn item_not_found_names_the_vault() {
    let op = OnePassword::new(connector());
    let err = op
        .find_secret(&token(), &FindSecretRequest::new("dev", "db-creds", "password"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, SecretError::ItemNotFound { ref vault, ref item } if vault == "dev" && item == "db-creds")
    );
}

#[tokio::test]
async fn rotation_specs_serialized_as_json() {
    let op = OnePassword::new(connector());
    let handle = op
        .find_secret_rotation_specs(
            &token(),
            &RotationSpecRequest::new("prod", "db-creds", "rotation"),
        )
        .await
        .unwrap();

    assert_eq!(handle.name(), ROTATION_SPECS_SECRET);
    let spec: RotationSpec = serde_json::from_str(handle.expose()).unwrap();
    assert_eq!(spec.expires_on, "2025-01-01");
    assert_eq!(spec.created_on, "2024-01-01");
    assert_eq!(spec.rotation_function, "rotateDbPassword");
}

#[tokio::test]
async fn rotation_specs_missing_field_fails() {
    let mut item = db_creds();
    item.fields.retain(|f| f.title != ROTATION_FUNCTION);
    let op = OnePassword::new(MemoryConnector::new(
        vec![vec![VaultOverview::new("v-prod", "prod")]],
        vec![item],
    ));

    let err = op
        .find_secret_rotation_specs(
            &token(),
            &RotationSpecRequest::new("prod", "db-creds", "rotation"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SecretError::RotationSpecNotFound { .. }));
}

#[tokio::test]
async fn put_secret_creates_missing_item_then_writes_field() {
    let connector = connector();
    let op = OnePassword::new(connector.clone());
    let outcome = op
        .put_secret(
            &token(),
            &PutSecretRequest::new("prod", "api-creds", "token"),
            &SecureSecret::new("t0k3n".to_string()),
        )
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.item.title, "api-creds");
    assert_eq!(outcome.item.vault_id, "v-prod");
    connector.with(|s| {
        assert_eq!(s.created.len(), 1);
        assert_eq!(
            s.writes,
            [(outcome.item.id.clone(), "token".to_string(), "t0k3n".to_string())]
        );
    });

    let handle = op
        .find_secret(&token(), &FindSecretRequest::new("prod", "api-creds", "token"))
        .await
        .unwrap();
    assert_eq!(handle.expose(), "t0k3n");
}

#[tokio::test]
async fn put_secret_updates_existing_item() {
    let connector = connector();
    let op = OnePassword::new(connector.clone());
    let outcome = op
        .put_secret(
            &token(),
            &PutSecretRequest::new("prod", "db-creds", "password"),
            &SecureSecret::new("new-pw".to_string()),
        )
        .await
        .unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.item.id, "i-db");
    assert!(connector.with(|s| s.created.is_empty()));

    let handle = op
        .find_secret(&token(), &FindSecretRequest::new("prod", "db-creds", "password"))
        .await
        .unwrap();
    assert_eq!(handle.expose(), "new-pw");
}

#[tokio::test]
async fn put_secret_unknown_vault_does_not_create() {
    let connector = connector();
    let op = OnePassword::new(connector.clone());
    let err = op
        .put_secret(
            &token(),
            &PutSecretRequest::new("qa", "db-creds", "password"),
            &SecureSecret::new("x".to_string()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SecretError::VaultNotFound { .. }));
    assert!(connector.with(|s| s.created.is_empty() && s.writes.is_empty()));
}

#[tokio::test]
async fn each_operation_connects_once() {
    let connector = connector();
    let op = OnePassword::new(connector.clone());
    let request = FindSecretRequest::new("prod", "db-creds", "password");

    op.find_secret(&token(), &request).await.unwrap();
    op.find_secret(&token(), &request).await.unwrap();
    op.find_secret_rotation_specs(
        &token(),
        &RotationSpecRequest::new("prod", "db-creds", "rotation"),
    )
    .await
    .unwrap();

    assert_eq!(connector.with(|s| s.connects), 3);
}

#[tokio::test]
async fn rejected_credential_is_auth_error() {
    let op = OnePassword::new(connector());
    let bad = SecureSecret::new(format!("{TOKEN}-revoked"));
    let err = op
        .find_secret(&bad, &FindSecretRequest::new("prod", "db-creds", "password"))
        .await
        .unwrap_err();

    assert!(matches!(err, SecretError::Auth { .. }));
    assert!(!err.is_lookup_failure());
}

#[tokio::test]
async fn dropping_the_future_aborts_a_stalled_scan() {
    let connector = connector();
    connector.with(|s| s.hang_after = Some(2));
    let op = OnePassword::new(connector.clone());

    let token = token();
    let request = FindSecretRequest::new("prod", "db-creds", "password");
    let lookup = op.find_secret(&token, &request);
    let result = tokio::time::timeout(Duration::from_millis(50), lookup).await;

    assert!(result.is_err(), "lookup should still be pending");
    assert!(connector.with(|s| s.writes.is_empty()));
}
