use std::sync::Arc;

use chrono::{Duration, Utc};

use courier_core::{AppId, AppResult};
use courier_domain::AuthenticationMethod::{
    ClientCertificate, ClientCredentials, Cookie, CustomHeader, HttpBasic, QueryParameter,
};
use courier_domain::ServiceSecret;

use super::AuthenticationService;
use crate::test_fakes::{
    FakeSecretRepository, FakeTokenClient, PrefixEncryptor, encrypted, service_secret,
};

const URL: &str = "https://svc.example/pour?drink=coffee";
const BASE: &str = "https://svc.example";

fn service(
    secrets: Vec<ServiceSecret>,
    token_client: FakeTokenClient,
) -> (AuthenticationService, Arc<FakeSecretRepository>, Arc<FakeTokenClient>) {
    let repository = Arc::new(FakeSecretRepository::with_secrets(secrets));
    let token_client = Arc::new(token_client);
    let service = AuthenticationService::new(
        repository.clone(),
        Arc::new(PrefixEncryptor),
        token_client.clone(),
    );
    (service, repository, token_client)
}

fn client_credentials(app_id: AppId, order: i64, expires_in_minutes: i64) -> ServiceSecret {
    let mut secret = service_secret(app_id, order, ClientCredentials, &[BASE], "client-id", "client-secret");
    secret.token_url = Some("https://auth.example/token".to_owned());
    secret.access_token = Some(encrypted("cached-token"));
    secret.expires_at = Some(Utc::now() + Duration::minutes(expires_in_minutes));
    secret
}

#[tokio::test]
async fn earliest_basic_or_bearer_secret_owns_authorization() -> AppResult<()> {
    let app_id = AppId::new();
    let (service, _, token_client) = service(
        vec![
            client_credentials(app_id, 2, 30),
            service_secret(app_id, 1, HttpBasic, &[BASE], "barista", "espresso"),
            service_secret(app_id, 3, HttpBasic, &[BASE], "late", "ignored"),
        ],
        FakeTokenClient::default(),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert_eq!(augmentations.authorization(), Some("Basic YmFyaXN0YTplc3ByZXNzbw=="));
    assert_eq!(token_client.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn bearer_token_claims_authorization_when_first() -> AppResult<()> {
    let app_id = AppId::new();
    let (service, _, _) = service(
        vec![
            service_secret(app_id, 5, HttpBasic, &[BASE], "barista", "espresso"),
            client_credentials(app_id, 4, 30),
        ],
        FakeTokenClient::default(),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert_eq!(augmentations.authorization(), Some("Bearer cached-token"));
    Ok(())
}

#[tokio::test]
async fn first_client_certificate_wins() -> AppResult<()> {
    let app_id = AppId::new();
    let (service, _, _) = service(
        vec![
            service_secret(app_id, 2, ClientCertificate, &[BASE], "second-cert", "second-key"),
            service_secret(app_id, 1, ClientCertificate, &[BASE], "first-cert", "first-key"),
        ],
        FakeTokenClient::default(),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;
    let identity = augmentations.client_identity();

    assert_eq!(identity.map(|identity| identity.certificate_pem.as_str()), Some("first-cert"));
    assert_eq!(identity.map(|identity| identity.private_key_pem.as_str()), Some("first-key"));
    Ok(())
}

#[tokio::test]
async fn cookies_and_query_parameters_accumulate() -> AppResult<()> {
    let app_id = AppId::new();
    let (service, _, _) = service(
        vec![
            service_secret(app_id, 1, Cookie, &[BASE], "session", "abc"),
            service_secret(app_id, 2, QueryParameter, &[BASE], "key", "k1"),
            service_secret(app_id, 3, Cookie, &[BASE], "region", "eu"),
            service_secret(app_id, 4, QueryParameter, &[BASE], "tenant", "t1"),
            service_secret(app_id, 5, Cookie, &["https://other.example"], "skipped", "x"),
        ],
        FakeTokenClient::default(),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert_eq!(augmentations.cookies().len(), 2);
    assert_eq!(augmentations.cookie_header().as_deref(), Some("session=abc; region=eu"));
    assert_eq!(
        augmentations.query_parameters(),
        &[
            ("key".to_owned(), "k1".to_owned()),
            ("tenant".to_owned(), "t1".to_owned())
        ]
    );
    Ok(())
}

#[tokio::test]
async fn custom_authorization_header_yields_to_earlier_claim() -> AppResult<()> {
    let app_id = AppId::new();
    let (service, _, _) = service(
        vec![
            service_secret(app_id, 1, HttpBasic, &[BASE], "barista", "espresso"),
            service_secret(app_id, 2, CustomHeader, &[BASE], "AUTHORIZATION", "Token custom"),
            service_secret(app_id, 3, CustomHeader, &[BASE], "X-Api-Key", "k1"),
        ],
        FakeTokenClient::default(),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert_eq!(augmentations.authorization(), Some("Basic YmFyaXN0YTplc3ByZXNzbw=="));
    assert_eq!(augmentations.headers(), &[("X-Api-Key".to_owned(), "k1".to_owned())]);
    Ok(())
}

#[tokio::test]
async fn custom_authorization_header_may_claim_first() -> AppResult<()> {
    let app_id = AppId::new();
    let (service, _, _) = service(
        vec![
            service_secret(app_id, 1, CustomHeader, &[BASE], "Authorization", "Token custom"),
            service_secret(app_id, 2, HttpBasic, &[BASE], "barista", "espresso"),
        ],
        FakeTokenClient::default(),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert_eq!(augmentations.authorization(), Some("Token custom"));
    Ok(())
}

#[tokio::test]
async fn excluded_and_foreign_secrets_are_ignored() -> AppResult<()> {
    let app_id = AppId::new();
    let foreign = service_secret(AppId::new(), 1, HttpBasic, &[BASE], "other", "app");
    let (service, _, _) = service(
        vec![
            foreign,
            service_secret(app_id, 2, HttpBasic, &[BASE, "!https://svc.example/pour"], "barista", "x"),
        ],
        FakeTokenClient::default(),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert!(!augmentations.has_authorization());
    Ok(())
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_persisted() -> AppResult<()> {
    let app_id = AppId::new();
    let secret = client_credentials(app_id, 1, -5);
    let secret_id = secret.id;
    let (service, repository, token_client) = service(vec![secret], FakeTokenClient::default());

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert_eq!(augmentations.authorization(), Some("Bearer fresh-token-1"));
    assert_eq!(token_client.call_count(), 1);
    let calls = token_client.calls.lock().map(|calls| calls.clone()).unwrap_or_default();
    assert_eq!(
        calls,
        vec![(
            "https://auth.example/token".to_owned(),
            "client-id".to_owned(),
            "client-secret".to_owned()
        )]
    );

    let updates = repository.token_updates.lock().map(|updates| updates.clone()).unwrap_or_default();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, secret_id);
    assert_eq!(updates[0].1, encrypted("fresh-token-1"));
    assert!(updates[0].2 > Utc::now() + Duration::minutes(59));

    let second = service.augmentations_for(app_id, URL).await?;
    assert_eq!(second.authorization(), Some("Bearer fresh-token-1"));
    assert_eq!(token_client.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn secret_without_cached_token_triggers_refresh() -> AppResult<()> {
    let app_id = AppId::new();
    let mut secret = client_credentials(app_id, 1, 30);
    secret.access_token = None;
    secret.expires_at = None;
    let (service, _, token_client) = service(vec![secret], FakeTokenClient::default());

    service.augmentations_for(app_id, URL).await?;

    assert_eq!(token_client.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_drops_only_that_strategy() -> AppResult<()> {
    let app_id = AppId::new();
    let (service, repository, token_client) = service(
        vec![
            client_credentials(app_id, 1, -5),
            service_secret(app_id, 2, HttpBasic, &[BASE], "barista", "espresso"),
            service_secret(app_id, 3, QueryParameter, &[BASE], "key", "k1"),
        ],
        FakeTokenClient::failing(),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert_eq!(token_client.call_count(), 1);
    assert_eq!(repository.token_update_count(), 0);
    assert_eq!(augmentations.authorization(), Some("Basic YmFyaXN0YTplc3ByZXNzbw=="));
    assert_eq!(augmentations.query_parameters().len(), 1);
    Ok(())
}

#[tokio::test]
async fn oversized_token_lifetime_drops_only_that_strategy() -> AppResult<()> {
    let app_id = AppId::new();
    let (service, repository, token_client) = service(
        vec![
            client_credentials(app_id, 1, -5),
            service_secret(app_id, 2, QueryParameter, &[BASE], "key", "k1"),
        ],
        FakeTokenClient::with_lifetime(10_000_000_000_000),
    );

    let augmentations = service.augmentations_for(app_id, URL).await?;

    assert_eq!(token_client.call_count(), 1);
    assert_eq!(repository.token_update_count(), 0);
    assert_eq!(augmentations.authorization(), None);
    assert_eq!(
        augmentations.query_parameters(),
        &[("key".to_owned(), "k1".to_owned())]
    );
    Ok(())
}

#[tokio::test]
async fn undecryptable_secret_is_an_internal_error() {
    let app_id = AppId::new();
    let mut secret = service_secret(app_id, 1, Cookie, &[BASE], "session", "abc");
    secret.secret = b"plaintext".to_vec();
    let (service, _, _) = service(vec![secret], FakeTokenClient::default());

    let result = service.augmentations_for(app_id, URL).await;

    assert!(matches!(result, Err(courier_core::AppError::Internal(_))));
}
