//! End-to-end token lifecycle tests against the in-memory backend.
//!
//! These tests drive the full engine: login, refresh rotation, replay
//! detection, logout, and targeted access-token revocation.

use std::sync::Arc;

use async_trait::async_trait;

use keymaster_auth::middleware::Authenticator;
use keymaster_auth::storage::IdentityProvider;
use keymaster_auth::{
    AuthConfig, AuthError, AuthResult, JwtCodec, Principal, RefreshTokenStore, TokenService,
    TokenType,
};
use keymaster_auth_memory::{MemoryRefreshTokenStore, MemoryRevocationIndex};

/// Fixed-table identity provider for tests.
struct TestIdentityProvider;

#[async_trait]
impl IdentityProvider for TestIdentityProvider {
    async fn verify_credentials(&self, identifier: &str, secret: &str) -> AuthResult<Principal> {
        match (identifier, secret) {
            ("alice", "correct-horse") => Ok(Principal::new("alice", "read write")),
            ("bob", "battery-staple") => Ok(Principal::new("bob", "read")),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

struct Harness {
    service: TokenService,
    authenticator: Authenticator,
    store: Arc<MemoryRefreshTokenStore>,
}

fn harness() -> Harness {
    harness_with(AuthConfig::default)
}

fn harness_with(make_config: impl FnOnce() -> AuthConfig) -> Harness {
    let mut config = make_config();
    config.issuer = "https://auth.example.com".to_string();
    // HMAC keys keep test startup fast
    config.signing.algorithm = "HS256".to_string();

    let codec = Arc::new(JwtCodec::from_config(&config).unwrap());
    let store = Arc::new(MemoryRefreshTokenStore::new());
    let index = Arc::new(MemoryRevocationIndex::new());

    let authenticator = Authenticator::new(codec.clone(), index.clone(), &config);
    let service = TokenService::new(
        codec,
        Arc::new(TestIdentityProvider),
        store.clone(),
        index,
        config,
    );

    Harness {
        service,
        authenticator,
        store,
    }
}

fn token_id(service: &TokenService, refresh_token: &str) -> uuid::Uuid {
    service
        .codec()
        .decode(refresh_token, TokenType::Refresh)
        .unwrap()
        .token_id()
        .unwrap()
}

#[tokio::test]
async fn login_issues_validatable_pair() {
    let h = harness();

    let pair = h.service.login("alice", "correct-horse").await.unwrap();
    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, 900);

    let ctx = h.authenticator.authenticate(&pair.access_token).await.unwrap();
    assert_eq!(ctx.subject(), "alice");
    assert!(ctx.has_scope("write"));

    // The two tokens are distinct credentials with distinct ids
    let access = h
        .service
        .codec()
        .decode(&pair.access_token, TokenType::Access)
        .unwrap();
    let refresh = h
        .service
        .codec()
        .decode(&pair.refresh_token, TokenType::Refresh)
        .unwrap();
    assert_ne!(access.jti, refresh.jti);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let h = harness();
    assert!(matches!(
        h.service.login("alice", "wrong").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn refresh_rotates_exactly_once() {
    let h = harness();

    let first = h.service.login("alice", "correct-horse").await.unwrap();
    let second = h.service.refresh(&first.refresh_token).await.unwrap();

    // The replacement works, the original is consumed
    assert!(h.authenticator.authenticate(&second.access_token).await.is_ok());
    let replay = h.service.refresh(&first.refresh_token).await;
    assert!(matches!(replay, Err(AuthError::AlreadyRotated)));

    // Replay detection revoked the replacement too
    let second_id = token_id(&h.service, &second.refresh_token);
    assert_eq!(
        h.store.status(second_id).await.unwrap(),
        keymaster_auth::RefreshTokenStatus::Revoked
    );
    assert!(matches!(
        h.service.refresh(&second.refresh_token).await,
        Err(AuthError::Revoked)
    ));
}

#[tokio::test]
async fn chain_revocation_spares_outstanding_access_tokens() {
    let h = harness();

    let first = h.service.login("alice", "correct-horse").await.unwrap();
    let second = h.service.refresh(&first.refresh_token).await.unwrap();

    h.service.logout(&second.refresh_token).await.unwrap();

    // Refresh chain is dead...
    assert!(matches!(
        h.service.refresh(&second.refresh_token).await,
        Err(AuthError::Revoked)
    ));
    // ...but the stateless access token rides out its own expiry
    assert!(h.authenticator.authenticate(&first.access_token).await.is_ok());
    assert!(h.authenticator.authenticate(&second.access_token).await.is_ok());
}

#[tokio::test]
async fn targeted_access_token_revocation() {
    let h = harness();

    let pair = h.service.login("alice", "correct-horse").await.unwrap();
    let claims = h
        .service
        .codec()
        .decode(&pair.access_token, TokenType::Access)
        .unwrap();

    let expires_at = time::OffsetDateTime::from_unix_timestamp(claims.exp).unwrap();
    h.service
        .revoke_access_token(&claims.jti, expires_at)
        .await
        .unwrap();

    // Effective on the next validation, before natural expiry
    assert!(matches!(
        h.authenticator.authenticate(&pair.access_token).await,
        Err(AuthError::Revoked)
    ));
}

#[tokio::test]
async fn access_revocation_flag_disables_index_lookup() {
    let h = harness_with(|| AuthConfig {
        access_token_revocation: false,
        ..AuthConfig::default()
    });

    let pair = h.service.login("alice", "correct-horse").await.unwrap();
    assert!(matches!(
        h.service
            .revoke_access_token("some-jti", time::OffsetDateTime::now_utc())
            .await,
        Err(AuthError::Configuration { .. })
    ));
    assert!(h.authenticator.authenticate(&pair.access_token).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_refresh_has_single_winner() {
    let h = harness();
    let pair = h.service.login("alice", "correct-horse").await.unwrap();

    let service = Arc::new(h.service);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        let token = pair.refresh_token.clone();
        handles.push(tokio::spawn(async move { service.refresh(&token).await }));
    }

    let mut winners = 0;
    let mut rejected = 0;
    let mut winner_pair = None;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(pair) => {
                winners += 1;
                winner_pair = Some(pair);
            }
            Err(AuthError::AlreadyRotated) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(rejected, 7);

    // The detected replay burned the whole chain, winner's fresh token included
    let root_id = token_id(&service, &pair.refresh_token);
    assert_eq!(
        h.store.status(root_id).await.unwrap(),
        keymaster_auth::RefreshTokenStatus::Revoked
    );
    let winner_id = token_id(&service, &winner_pair.unwrap().refresh_token);
    assert_eq!(
        h.store.status(winner_id).await.unwrap(),
        keymaster_auth::RefreshTokenStatus::Revoked
    );
}

#[tokio::test]
async fn subjects_are_isolated() {
    let h = harness();

    let alice = h.service.login("alice", "correct-horse").await.unwrap();
    let bob = h.service.login("bob", "battery-staple").await.unwrap();

    h.service.logout(&alice.refresh_token).await.unwrap();

    // Bob's chain is untouched
    assert!(h.service.refresh(&bob.refresh_token).await.is_ok());

    let ctx = h.authenticator.authenticate(&bob.access_token).await.unwrap();
    assert_eq!(ctx.subject(), "bob");
    assert!(!ctx.has_scope("write"));
}
