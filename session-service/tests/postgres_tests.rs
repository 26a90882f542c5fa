mod common;

use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use common::TestDb;
use session_service::domain::session::errors::RefreshTokenError;
use session_service::domain::session::models::RefreshToken;
use session_service::domain::session::ports::RefreshTokenRepository;
use session_service::domain::user::errors::UserError;
use session_service::domain::user::models::User;
use session_service::domain::user::models::UserId;
use session_service::domain::user::models::Username;
use session_service::domain::user::ports::UserRepository;
use session_service::domain::visitor::ports::VisitorRecorder;
use session_service::outbound::repositories::PostgresRefreshTokenRepository;
use session_service::outbound::repositories::PostgresUserRepository;
use session_service::outbound::repositories::PostgresVisitorRecorder;

fn at(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap()
}

fn user(name: &str) -> User {
    User::new(
        Username::new(name.to_string()).unwrap(),
        "$argon2id$stub".to_string(),
        at(1_700_000_000),
    )
}

/// Insert an owner row; refresh tokens reference users.
async fn owner(db: &TestDb, name: &str) -> UserId {
    PostgresUserRepository::new(db.pool.clone())
        .create(user(name))
        .await
        .expect("Failed to create owner")
        .id
}

fn token(
    owner: UserId,
    value: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> RefreshToken {
    RefreshToken {
        user_id: owner,
        token: value.to_string(),
        expires_at,
        created_at,
        revoked: false,
    }
}

#[tokio::test]
async fn test_user_round_trip() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let users = PostgresUserRepository::new(db.pool.clone());
    let username = Username::new("alice".to_string()).unwrap();

    assert!(!users.exists_by_username(&username).await.unwrap());

    let created = users.create(user("alice")).await.unwrap();

    assert!(users.exists_by_username(&username).await.unwrap());
    let found = users.find_by_username(&username).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.password_hash, "$argon2id$stub");
    assert_eq!(found.registered_at, at(1_700_000_000));
    assert!(users.find_by_id(&created.id).await.unwrap().is_some());
    assert!(users.find_by_id(&UserId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_username_maps_to_already_exists() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let users = PostgresUserRepository::new(db.pool.clone());

    users.create(user("alice")).await.unwrap();
    let result = users.create(user("alice")).await;

    assert!(matches!(result, Err(UserError::UsernameAlreadyExists(name)) if name == "alice"));
}

#[tokio::test]
async fn test_duplicate_refresh_token_maps_to_already_exists() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let owner = owner(&db, "alice").await;
    let tokens = PostgresRefreshTokenRepository::new(db.pool.clone());
    let record = token(owner, "t1", at(1_000), at(2_000));

    tokens.create(&record).await.unwrap();
    let result = tokens.create(&record).await;

    assert!(matches!(result, Err(RefreshTokenError::AlreadyExists)));
    assert_eq!(tokens.find_by_token("t1").await.unwrap(), Some(record));
}

#[tokio::test]
async fn test_revoke_if_active_succeeds_exactly_once() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let owner = owner(&db, "alice").await;
    let tokens = PostgresRefreshTokenRepository::new(db.pool.clone());
    tokens
        .create(&token(owner, "t1", at(1_000), at(2_000)))
        .await
        .unwrap();

    assert!(tokens.revoke_if_active("t1").await.unwrap());
    assert!(!tokens.revoke_if_active("t1").await.unwrap());
    assert!(!tokens.revoke_if_active("unknown").await.unwrap());

    assert!(tokens.find_active_by_token("t1").await.unwrap().is_none());
    assert!(tokens.find_by_token("t1").await.unwrap().unwrap().revoked);
}

#[tokio::test]
async fn test_concurrent_revoke_if_active_single_winner() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let owner = owner(&db, "alice").await;
    let tokens = Arc::new(PostgresRefreshTokenRepository::new(db.pool.clone()));
    tokens
        .create(&token(owner, "contended", at(1_000), at(2_000)))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tokens = Arc::clone(&tokens);
            tokio::spawn(async move { tokens.revoke_if_active("contended").await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_revoke_all_for_user_counts_only_active_tokens() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let alice = owner(&db, "alice").await;
    let bob = owner(&db, "bob").await;
    let tokens = PostgresRefreshTokenRepository::new(db.pool.clone());
    for (owner, value) in [(alice, "a1"), (alice, "a2"), (alice, "a3"), (bob, "b1")] {
        tokens
            .create(&token(owner, value, at(1_000), at(2_000)))
            .await
            .unwrap();
    }
    tokens.revoke("a1").await.unwrap();

    assert_eq!(tokens.revoke_all_for_user(&alice).await.unwrap(), 2);
    assert_eq!(tokens.revoke_all_for_user(&alice).await.unwrap(), 0);
    assert!(tokens.find_active_by_token("b1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_expired_removes_only_rows_before_now() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let owner = owner(&db, "alice").await;
    let tokens = PostgresRefreshTokenRepository::new(db.pool.clone());
    let now = at(10_000);

    let expired = token(owner, "expired", at(0), now - Duration::seconds(1));
    let boundary = token(owner, "boundary", at(0), now);
    let live = token(owner, "live", at(0), now + Duration::hours(1));
    let mut revoked_live = token(owner, "revoked-live", at(0), now + Duration::hours(1));
    revoked_live.revoked = true;
    for record in [&expired, &boundary, &live, &revoked_live] {
        tokens.create(record).await.unwrap();
    }

    assert_eq!(tokens.delete_expired(now).await.unwrap(), 1);

    assert!(tokens.find_by_token("expired").await.unwrap().is_none());
    assert_eq!(tokens.find_by_token("boundary").await.unwrap(), Some(boundary));
    assert_eq!(tokens.find_by_token("live").await.unwrap(), Some(live));
    assert_eq!(
        tokens.find_by_token("revoked-live").await.unwrap(),
        Some(revoked_live)
    );
}

#[tokio::test]
async fn test_record_visit_keeps_one_row_per_user() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let owner = owner(&db, "alice").await;
    let recorder = PostgresVisitorRecorder::new(db.pool.clone());

    recorder.record_visit(&owner).await.unwrap();
    recorder.record_visit(&owner).await.unwrap();

    let visits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visitors WHERE user_id = $1")
        .bind(owner.0)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(visits, 1);
}
