//! Postgres-backed message store tests against an ephemeral instance.

use gemchat_core::chat::{ChatPage, MessageStore};
use gemchat_core::db::DbManager;
use gemchat_core::messages::PgMessageStore;
use gemchat_core::models::auth::Identity;
use gemchat_core::models::message::Role;
use sqlx::PgPool;

async fn start_db() -> (DbManager, PgPool) {
    let mut db = DbManager::ephemeral().await.expect("DbManager::ephemeral");
    db.setup().await.expect("db setup");
    db.start().await.expect("db start");
    let pool = PgPool::connect(&db.connection_url())
        .await
        .expect("connect to ephemeral PG");
    gemchat_core::migrate::migrate(&pool).await.expect("migrate");
    (db, pool)
}

#[tokio::test]
#[ignore = "requires PostgreSQL binaries on PATH"]
async fn messages_are_partitioned_by_owner_and_ordered() {
    let (mut db, pool) = start_db().await;
    let store = PgMessageStore::new(pool.clone());

    store.insert("ada@example.com", Role::User, "one").await.unwrap();
    store.insert("grace@example.com", Role::User, "other").await.unwrap();
    store.insert("ada@example.com", Role::Assistant, "two").await.unwrap();
    store.insert("ada@example.com", Role::User, "three").await.unwrap();

    let ada = store.list("ada@example.com").await.unwrap();
    let contents: Vec<&str> = ada.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
    assert_eq!(ada[1].role, Role::Assistant);
    assert!(ada.windows(2).all(|w| w[0].created_at <= w[1].created_at));

    assert_eq!(store.clear("ada@example.com").await.unwrap(), 3);
    assert!(store.list("ada@example.com").await.unwrap().is_empty());
    assert_eq!(store.list("grace@example.com").await.unwrap().len(), 1);

    pool.close().await;
    db.stop().await.expect("db stop");
}

#[tokio::test]
#[ignore = "requires PostgreSQL binaries on PATH"]
async fn page_reload_reflects_persisted_roles() {
    let (mut db, pool) = start_db().await;
    let store = PgMessageStore::new(pool.clone());
    let ada = Identity {
        user_id: "u-ada".into(),
        email: "ada@example.com".into(),
        name: None,
    };

    // A user turn whose reply never arrived, followed by a full turn.
    store.insert(&ada.email, Role::User, "lost").await.unwrap();
    store.insert(&ada.email, Role::User, "hi").await.unwrap();
    store.insert(&ada.email, Role::Assistant, "hello").await.unwrap();

    let mut page = ChatPage::new(Some(ada));
    assert_eq!(page.load(&store).await.unwrap(), 3);
    let roles: Vec<Role> = page.transcript().entries().iter().map(|e| e.role).collect();
    assert_eq!(roles, vec![Role::User, Role::User, Role::Assistant]);

    pool.close().await;
    db.stop().await.expect("db stop");
}
