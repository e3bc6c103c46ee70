//! Integration test — `PgAgentStore` against a real PostgreSQL.
//!
//! Set `DATABASE_URL` to run these; without it every test returns early.
//! Each test migrates into its own throwaway schema, so tests can run in
//! parallel against one database and exact row counts hold.

use agentry_core::agents::{AgentStore, PgAgentStore};
use agentry_core::migrate::migrate;
use agentry_core::models::agent::SocialProfile;
use agentry_core::uuid::uuidv7;
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

struct TestDb {
    admin: PgPool,
    schema: String,
    store: PgAgentStore,
}

impl TestDb {
    async fn connect() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping PostgreSQL store test");
            return None;
        };
        let options: PgConnectOptions = url.parse().expect("DATABASE_URL");

        let admin = PgPool::connect_with(options.clone())
            .await
            .expect("connect admin pool");
        let schema = format!("agentry_test_{}", uuidv7().simple());
        let create = format!("CREATE SCHEMA {schema}");
        sqlx::query(&create)
            .execute(&admin)
            .await
            .expect("create schema");

        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_with(options.options([("search_path", schema.as_str())]))
            .await
            .expect("connect test pool");
        migrate(&pool).await.expect("migrate");

        Some(Self {
            admin,
            schema,
            store: PgAgentStore::new(pool),
        })
    }

    async fn drop_schema(self) {
        self.store.pool().close().await;
        let drop = format!("DROP SCHEMA {} CASCADE", self.schema);
        sqlx::query(&drop)
            .execute(&self.admin)
            .await
            .expect("drop schema");
        self.admin.close().await;
    }
}

fn profile(payload: Value) -> SocialProfile {
    SocialProfile::from_value(payload).expect("profile")
}

#[tokio::test]
async fn first_insert_stores_profile_verbatim() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let payload = json!({
        "sub": "github|42",
        "name": null,
        "nickname": "octo",
        "email_verified": "true",
        "roles": [],
        "identities": [{"provider": "github", "user_id": 42, "isSocial": true}],
        "https://agentry.example/tenant": "acme"
    });

    let agent = db
        .store
        .upsert_verified("T1", &profile(payload.clone()))
        .await
        .expect("upsert");

    assert_eq!(agent.subject, "github|42");
    assert_eq!(agent.access_token.as_deref(), Some("T1"));
    assert_eq!(Value::from(agent.social_profile.clone()), payload);
    assert_eq!(db.store.count().await.expect("count"), 1);

    let by_token = db
        .store
        .find_by_access_token("T1")
        .await
        .expect("lookup")
        .expect("agent for T1");
    assert_eq!(by_token, agent);
    assert_eq!(Value::from(by_token.social_profile), payload);

    let by_id = db.store.find_by_id(agent.id).await.expect("lookup");
    assert_eq!(by_id.as_ref(), Some(&agent));

    db.drop_schema().await;
}

#[tokio::test]
async fn new_token_for_known_subject_updates_in_place() {
    let Some(db) = TestDb::connect().await else {
        return;
    };

    let first = db
        .store
        .upsert_verified("T1", &profile(json!({"sub": "auth0|i1", "name": "Grace Hopper"})))
        .await
        .expect("first upsert");
    let second = db
        .store
        .upsert_verified(
            "T2",
            &profile(json!({"sub": "auth0|i1", "name": "Rear Admiral Hopper"})),
        )
        .await
        .expect("second upsert");

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(second.access_token.as_deref(), Some("T2"));
    assert_eq!(second.social_profile.name(), Some("Rear Admiral Hopper"));

    assert!(db.store.find_by_access_token("T1").await.expect("lookup").is_none());
    assert_eq!(db.store.count().await.expect("count"), 1);

    db.drop_schema().await;
}

#[tokio::test]
async fn token_moves_between_subjects() {
    let Some(db) = TestDb::connect().await else {
        return;
    };

    let a = db
        .store
        .upsert_verified("shared", &profile(json!({"sub": "auth0|a"})))
        .await
        .expect("upsert a");
    let b = db
        .store
        .upsert_verified("shared", &profile(json!({"sub": "auth0|b"})))
        .await
        .expect("upsert b");

    assert_ne!(a.id, b.id);
    assert_eq!(b.access_token.as_deref(), Some("shared"));

    let holder = db
        .store
        .find_by_access_token("shared")
        .await
        .expect("lookup")
        .expect("token holder");
    assert_eq!(holder.id, b.id);

    let previous = db
        .store
        .find_by_id(a.id)
        .await
        .expect("lookup")
        .expect("agent a");
    assert_eq!(previous.access_token, None);
    assert_eq!(previous.subject, "auth0|a");
    assert_eq!(db.store.count().await.expect("count"), 2);

    db.drop_schema().await;
}

#[tokio::test]
async fn count_tracks_distinct_subjects() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    assert_eq!(db.store.count().await.expect("count"), 0);

    for (token, sub) in [("T1", "auth0|1"), ("T2", "auth0|2"), ("T1", "auth0|1"), ("T3", "auth0|2")] {
        db.store
            .upsert_verified(token, &profile(json!({"sub": sub})))
            .await
            .expect("upsert");
    }

    assert_eq!(db.store.count().await.expect("count"), 2);
    assert!(db.store.find_by_access_token("T2").await.expect("lookup").is_none());

    db.drop_schema().await;
}
