use chrono::Local;
use rustf_model::prelude::*;
use sqlx::sqlite::SqlitePoolOptions;

async fn database() -> SqliteAdapter {
    // A single connection keeps every query on the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            password TEXT,
            date DATE,
            active BOOLEAN DEFAULT 1
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    SqliteAdapter::from_pool("main", pool)
}

async fn user(db: &SqliteAdapter) -> Record {
    User::bind(Arc::new(db.clone()))
        .await
        .unwrap()
        .with_security(Security::default().with_cost(4))
}

async fn fetch(db: &SqliteAdapter, id: i64) -> Row {
    db.select_one("user", &Filter::new().where_eq("id", id))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_describe_reads_table_info() {
    let db = database().await;
    let schema = db.describe("user").await.unwrap();

    assert_eq!(
        schema.names().collect::<Vec<_>>(),
        vec!["id", "email", "password", "date", "active"]
    );
    let id = schema.get("id").unwrap();
    assert!(id.primary_key);
    assert!(id.auto_increment);
    assert!(!schema.get("email").unwrap().nullable);
    assert!(schema.get("password").unwrap().nullable);
    assert_eq!(schema.get("active").unwrap().default.as_deref(), Some("1"));
    assert_eq!(schema.primary_key().unwrap(), Some("id"));
}

#[tokio::test]
async fn test_describe_missing_table() {
    let db = database().await;
    assert!(matches!(
        db.describe("nothing").await,
        Err(Error::TableNotFound(_))
    ));
    assert!(db.ping().await.unwrap());
}

#[tokio::test]
async fn test_user_creation() {
    let db = database().await;
    let mut user = user(&db).await;

    let persisted = user
        .save(Some(
            Candidate::new()
                .with("email", "ann@example.com")
                .with("password", "secret")
                .with("verify_password", "secret"),
        ))
        .await
        .unwrap();

    assert_eq!(persisted.kind, WriteKind::Insert);
    assert_eq!(persisted.id, Some(SqlValue::BigInt(1)));

    let row = fetch(&db, 1).await;
    let hash = row.get("password").and_then(SqlValue::as_str).unwrap();
    assert!(user.verify("secret", hash));
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(row.get("date").and_then(SqlValue::as_str), Some(today.as_str()));

    // Database defaults are read back after the insert
    assert_eq!(user.get("active").and_then(SqlValue::as_i64), Some(1));
}

#[tokio::test]
async fn test_user_mismatch_writes_nothing() {
    let db = database().await;
    let mut user = user(&db).await;

    let err = user
        .save(Some(
            Candidate::new()
                .with("email", "ann@example.com")
                .with("password", "b")
                .with("verify_password", "a"),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "The password does not match.");

    let missing = db
        .select_one("user", &Filter::new().where_eq("email", "ann@example.com"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_update_and_resave() {
    let db = database().await;
    let mut user = user(&db).await;
    user.save(Some(Candidate::new().with("email", "ann@example.com")))
        .await
        .unwrap();

    let persisted = user
        .save(Some(Candidate::new().with("id", "1").with("email", "annie@example.com")))
        .await
        .unwrap();
    assert_eq!(persisted.kind, WriteKind::Update);
    assert_eq!(persisted.rows_affected, 1);

    let persisted = user.save(None).await.unwrap();
    assert_eq!(persisted.kind, WriteKind::Update);
    assert_eq!(persisted.rows_affected, 0);

    let row = fetch(&db, 1).await;
    assert_eq!(row.get("email"), Some(&SqlValue::from("annie@example.com")));
    assert!(db
        .select_one("user", &Filter::new().where_eq("id", 2))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unknown_key_inserts() {
    let db = database().await;
    let mut user = user(&db).await;

    let persisted = user
        .save(Some(Candidate::new().with("id", 42).with("email", "bob@example.com")))
        .await
        .unwrap();

    assert_eq!(persisted.kind, WriteKind::Insert);
    assert_eq!(persisted.id, Some(SqlValue::BigInt(1)));
}

#[tokio::test]
async fn test_not_null_violation_surfaces() {
    let db = database().await;
    let mut user = user(&db).await;

    let err = user
        .save(Some(Candidate::new().with("password", SqlValue::Null)))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_DB_QUERY");
}

#[tokio::test]
async fn test_composite_key_is_ambiguous() {
    let db = database().await;
    sqlx::query("CREATE TABLE membership (user_id INTEGER, group_id INTEGER, PRIMARY KEY (user_id, group_id))")
        .execute(db.pool())
        .await
        .unwrap();

    let err = Record::bind(Arc::new(db), &Binding::new("membership"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousPrimaryKey { .. }));
}

#[tokio::test]
async fn test_schema_cache_respects_ttl() {
    let db = database().await;
    let ttl = std::time::Duration::from_secs(60);
    db.schema("user", ttl).await.unwrap();

    sqlx::query("ALTER TABLE user ADD COLUMN nickname TEXT")
        .execute(db.pool())
        .await
        .unwrap();

    let cached = db.schema("user", ttl).await.unwrap();
    assert!(!cached.contains("nickname"));

    let fresh = db.schema("user", std::time::Duration::ZERO).await.unwrap();
    assert!(fresh.contains("nickname"));
}
