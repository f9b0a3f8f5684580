#![cfg(feature = "config")]

use rustf_model::config::ModelConfig;
use rustf_model::DatabaseAdapter;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

#[test]
fn test_parse_full_document() {
    let config = ModelConfig::from_toml_str(
        r#"
        [security]
        bcrypt_cost = 12

        [schema]
        ttl = 300

        [databases.main]
        url = "sqlite://app.db"
        max_connections = 5
        is_default = true

        [databases.archive]
        url = "mysql://root@localhost/archive"
        "#,
    )
    .unwrap();

    assert_eq!(config.security.bcrypt_cost, 12);
    assert_eq!(config.schema_ttl(), Duration::from_secs(300));
    assert_eq!(config.databases.len(), 2);

    let (name, main) = config.databases.get_default().unwrap();
    assert_eq!(name, "main");
    assert_eq!(main.max_connections, 5);
    assert_eq!(config.databases.get("archive").unwrap().max_connections, 10);
    assert_eq!(config.security().cost(), 12);
}

#[test]
fn test_empty_document_uses_defaults() {
    let config = ModelConfig::from_toml_str("").unwrap();
    assert_eq!(config.security.bcrypt_cost, 10);
    assert_eq!(config.schema.ttl, 60);
    assert!(config.databases.is_empty());
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(ModelConfig::from_toml_str("[security]\nbcrypt_cost = 40").is_err());
    assert!(ModelConfig::from_toml_str("[security]\nbcrypt_cost = \"ten\"").is_err());

    let two_defaults = r#"
        [databases.a]
        url = "memory:"
        is_default = true

        [databases.b]
        url = "memory:"
        is_default = true
    "#;
    let err = ModelConfig::from_toml_str(two_defaults).unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG");
}

#[test]
fn test_environment_file_is_merged() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "config.toml",
        r#"
        [schema]
        ttl = 120

        [databases.main]
        url = "sqlite://app.db"
        is_default = true

        [databases.archive]
        url = "sqlite://archive.db"
        "#,
    );
    write(
        &dir,
        "config.testing.toml",
        r#"
        [schema]
        ttl = 0

        [databases.archive]
        url = "memory:"
        "#,
    );

    let config = ModelConfig::load_for_environment(dir.path(), "testing").unwrap();
    assert_eq!(config.schema_ttl(), Duration::ZERO);
    assert_eq!(config.databases.get("archive").unwrap().url, "memory:");
    assert!(config.databases.get("main").unwrap().is_default);

    // Other environments only see the base file
    let config = ModelConfig::load_for_environment(dir.path(), "production").unwrap();
    assert_eq!(config.schema.ttl, 120);
    assert_eq!(
        config.databases.get("archive").unwrap().url,
        "sqlite://archive.db"
    );
}

#[test]
fn test_missing_directory_files_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = ModelConfig::load_for_environment(dir.path(), "development").unwrap();
    assert_eq!(config.schema.ttl, 60);
}

#[test]
fn test_from_file_reports_path() {
    let dir = TempDir::new().unwrap();
    write(&dir, "broken.toml", "[security\nbcrypt_cost = 10");

    let err = ModelConfig::from_file(dir.path().join("broken.toml")).unwrap_err();
    assert!(err.to_string().contains("broken.toml"));

    let err = ModelConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[tokio::test]
async fn test_registry_from_memory_config() {
    let config = ModelConfig::from_toml_str(
        r#"
        [databases.main]
        url = "memory:"
        "#,
    )
    .unwrap();

    let registry = config.registry().await.unwrap();
    assert_eq!(registry.list_databases().await, vec!["main"]);
    assert_eq!(registry.get_default().await.unwrap().name(), "main");
}
