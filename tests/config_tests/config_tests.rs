//! Tests for Config
//!
//! These tests verify:
//! - Defaults and the builder
//! - Validation of the index file name
//! - Loading a JSON config file

use std::fs;
use std::path::PathBuf;

use stashkv::{Config, Engine, StashError, UnknownFormatPolicy};
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.data_dir, PathBuf::from("./stashkv_data"));
    assert_eq!(config.index_file_name, "index.json");
    assert_eq!(config.unknown_format_policy, UnknownFormatPolicy::Reject);
    assert!(config.atomic_index_writes);
    assert!(!config.sync_writes);
}

#[test]
fn test_builder_sets_every_field() {
    let config = Config::builder()
        .data_dir("/tmp/stash")
        .index_file_name("catalog.json")
        .unknown_format_policy(UnknownFormatPolicy::RawCopy)
        .atomic_index_writes(false)
        .sync_writes(true)
        .build();

    assert_eq!(config.index_path(), PathBuf::from("/tmp/stash/catalog.json"));
    assert_eq!(config.unknown_format_policy, UnknownFormatPolicy::RawCopy);
    assert!(!config.atomic_index_writes);
    assert!(config.sync_writes);
}

#[test]
fn test_validate_index_file_name() {
    for name in ["", ".", "..", "sub/index.json", "sub\\index.json"] {
        let config = Config::builder().index_file_name(name).build();
        assert!(
            matches!(config.validate(), Err(StashError::Config(_))),
            "accepted {:?}",
            name
        );
    }

    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_from_file_fills_in_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stashkv.json");
    fs::write(
        &path,
        r#"{"data_dir": "/srv/stash", "unknown_format_policy": "raw_copy"}"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.data_dir, PathBuf::from("/srv/stash"));
    assert_eq!(config.unknown_format_policy, UnknownFormatPolicy::RawCopy);
    assert_eq!(config.index_file_name, "index.json");
    assert!(config.atomic_index_writes);
}

#[test]
fn test_from_file_errors() {
    let temp_dir = TempDir::new().unwrap();

    let missing = Config::from_file(temp_dir.path().join("absent.json"));
    assert!(matches!(missing, Err(StashError::Io(_))));

    let bad_policy = temp_dir.path().join("bad_policy.json");
    fs::write(&bad_policy, r#"{"unknown_format_policy": "maybe"}"#).unwrap();
    assert!(matches!(
        Config::from_file(&bad_policy),
        Err(StashError::Config(_))
    ));

    let bad_name = temp_dir.path().join("bad_name.json");
    fs::write(&bad_name, r#"{"index_file_name": "../index.json"}"#).unwrap();
    assert!(matches!(
        Config::from_file(&bad_name),
        Err(StashError::Config(_))
    ));
}

#[test]
fn test_engine_opens_from_loaded_config() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let path = temp_dir.path().join("stashkv.json");
    let config = Config::builder()
        .data_dir(&data_dir)
        .index_file_name("keys.json")
        .build();
    fs::write(&path, serde_json::to_vec(&config).unwrap()).unwrap();

    let engine = Engine::open(Config::from_file(&path).unwrap()).unwrap();

    assert_eq!(engine.index_path(), data_dir.join("keys.json"));
    assert!(data_dir.join("keys.json").exists());
}
