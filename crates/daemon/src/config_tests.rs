// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load_from(dir.path()).unwrap();

    assert_eq!(config.service.cache, Duration::ZERO);
    assert!(config.service.timeout.is_none());
    assert_eq!(config.service.pool_size, 4);
    assert!(config.users.is_empty());
    assert_eq!(config.socket_path, dir.path().join("verdictd.sock"));
    assert_eq!(config.analyzers_dir, dir.path().join("analyzers.d"));
}

#[test]
fn full_file_parses() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("verdict.toml"),
        r#"
[job]
cache = 3600
timeout = 600

[runner]
pool_size = 8

[analyzers]
path = "/opt/verdict/analyzers"

[users]
alice = "org-a"
bob = "org-b"
"#,
    )
    .unwrap();

    let config = Config::load_from(dir.path()).unwrap();
    assert_eq!(config.service.cache, Duration::from_secs(3600));
    assert_eq!(config.service.timeout, Some(Duration::from_secs(600)));
    assert_eq!(config.service.pool_size, 8);
    assert_eq!(config.analyzers_dir, PathBuf::from("/opt/verdict/analyzers"));
    assert_eq!(config.users.get("alice").map(String::as_str), Some("org-a"));
    assert_eq!(config.users.len(), 2);
}

#[test]
fn zero_cache_disables_and_relative_analyzers_resolve() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("verdict.toml"),
        "[job]\ncache = 0\n\n[analyzers]\npath = \"defs\"\n",
    )
    .unwrap();

    let config = Config::load_from(dir.path()).unwrap();
    assert!(config.service.cache.is_zero());
    assert_eq!(config.analyzers_dir, dir.path().join("defs"));
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("verdict.toml"), "[job]\ncash = 1\n").unwrap();
    assert!(matches!(
        Config::load_from(dir.path()),
        Err(ConfigError::Parse { .. })
    ));
}
