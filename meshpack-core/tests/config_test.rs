use std::fs;
use std::path::PathBuf;

use meshpack_core::config::{WorkspaceConfig, CONFIG_FILE};
use meshpack_core::error::ErrorKind;
use tempfile::TempDir;

#[test]
fn test_discover_walks_up_to_config() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(CONFIG_FILE),
        r#"
[workspace]
packages_dir = "libs"
concurrency = 4
bail = true
client = "npm"
"#,
    )
    .unwrap();
    let nested = temp.path().join("libs").join("pkg-a").join("src");
    fs::create_dir_all(&nested).unwrap();

    let config = WorkspaceConfig::discover(&nested).unwrap().unwrap();
    assert_eq!(config.concurrency, Some(4));
    assert_eq!(config.bail, Some(true));
    assert_eq!(config.client_or_default(), "npm");
    assert_eq!(config.root(), Some(temp.path()));
    assert_eq!(config.resolved_packages_dir(), Some(temp.path().join("libs")));
}

#[test]
fn test_discover_stops_at_git_root() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CONFIG_FILE), "[workspace]\n").unwrap();
    let repo = temp.path().join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();

    assert!(WorkspaceConfig::discover(&repo).unwrap().is_none());
}

#[test]
fn test_empty_config_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE);
    fs::write(&path, "").unwrap();

    let config = WorkspaceConfig::from_path(&path).unwrap();
    assert_eq!(config.client_or_default(), "yarn");
    assert!(config.resolved_packages_dir().is_none());
    assert!(config.concurrency.is_none());
}

#[test]
fn test_absolute_packages_dir_is_kept() {
    let config = WorkspaceConfig {
        packages_dir: Some(PathBuf::from("/srv/packages")),
        config_path: Some(PathBuf::from("/repo/meshpack.toml")),
        ..WorkspaceConfig::default()
    };
    assert_eq!(
        config.resolved_packages_dir(),
        Some(PathBuf::from("/srv/packages"))
    );
}

#[test]
fn test_unknown_keys_are_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE);
    fs::write(&path, "[workspace]\nparallel = 3\n").unwrap();

    let err = WorkspaceConfig::from_path(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("parallel"));
}
