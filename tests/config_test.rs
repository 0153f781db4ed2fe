use std::env;
use std::fs;
use tempfile::TempDir;

const ENV_KEYS: &[&str] = &[
    "S3_ENDPOINT",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "S3_KEY",
    "S3_SECRET",
    "AWS_REGION",
    "S3_PATH_PREFIX",
];

fn write_config(dir: &TempDir, yaml: &str) -> String {
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();
    config_path.to_string_lossy().into_owned()
}

/// Test loading configuration from YAML file
#[test]
fn test_load_yaml_config() {
    let yaml = r#"
default_profile: test
profiles:
  test:
    endpoint: https://s3.example.com
    access_key: AKIATEST
    secret_key: secrettest
    region: us-west-2
    path_prefix: /gateway
"#;

    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, yaml);

    let config = s3raw::config::load_from_yaml(&path).unwrap();

    assert_eq!(config.profiles.len(), 1);
    assert_eq!(config.default_profile.as_deref(), Some("test"));

    let profile = config.profiles.get("test").unwrap();
    assert_eq!(profile.endpoint, "https://s3.example.com");
    assert_eq!(profile.access_key, "AKIATEST");
    assert_eq!(profile.secret_key, "secrettest");
    assert_eq!(profile.region, "us-west-2");
    assert_eq!(profile.path_prefix.as_deref(), Some("/gateway"));
}

/// Test default values
#[test]
fn test_default_values() {
    let yaml = r#"
profiles:
  minimal:
    endpoint: https://s3.test.com
    access_key: key
    secret_key: secret
"#;

    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, yaml);

    let config = s3raw::config::load_from_yaml(&path).unwrap();

    let profile = config.profiles.get("minimal").unwrap();
    assert_eq!(profile.region, "us-east-1");
    assert_eq!(profile.path_prefix, None);

    // A lone profile is the default even without default_profile
    assert_eq!(config.get_profile(None).unwrap().endpoint, "https://s3.test.com");
}

/// Test profile selection through load_config
#[test]
fn test_load_config_with_profile() {
    let yaml = r#"
default_profile: prod
profiles:
  prod:
    endpoint: https://s3-prod.test.com
    access_key: prod_key
    secret_key: prod_secret
  dev:
    endpoint: https://s3-dev.test.com
    access_key: dev_key
    secret_key: dev_secret
"#;

    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, yaml);

    let config = s3raw::config::load_config(Some(&path), None).unwrap();
    assert_eq!(config.get_profile(None).unwrap().access_key, "prod_key");

    let config = s3raw::config::load_config(Some(&path), Some("dev")).unwrap();
    assert_eq!(config.get_profile(None).unwrap().access_key, "dev_key");

    assert!(s3raw::config::load_config(Some(&path), Some("nonexistent")).is_err());
}

#[test]
fn test_invalid_yaml_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "profiles:\n  broken:\n    endpoint: [\n");

    assert!(s3raw::config::load_from_yaml(&path).is_err());
    assert!(s3raw::config::load_from_yaml(temp_dir.path().join("missing.yaml")).is_err());
}

/// Core picks the profile and builds its client
#[test]
fn test_core_from_config() {
    let yaml = r#"
profiles:
  a:
    endpoint: http://127.0.0.1:9000
    access_key: k
    secret_key: s
  b:
    endpoint: http://127.0.0.1:9001
    access_key: k
    secret_key: s
    path_prefix: api
"#;

    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, yaml);
    let config = s3raw::config::load_from_yaml(&path).unwrap();

    // Two profiles and no default: a name is required
    assert!(s3raw::Core::new(config.clone(), None).is_err());
    assert!(s3raw::Core::new(config.clone(), Some("c")).is_err());

    let core = s3raw::Core::new(config, Some("b")).unwrap();
    assert_eq!(core.client().endpoint(), "http://127.0.0.1:9001");
    assert_eq!(core.client().service_path("/bucket"), "/api/bucket");
}

/// Environment loading, both credential spellings
///
/// Kept in one test since the process environment is shared between threads.
#[test]
fn test_load_env_config() {
    let saved: Vec<(&str, Option<String>)> =
        ENV_KEYS.iter().map(|k| (*k, env::var(k).ok())).collect();
    for key in ENV_KEYS {
        env::remove_var(key);
    }

    // Missing endpoint
    env::set_var("AWS_ACCESS_KEY_ID", "test_key");
    env::set_var("AWS_SECRET_ACCESS_KEY", "test_secret");
    assert!(s3raw::config::load_from_env().is_err());

    // AWS standard names
    env::set_var("S3_ENDPOINT", " https://s3.test.com ");
    env::set_var("AWS_REGION", "eu-west-1");
    env::set_var("S3_PATH_PREFIX", "/gw");

    let config = s3raw::config::load_from_env().unwrap();
    assert_eq!(config.profiles.len(), 1);
    assert_eq!(config.default_profile.as_deref(), Some("default"));
    let profile = config.profiles.get("default").unwrap();
    assert_eq!(profile.endpoint, "https://s3.test.com");
    assert_eq!(profile.access_key, "test_key");
    assert_eq!(profile.secret_key, "test_secret");
    assert_eq!(profile.region, "eu-west-1");
    assert_eq!(profile.path_prefix.as_deref(), Some("/gw"));

    // Legacy names, default region
    env::remove_var("AWS_ACCESS_KEY_ID");
    env::remove_var("AWS_SECRET_ACCESS_KEY");
    env::remove_var("AWS_REGION");
    env::remove_var("S3_PATH_PREFIX");
    env::set_var("S3_KEY", "legacy_key");
    env::set_var("S3_SECRET", "legacy_secret");

    let config = s3raw::config::load_config(None, None).unwrap();
    let profile = config.get_profile(None).unwrap();
    assert_eq!(profile.access_key, "legacy_key");
    assert_eq!(profile.secret_key, "legacy_secret");
    assert_eq!(profile.region, "us-east-1");
    assert_eq!(profile.path_prefix, None);

    // Missing secret
    env::remove_var("S3_SECRET");
    assert!(s3raw::config::load_from_env().is_err());

    for (key, value) in saved {
        cleanup_env(key, value);
    }
}

/// Helper function to cleanup environment variables
fn cleanup_env(key: &str, orig_val: Option<String>) {
    match orig_val {
        Some(val) => env::set_var(key, val),
        None => env::remove_var(key),
    }
}
