use std::{env, fs, time::Duration};

use tokenward_auth::config::SecretEncoding;
use tokenward_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tokenward.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
body_limit_bytes = 4096

[logging]
level = "debug"

[auth]
issuer = "https://auth.example.test"

[auth.signing]
algorithm = "HS512"
secret = "a2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2s="
secret_encoding = "base64"

[auth.tokens]
access_token_lifetime = "2m"
refresh_token_lifetime = "7days"

[auth.revocation]
store_timeout = "500ms"
cleanup_interval = "1h"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.body_limit_bytes, 4096);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.auth.issuer, "https://auth.example.test");
    assert_eq!(cfg.auth.signing.algorithm, "HS512");
    assert_eq!(cfg.auth.signing.secret_encoding, SecretEncoding::Base64);
    assert_eq!(cfg.auth.tokens.access_token_lifetime, Duration::from_secs(120));
    assert_eq!(
        cfg.auth.tokens.refresh_token_lifetime,
        Duration::from_secs(7 * 86_400)
    );
    assert_eq!(cfg.auth.revocation.store_timeout, Duration::from_millis(500));
    assert_eq!(cfg.auth.revocation.cleanup_interval, Duration::from_secs(3600));

    // 2) Env override should win over file
    unsafe {
        env::set_var("TOKENWARD__AUTH__ISSUER", "https://override.example.test");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.auth.issuer, "https://override.example.test");
    unsafe {
        env::remove_var("TOKENWARD__AUTH__ISSUER");
    }

    // 3) Invalid config should fail validation
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = toml_content.replace(
        "access_token_lifetime = \"2m\"",
        "access_token_lifetime = \"30days\"",
    );
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("validation should fail");
    assert!(err.contains("shorter"), "{err}");
}

#[test]
fn missing_secret_is_rejected() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tokenward.toml");
    fs::write(&path, "[server]\nport = 8082\n").expect("write toml");

    let err = load_config(path.to_str()).expect_err("secret is required");
    assert!(err.contains("auth.signing.secret"), "{err}");
}
