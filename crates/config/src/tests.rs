use crate::{AppConfig, ConfigError, JwtConfig};
use figment::{
    Figment, Jail,
    providers::{Format, Toml},
};
use secrecy::{ExposeSecret, Secret};

const BASE: &str = r#"
app_name = "notes"

[jwt]
secret = "0123456789abcdef0123456789abcdef"

[crud]
allowed_origins = ["https://app.example.com"]

[crud.resources.notes]
one_slug = "/api/notes/{id}"
all_slug = "/api/notes"

[crud.resources.notes.permissions]
Admin = ["ReadOne", "ReadAll", "CreateOne"]
User = ["ReadOne"]
"#;

#[test]
fn test_secret_redaction() {
    let config = JwtConfig {
        secret: Secret::new("my_secret_password".to_string()),
        expires_in: 60,
        issuer: "iss".to_string(),
        audience: "aud".to_string(),
    };
    let debug_output = format!("{:?}", config);
    assert!(!debug_output.contains("my_secret_password"));
    assert!(debug_output.contains("REDACTED"));
}

#[test]
fn test_defaults_applied() {
    let config = AppConfig::from_figment(Figment::from(Toml::string(BASE))).unwrap();

    assert_eq!(config.app_env, "development");
    assert!(config.is_development());
    assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
    assert_eq!(config.telemetry.log_level, "info");
    assert!(!config.crud.deny_with_forbidden);
    assert_eq!(config.jwt.expires_in, 3600);
    assert_eq!(
        config.jwt.secret.expose_secret(),
        "0123456789abcdef0123456789abcdef"
    );
}

#[test]
fn test_resource_permissions_keep_order() {
    let config = AppConfig::from_figment(Figment::from(Toml::string(BASE))).unwrap();
    let notes = &config.crud.resources["notes"];

    assert_eq!(notes.all_slug, "/api/notes");
    assert_eq!(
        notes.permissions["Admin"],
        vec!["ReadOne", "ReadAll", "CreateOne"]
    );
    assert_eq!(config.crud.allowed_origins, vec!["https://app.example.com"]);
}

#[test]
fn test_same_slug_rejected() {
    let toml = r#"
app_name = "notes"

[jwt]
secret = "s"

[crud.resources.notes]
one_slug = "/api/notes"
all_slug = "/api/notes"
"#;
    let err = AppConfig::from_figment(Figment::from(Toml::string(toml))).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_load_merges_env_over_files() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", BASE)?;
        jail.create_file(
            "production.toml",
            "[server]\nport = 9000\n\n[telemetry]\njson = true\n",
        )?;
        jail.set_env("APP_ENV", "production");
        jail.set_env("APP_CRUD__DENY_WITH_FORBIDDEN", "true");

        let config = AppConfig::load(".").map_err(|e| e.to_string())?;
        assert_eq!(config.server.port, 9000);
        assert!(config.telemetry.json);
        assert!(config.crud.deny_with_forbidden);
        Ok(())
    });
}

#[test]
fn test_app_env_follows_env_var() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "default.toml",
            &format!("app_env = \"development\"\n{}", BASE),
        )?;
        jail.set_env("APP_ENV", "staging");

        let config = AppConfig::load(".").map_err(|e| e.to_string())?;
        assert_eq!(config.app_env, "staging");
        assert!(!config.is_development());
        Ok(())
    });
}

#[test]
fn test_app_env_defaults_to_development() {
    Jail::expect_with(|jail| {
        jail.create_file("default.toml", &format!("app_env = \"production\"\n{}", BASE))?;
        jail.clear_env();

        let config = AppConfig::load(".").map_err(|e| e.to_string())?;
        assert_eq!(config.app_env, "development");
        assert!(config.is_development());
        Ok(())
    });
}
