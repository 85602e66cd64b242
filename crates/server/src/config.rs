use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;

use crate::data::DbConfig;

pub const DEFAULT_CONFIG_PATH: &str = "backoffice.toml";
pub const ENV_PREFIX: &str = "BACKOFFICE_";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub db: DbConfig,
    pub admin: AdminConfig,
    pub logger: LoggerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8008".to_owned(),
            db: DbConfig::default(),
            admin: AdminConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

/// The bootstrap admin created by `create-admin`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub user_id: String,
    pub display_name: String,
    /// Seed the admin password is derived from. It is also what
    /// `create-admin` hands back to the caller.
    pub password_seed: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            user_id: "@admin:synapse".to_owned(),
            display_name: "Admin User".to_owned(),
            password_seed: "password".to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, overridden by `RUST_LOG` when set.
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: "info".to_owned(),
        }
    }
}

/// Layers the TOML file and `BACKOFFICE_*` variables over the defaults.
///
/// Nested keys are separated by a double underscore, e.g.
/// `BACKOFFICE_DB__URL`. A missing file is not an error.
pub fn figment(path: impl AsRef<Path>) -> Figment {
    Figment::new()
        .merge(Toml::file(path.as_ref()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn load(path: impl AsRef<Path>) -> Result<ServerConfig, figment::Error> {
    figment(path).extract()
}

#[cfg(test)]
mod tests {
    use figment::providers::Serialized;

    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let config: ServerConfig = Figment::new().extract().unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8008");
        assert_eq!(config.admin.user_id, "@admin:synapse");
        assert_eq!(config.admin.password_seed, "password");
        assert_eq!(config.logger.format, LogFormat::Compact);
        assert_eq!(config.db.pool_size, 10);
    }

    #[test]
    fn nested_values_override_defaults() {
        let config: ServerConfig = Figment::new()
            .merge(Serialized::default("listen_addr", "127.0.0.1:9000"))
            .merge(Serialized::default("logger.format", "json"))
            .merge(Serialized::default("admin.display_name", "Root"))
            .extract()
            .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.logger.format, LogFormat::Json);
        assert_eq!(config.admin.display_name, "Root");
        assert_eq!(config.admin.user_id, "@admin:synapse");
    }

    #[test]
    fn toml_file_is_read() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_PATH,
                r#"
                listen_addr = "127.0.0.1:8080"

                [db]
                url = "postgresql://tenant@localhost/tenant"
                pool_size = 4
                "#,
            )?;
            jail.set_env("BACKOFFICE_ADMIN__PASSWORD_SEED", "secret");

            let config = load(DEFAULT_CONFIG_PATH)?;
            assert_eq!(config.listen_addr, "127.0.0.1:8080");
            assert_eq!(config.db.url, "postgresql://tenant@localhost/tenant");
            assert_eq!(config.db.pool_size, 4);
            assert_eq!(config.admin.password_seed, "secret");
            Ok(())
        });
    }
}
