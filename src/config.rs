//! Configuration for the webhook server.

use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::materials::{ConfiguredMaterial, MaterialRegistry};

const CONFIG_FILE: &str = "material-hooks.toml";
const ENV_PREFIX: &str = "MATERIAL_HOOKS_";

/// Service configuration with defaults, file, and environment overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables prefixed `MATERIAL_HOOKS_` (highest priority)
/// 2. Configuration file (`material-hooks.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Everything except `webhook_secret` has a default. Materials are usually
/// listed in the file:
///
/// ```toml
/// webhook_secret = "s3cret"
///
/// [[materials]]
/// url = "git@bitbucket.org:gocd/spaceship.git"
/// branch = "master"
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address.
    ///
    /// Environment variable: `MATERIAL_HOOKS_HOST`
    #[serde(default = "default_host")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `MATERIAL_HOOKS_PORT`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret every provider authenticates against.
    ///
    /// Environment variable: `MATERIAL_HOOKS_WEBHOOK_SECRET`
    #[serde(default)]
    pub webhook_secret: String,

    /// Upper bound on a single material updater call, in seconds.
    ///
    /// Environment variable: `MATERIAL_HOOKS_DISPATCH_TIMEOUT_SECONDS`
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_seconds: u64,

    /// Git materials push notifications are matched against.
    #[serde(default)]
    pub materials: Vec<ConfiguredMaterial>,

    /// Log filter used when `RUST_LOG` is unset.
    ///
    /// Environment variable: `MATERIAL_HOOKS_RUST_LOG`
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides, then validate it.
    pub fn load() -> Result<Self> {
        let config: Self = Self::figment()
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// The layered configuration sources, lowest priority first.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_seconds)
    }

    /// Builds the material registry from the configured materials.
    pub fn material_registry(&self) -> MaterialRegistry {
        MaterialRegistry::new(self.materials.clone())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.webhook_secret.is_empty() {
            anyhow::bail!("webhook_secret must be set");
        }

        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.dispatch_timeout_seconds == 0 {
            anyhow::bail!("dispatch_timeout_seconds must be greater than 0");
        }

        for (index, material) in self.materials.iter().enumerate() {
            if material.url.is_empty() {
                anyhow::bail!("materials[{index}].url must not be empty");
            }
            if material.branch.is_empty() {
                anyhow::bail!("materials[{index}].branch must not be empty");
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("webhook_secret", &"***")
            .field("dispatch_timeout_seconds", &self.dispatch_timeout_seconds)
            .field("materials", &self.materials)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_secret: String::new(),
            dispatch_timeout_seconds: default_dispatch_timeout(),
            materials: Vec::new(),
            rust_log: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8153
}

fn default_dispatch_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "material_hooks=debug,tower_http=debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn valid() -> Config {
        Config {
            webhook_secret: "s3cret".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn defaults_need_only_a_secret() {
        assert!(Config::default().validate().is_err());
        assert!(valid().validate().is_ok());
        assert_eq!(valid().dispatch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            Config {
                port: 0,
                ..valid()
            },
            Config {
                dispatch_timeout_seconds: 0,
                ..valid()
            },
            Config {
                materials: vec![ConfiguredMaterial::new("", "master")],
                ..valid()
            },
            Config {
                materials: vec![ConfiguredMaterial::new("https://example.com/a/b", "")],
                ..valid()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn parse_server_addr() {
        let config = Config {
            host: "0.0.0.0".to_string(),
            port: 9000,
            ..valid()
        };
        assert_eq!(
            config.parse_server_addr().unwrap(),
            "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
        );

        let config = Config {
            host: "not a host".to_string(),
            ..valid()
        };
        assert!(config.parse_server_addr().is_err());
    }

    #[test]
    fn loads_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                    webhook_secret = "from-file"
                    port = 9000

                    [[materials]]
                    url = "git@bitbucket.org:gocd/spaceship.git"
                    branch = "master"
                "#,
            )?;
            jail.set_env("MATERIAL_HOOKS_WEBHOOK_SECRET", "from-env");
            jail.set_env("MATERIAL_HOOKS_DISPATCH_TIMEOUT_SECONDS", "5");

            let config = Config::load().map_err(|e| e.to_string())?;

            assert_eq!(config.webhook_secret, "from-env");
            assert_eq!(config.port, 9000);
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.dispatch_timeout(), Duration::from_secs(5));
            assert_eq!(
                config.material_registry().materials(),
                &[ConfiguredMaterial::new(
                    "git@bitbucket.org:gocd/spaceship.git",
                    "master"
                )]
            );
            Ok(())
        });
    }

    #[test]
    fn missing_secret_fails_to_load() {
        Jail::expect_with(|_jail| {
            assert!(Config::load().is_err());
            Ok(())
        });
    }
}
