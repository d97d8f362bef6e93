use marquee_shared::Redacted;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub gateway: GatewaySettings,
    pub app: AppSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Redacted<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Redacted<String>,
}

/// Merchant credentials for the hosted payment page.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub merchant_key: String,
    pub merchant_salt: Redacted<String>,
    pub base_url: String,
    #[serde(default = "default_product_info")]
    pub product_info: String,
    #[serde(default = "default_phone")]
    pub default_phone: String,
}

fn default_product_info() -> String { marquee_core::payment::DEFAULT_PRODUCT_INFO.to_string() }
fn default_phone() -> String { marquee_core::payment::DEFAULT_PHONE.to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    /// Public base URL of this API; the gateway posts callbacks here.
    pub base_url: String,
    pub frontend_base_url: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `MARQUEE__GATEWAY__MERCHANT_SALT=...`
            .add_source(config::Environment::with_prefix("MARQUEE").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Every secret and URL the booking flow depends on must be present.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let required = [
            ("database.url", self.database.url.expose().as_str()),
            ("auth.jwt_secret", self.auth.jwt_secret.expose().as_str()),
            ("gateway.merchant_key", self.gateway.merchant_key.as_str()),
            ("gateway.merchant_salt", self.gateway.merchant_salt.expose().as_str()),
            ("gateway.base_url", self.gateway.base_url.as_str()),
            ("app.base_url", self.app.base_url.as_str()),
            ("app.frontend_base_url", self.app.frontend_base_url.as_str()),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(config::ConfigError::Message(format!(
                "Missing required configuration: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            server: ServerConfig { port: 8080 },
            database: DatabaseConfig {
                url: Redacted::new("postgres://localhost/marquee".to_string()),
                max_connections: 5,
            },
            auth: AuthConfig { jwt_secret: Redacted::new("jwt".to_string()) },
            gateway: GatewaySettings {
                merchant_key: "merchantK1".to_string(),
                merchant_salt: Redacted::new("S3cr3t".to_string()),
                base_url: "https://test.gateway.example".to_string(),
                product_info: default_product_info(),
                default_phone: default_phone(),
            },
            app: AppSettings {
                base_url: "http://localhost:8080".to_string(),
                frontend_base_url: "http://localhost:5173".to_string(),
                allowed_origins: vec![],
            },
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_names_missing_keys() {
        let mut config = sample();
        config.gateway.merchant_salt = Redacted::new(String::new());
        config.app.frontend_base_url = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("gateway.merchant_salt"));
        assert!(err.contains("app.frontend_base_url"));
        assert!(!err.contains("gateway.merchant_key"));
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("S3cr3t"));
        assert!(!rendered.contains("postgres://"));
    }
}
