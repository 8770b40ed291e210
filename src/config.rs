use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub mercadopago: MercadoPagoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MercadoPagoConfig {
    pub access_token: String,
    #[serde(default = "default_mercadopago_base_url")]
    pub base_url: String,
    /// URL the gateway redirects the payer back to after checkout.
    #[serde(default)]
    pub back_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_mercadopago_base_url() -> String {
    "https://api.mercadopago.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Missing config file is fine as long as the environment carries
        // everything required.
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str)
                    .map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is required when no config.toml is present")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    mercadopago: MercadoPagoConfig {
                        access_token: get_env("MERCADOPAGO_ACCESS_TOKEN").unwrap_or_default(),
                        base_url: get_env("MERCADOPAGO_BASE_URL")
                            .unwrap_or_else(default_mercadopago_base_url),
                        back_url: get_env("MERCADOPAGO_BACK_URL").unwrap_or_default(),
                        request_timeout_secs: get_env_parse(
                            "MERCADOPAGO_TIMEOUT_SECS",
                            default_request_timeout_secs(),
                        ),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // Environment overrides apply even when the file exists.
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("MERCADOPAGO_ACCESS_TOKEN") {
            config.mercadopago.access_token = v;
        }
        if let Ok(v) = env::var("MERCADOPAGO_BASE_URL") {
            config.mercadopago.base_url = v;
        }
        if let Ok(v) = env::var("MERCADOPAGO_BACK_URL") {
            config.mercadopago.back_url = v;
        }
        if let Ok(v) = env::var("MERCADOPAGO_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            config.mercadopago.request_timeout_secs = n;
        }

        Ok(config)
    }
}
