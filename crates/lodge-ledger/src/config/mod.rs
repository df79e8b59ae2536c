use rust_decimal::Decimal;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub policy: PolicyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            policy: PolicyConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Bounds applied when rooms, tenants and ad-hoc payments are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    pub dorm_min_capacity: u32,
    pub dorm_max_capacity: u32,
    pub max_monthly_rent: Decimal,
    pub max_payment_amount: Decimal,
}

impl PolicyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let policy = Self {
            dorm_min_capacity: env_or("LODGE_DORM_MIN_CAPACITY", defaults.dorm_min_capacity)?,
            dorm_max_capacity: env_or("LODGE_DORM_MAX_CAPACITY", defaults.dorm_max_capacity)?,
            max_monthly_rent: env_or("LODGE_MAX_MONTHLY_RENT", defaults.max_monthly_rent)?,
            max_payment_amount: env_or("LODGE_MAX_PAYMENT_AMOUNT", defaults.max_payment_amount)?,
        };

        if policy.dorm_min_capacity == 0 || policy.dorm_min_capacity > policy.dorm_max_capacity {
            return Err(ConfigError::InvalidPolicy {
                key: "LODGE_DORM_MIN_CAPACITY",
            });
        }
        if policy.max_monthly_rent <= Decimal::ZERO {
            return Err(ConfigError::InvalidPolicy {
                key: "LODGE_MAX_MONTHLY_RENT",
            });
        }
        if policy.max_payment_amount <= Decimal::ZERO {
            return Err(ConfigError::InvalidPolicy {
                key: "LODGE_MAX_PAYMENT_AMOUNT",
            });
        }

        Ok(policy)
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dorm_min_capacity: 4,
            dorm_max_capacity: 20,
            max_monthly_rent: Decimal::from(1_000_000),
            max_payment_amount: Decimal::from(10_000_000),
        }
    }
}

fn env_or<V: FromStr>(key: &'static str, default: V) -> Result<V, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<V>()
            .map_err(|_| ConfigError::InvalidPolicy { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPolicy { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPolicy { key } => {
                write!(f, "{key} is missing a usable value")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidPolicy { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
