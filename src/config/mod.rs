use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Signing secret used when `JWT_SECRET` is unset outside production.
pub const DEV_JWT_SECRET: &str = "godplan-dev-secret-change-me";

/// Search path appended to connection targets that do not name one.
pub const DEFAULT_SEARCH_PATH: &str = "godplan,public";

/// Session time zone when `DB_TIMEZONE` is unset.
pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("JWT_SECRET must be set to a non-default value in production")]
    InsecureSecret,

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub security: SecurityConfig,
    pub attendance: AttendanceConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseConfig {
    /// Connection target, either `DATABASE_URL` verbatim or assembled from `DB_*` parts.
    #[serde(skip_serializing)]
    pub url: String,
    /// Set when the target does not already carry a search path.
    pub search_path: Option<String>,
    pub max_open_connections: u32,
    pub max_idle_connections: u32,
    pub max_lifetime_secs: u64,
    pub idle_timeout_secs: u64,
    /// Session `TimeZone`; calendar-date filters on `created_at` are evaluated in it.
    pub timezone: String,
    pub connect_attempts: u32,
    pub connect_retry_delay_secs: u64,
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub jwt_leeway_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceConfig {
    pub office_latitude: f64,
    pub office_longitude: f64,
    pub radius_meters: f64,
    pub enable_location_check: bool,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("ENVIRONMENT").as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let server = ServerConfig {
            port: parse_or(get("PORT"), "PORT", 8080)?,
            read_timeout_secs: 15,
            write_timeout_secs: 15,
            idle_timeout_secs: 60,
            max_body_bytes: parse_or(get("MAX_BODY_BYTES"), "MAX_BODY_BYTES", 10 * 1024 * 1024)?,
        };

        // Offline commands (`token`, `distance`) run without a database target
        let database = match get("DATABASE_URL") {
            Some(url) => Some(url),
            None if get("DB_HOST").is_some() => Some(database_url_from_parts(&get)?),
            None => None,
        }
        .map(|url| database_section(url, &get))
        .transpose()?;

        let jwt_secret = match (get("JWT_SECRET"), environment) {
            (Some(secret), Environment::Production) if secret == DEV_JWT_SECRET => {
                return Err(ConfigError::InsecureSecret)
            }
            (Some(secret), _) => secret,
            (None, Environment::Production) => return Err(ConfigError::InsecureSecret),
            (None, Environment::Development) => DEV_JWT_SECRET.to_string(),
        };

        let security = SecurityConfig {
            jwt_secret,
            jwt_expiry_hours: 24,
            jwt_leeway_secs: 0,
        };

        let attendance = AttendanceConfig {
            office_latitude: parse_or(get("OFFICE_LATITUDE"), "OFFICE_LATITUDE", -6.2)?,
            office_longitude: parse_or(get("OFFICE_LONGITUDE"), "OFFICE_LONGITUDE", 106.8)?,
            radius_meters: parse_or(get("ATTENDANCE_RADIUS_METERS"), "ATTENDANCE_RADIUS_METERS", 100.0)?,
            enable_location_check: parse_bool(get("ENABLE_LOCATION_CHECK"), "ENABLE_LOCATION_CHECK", true)?,
        };

        if !(attendance.radius_meters >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "ATTENDANCE_RADIUS_METERS",
                value: attendance.radius_meters.to_string(),
            });
        }

        Ok(Self {
            environment,
            server,
            database,
            security,
            attendance,
        })
    }

    /// The database section, required by every command that opens a pool.
    pub fn database(&self) -> Result<&DatabaseConfig, ConfigError> {
        self.database
            .as_ref()
            .ok_or(ConfigError::Missing("DATABASE_URL or DB_HOST"))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Default `EnvFilter` directives when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        match self.environment {
            Environment::Development => "godplan_api=debug,tower_http=debug",
            Environment::Production => "godplan_api=info,tower_http=info",
        }
    }
}

impl ServerConfig {
    /// Transport deadline applied to a whole request/response exchange.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs.max(self.write_timeout_secs))
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn parse_bool(raw: Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value }),
        },
    }
}

fn database_section<F>(url: String, get: &F) -> Result<DatabaseConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let search_path = if url.contains("search_path") {
        None
    } else {
        Some(DEFAULT_SEARCH_PATH.to_string())
    };

    Ok(DatabaseConfig {
        url,
        search_path,
        max_open_connections: 25,
        max_idle_connections: 10,
        max_lifetime_secs: 30 * 60,
        idle_timeout_secs: 5 * 60,
        timezone: get("DB_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        connect_attempts: 5,
        connect_retry_delay_secs: 2,
        auto_migrate: parse_bool(get("DB_AUTO_MIGRATE"), "DB_AUTO_MIGRATE", false)?,
    })
}

fn database_url_from_parts<F>(get: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = get("DB_HOST").ok_or(ConfigError::Missing("DATABASE_URL or DB_HOST"))?;
    let port: u16 = parse_or(get("DB_PORT"), "DB_PORT", 5432)?;
    let user = get("DB_USER").unwrap_or_else(|| "postgres".to_string());
    let name = get("DB_NAME").unwrap_or_else(|| "godplan".to_string());
    let sslmode = get("DB_SSLMODE").unwrap_or_else(|| "disable".to_string());

    let mut url = url::Url::parse(&format!("postgres://{}:{}/{}", host, port, name))
        .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
    url.set_username(&user)
        .map_err(|_| ConfigError::InvalidDatabaseUrl("username".to_string()))?;
    if let Some(password) = get("DB_PASSWORD") {
        url.set_password(Some(&password))
            .map_err(|_| ConfigError::InvalidDatabaseUrl("password".to_string()))?;
    }

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("sslmode", &sslmode);
        if let Some(root_cert) = get("DB_SSLROOTCERT") {
            query.append_pair("sslrootcert", &root_cert);
        }
    }

    Ok(url.into())
}
