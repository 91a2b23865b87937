use std::env;
use tracing::warn;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
pub const DEFAULT_NOTIFICATION_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_SERVER_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub redis_url: Option<String>,
    pub notifications_enabled: bool,
    pub notification_queue_capacity: usize,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            redis_url: None,
            notifications_enabled: true,
            notification_queue_capacity: DEFAULT_NOTIFICATION_QUEUE_CAPACITY,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            token_ttl_hours: bounded_token_ttl(parse_or_default(
                "JWT_EXPIRATION_HOURS",
                DEFAULT_TOKEN_TTL_HOURS,
            )),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, accounts and consultations are kept in memory");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            notifications_enabled: parse_or_default("NOTIFICATIONS_ENABLED", true),
            notification_queue_capacity: parse_or_default(
                "NOTIFICATION_QUEUE_CAPACITY",
                DEFAULT_NOTIFICATION_QUEUE_CAPACITY,
            ),
            server_port: parse_or_default("SERVER_PORT", DEFAULT_SERVER_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn is_database_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn is_messaging_configured(&self) -> bool {
        self.notifications_enabled && self.redis_url.is_some()
    }
}

fn bounded_token_ttl(hours: i64) -> i64 {
    if hours <= 0 {
        warn!("JWT_EXPIRATION_HOURS must be positive, using default {}", DEFAULT_TOKEN_TTL_HOURS);
        DEFAULT_TOKEN_TTL_HOURS
    } else if hours > MAX_TOKEN_TTL_HOURS {
        warn!("JWT_EXPIRATION_HOURS {} is too large, capping at {}", hours, MAX_TOKEN_TTL_HOURS);
        MAX_TOKEN_TTL_HOURS
    } else {
        hours
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
