use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use tracing::{debug, info, instrument};

use shared_config::AppConfig;

use crate::NotificationError;

/// Outbound side of the notification channel. Implementations are
/// fire-and-forget from the caller's point of view.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), NotificationError>;

    fn name(&self) -> &'static str;
}

/// Drops every event. Used when messaging is disabled.
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, topic: &str, _payload: &str) -> Result<(), NotificationError> {
        debug!("Notifications disabled, dropping {} event", topic);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Writes events to the log instead of a broker.
pub struct LoggingPublisher;

#[async_trait]
impl EventPublisher for LoggingPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), NotificationError> {
        info!(topic = %topic, "Notification: {}", payload);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "logging"
    }
}

/// Publishes events on Redis pub/sub channels named after the topic.
pub struct RedisEventPublisher {
    pool: Pool,
}

impl RedisEventPublisher {
    pub async fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        let redis_url = config
            .redis_url
            .clone()
            .ok_or_else(|| NotificationError::Publish("REDIS_URL is not set".to_string()))?;

        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            NotificationError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Failed to create Redis pool",
                format!("Pool creation error: {}", e),
            )))
        })?;

        // Test connection
        let mut conn = pool.get().await.map_err(|e| {
            NotificationError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Failed to connect to Redis",
                format!("Connection error: {}", e),
            )))
        })?;

        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis event publisher initialized successfully");

        Ok(Self { pool })
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    #[instrument(skip(self, payload))]
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), NotificationError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| NotificationError::Publish(format!("Failed to get Redis connection: {}", e)))?;

        let receivers: i64 = conn.publish(topic, payload).await?;
        debug!("Published {} event to {} subscribers", topic, receivers);

        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
