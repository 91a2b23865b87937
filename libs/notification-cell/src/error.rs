use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Notification queue is closed")]
    QueueClosed,

    #[error("Redis connection error: {0}")]
    Redis(#[from] redis::RedisError),
}
