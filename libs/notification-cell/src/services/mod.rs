pub mod dispatcher;
pub mod message;
pub mod publisher;

pub use dispatcher::NotificationDispatcher;
pub use message::{build_payload, format_message};
pub use publisher::{EventPublisher, LoggingPublisher, NoopPublisher, RedisEventPublisher};
