//! 基础设施层：SQLite仓储实现与出站消息通道适配器

pub mod database;
pub mod sender;

pub use database::sqlite::{SqliteContactRepository, SqliteScheduleRepository};
pub use database::{create_pool, run_migrations};
pub use sender::WebhookMessageSender;
