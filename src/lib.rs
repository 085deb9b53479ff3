// 公开内部模块以便测试
pub mod calculator;
pub mod config;
pub mod database;
pub mod error;
pub mod notifier;
pub mod triggers;
pub mod utils;

// 重新导出常用的类型和结构体
pub use calculator::{aggregate, BalanceCalculator, LedgerAggregator, LedgerSummary};
pub use config::Settings;
pub use database::{models, DocumentStore, SqliteDocumentStore};
pub use error::TeamLedgerError;
pub use notifier::{DomainEvent, NotificationDispatcher, PushSender, UserDirectory};
pub use triggers::{Commands, EventFeed, TriggerHandler};
