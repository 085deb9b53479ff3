use anyhow::Result;
use dotenv::dotenv;
use log::info;
use std::sync::Arc;

use teamledger::calculator::BalanceCalculator;
use teamledger::config::Settings;
use teamledger::database::{DocumentStore, SqliteDocumentStore};
use teamledger::notifier::{
    DryRunPushSender, HttpPushSender, NotificationDispatcher, PushSender, StoreUserDirectory,
    UserDirectory,
};
use teamledger::triggers::{Commands, EventFeed, TriggerHandler};
use teamledger::utils::Logger;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenv().ok();

    // 初始化日志
    env_logger::init();

    Logger::log_operation_start("TeamLedger", "Initializing application");

    // 加载配置
    let settings = match Settings::new() {
        Ok(s) => {
            Logger::log_operation_success("Configuration", "Settings loaded successfully");
            s
        }
        Err(e) => {
            Logger::log_operation_failure("Configuration", &e.to_string());
            return Err(e);
        }
    };

    // 验证配置
    if let Err(e) = settings.validate() {
        Logger::log_operation_failure("Configuration validation", &e.to_string());
        return Err(e);
    }

    // 初始化文档存储
    let store: Arc<dyn DocumentStore> = match SqliteDocumentStore::new(&settings.database_url).await {
        Ok(store) => {
            Logger::log_operation_success("Database", "Document store initialized successfully");
            Arc::new(store)
        }
        Err(e) => {
            Logger::log_operation_failure("Database", &e.to_string());
            return Err(e.into());
        }
    };

    // 初始化推送
    let push: Arc<dyn PushSender> = match &settings.push_endpoint {
        Some(endpoint) => Arc::new(HttpPushSender::new(
            endpoint.clone(),
            settings.push_api_key.clone(),
            settings.push_timeout(),
        )?),
        None => {
            info!("No PUSH_ENDPOINT configured, push notifications run in dry-run mode");
            Arc::new(DryRunPushSender)
        }
    };

    let directory: Arc<dyn UserDirectory> = Arc::new(StoreUserDirectory::new(store.clone()));
    let dispatcher = NotificationDispatcher::new(directory.clone(), push, store.clone())
        .with_deduplication(settings.deduplicate_deliveries);
    let handler = TriggerHandler::new(directory, dispatcher);
    let feed = EventFeed::new(store.clone(), handler);
    let calculator = BalanceCalculator::new(store);
    Logger::log_operation_success("Dispatcher", "Notification pipeline ready");

    info!("📊 Configuration:");
    info!("  - Database: {}", settings.database_url);
    info!(
        "  - Push endpoint: {}",
        settings.push_endpoint.as_deref().unwrap_or("dry-run")
    );
    info!("  - Push timeout: {}s", settings.push_timeout);
    info!("  - Deduplicate deliveries: {}", settings.deduplicate_deliveries);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = match args.split_first() {
        Some((command, rest)) => (command.as_str(), rest),
        None => ("help", &[][..]),
    };

    let commands = Commands::new(feed, calculator, settings);
    commands.handle_command(command, rest).await
}
