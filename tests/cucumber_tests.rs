use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use async_trait::async_trait;
use cucumber::{given, when, then, World};
use serde_json::{json, Value};

// 导入项目模块
use teamledger::calculator::BalanceCalculator;
use teamledger::database::models::NotificationRecord;
use teamledger::database::operations::SqliteDocumentStore;
use teamledger::database::traits::{DocumentStore, Filter};
use teamledger::error::TeamLedgerError;
use teamledger::notifier::dispatcher::NotificationDispatcher;
use teamledger::notifier::directory::StoreUserDirectory;
use teamledger::notifier::traits::{PushMessage, PushSender, UserDirectory};
use teamledger::triggers::feed::{EventFeed, FeedStats};
use teamledger::triggers::handler::TriggerHandler;

// 与 integration_tests 中相同的推送 mock
#[derive(Debug, Clone, Default)]
pub struct MockPushSender {
    pub sent: Arc<Mutex<Vec<PushMessage>>>,
    pub failing_tokens: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl PushSender for MockPushSender {
    async fn send(&self, message: &PushMessage) -> teamledger::error::Result<String> {
        if self.failing_tokens.lock().await.contains(&message.token) {
            return Err(TeamLedgerError::delivery_failure("Mock push error"));
        }

        self.sent.lock().await.push(message.clone());
        Ok(format!("msg-{}", rand::random::<u32>()))
    }
}

// World结构，管理测试状态
#[derive(World)]
#[world(init = Self::new)]
pub struct TeamLedgerWorld {
    pub store: SqliteDocumentStore,
    pub push: MockPushSender,
    pub feed: EventFeed,
    pub calculator: BalanceCalculator,
    pub last_stats: FeedStats,
    pub entity_counter: usize,
}

impl fmt::Debug for TeamLedgerWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamLedgerWorld")
            .field("push", &self.push)
            .field("last_stats", &self.last_stats)
            .finish_non_exhaustive()
    }
}

impl TeamLedgerWorld {
    async fn new() -> Self {
        // 使用内存数据库避免文件系统权限问题
        let store = SqliteDocumentStore::new(":memory:")
            .await
            .expect("in-memory store");
        let push = MockPushSender::default();

        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let directory: Arc<dyn UserDirectory> = Arc::new(StoreUserDirectory::new(shared.clone()));
        let dispatcher =
            NotificationDispatcher::new(directory.clone(), Arc::new(push.clone()), shared.clone());
        let handler = TriggerHandler::new(directory, dispatcher);

        Self {
            store,
            push,
            feed: EventFeed::new(shared.clone(), handler),
            calculator: BalanceCalculator::new(shared),
            last_stats: FeedStats::default(),
            entity_counter: 0,
        }
    }

    async fn write(&mut self, request: Value) {
        let line = request.to_string();
        self.last_stats = self.feed.run(line.as_bytes()).await.expect("feed run");
    }

    fn next_entity_id(&mut self, prefix: &str) -> String {
        self.entity_counter += 1;
        format!("{prefix}{}", self.entity_counter)
    }

    async fn inbox(&self, user_id: &str) -> Vec<NotificationRecord> {
        self.store
            .query(&format!("users/{user_id}/notifications"), &Filter::All)
            .await
            .unwrap()
            .iter()
            .map(|doc| doc.decode().unwrap())
            .collect()
    }

    async fn transaction(&mut self, owner: &str, kind: &str, amount: f64, currency: &str, reason: &str) {
        let entity_id = self.next_entity_id("t");
        self.write(json!({
            "op": "createTransaction",
            "ownerUserId": owner,
            "entityId": entity_id,
            "fields": {
                "amount": amount,
                "currency": currency,
                "type": kind,
                "reason": reason,
                "date": "2024-03-01T10:00:00Z"
            }
        }))
        .await;
    }
}

// 团队步骤实现
#[given(expr = "老板 {string} 的设备令牌为 {string}")]
async fn patron_with_token(world: &mut TeamLedgerWorld, user_id: String, token: String) {
    world
        .write(json!({
            "op": "upsertUser",
            "ownerUserId": user_id,
            "fields": {"name": user_id, "role": "PATRON", "deviceToken": token}
        }))
        .await;
}

#[given(expr = "负责人 {string} 隶属于 {string} 设备令牌为 {string}")]
async fn responsable_with_token(world: &mut TeamLedgerWorld, user_id: String, manager: String, token: String) {
    world
        .write(json!({
            "op": "upsertUser",
            "ownerUserId": user_id,
            "fields": {"name": user_id, "role": "RESPONSABLE", "managerId": manager, "deviceToken": token}
        }))
        .await;
}

#[given(expr = "负责人 {string} 隶属于 {string} 没有设备令牌")]
async fn responsable_without_token(world: &mut TeamLedgerWorld, user_id: String, manager: String) {
    world
        .write(json!({
            "op": "upsertUser",
            "ownerUserId": user_id,
            "fields": {"name": user_id, "role": "RESPONSABLE", "managerId": manager}
        }))
        .await;
}

#[given(expr = "设备令牌 {string} 推送失败")]
async fn token_fails(world: &mut TeamLedgerWorld, token: String) {
    world.push.failing_tokens.lock().await.insert(token);
}

// 写入步骤实现
#[when(expr = "{string} 记录一笔 {float} {string} 的支出 {string}")]
async fn record_expense(world: &mut TeamLedgerWorld, owner: String, amount: f64, currency: String, reason: String) {
    world.transaction(&owner, "EXPENSE", amount, &currency, &reason).await;
}

#[when(expr = "{string} 记录一笔 {float} {string} 的预算")]
async fn record_budget(world: &mut TeamLedgerWorld, owner: String, amount: f64, currency: String) {
    world.transaction(&owner, "BUDGET_ADD", amount, &currency, "Budget").await;
}

#[when(expr = "{string} 发布报告 {string}")]
async fn publish_recap(world: &mut TeamLedgerWorld, owner: String, title: String) {
    let entity_id = world.next_entity_id("rc");
    world
        .write(json!({
            "op": "createRecap",
            "ownerUserId": owner,
            "entityId": entity_id,
            "fields": {"title": title}
        }))
        .await;
}

#[when(expr = "{string} 创建 {string} 任务 {string}")]
async fn create_mission(world: &mut TeamLedgerWorld, owner: String, mission_type: String, mission_id: String) {
    world
        .write(json!({
            "op": "createMission",
            "ownerUserId": owner,
            "entityId": mission_id,
            "fields": {"title": mission_id, "status": "TODO", "type": mission_type}
        }))
        .await;
}

#[when(expr = "{string} 将任务 {string} 状态改为 {string}")]
async fn update_mission_status(world: &mut TeamLedgerWorld, owner: String, mission_id: String, status: String) {
    world
        .write(json!({
            "op": "updateMission",
            "ownerUserId": owner,
            "entityId": mission_id,
            "fields": {"status": status}
        }))
        .await;
}

#[when(expr = "{string} 将任务 {string} 标题改为 {string}")]
async fn update_mission_title(world: &mut TeamLedgerWorld, owner: String, mission_id: String, title: String) {
    world
        .write(json!({
            "op": "updateMission",
            "ownerUserId": owner,
            "entityId": mission_id,
            "fields": {"title": title}
        }))
        .await;
}

// 结果断言
#[then(expr = "设备令牌 {string} 应该收到 {int} 条推送")]
async fn token_received(world: &mut TeamLedgerWorld, token: String, expected: usize) {
    let sent = world.push.sent.lock().await;
    let count = sent.iter().filter(|m| m.token == token).count();
    assert_eq!(count, expected, "pushes to {token}");
}

#[then(expr = "一共应该发送 {int} 条推送")]
async fn total_pushes(world: &mut TeamLedgerWorld, expected: usize) {
    assert_eq!(world.push.sent.lock().await.len(), expected);
}

#[then(expr = "用户 {string} 应该有 {int} 条通知")]
async fn inbox_size(world: &mut TeamLedgerWorld, user_id: String, expected: usize) {
    assert_eq!(world.inbox(&user_id).await.len(), expected, "inbox of {user_id}");
}

#[then(expr = "用户 {string} 的最新通知类型应该是 {string}")]
async fn latest_kind(world: &mut TeamLedgerWorld, user_id: String, expected: String) {
    let records = world.inbox(&user_id).await;
    let latest = records
        .iter()
        .max_by_key(|r| r.created_at)
        .expect("inbox should not be empty");
    assert_eq!(latest.kind.as_str(), expected);
    assert!(!latest.read);
}

#[then(expr = "写入应该被拒绝")]
async fn write_rejected(world: &mut TeamLedgerWorld) {
    assert_eq!(world.last_stats.applied, 0);
    assert_eq!(world.last_stats.rejected, 1);
}

#[then(expr = "用户 {string} 的总预算应该约为 {float}")]
async fn total_budget(world: &mut TeamLedgerWorld, user_id: String, expected: f64) {
    let summary = world.calculator.user_summary(&user_id).await.unwrap();
    assert!((summary.total_budget - expected).abs() < 0.01, "{summary:?}");
}

#[then(expr = "用户 {string} 的总支出应该约为 {float}")]
async fn total_expenses(world: &mut TeamLedgerWorld, user_id: String, expected: f64) {
    let summary = world.calculator.user_summary(&user_id).await.unwrap();
    assert!((summary.total_expenses - expected).abs() < 0.01, "{summary:?}");
}

#[then(expr = "用户 {string} 的余额应该约为 {float}")]
async fn balance(world: &mut TeamLedgerWorld, user_id: String, expected: f64) {
    let summary = world.calculator.user_summary(&user_id).await.unwrap();
    assert!((summary.balance - expected).abs() < 0.01, "{summary:?}");
}

#[tokio::main]
async fn main() {
    TeamLedgerWorld::run("tests/features").await;
}
