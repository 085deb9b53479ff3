use crate::calculator::currency::Currency;
use crate::database::paths;
use crate::error::{Result, TeamLedgerError};
use crate::utils::Validator;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type Fields = Map<String, Value>;

/// 文档存储中的一条原始记录
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub path: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: impl Into<String>, fields: Fields) -> Self {
        let path = path.into();
        let id = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { id, path, fields }
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// 解码为强类型记录；缺失的 `id` 用文档 ID 补齐
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields
            .entry("id")
            .or_insert_with(|| Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| TeamLedgerError::invalid_document(&self.path, e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    BudgetAdd,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub author_id: String,
    pub amount: f64,
    pub currency: Currency,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub reason: String,
    pub date: DateTime<Utc>,
}

/// 存储层的交易原文，币种保留为字符串，便于区分未知币种与格式错误
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTransaction {
    id: String,
    #[serde(default)]
    author_id: Option<String>,
    amount: f64,
    currency: String,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    #[serde(default)]
    reason: String,
    date: DateTime<Utc>,
}

impl Transaction {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let stored: StoredTransaction = doc.decode()?;
        let currency = Currency::from_code(&stored.currency)?;

        if !Validator::is_valid_amount(stored.amount) {
            return Err(TeamLedgerError::invalid_document(
                &doc.path,
                format!("amount must be a non-negative finite number, got {}", stored.amount),
            ));
        }

        let author_id = stored
            .author_id
            .or_else(|| paths::owner_of(&doc.path).map(str::to_string))
            .ok_or_else(|| TeamLedgerError::invalid_document(&doc.path, "missing authorId"))?;

        Ok(Self {
            id: stored.id,
            author_id,
            amount: stored.amount,
            currency,
            transaction_type: stored.transaction_type,
            reason: stored.reason,
            date: stored.date,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Patron,
    Responsable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
}

impl User {
    /// 负责人的上级；老板或未设置时为 None
    pub fn manager(&self) -> Option<&str> {
        match self.role {
            Role::Responsable => self.manager_id.as_deref().filter(|m| !m.is_empty()),
            Role::Patron => None,
        }
    }

    pub fn device_token(&self) -> Option<&str> {
        self.device_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        let path = paths::user(&self.id);
        match (self.role, self.manager_id.as_deref()) {
            (Role::Responsable, None) | (Role::Responsable, Some("")) => Err(
                TeamLedgerError::invalid_document(path, "RESPONSABLE requires a managerId"),
            ),
            (Role::Patron, Some(_)) => Err(TeamLedgerError::invalid_document(
                path,
                "PATRON cannot have a managerId",
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionType {
    Personal,
    Shared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    #[serde(default)]
    pub author_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: MissionStatus,
    #[serde(rename = "type")]
    pub mission_type: MissionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// 每次更新写入时生成，区分同一任务的多次状态变化
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recap {
    pub id: String,
    #[serde(default)]
    pub author_id: String,
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub recap_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ExpenseAdded,
    BudgetAdded,
    RecapAdded,
    MissionCompleted,
    MissionAssigned,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::ExpenseAdded => "EXPENSE_ADDED",
            NotificationKind::BudgetAdded => "BUDGET_ADDED",
            NotificationKind::RecapAdded => "RECAP_ADDED",
            NotificationKind::MissionCompleted => "MISSION_COMPLETED",
            NotificationKind::MissionAssigned => "MISSION_ASSIGNED",
        }
    }
}

/// 应用内通知收件箱中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub data: BTreeMap<String, String>,
}

/// 任意可序列化记录转为字段表
pub fn to_fields<T: Serialize>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(TeamLedgerError::invalid_document(
            "",
            format!("expected an object, got {other}"),
        )),
    }
}
