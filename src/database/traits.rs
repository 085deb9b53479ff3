use crate::database::models::{Document, Fields};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// 写入选项；`merge` 为真时只覆盖给出的字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn replace() -> Self {
        Self { merge: false }
    }
}

/// 局部更新的字段值，`Delete` 为删除标记
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Set(Value),
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => fields.get(field) == Some(value),
        }
    }
}

/// 抽象文档存储操作的trait，用于测试时mock
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 读取单个文档
    async fn get(&self, path: &str) -> Result<Option<Document>>;

    /// 写入文档
    async fn set(&self, path: &str, fields: Fields, options: SetOptions) -> Result<()>;

    /// 查询集合
    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// 局部更新已存在的文档
    async fn update(&self, path: &str, fields: Vec<(String, FieldValue)>) -> Result<()>;

    /// 在集合中追加文档，返回生成的 ID
    async fn add(&self, collection: &str, fields: Fields) -> Result<String>;
}
