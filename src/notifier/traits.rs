use crate::database::models::User;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// 推送到设备的一条消息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

/// 抽象推送服务的trait，用于测试时mock
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    /// 发送推送，成功时返回投递 ID
    async fn send(&self, message: &PushMessage) -> Result<String>;
}

/// 用户目录查询
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// 所有 `managerId` 指向该用户的协作者
    async fn collaborators_of(&self, manager_id: &str) -> Result<Vec<User>>;
}
