use crate::database::models::User;
use crate::database::paths;
use crate::database::traits::{DocumentStore, Filter};
use crate::error::Result;
use crate::notifier::traits::UserDirectory;
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

/// 基于文档存储 `users` 集合的用户目录
#[derive(Clone)]
pub struct StoreUserDirectory {
    store: Arc<dyn DocumentStore>,
}

impl StoreUserDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserDirectory for StoreUserDirectory {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        match self.store.get(&paths::user(user_id)).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    async fn collaborators_of(&self, manager_id: &str) -> Result<Vec<User>> {
        let documents = self
            .store
            .query(paths::USERS, &Filter::eq("managerId", manager_id))
            .await?;

        // 单条损坏的用户档案不应影响其他协作者
        let mut users = Vec::with_capacity(documents.len());
        for doc in documents {
            match doc.decode::<User>() {
                Ok(user) => users.push(user),
                Err(e) => warn!("Skipping unreadable user {}: {}", doc.path, e),
            }
        }
        Ok(users)
    }
}
