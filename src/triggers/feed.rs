use crate::database::models::{
    to_fields, Document, Fields, Mission, Recap, Role, Transaction, User,
};
use crate::database::paths;
use crate::database::traits::{DocumentStore, SetOptions};
use crate::error::{Result, TeamLedgerError};
use crate::triggers::handler::TriggerHandler;
use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteOp {
    UpsertUser,
    CreateTransaction,
    CreateRecap,
    CreateMission,
    UpdateMission,
}

/// 一行写入请求
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    pub op: WriteOp,
    pub owner_user_id: String,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub applied: usize,
    pub rejected: usize,
}

/// 先完成写入，再在独立任务上触发通知
#[derive(Clone)]
pub struct EventFeed {
    store: Arc<dyn DocumentStore>,
    handler: TriggerHandler,
}

impl EventFeed {
    pub fn new(store: Arc<dyn DocumentStore>, handler: TriggerHandler) -> Self {
        Self { store, handler }
    }

    /// 逐行处理写入请求，结束前等待所有已触发的通知任务
    pub async fn run<R>(&self, reader: R) -> Result<FeedStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut stats = FeedStats::default();
        let mut pending = Vec::new();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let applied = match serde_json::from_str::<WriteRequest>(line) {
                Ok(request) => self.apply(request).await,
                Err(e) => Err(e.into()),
            };

            match applied {
                Ok(task) => {
                    stats.applied += 1;
                    pending.extend(task);
                }
                Err(e) => {
                    stats.rejected += 1;
                    warn!("Rejected write: {}", e);
                }
            }
        }

        for result in join_all(pending).await {
            if let Err(e) = result {
                error!("Notification task panicked: {}", e);
            }
        }

        info!(
            "Feed finished: {} applied, {} rejected",
            stats.applied, stats.rejected
        );
        Ok(stats)
    }

    /// 写入一条记录；写入成功后返回对应的通知任务（若有）
    pub async fn apply(&self, request: WriteRequest) -> Result<Option<JoinHandle<()>>> {
        let owner = request.owner_user_id.clone();
        let entity_id = request
            .entity_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        match request.op {
            WriteOp::UpsertUser => {
                let path = paths::user(&owner);
                let merged = self.merged_fields(&path, request.fields).await?;
                let user: User = Document::new(&path, merged).decode()?;
                user.validate()?;
                if let Some(manager_id) = user.manager() {
                    self.ensure_patron(&path, manager_id).await?;
                }

                self.store
                    .set(&path, to_fields(&user)?, SetOptions::replace())
                    .await?;
                debug!("Upserted user {}", owner);
                Ok(None)
            }
            WriteOp::CreateTransaction => {
                let path = paths::user_entry(&owner, paths::TRANSACTIONS, &entity_id);
                let fields = with_author(request.fields, &owner);
                let doc = Document::new(&path, fields);
                Transaction::from_document(&doc)?;

                self.create_once(&doc).await?;
                let handler = self.handler.clone();
                Ok(Some(tokio::spawn(async move {
                    handler.on_transaction_created(&owner, &entity_id, &doc).await;
                })))
            }
            WriteOp::CreateRecap => {
                let path = paths::user_entry(&owner, paths::RECAPS, &entity_id);
                let doc = Document::new(&path, with_author(request.fields, &owner));
                doc.decode::<Recap>()?;

                self.create_once(&doc).await?;
                let handler = self.handler.clone();
                Ok(Some(tokio::spawn(async move {
                    handler.on_recap_created(&owner, &entity_id, &doc).await;
                })))
            }
            WriteOp::CreateMission => {
                let path = paths::user_entry(&owner, paths::MISSIONS, &entity_id);
                let doc = Document::new(&path, with_author(request.fields, &owner));
                doc.decode::<Mission>()?;

                self.create_once(&doc).await?;
                let handler = self.handler.clone();
                Ok(Some(tokio::spawn(async move {
                    handler.on_mission_created(&owner, &entity_id, &doc).await;
                })))
            }
            WriteOp::UpdateMission => {
                let path = paths::user_entry(&owner, paths::MISSIONS, &entity_id);
                let before = self.store.get(&path).await?.ok_or_else(|| {
                    TeamLedgerError::invalid_document(&path, "mission does not exist")
                })?;

                let mut merged = before.fields.clone();
                merged.extend(request.fields);
                merged.insert(
                    "revision".to_string(),
                    Value::String(uuid::Uuid::new_v4().to_string()),
                );
                let after = Document::new(&path, merged);
                after.decode::<Mission>()?;

                self.store.set(&path, after.fields.clone(), SetOptions::replace()).await?;
                let handler = self.handler.clone();
                Ok(Some(tokio::spawn(async move {
                    handler
                        .on_mission_updated(&owner, &entity_id, &before, &after)
                        .await;
                })))
            }
        }
    }

    /// 流水等记录只追加不修改。内容相同的重复创建视为重投，保留原文档并照常触发
    async fn create_once(&self, doc: &Document) -> Result<()> {
        match self.store.get(&doc.path).await? {
            None => {
                self.store
                    .set(&doc.path, doc.fields.clone(), SetOptions::replace())
                    .await
            }
            Some(existing) if existing.fields == doc.fields => {
                debug!("Redelivered create for {}, stored document kept", doc.path);
                Ok(())
            }
            Some(_) => Err(TeamLedgerError::conflict(&doc.path)),
        }
    }

    async fn ensure_patron(&self, user_path: &str, manager_id: &str) -> Result<()> {
        let manager: User = self
            .store
            .get(&paths::user(manager_id))
            .await?
            .ok_or_else(|| {
                TeamLedgerError::invalid_document(
                    user_path,
                    format!("manager {manager_id} does not exist"),
                )
            })?
            .decode()?;

        if manager.role != Role::Patron {
            return Err(TeamLedgerError::invalid_document(
                user_path,
                format!("manager {manager_id} is not a PATRON"),
            ));
        }
        Ok(())
    }

    async fn merged_fields(&self, path: &str, fields: Fields) -> Result<Fields> {
        let mut merged = self
            .store
            .get(path)
            .await?
            .map(|doc| doc.fields)
            .unwrap_or_default();
        merged.extend(fields);
        Ok(merged)
    }
}

fn with_author(mut fields: Fields, owner: &str) -> Fields {
    fields
        .entry("authorId")
        .or_insert_with(|| Value::String(owner.to_string()));
    fields
}
