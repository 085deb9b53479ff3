use crate::database::models::{to_fields, NotificationKind, NotificationRecord, User};
use crate::database::paths;
use crate::database::traits::{DocumentStore, SetOptions};
use crate::error::Result;
use crate::notifier::events::DomainEvent;
use crate::notifier::rules::{decide, Audience, NotificationMessage};
use crate::notifier::traits::{PushMessage, PushSender, UserDirectory};
use crate::utils::Logger;
use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Sent(String),
    NoToken,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Written(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered {
        push: PushOutcome,
        record: RecordOutcome,
    },
    /// 收件箱中已有同一事件的记录
    Duplicate,
    /// 目录中找不到接收者
    UnknownTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub target_user_id: String,
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    pub fn is_pushed(&self) -> bool {
        matches!(
            self.outcome,
            DeliveryOutcome::Delivered {
                push: PushOutcome::Sent(_),
                ..
            }
        )
    }

    pub fn is_recorded(&self) -> bool {
        matches!(
            self.outcome,
            DeliveryOutcome::Delivered {
                record: RecordOutcome::Written(_),
                ..
            }
        )
    }

    pub fn has_failure(&self) -> bool {
        matches!(
            self.outcome,
            DeliveryOutcome::Delivered {
                push: PushOutcome::Failed(_),
                ..
            } | DeliveryOutcome::Delivered {
                record: RecordOutcome::Failed(_),
                ..
            }
        )
    }
}

/// 一次事件分发的结果，每个接收者一条
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub kind: Option<NotificationKind>,
    pub deliveries: Vec<DeliveryReport>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn pushed_count(&self) -> usize {
        self.deliveries.iter().filter(|d| d.is_pushed()).count()
    }

    pub fn recorded_count(&self) -> usize {
        self.deliveries.iter().filter(|d| d.is_recorded()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeliveryReport> {
        self.deliveries.iter().filter(|d| d.has_failure())
    }
}

/// 投递对象。扇出时目录已返回完整档案，单一接收者只有 ID
#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    Resolved(User),
    Unresolved(String),
}

impl Recipient {
    pub fn user_id(&self) -> &str {
        match self {
            Recipient::Resolved(user) => &user.id,
            Recipient::Unresolved(user_id) => user_id,
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    directory: Arc<dyn UserDirectory>,
    push: Arc<dyn PushSender>,
    store: Arc<dyn DocumentStore>,
    deduplicate: bool,
}

impl NotificationDispatcher {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        push: Arc<dyn PushSender>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            directory,
            push,
            store,
            deduplicate: true,
        }
    }

    pub fn with_deduplication(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// 判定并投递。扇出时各接收者并发投递，单个失败不影响其他接收者
    pub async fn dispatch(&self, event: &DomainEvent, actor: &User) -> Result<DispatchReport> {
        let Some(notification) = decide(event, actor) else {
            debug!(
                "No notification for {} by {} ({:?})",
                event.kind().as_str(),
                actor.id,
                actor.role
            );
            return Ok(DispatchReport::default());
        };

        let targets = self.resolve(&notification.audience).await?;
        let key = event.idempotency_key();
        debug!(
            "Dispatching {} to {} target(s)",
            notification.message.kind.as_str(),
            targets.len()
        );

        let deliveries = join_all(
            targets
                .iter()
                .map(|target| self.deliver(target, &notification.message, &key)),
        )
        .await;

        Ok(DispatchReport {
            kind: Some(notification.message.kind),
            deliveries,
        })
    }

    async fn resolve(&self, audience: &Audience) -> Result<Vec<Recipient>> {
        match audience {
            Audience::User(user_id) => Ok(vec![Recipient::Unresolved(user_id.clone())]),
            Audience::CollaboratorsOf(manager_id) => {
                let collaborators = self.directory.collaborators_of(manager_id).await?;
                Ok(collaborators.into_iter().map(Recipient::Resolved).collect())
            }
        }
    }

    async fn lookup(&self, recipient: &Recipient) -> Result<Option<User>> {
        match recipient {
            Recipient::Resolved(user) => Ok(Some(user.clone())),
            Recipient::Unresolved(user_id) => self.directory.get_user(user_id).await,
        }
    }

    /// 投递给单个接收者：推送与收件箱记录各自独立尝试，互不影响
    pub async fn deliver(
        &self,
        recipient: &Recipient,
        message: &NotificationMessage,
        key: &str,
    ) -> DeliveryReport {
        let target_user_id = recipient.user_id();
        let record_path = paths::user_entry(target_user_id, paths::NOTIFICATIONS, key);

        if self.deduplicate {
            match self.store.get(&record_path).await {
                Ok(Some(_)) => {
                    debug!("Notification {} already delivered, skipping", record_path);
                    return DeliveryReport {
                        target_user_id: target_user_id.to_string(),
                        outcome: DeliveryOutcome::Duplicate,
                    };
                }
                Ok(None) => {}
                Err(e) => warn!("Duplicate check failed for {}: {}", record_path, e),
            }
        }

        let push = match self.lookup(recipient).await {
            Ok(Some(user)) => self.push_to(&user, message).await,
            Ok(None) => {
                debug!("Notification target {} not found, skipping", target_user_id);
                return DeliveryReport {
                    target_user_id: target_user_id.to_string(),
                    outcome: DeliveryOutcome::UnknownTarget,
                };
            }
            Err(e) => {
                warn!("Failed to look up {}: {}", target_user_id, e);
                PushOutcome::Failed(e.to_string())
            }
        };

        let record = self.record(&record_path, message).await;
        Logger::log_notification_sent(
            message.kind.as_str(),
            target_user_id,
            matches!(push, PushOutcome::Sent(_)),
        );

        DeliveryReport {
            target_user_id: target_user_id.to_string(),
            outcome: DeliveryOutcome::Delivered { push, record },
        }
    }

    async fn push_to(&self, user: &User, message: &NotificationMessage) -> PushOutcome {
        let Some(token) = user.device_token() else {
            debug!("No device token for {}, push skipped", user.id);
            return PushOutcome::NoToken;
        };

        let push = PushMessage {
            token: token.to_string(),
            title: message.title.clone(),
            body: message.body.clone(),
            data: message.data.clone(),
        };

        match self.push.send(&push).await {
            Ok(delivery_id) => {
                info!("Push sent to {}: {}", user.id, delivery_id);
                PushOutcome::Sent(delivery_id)
            }
            Err(e) => {
                warn!("Push to {} failed: {}", user.id, e);
                PushOutcome::Failed(e.to_string())
            }
        }
    }

    async fn record(&self, path: &str, message: &NotificationMessage) -> RecordOutcome {
        let record = NotificationRecord {
            title: message.title.clone(),
            body: message.body.clone(),
            kind: message.kind,
            read: false,
            created_at: Utc::now(),
            data: message.data.clone(),
        };

        let written = match to_fields(&record) {
            Ok(fields) => self.store.set(path, fields, SetOptions::replace()).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => RecordOutcome::Written(path.to_string()),
            Err(e) => {
                warn!("Failed to record notification {}: {}", path, e);
                RecordOutcome::Failed(e.to_string())
            }
        }
    }
}
