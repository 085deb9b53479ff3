use crate::database::models::{Document, Mission, Recap, Transaction};
use crate::error::{Result, TeamLedgerError};
use crate::notifier::dispatcher::{DispatchReport, NotificationDispatcher};
use crate::notifier::events::DomainEvent;
use crate::notifier::traits::UserDirectory;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// 写入后的触发入口，每种写入一个方法。
///
/// 这些方法从不返回错误：通知失败只记日志，不能影响触发它的写入。
#[derive(Clone)]
pub struct TriggerHandler {
    directory: Arc<dyn UserDirectory>,
    dispatcher: NotificationDispatcher,
}

impl TriggerHandler {
    pub fn new(directory: Arc<dyn UserDirectory>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            directory,
            dispatcher,
        }
    }

    pub async fn on_transaction_created(
        &self,
        owner_user_id: &str,
        transaction_id: &str,
        after: &Document,
    ) {
        let event = Transaction::from_document(after).map(|mut tx| {
            tx.id = transaction_id.to_string();
            DomainEvent::from_transaction(tx)
        });
        self.run("transaction created", owner_user_id, event.map(Some))
            .await;
    }

    pub async fn on_recap_created(&self, owner_user_id: &str, recap_id: &str, after: &Document) {
        let event = after.decode::<Recap>().map(|mut recap| {
            recap.id = recap_id.to_string();
            if recap.author_id.is_empty() {
                recap.author_id = owner_user_id.to_string();
            }
            DomainEvent::from_recap(recap)
        });
        self.run("recap created", owner_user_id, event.map(Some)).await;
    }

    pub async fn on_mission_created(&self, owner_user_id: &str, mission_id: &str, after: &Document) {
        let event = decode_mission(owner_user_id, mission_id, after)
            .map(DomainEvent::from_mission_created);
        self.run("mission created", owner_user_id, event).await;
    }

    pub async fn on_mission_updated(
        &self,
        owner_user_id: &str,
        mission_id: &str,
        before: &Document,
        after: &Document,
    ) {
        let event = decode_mission(owner_user_id, mission_id, before).and_then(|before| {
            decode_mission(owner_user_id, mission_id, after)
                .map(|after| DomainEvent::from_mission_update(&before, after))
        });
        self.run("mission updated", owner_user_id, event).await;
    }

    /// 查找发起人并分发；错误会返回给调用方
    pub async fn dispatch_for(
        &self,
        owner_user_id: &str,
        event: &DomainEvent,
    ) -> Result<DispatchReport> {
        let actor = self
            .directory
            .get_user(owner_user_id)
            .await?
            .ok_or_else(|| TeamLedgerError::lookup_miss(owner_user_id))?;

        self.dispatcher.dispatch(event, &actor).await
    }

    async fn run(&self, trigger: &str, owner_user_id: &str, event: Result<Option<DomainEvent>>) {
        let event = match event {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!("{} by {}: nothing to notify", trigger, owner_user_id);
                return;
            }
            Err(e) => {
                error!("{} by {}: unreadable document: {}", trigger, owner_user_id, e);
                return;
            }
        };

        match self.dispatch_for(owner_user_id, &event).await {
            Ok(report) if report.is_empty() => {
                debug!("{} by {}: no recipient", trigger, owner_user_id);
            }
            Ok(report) => {
                info!(
                    "{} by {}: {} delivery(ies), {} pushed, {} recorded",
                    trigger,
                    owner_user_id,
                    report.deliveries.len(),
                    report.pushed_count(),
                    report.recorded_count()
                );
                for failed in report.failures() {
                    warn!("Partial delivery to {}: {:?}", failed.target_user_id, failed.outcome);
                }
            }
            Err(e) if e.is_lookup_miss() => {
                debug!("{} by {}: {}", trigger, owner_user_id, e);
            }
            Err(e) => {
                error!(
                    "{} by {}: notification dispatch failed [{}]: {}",
                    trigger,
                    owner_user_id,
                    e.severity(),
                    e
                );
            }
        }
    }
}

fn decode_mission(owner_user_id: &str, mission_id: &str, doc: &Document) -> Result<Mission> {
    let mut mission: Mission = doc.decode()?;
    mission.id = mission_id.to_string();
    if mission.author_id.is_empty() {
        mission.author_id = owner_user_id.to_string();
    }
    Ok(mission)
}
