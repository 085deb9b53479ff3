use crate::database::models::{
    Mission, MissionStatus, MissionType, NotificationKind, Recap, Transaction, TransactionType,
};

/// 会触发通知判定的领域事件
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    ExpenseCreated(Transaction),
    BudgetAdded(Transaction),
    RecapCreated(Recap),
    MissionCompleted(Mission),
    SharedMissionCreated(Mission),
}

impl DomainEvent {
    pub fn from_transaction(transaction: Transaction) -> Self {
        match transaction.transaction_type {
            TransactionType::Expense => DomainEvent::ExpenseCreated(transaction),
            TransactionType::BudgetAdd => DomainEvent::BudgetAdded(transaction),
        }
    }

    pub fn from_recap(recap: Recap) -> Self {
        DomainEvent::RecapCreated(recap)
    }

    /// 只在状态从非 DONE 变为 DONE 时产生事件
    pub fn from_mission_update(before: &Mission, after: Mission) -> Option<Self> {
        let completed =
            before.status != MissionStatus::Done && after.status == MissionStatus::Done;
        completed.then_some(DomainEvent::MissionCompleted(after))
    }

    /// 个人任务的创建不产生事件
    pub fn from_mission_created(mission: Mission) -> Option<Self> {
        match mission.mission_type {
            MissionType::Shared => Some(DomainEvent::SharedMissionCreated(mission)),
            MissionType::Personal => None,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            DomainEvent::ExpenseCreated(_) => NotificationKind::ExpenseAdded,
            DomainEvent::BudgetAdded(_) => NotificationKind::BudgetAdded,
            DomainEvent::RecapCreated(_) => NotificationKind::RecapAdded,
            DomainEvent::MissionCompleted(_) => NotificationKind::MissionCompleted,
            DomainEvent::SharedMissionCreated(_) => NotificationKind::MissionAssigned,
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            DomainEvent::ExpenseCreated(tx) | DomainEvent::BudgetAdded(tx) => &tx.id,
            DomainEvent::RecapCreated(recap) => &recap.id,
            DomainEvent::MissionCompleted(mission)
            | DomainEvent::SharedMissionCreated(mission) => &mission.id,
        }
    }

    /// 同一事件重复投递时得到相同的键。
    ///
    /// 任务完成可以发生多次，键中带上触发写入的修订号。
    pub fn idempotency_key(&self) -> String {
        match self {
            DomainEvent::MissionCompleted(Mission {
                revision: Some(revision),
                ..
            }) => format!("{}-{}-{}", self.kind().as_str(), self.entity_id(), revision),
            _ => format!("{}-{}", self.kind().as_str(), self.entity_id()),
        }
    }
}
