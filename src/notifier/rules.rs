//! 通知判定规则
//!
//! 纯函数：给定事件和发起人，决定通知谁、发什么。每个事件最多产生一条通知，
//! 共享任务是唯一一种会扇出到多个接收者的情况。

use crate::database::models::{NotificationKind, Role, User};
use crate::notifier::events::DomainEvent;
use crate::utils::Formatter;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    User(String),
    /// 所有 `managerId` 等于该 ID 的协作者
    CollaboratorsOf(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub audience: Audience,
    pub message: NotificationMessage,
}

pub fn decide(event: &DomainEvent, actor: &User) -> Option<Notification> {
    let kind = event.kind();
    let mut data = BTreeMap::from([("type".to_string(), kind.as_str().to_string())]);

    match event {
        DomainEvent::ExpenseCreated(tx) => {
            let manager = actor.manager()?;
            let amount = Formatter::format_amount(tx.amount, tx.currency);
            data.insert("transactionId".into(), tx.id.clone());
            data.insert("userId".into(), actor.id.clone());
            data.insert("userName".into(), actor.name.clone());
            data.insert("amount".into(), tx.amount.to_string());
            data.insert("currency".into(), tx.currency.code().to_string());
            data.insert("reason".into(), tx.reason.clone());

            Some(Notification {
                audience: Audience::User(manager.to_string()),
                message: NotificationMessage {
                    kind,
                    title: "💰 Nouvelle dépense".to_string(),
                    body: format!("{} a ajouté une dépense de {} : {}", actor.name, amount, tx.reason),
                    data,
                },
            })
        }
        DomainEvent::BudgetAdded(tx) => {
            // 预算通知给收到预算的负责人本人，而不是上级
            actor.manager()?;
            let amount = Formatter::format_amount(tx.amount, tx.currency);
            data.insert("transactionId".into(), tx.id.clone());
            data.insert("amount".into(), tx.amount.to_string());
            data.insert("currency".into(), tx.currency.code().to_string());

            Some(Notification {
                audience: Audience::User(actor.id.clone()),
                message: NotificationMessage {
                    kind,
                    title: "💵 Budget ajouté".to_string(),
                    body: format!("Un budget de {} a été ajouté à votre compte", amount),
                    data,
                },
            })
        }
        DomainEvent::RecapCreated(recap) => {
            let manager = actor.manager()?;
            data.insert("recapId".into(), recap.id.clone());
            data.insert("userId".into(), actor.id.clone());
            data.insert("userName".into(), actor.name.clone());
            data.insert("title".into(), recap.title.clone());

            Some(Notification {
                audience: Audience::User(manager.to_string()),
                message: NotificationMessage {
                    kind,
                    title: "📋 Nouveau rapport".to_string(),
                    body: format!("{} a publié un nouveau rapport : {}", actor.name, recap.title),
                    data,
                },
            })
        }
        DomainEvent::MissionCompleted(mission) => {
            let manager = actor.manager()?;
            data.insert("missionId".into(), mission.id.clone());
            data.insert("userId".into(), actor.id.clone());
            data.insert("userName".into(), actor.name.clone());
            data.insert("title".into(), mission.title.clone());

            Some(Notification {
                audience: Audience::User(manager.to_string()),
                message: NotificationMessage {
                    kind,
                    title: "✅ Mission terminée".to_string(),
                    body: format!("{} a terminé la mission : {}", actor.name, mission.title),
                    data,
                },
            })
        }
        DomainEvent::SharedMissionCreated(mission) => {
            if actor.role != Role::Patron {
                return None;
            }
            data.insert("missionId".into(), mission.id.clone());
            data.insert("patronId".into(), actor.id.clone());
            data.insert("title".into(), mission.title.clone());

            Some(Notification {
                audience: Audience::CollaboratorsOf(actor.id.clone()),
                message: NotificationMessage {
                    kind,
                    title: "🎯 Nouvelle mission".to_string(),
                    body: format!("{} vous a assigné une nouvelle mission : {}", actor.name, mission.title),
                    data,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::currency::Currency;
    use crate::database::models::{
        Mission, MissionStatus, MissionType, Recap, Transaction, TransactionType,
    };
    use chrono::Utc;

    fn responsable() -> User {
        User {
            id: "R1".into(),
            name: "Awa".into(),
            role: Role::Responsable,
            manager_id: Some("P1".into()),
            device_token: Some("tok-r1".into()),
        }
    }

    fn patron() -> User {
        User {
            id: "P1".into(),
            name: "Moussa".into(),
            role: Role::Patron,
            manager_id: None,
            device_token: Some("tok-p1".into()),
        }
    }

    fn transaction(kind: TransactionType) -> Transaction {
        Transaction {
            id: "t1".into(),
            author_id: "R1".into(),
            amount: 150.0,
            currency: Currency::Usd,
            transaction_type: kind,
            reason: "Carburant".into(),
            date: Utc::now(),
        }
    }

    fn mission(mission_type: MissionType) -> Mission {
        Mission {
            id: "m1".into(),
            author_id: "P1".into(),
            title: "Inventaire".into(),
            description: None,
            status: MissionStatus::Done,
            mission_type,
            date: None,
            revision: None,
        }
    }

    #[test]
    fn test_expense_notifies_manager() {
        let event = DomainEvent::from_transaction(transaction(TransactionType::Expense));
        let n = decide(&event, &responsable()).unwrap();

        assert_eq!(n.audience, Audience::User("P1".into()));
        assert_eq!(n.message.title, "💰 Nouvelle dépense");
        assert_eq!(n.message.data["type"], "EXPENSE_ADDED");
        assert_eq!(n.message.data["amount"], "150");
        assert_eq!(n.message.data["currency"], "USD");
        assert!(n.message.body.contains("Awa"));
        assert!(n.message.body.contains("150.00 USD"));
        assert!(n.message.body.contains("Carburant"));
    }

    #[test]
    fn test_expense_without_manager_is_silent() {
        let event = DomainEvent::from_transaction(transaction(TransactionType::Expense));
        assert!(decide(&event, &patron()).is_none());

        let orphan = User {
            manager_id: None,
            ..responsable()
        };
        assert!(decide(&event, &orphan).is_none());
    }

    #[test]
    fn test_budget_notifies_recipient_not_manager() {
        let event = DomainEvent::from_transaction(transaction(TransactionType::BudgetAdd));
        let n = decide(&event, &responsable()).unwrap();

        assert_eq!(n.audience, Audience::User("R1".into()));
        assert_eq!(n.message.title, "💵 Budget ajouté");
        assert_eq!(n.message.data["type"], "BUDGET_ADDED");

        assert!(decide(&event, &patron()).is_none());
    }

    #[test]
    fn test_recap_notifies_manager() {
        let recap = Recap {
            id: "rc1".into(),
            author_id: "R1".into(),
            title: "Semaine 12".into(),
            recap_type: None,
            content: None,
            date: None,
        };
        let event = DomainEvent::from_recap(recap);
        let n = decide(&event, &responsable()).unwrap();
        assert_eq!(n.audience, Audience::User("P1".into()));
        assert_eq!(n.message.title, "📋 Nouveau rapport");
        assert!(n.message.body.contains("Semaine 12"));
        assert_eq!(n.message.data["type"], "RECAP_ADDED");

        assert!(decide(&event, &patron()).is_none());
    }

    #[test]
    fn test_mission_completed_notifies_manager() {
        let event = DomainEvent::MissionCompleted(mission(MissionType::Personal));
        let n = decide(&event, &responsable()).unwrap();
        assert_eq!(n.audience, Audience::User("P1".into()));
        assert_eq!(n.message.title, "✅ Mission terminée");
        assert_eq!(n.message.data["type"], "MISSION_COMPLETED");
    }

    #[test]
    fn test_shared_mission_fans_out_from_patron_only() {
        let event = DomainEvent::SharedMissionCreated(mission(MissionType::Shared));
        let n = decide(&event, &patron()).unwrap();
        assert_eq!(n.audience, Audience::CollaboratorsOf("P1".into()));
        assert_eq!(n.message.title, "🎯 Nouvelle mission");
        assert_eq!(n.message.data["type"], "MISSION_ASSIGNED");

        assert!(decide(&event, &responsable()).is_none());
    }
}
