use crate::calculator::aggregate::{CurrencyTotals, LedgerAggregator, LedgerSummary};
use crate::calculator::currency::Currency;
use crate::database::models::Transaction;
use crate::database::paths;
use crate::database::traits::{DocumentStore, Filter};
use crate::error::Result;
use crate::utils::Logger;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 读取用户完整的流水快照并汇总；不缓存，不做增量更新
#[derive(Clone)]
pub struct BalanceCalculator {
    store: Arc<dyn DocumentStore>,
}

impl BalanceCalculator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let collection = paths::user_collection(user_id, paths::TRANSACTIONS);
        let documents = self.store.query(&collection, &Filter::All).await?;
        debug!("Loaded {} transactions for {}", documents.len(), user_id);

        documents.iter().map(Transaction::from_document).collect()
    }

    /// 计算用户当前余额
    pub async fn user_summary(&self, user_id: &str) -> Result<LedgerSummary> {
        let transactions = self.transactions(user_id).await?;
        let summary = LedgerAggregator::aggregate(&transactions);

        Logger::log_balance(
            user_id,
            summary.balance,
            summary.total_budget,
            summary.total_expenses,
        );
        Ok(summary)
    }

    pub async fn user_summary_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<LedgerSummary> {
        let transactions = self.transactions(user_id).await?;
        Ok(LedgerAggregator::aggregate_between(&transactions, from, to))
    }

    pub async fn user_breakdown(&self, user_id: &str) -> Result<BTreeMap<Currency, CurrencyTotals>> {
        let transactions = self.transactions(user_id).await?;
        Ok(LedgerAggregator::breakdown_by_currency(&transactions))
    }
}
