use crate::calculator::currency::{to_reporting, Currency};
use crate::database::models::{Document, Transaction, TransactionType};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// 以报表币种 (EUR) 计的余额汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub balance: f64,
    pub total_budget: f64,
    pub total_expenses: f64,
}

/// 单一币种下的原币合计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotals {
    pub budget: f64,
    pub expenses: f64,
}

/// 多币种流水汇总。纯函数，无内部状态，每次都对完整快照重新计算
pub struct LedgerAggregator;

impl LedgerAggregator {
    pub fn aggregate<'a, I>(transactions: I) -> LedgerSummary
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut total_budget = 0.0;
        let mut total_expenses = 0.0;

        for tx in transactions {
            let amount = to_reporting(tx.amount, tx.currency);
            match tx.transaction_type {
                TransactionType::BudgetAdd => total_budget += amount,
                TransactionType::Expense => total_expenses += amount,
            }
        }

        LedgerSummary {
            balance: total_budget - total_expenses,
            total_budget,
            total_expenses,
        }
    }

    /// 直接汇总存储中的原始文档；未知币种按配置错误返回
    pub fn aggregate_documents(documents: &[Document]) -> Result<LedgerSummary> {
        let transactions = documents
            .iter()
            .map(Transaction::from_document)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::aggregate(&transactions))
    }

    /// 只汇总 `[from, to]` 区间内的流水（含边界）
    pub fn aggregate_between(
        transactions: &[Transaction],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LedgerSummary {
        Self::aggregate(
            transactions
                .iter()
                .filter(|tx| tx.date >= from && tx.date <= to),
        )
    }

    /// 按原币种分别统计，不做换算
    pub fn breakdown_by_currency(transactions: &[Transaction]) -> BTreeMap<Currency, CurrencyTotals> {
        let mut totals: BTreeMap<Currency, CurrencyTotals> = BTreeMap::new();
        for tx in transactions {
            let entry = totals.entry(tx.currency).or_default();
            match tx.transaction_type {
                TransactionType::BudgetAdd => entry.budget += tx.amount,
                TransactionType::Expense => entry.expenses += tx.amount,
            }
        }
        totals
    }
}

pub fn aggregate(transactions: &[Transaction]) -> LedgerSummary {
    LedgerAggregator::aggregate(transactions)
}
