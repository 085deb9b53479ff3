use crate::calculator::currency::Currency;
use log::{error, info};
use regex::Regex;
use std::sync::OnceLock;

/// 日志记录工具
pub struct Logger;

impl Logger {
    pub fn log_operation_start(operation: &str, details: &str) {
        info!("🚀 Starting {}: {}", operation, details);
    }

    pub fn log_operation_success(operation: &str, details: &str) {
        info!("✅ {} completed successfully: {}", operation, details);
    }

    pub fn log_operation_failure(operation: &str, error: &str) {
        error!("❌ {} failed: {}", operation, error);
    }

    pub fn log_notification_sent(kind: &str, target_user_id: &str, pushed: bool) {
        info!(
            "🔔 Notification {} -> {} (push: {})",
            kind,
            target_user_id,
            if pushed { "sent" } else { "skipped" }
        );
    }

    pub fn log_balance(user_id: &str, balance: f64, budget: f64, expenses: f64) {
        info!(
            "💰 Balance for {}: {:.2} EUR (budget {:.2} / expenses {:.2})",
            user_id, balance, budget, expenses
        );
    }
}

/// 格式化工具
pub struct Formatter;

impl Formatter {
    /// 按币种精度格式化金额
    pub fn format_amount(amount: f64, currency: Currency) -> String {
        format!("{:.*} {}", currency.decimals(), amount, currency.code())
    }
}

/// 验证工具
pub struct Validator;

impl Validator {
    /// 验证金额
    pub fn is_valid_amount(amount: f64) -> bool {
        amount >= 0.0 && amount <= 999_999_999_999.99 && !amount.is_nan() && !amount.is_infinite()
    }

    /// 验证文档 ID 或路径段
    pub fn is_valid_document_id(id: &str) -> bool {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN
            .get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]{1,256}$").expect("valid id pattern"));
        pattern.is_match(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(Formatter::format_amount(1000.0, Currency::Eur), "1000.00 EUR");
        assert_eq!(Formatter::format_amount(150.5, Currency::Usd), "150.50 USD");
        assert_eq!(Formatter::format_amount(25000.0, Currency::Xof), "25000 XOF");
    }

    #[test]
    fn test_validators() {
        // 金额验证
        assert!(Validator::is_valid_amount(1000.0));
        assert!(Validator::is_valid_amount(0.0));
        assert!(!Validator::is_valid_amount(-100.0));
        assert!(!Validator::is_valid_amount(f64::NAN));
        assert!(!Validator::is_valid_amount(f64::INFINITY));

        // 文档 ID 验证
        assert!(Validator::is_valid_document_id("P1"));
        assert!(Validator::is_valid_document_id("EXPENSE_ADDED-tx_42"));
        assert!(!Validator::is_valid_document_id(""));
        assert!(!Validator::is_valid_document_id("a/b"));
        assert!(!Validator::is_valid_document_id("has space"));
    }
}
