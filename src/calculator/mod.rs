pub mod aggregate;
pub mod balance;
pub mod currency;

pub use aggregate::{aggregate, LedgerAggregator, LedgerSummary};
pub use balance::BalanceCalculator;
pub use currency::{convert, Currency};
