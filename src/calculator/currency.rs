use crate::error::{Result, TeamLedgerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 报表币种，同时也是所有跨币种换算的中转币种
pub const REPORTING_CURRENCY: Currency = Currency::Eur;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "XOF")]
    Xof,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Eur, Currency::Usd, Currency::Xof];

    /// 1 EUR 兑换多少单位本币
    pub fn rate(self) -> f64 {
        match self {
            Currency::Eur => 1.0,
            Currency::Usd => 1.09,
            Currency::Xof => 655.957,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Xof => "XOF",
        }
    }

    /// XOF 没有辅币单位
    pub fn decimals(self) -> usize {
        match self {
            Currency::Eur | Currency::Usd => 2,
            Currency::Xof => 0,
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "XOF" => Ok(Currency::Xof),
            _ => Err(TeamLedgerError::unknown_currency(code)),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = TeamLedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Currency::from_code(s)
    }
}

/// 币种换算，一律经由 EUR 中转，不使用直接汇率
pub fn convert(amount: f64, from: Currency, to: Currency) -> f64 {
    amount / from.rate() * to.rate()
}

pub fn to_reporting(amount: f64, from: Currency) -> f64 {
    convert(amount, from, REPORTING_CURRENCY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_eur_is_identity() {
        assert_eq!(to_reporting(2500.0, Currency::Eur), 2500.0);
        assert_eq!(convert(75.0, Currency::Eur, Currency::Eur), 75.0);
    }

    #[test]
    fn test_usd_to_eur() {
        let eur = to_reporting(150.0, Currency::Usd);
        assert!((eur - 137.614_678_899).abs() < 1e-6);
    }

    #[test]
    fn test_cross_rate_pivots_through_eur() {
        let xof = convert(100.0, Currency::Usd, Currency::Xof);
        let expected = 100.0 / 1.09 * 655.957;
        assert_eq!(xof, expected);
    }

    #[test]
    fn test_round_trip_every_pair() {
        for from in Currency::ALL {
            for to in Currency::ALL {
                let x = 1234.56;
                let back = convert(convert(x, from, to), to, from);
                assert!(
                    (back - x).abs() < TOLERANCE * x,
                    "{from} -> {to} -> {from}: {back}"
                );
            }
        }
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Currency::from_code("EUR").unwrap(), Currency::Eur);
        assert_eq!(Currency::from_code(" usd ").unwrap(), Currency::Usd);
        assert_eq!("XOF".parse::<Currency>().unwrap(), Currency::Xof);

        let err = Currency::from_code("GBP").unwrap_err();
        assert!(matches!(err, TeamLedgerError::UnknownCurrency { ref code } if code == "GBP"));
    }

    #[test]
    fn test_serde_uses_iso_codes() {
        assert_eq!(serde_json::to_string(&Currency::Xof).unwrap(), "\"XOF\"");
        let c: Currency = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(c, Currency::Usd);
    }
}
