use crate::calculator::balance::BalanceCalculator;
use crate::config::Settings;
use crate::triggers::feed::EventFeed;
use crate::utils::Formatter;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde_json::json;
use tokio::io::BufReader;

const HELP_TEXT: &str = "TeamLedger

用法:
  teamledger listen            从标准输入逐行读取写入请求 (JSON)，写入后触发通知
  teamledger balance <userId> [from to]
                               输出用户的 EUR 余额与各币种明细；可选 RFC 3339 时间区间（含边界）
  teamledger status            查看当前配置
  teamledger help              显示帮助信息";

#[derive(Clone)]
pub struct Commands {
    feed: EventFeed,
    calculator: BalanceCalculator,
    settings: Settings,
}

impl Commands {
    pub fn new(feed: EventFeed, calculator: BalanceCalculator, settings: Settings) -> Self {
        Self {
            feed,
            calculator,
            settings,
        }
    }

    pub async fn handle_command(&self, command: &str, args: &[String]) -> Result<()> {
        match command {
            "listen" => self.handle_listen().await,
            "balance" => {
                let user_id = args
                    .first()
                    .ok_or_else(|| anyhow!("balance requires a user id"))?;
                let window = match (args.get(1), args.get(2)) {
                    (Some(from), Some(to)) => Some((parse_instant(from)?, parse_instant(to)?)),
                    (None, None) => None,
                    _ => return Err(anyhow!("balance window needs both <from> and <to>")),
                };
                self.handle_balance(user_id, window).await
            }
            "status" => self.handle_status(),
            "help" | "--help" | "-h" => {
                println!("{HELP_TEXT}");
                Ok(())
            }
            other => Err(anyhow!("Unknown command: {other}\n\n{HELP_TEXT}")),
        }
    }

    async fn handle_listen(&self) -> Result<()> {
        info!("👂 Listening for write requests on stdin...");
        let stats = self.feed.run(BufReader::new(tokio::io::stdin())).await?;
        println!("{} applied, {} rejected", stats.applied, stats.rejected);
        Ok(())
    }

    async fn handle_balance(
        &self,
        user_id: &str,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<()> {
        let summary = match window {
            Some((from, to)) => self.calculator.user_summary_between(user_id, from, to).await?,
            None => self.calculator.user_summary(user_id).await?,
        };
        let breakdown = self.calculator.user_breakdown(user_id).await?;

        let per_currency: serde_json::Map<String, serde_json::Value> = breakdown
            .iter()
            .map(|(currency, totals)| {
                (
                    currency.code().to_string(),
                    json!({
                        "budget": Formatter::format_amount(totals.budget, *currency),
                        "expenses": Formatter::format_amount(totals.expenses, *currency),
                    }),
                )
            })
            .collect();

        let output = json!({
            "userId": user_id,
            "summary": summary,
            "byCurrency": per_currency,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn handle_status(&self) -> Result<()> {
        println!("TeamLedger Status: ✅ Running");
        println!("Database: {}", self.settings.database_url);
        println!(
            "Push: {}",
            self.settings.push_endpoint.as_deref().unwrap_or("dry-run")
        );
        println!("Deduplicate deliveries: {}", self.settings.deduplicate_deliveries);
        Ok(())
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid RFC 3339 timestamp: {value}"))?;
    Ok(parsed.with_timezone(&Utc))
}
