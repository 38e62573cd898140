//! Terminal rendering for contracts, dashboard counts, and notifications.

use chrono::{DateTime, Utc};
use contractwatch_core::{
    Contract, DashboardStats, NotificationItem, NotificationKind, format_relative_time,
};

const TITLE_WIDTH: usize = 48;

// ── Contract list ──

/// One row per contract: id, status, risk, age, title.
pub fn contract_table(contracts: &[Contract], now: DateTime<Utc>) -> String {
    if contracts.is_empty() {
        return "No contracts yet. Upload one to start an analysis.\n".to_string();
    }

    let mut out = format!(
        "{:>6}  {:<10} {:<7} {:<11} {}\n",
        "ID", "STATUS", "RISK", "UPLOADED", "TITLE"
    );
    for c in contracts {
        let risk = c.risk().map(|r| r.label()).unwrap_or("-");
        out.push_str(&format!(
            "{:>6}  {:<10} {:<7} {:<11} {}\n",
            c.id,
            c.status.label(),
            risk,
            format_relative_time(c.created_at, now),
            truncate(&c.title, TITLE_WIDTH)
        ));
    }
    out
}

// ── Single contract ──

/// Vertical card for one contract.
pub fn contract_card(contract: &Contract, now: DateTime<Utc>) -> String {
    let mut out = format!("=== {} ===\n\n", contract.title);
    out.push_str(&format!("  {:<12} {}\n", "id", contract.id));
    out.push_str(&format!("  {:<12} {}\n", "status", contract.status));
    if let Some(risk) = contract.risk() {
        out.push_str(&format!("  {:<12} {}\n", "risk", risk));
    }
    out.push_str(&format!(
        "  {:<12} {} ({})\n",
        "uploaded",
        contract.created_at.format("%Y-%m-%d %H:%M UTC"),
        format_relative_time(contract.created_at, now)
    ));
    if contract.status.is_in_progress() {
        out.push_str("\n  Analysis is still running.\n");
    }
    out
}

// ── Dashboard ──

pub fn stats_summary(stats: &DashboardStats) -> String {
    format!(
        "  {:<12} {}\n  {:<12} {}\n  {:<12} {}\n  {:<12} {}\n",
        "total", stats.total, "completed", stats.completed, "high risk", stats.high_risk,
        "in progress", stats.in_progress,
    )
}

// ── Notifications ──

pub fn notification_line(item: &NotificationItem, now: DateTime<Utc>) -> String {
    let marker = match item.kind {
        NotificationKind::AnalysisComplete => "[ok]",
        NotificationKind::AnalysisFailed => "[!!]",
    };
    format!(
        "{marker} {}: {} (#{}, {})",
        item.title,
        truncate(&item.message, TITLE_WIDTH),
        item.contract_id,
        format_relative_time(item.created_at, now)
    )
}

// ── Helpers ──

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contractwatch_core::{ContractStatus, derive_notifications};
    use std::collections::BTreeSet;

    fn now() -> DateTime<Utc> {
        "2026-02-21T12:00:00Z".parse().unwrap()
    }

    fn contract(id: i64, status: ContractStatus, risk: Option<&str>) -> Contract {
        Contract {
            id,
            title: "Residential lease".into(),
            status,
            risk_level: risk.map(Into::into),
            created_at: "2026-02-21T09:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn table_hides_risk_until_completed() {
        let table = contract_table(
            &[
                contract(2, ContractStatus::Processing, Some("high")),
                contract(1, ContractStatus::Completed, Some("warning")),
            ],
            now(),
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("analysing"));
        assert!(lines[1].contains(" - "));
        assert!(lines[2].contains("Medium"));
        assert!(lines[2].contains("3h ago"));
    }

    #[test]
    fn empty_table_has_hint() {
        assert!(contract_table(&[], now()).starts_with("No contracts yet"));
    }

    #[test]
    fn card_shows_status_and_risk() {
        let card = contract_card(&contract(7, ContractStatus::Completed, Some("DANGER")), now());
        assert!(card.starts_with("=== Residential lease ==="));
        assert!(card.contains("COMPLETED"));
        assert!(card.contains("High"));
        assert!(!card.contains("still running"));

        let card = contract_card(&contract(8, ContractStatus::Pending, Some("DANGER")), now());
        assert!(!card.contains("High"));
        assert!(card.contains("still running"));
    }

    #[test]
    fn notification_line_marks_failures() {
        let feed = derive_notifications(
            &[contract(3, ContractStatus::Failed, None)],
            &BTreeSet::new(),
        );
        let line = notification_line(&feed[0], now());
        assert_eq!(line, "[!!] Analysis failed: Residential lease (#3, 3h ago)");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("근로계약서_2024_최종본", 8), "근로계약서...");
    }
}
