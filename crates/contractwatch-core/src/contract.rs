//! Contract records as returned by the analysis API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Analysis state of an uploaded contract.
///
/// Transitions are driven by the backend: `PENDING → PROCESSING → COMPLETED`,
/// or `PENDING/PROCESSING → FAILED`. Clients only observe them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ContractStatus {
    /// `COMPLETED` and `FAILED` are terminal; nothing moves them without a re-upload.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn is_in_progress(self) -> bool {
        !self.is_terminal()
    }

    /// Upper-case wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Short human label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "queued",
            Self::Processing => "analysing",
            Self::Completed => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown contract status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for ContractStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Risk classification attached to a completed analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Interpret a raw `risk_level` string from the API.
    ///
    /// Case-insensitive. `danger` is a synonym for high and `warning` for
    /// medium; any other non-empty value reads as low. Blank input is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let level = raw.trim().to_ascii_lowercase();
        match level.as_str() {
            "" => None,
            "high" | "danger" => Some(Self::High),
            "medium" | "warning" => Some(Self::Medium),
            _ => Some(Self::Low),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An uploaded contract undergoing (or done with) asynchronous analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    pub title: String,
    pub status: ContractStatus,
    /// Raw classification as sent by the server. Use [`Contract::risk`] to read it.
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Parse an ISO 8601 timestamp. Values without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}

impl Contract {
    /// Risk of a completed analysis. Always `None` for non-completed contracts,
    /// whatever the server put in `risk_level`.
    pub fn risk(&self) -> Option<RiskLevel> {
        if self.status != ContractStatus::Completed {
            return None;
        }
        self.risk_level.as_deref().and_then(RiskLevel::parse)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(status: ContractStatus, risk: Option<&str>) -> Contract {
        Contract {
            id: 7,
            title: "Lease agreement".into(),
            status,
            risk_level: risk.map(Into::into),
            created_at: "2026-02-21T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(!ContractStatus::Pending.is_terminal());
        assert!(!ContractStatus::Processing.is_terminal());
        assert!(ContractStatus::Completed.is_terminal());
        assert!(ContractStatus::Failed.is_terminal());
    }

    #[test]
    fn risk_synonyms_are_case_insensitive() {
        assert_eq!(RiskLevel::parse("HIGH"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("Danger"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("medium"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("WARNING"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("low"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::parse("safe"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::parse("  "), None);
    }

    #[test]
    fn risk_ignored_unless_completed() {
        assert_eq!(
            contract(ContractStatus::Completed, Some("high")).risk(),
            Some(RiskLevel::High)
        );
        assert_eq!(contract(ContractStatus::Processing, Some("high")).risk(), None);
        assert_eq!(contract(ContractStatus::Failed, Some("danger")).risk(), None);
        assert_eq!(contract(ContractStatus::Completed, None).risk(), None);
    }

    #[test]
    fn status_from_str() {
        assert_eq!("completed".parse(), Ok(ContractStatus::Completed));
        assert_eq!(" PENDING ".parse(), Ok(ContractStatus::Pending));
        assert!("archived".parse::<ContractStatus>().is_err());
    }

    #[test]
    fn contract_from_api_json() {
        let json = r#"{
            "id": 12,
            "title": "Employment contract 2024",
            "status": "PROCESSING",
            "risk_level": null,
            "created_at": "2026-02-21T10:00:00Z",
            "file_path": "/uploads/12.pdf"
        }"#;
        let parsed: Contract = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, 12);
        assert_eq!(parsed.status, ContractStatus::Processing);
        assert!(parsed.risk_level.is_none());
    }

    #[test]
    fn missing_risk_level_defaults_to_none() {
        let json = r#"{"id":1,"title":"t","status":"FAILED","created_at":"2026-02-21T10:00:00+09:00"}"#;
        let parsed: Contract = serde_json::from_str(json).unwrap();
        assert!(parsed.risk_level.is_none());
        assert_eq!(parsed.created_at.to_rfc3339(), "2026-02-21T01:00:00+00:00");
    }

    #[test]
    fn timestamp_without_offset_reads_as_utc() {
        let json = r#"{"id":1,"title":"t","status":"COMPLETED","risk_level":"high","created_at":"2026-02-21T10:00:00.123456"}"#;
        let parsed: Contract = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.created_at.to_rfc3339(),
            "2026-02-21T10:00:00.123456+00:00"
        );
        assert_eq!(parsed.risk(), Some(RiskLevel::High));
    }

    #[test]
    fn timestamp_variants() {
        let expected: DateTime<Utc> = "2026-02-21T10:00:00Z".parse().unwrap();
        assert_eq!(parse_timestamp("2026-02-21T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-02-21 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-02-21T19:00:00+09:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let json = r#"{"id":1,"title":"t","status":"FAILED","created_at":"soon"}"#;
        let err = serde_json::from_str::<Contract>(json).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }
}
