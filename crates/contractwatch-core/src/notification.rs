//! Notification feed derived from contract status.
//!
//! The feed is never stored. It is recomputed from the current contract list
//! and the set of acknowledged notification ids every time it is needed, so
//! ids must be a deterministic function of the source contract.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Contract, ContractStatus};

/// Number of notifications shown in the feed.
pub const FEED_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AnalysisComplete,
    AnalysisFailed,
}

impl NotificationKind {
    /// Kind for a contract status; `None` for statuses that don't notify.
    pub fn for_status(status: ContractStatus) -> Option<Self> {
        match status {
            ContractStatus::Completed => Some(Self::AnalysisComplete),
            ContractStatus::Failed => Some(Self::AnalysisFailed),
            ContractStatus::Pending | ContractStatus::Processing => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::AnalysisComplete => "Analysis complete",
            Self::AnalysisFailed => "Analysis failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub contract_id: i64,
    pub contract_title: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Which notification kinds the user wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub analysis_complete: bool,
    pub analysis_failed: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            analysis_complete: true,
            analysis_failed: true,
        }
    }
}

impl NotificationPreferences {
    pub fn allows(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::AnalysisComplete => self.analysis_complete,
            NotificationKind::AnalysisFailed => self.analysis_failed,
        }
    }
}

/// Stable notification id for a contract.
pub fn notification_id(contract_id: i64) -> String {
    format!("notif-{contract_id}")
}

/// Derive the notification feed with every kind enabled.
///
/// Keeps only terminal contracts, in list order (callers pass newest-first),
/// and caps the result at [`FEED_LIMIT`]. The cap is applied after filtering.
pub fn derive_notifications(
    contracts: &[Contract],
    read_ids: &BTreeSet<String>,
) -> Vec<NotificationItem> {
    derive_notifications_with(&NotificationPreferences::default(), contracts, read_ids)
}

/// Derive the notification feed, dropping kinds muted in `prefs` before the cap.
pub fn derive_notifications_with(
    prefs: &NotificationPreferences,
    contracts: &[Contract],
    read_ids: &BTreeSet<String>,
) -> Vec<NotificationItem> {
    contracts
        .iter()
        .filter_map(|c| NotificationKind::for_status(c.status).map(|kind| (c, kind)))
        .filter(|(_, kind)| prefs.allows(*kind))
        .take(FEED_LIMIT)
        .map(|(c, kind)| {
            let id = notification_id(c.id);
            let read = read_ids.contains(&id);
            NotificationItem {
                id,
                kind,
                title: kind.title().to_string(),
                message: c.title.clone(),
                contract_id: c.id,
                contract_title: c.title.clone(),
                read,
                created_at: c.created_at,
            }
        })
        .collect()
}

pub fn unread_count(feed: &[NotificationItem]) -> usize {
    feed.iter().filter(|n| !n.read).count()
}
