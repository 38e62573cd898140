//! Summary counts for the contract dashboard.

use serde::Serialize;

use crate::{Contract, ContractStatus, RiskLevel};

/// Number of contracts listed under "recent".
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub completed: usize,
    /// Pending plus processing.
    pub in_progress: usize,
    /// Completed analyses rated high risk.
    pub high_risk: usize,
}

impl DashboardStats {
    pub fn from_contracts(contracts: &[Contract]) -> Self {
        contracts.iter().fold(Self::default(), |mut stats, c| {
            stats.total += 1;
            match c.status {
                ContractStatus::Completed => stats.completed += 1,
                ContractStatus::Pending | ContractStatus::Processing => stats.in_progress += 1,
                ContractStatus::Failed => {}
            }
            if c.risk() == Some(RiskLevel::High) {
                stats.high_risk += 1;
            }
            stats
        })
    }
}

/// The first [`RECENT_LIMIT`] contracts; the API lists newest first.
pub fn recent_contracts(contracts: &[Contract]) -> &[Contract] {
    &contracts[..contracts.len().min(RECENT_LIMIT)]
}
