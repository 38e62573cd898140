//! Status sync engine.
//!
//! Holds the local view of the contract list, refreshes it from a
//! [`ContractSource`] while any analysis is still running, and derives the
//! notification feed from it.
//!
//! # Polling
//!
//! Polling is level-triggered: [`should_poll`] is re-evaluated after every
//! refresh and every local mutation of the list. At most one poller task
//! exists per engine, and constructing an engine starts nothing.
//!
//! # Ordering
//!
//! Every fetch is tagged with a sequence number when it is issued. A result is
//! applied only if it is newer than the last applied one, so a slow response
//! can never roll the list back. Local mutations count as the newest write.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contractwatch_core::{
    Contract, DashboardStats, NotificationItem, NotificationPreferences,
    derive_notifications_with, unread_count,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{ContractSource, SyncError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between refreshes while any contract is pending or processing.
    pub poll_interval: Duration,
    pub preferences: NotificationPreferences,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            preferences: NotificationPreferences::default(),
        }
    }
}

/// What a call to [`StatusSyncEngine::refresh`] did to the local list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched list replaced the local one.
    Applied,
    /// The fetch failed; the previous list is kept.
    Failed,
    /// A newer result had already been applied; this one was dropped.
    Superseded,
    /// The engine was shut down before the result arrived.
    Discarded,
}

/// True while at least one contract is pending or processing.
pub fn should_poll(contracts: &[Contract]) -> bool {
    contracts.iter().any(|c| c.status.is_in_progress())
}

struct Poller {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    contracts: Vec<Contract>,
    read_ids: BTreeSet<String>,
    /// Last sequence number handed to a fetch.
    issued_seq: u64,
    /// Sequence number of the write currently visible.
    applied_seq: u64,
    poller: Option<Poller>,
    pollers_started: u64,
    closed: bool,
}

struct Shared<S> {
    source: S,
    config: SyncConfig,
    state: Mutex<State>,
    revision: watch::Sender<u64>,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

/// Keeps a contract list fresh while work is outstanding and derives a
/// read/unread notification feed from it.
///
/// Methods that can start polling must be called from within a tokio runtime.
/// Dropping the engine stops its poller.
pub struct StatusSyncEngine<S: ContractSource + 'static> {
    shared: Arc<Shared<S>>,
}

impl<S: ContractSource + 'static> StatusSyncEngine<S> {
    pub fn new(source: S, config: SyncConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                source,
                config,
                state: Mutex::new(State::default()),
                revision,
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    /// Initial load. Unlike [`refresh`](Self::refresh), a fetch failure is
    /// returned to the caller; the local list is left untouched either way.
    pub async fn load(&self) -> Result<RefreshOutcome, SyncError> {
        let outcome = fetch_and_apply(&*self.shared).await?;
        reconcile_polling(&self.shared);
        Ok(outcome)
    }

    /// Replace the local list with a fresh fetch.
    ///
    /// Never fails: a transport error is logged and the last good list stays
    /// visible. The next scheduled poll is the retry.
    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = refresh_once(&*self.shared).await;
        reconcile_polling(&self.shared);
        outcome
    }

    /// Replace the local list outright, e.g. with a list obtained elsewhere.
    pub fn replace_contracts(&self, contracts: Vec<Contract>) {
        self.mutate(|list| *list = contracts);
    }

    /// Insert a contract at the front of the list, or update it in place if
    /// its id is already present.
    pub fn upsert_contract(&self, contract: Contract) {
        self.mutate(|list| match list.iter_mut().find(|c| c.id == contract.id) {
            Some(existing) => *existing = contract,
            None => list.insert(0, contract),
        });
    }

    /// Remove a contract from the local list, returning it if present.
    pub fn remove_contract(&self, id: i64) -> Option<Contract> {
        let mut removed = None;
        self.mutate(|list| {
            if let Some(pos) = list.iter().position(|c| c.id == id) {
                removed = Some(list.remove(pos));
            }
        });
        removed
    }

    fn mutate(&self, f: impl FnOnce(&mut Vec<Contract>)) {
        {
            let mut st = self.shared.lock();
            if st.closed {
                return;
            }
            f(&mut st.contracts);
            // Anything fetched before this point predates the local write.
            st.applied_seq = st.issued_seq;
        }
        self.shared.bump_revision();
        reconcile_polling(&self.shared);
    }

    /// Acknowledge one notification. Re-acknowledging is a no-op.
    pub fn mark_read(&self, id: &str) {
        let inserted = self.shared.lock().read_ids.insert(id.to_string());
        if inserted {
            self.shared.bump_revision();
        }
    }

    /// Acknowledge every notification in the feed as it stands right now.
    pub fn mark_all_read(&self) {
        let inserted = {
            let mut st = self.shared.lock();
            let feed =
                derive_notifications_with(&self.shared.config.preferences, &st.contracts, &st.read_ids);
            let mut inserted = 0;
            for item in feed {
                if st.read_ids.insert(item.id) {
                    inserted += 1;
                }
            }
            inserted
        };
        if inserted > 0 {
            debug!(count = inserted, "marked notifications read");
            self.shared.bump_revision();
        }
    }

    /// Snapshot of the local contract list.
    pub fn contracts(&self) -> Vec<Contract> {
        self.shared.lock().contracts.clone()
    }

    pub fn notifications(&self) -> Vec<NotificationItem> {
        let st = self.shared.lock();
        derive_notifications_with(&self.shared.config.preferences, &st.contracts, &st.read_ids)
    }

    pub fn unread_count(&self) -> usize {
        unread_count(&self.notifications())
    }

    /// Snapshot of the acknowledged notification ids.
    pub fn read_ids(&self) -> BTreeSet<String> {
        self.shared.lock().read_ids.clone()
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_contracts(&self.shared.lock().contracts)
    }

    /// Whether a poller task is currently armed.
    pub fn is_polling(&self) -> bool {
        self.shared
            .lock()
            .poller
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }

    /// Receiver that changes whenever the list or the read set changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Stop polling and detach from the source.
    ///
    /// Fetches still in flight complete without touching local state, and no
    /// further polling is ever started. Safe to call more than once.
    pub fn shutdown(&self) {
        let poller = {
            let mut st = self.shared.lock();
            st.closed = true;
            st.poller.take()
        };
        if let Some(poller) = poller {
            poller.handle.abort();
            info!(poller = poller.id, "contract polling shut down");
        }
    }
}

impl<S: ContractSource + 'static> Drop for StatusSyncEngine<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Fetch the list and apply it if it is still the newest result.
///
/// Only a transport failure is an error; stale and post-shutdown results are
/// reported through the outcome.
async fn fetch_and_apply<S: ContractSource>(
    shared: &Shared<S>,
) -> Result<RefreshOutcome, SyncError> {
    let seq = {
        let mut st = shared.lock();
        if st.closed {
            return Ok(RefreshOutcome::Discarded);
        }
        st.issued_seq += 1;
        st.issued_seq
    };

    let result = shared.source.list_contracts().await;

    {
        let mut st = shared.lock();
        if st.closed {
            debug!(seq, "engine shut down; dropping contract list");
            return Ok(RefreshOutcome::Discarded);
        }
        let contracts = result?;
        if seq <= st.applied_seq {
            debug!(seq, applied = st.applied_seq, "dropping superseded contract list");
            return Ok(RefreshOutcome::Superseded);
        }
        debug!(seq, count = contracts.len(), "applied contract list");
        st.applied_seq = seq;
        st.contracts = contracts;
    }
    shared.bump_revision();
    Ok(RefreshOutcome::Applied)
}

async fn refresh_once<S: ContractSource>(shared: &Shared<S>) -> RefreshOutcome {
    match fetch_and_apply(shared).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "contract refresh failed; keeping last list");
            RefreshOutcome::Failed
        }
    }
}

/// Arm or disarm the poller to match the current list.
fn reconcile_polling<S: ContractSource + 'static>(shared: &Arc<Shared<S>>) {
    let mut st = shared.lock();
    if st.closed {
        return;
    }
    if st.poller.as_ref().is_some_and(|p| p.handle.is_finished()) {
        st.poller = None;
    }

    let wanted = should_poll(&st.contracts);
    if wanted && st.poller.is_none() {
        st.pollers_started += 1;
        let id = st.pollers_started;
        let handle = tokio::spawn(poll_loop(Arc::clone(shared), id));
        st.poller = Some(Poller { id, handle });
        info!(
            poller = id,
            interval_ms = shared.config.poll_interval.as_millis() as u64,
            "contract polling started"
        );
    } else if !wanted && let Some(poller) = st.poller.take() {
        poller.handle.abort();
        info!(poller = poller.id, "contract polling stopped");
    }
}

async fn poll_loop<S: ContractSource>(shared: Arc<Shared<S>>, id: u64) {
    let period = shared.config.poll_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        refresh_once(&*shared).await;

        {
            let mut st = shared.lock();
            if st.closed {
                return;
            }
            if should_poll(&st.contracts) {
                continue;
            }
            if st.poller.as_ref().is_some_and(|p| p.id == id) {
                st.poller = None;
            }
        }
        info!(poller = id, "all contracts settled; polling stopped");
        // Subscribers waiting on the poller need to see it go away.
        shared.bump_revision();
        return;
    }
}
