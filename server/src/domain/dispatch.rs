//! Query dispatcher
//!
//! Sits between the HTTP handlers and the analytics executor and fixes two
//! problems of per-chart fetching:
//!
//! - **Coalescing**: identical in-flight queries (same SQL and params) share a
//!   single upstream call. The in-flight table only holds weak handles, so
//!   once every waiter is gone the upstream future is dropped and its entry
//!   removed.
//! - **Supersession**: a request may name a slot (one chart of one client).
//!   A newer request on the same slot cancels the older one, which then
//!   resolves to [`DispatchError::Superseded`].

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::data::analytics::{AnalyticsError, PreparedQuery, QueryExecutor, Row};
use crate::utils::debug::write_debug;

/// File under the debug directory receiving one line per upstream query
pub const DEBUG_QUERY_LOG: &str = "queries.jsonl";

/// Rows shared between all waiters of a coalesced query
pub type QueryRows = Arc<Vec<Row>>;

type SharedResult = Result<QueryRows, Arc<AnalyticsError>>;
type Upstream = BoxFuture<'static, SharedResult>;

#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    #[error("Query on slot '{0}' was superseded by a newer request")]
    Superseded(String),

    #[error("Query dispatcher is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Analytics(Arc<AnalyticsError>),
}

struct InFlight {
    id: u64,
    handle: WeakShared<Upstream>,
}

struct SlotEntry {
    generation: u64,
    token: CancellationToken,
}

/// Releases a slot claim when its request finishes or is dropped
struct SlotClaim<'a> {
    slots: &'a DashMap<String, SlotEntry>,
    slot: &'a str,
    generation: u64,
}

impl Drop for SlotClaim<'_> {
    fn drop(&mut self) {
        self.slots
            .remove_if(self.slot, |_, entry| entry.generation == self.generation);
    }
}

/// Owned by an upstream call; unregisters it once the call completes or
/// every waiter has gone away
struct InFlightGuard {
    in_flight: Arc<DashMap<PreparedQuery, InFlight>>,
    key: PreparedQuery,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .remove_if(&self.key, |_, entry| entry.id == self.id);
    }
}

pub struct QueryDispatcher {
    executor: Arc<dyn QueryExecutor>,
    coalesce: bool,
    in_flight: Arc<DashMap<PreparedQuery, InFlight>>,
    slots: DashMap<String, SlotEntry>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
    debug_dir: Option<PathBuf>,
}

impl QueryDispatcher {
    pub fn new(executor: Arc<dyn QueryExecutor>, coalesce: bool) -> Self {
        Self {
            executor,
            coalesce,
            in_flight: Arc::new(DashMap::new()),
            slots: DashMap::new(),
            next_id: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
            debug_dir: None,
        }
    }

    /// Record every upstream query under `dir`
    pub fn with_debug_log(mut self, dir: PathBuf) -> Self {
        self.debug_dir = Some(dir);
        self
    }

    /// Execute `query`, optionally on a logical `slot`.
    pub async fn execute(
        &self,
        slot: Option<&str>,
        query: PreparedQuery,
    ) -> Result<QueryRows, DispatchError> {
        if self.shutdown.is_cancelled() {
            return Err(DispatchError::ShuttingDown);
        }

        let upstream = self.upstream(query);

        match slot {
            Some(slot) => {
                let (_claim, token) = self.claim_slot(slot);
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(self.cancelled_error(slot)),
                    r = upstream => r.map_err(DispatchError::Analytics),
                }
            }
            None => tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Err(DispatchError::ShuttingDown),
                r = upstream => r.map_err(DispatchError::Analytics),
            },
        }
    }

    /// Cancel every outstanding and future request
    pub fn cancel_all(&self) {
        tracing::debug!(slots = self.slots.len(), "Cancelling all analytics queries");
        self.shutdown.cancel();
    }

    /// Number of distinct upstream queries that still have a waiter
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn cancelled_error(&self, slot: &str) -> DispatchError {
        if self.shutdown.is_cancelled() {
            DispatchError::ShuttingDown
        } else {
            tracing::debug!(slot, "Query superseded");
            DispatchError::Superseded(slot.to_string())
        }
    }

    fn claim_slot<'a>(&'a self, slot: &'a str) -> (SlotClaim<'a>, CancellationToken) {
        let generation = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.shutdown.child_token();
        let entry = SlotEntry {
            generation,
            token: token.clone(),
        };
        if let Some(previous) = self.slots.insert(slot.to_string(), entry) {
            previous.token.cancel();
        }
        let claim = SlotClaim {
            slots: &self.slots,
            slot,
            generation,
        };
        (claim, token)
    }

    fn upstream(&self, query: PreparedQuery) -> Upstream {
        if !self.coalesce {
            return self.run(query);
        }

        match self.in_flight.entry(query.clone()) {
            Entry::Occupied(mut occupied) => {
                if let Some(shared) = occupied.get().handle.upgrade() {
                    tracing::trace!(sql = %query.sql, "Joining in-flight query");
                    return shared.boxed();
                }
                let (id, shared) = self.share(query);
                if let Some(handle) = shared.downgrade() {
                    occupied.insert(InFlight { id, handle });
                }
                shared.boxed()
            }
            Entry::Vacant(vacant) => {
                let (id, shared) = self.share(query);
                if let Some(handle) = shared.downgrade() {
                    vacant.insert(InFlight { id, handle });
                }
                shared.boxed()
            }
        }
    }

    fn share(&self, query: PreparedQuery) -> (u64, Shared<Upstream>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            key: query.clone(),
            id,
        };
        let run = self.run(query);

        // The guard drops with this future, whether it completes or not
        let upstream: Upstream = async move {
            let _guard = guard;
            run.await
        }
        .boxed();

        (id, upstream.shared())
    }

    fn run(&self, query: PreparedQuery) -> Upstream {
        let executor = Arc::clone(&self.executor);
        let debug_dir = self.debug_dir.clone();
        async move {
            if let Some(dir) = debug_dir {
                write_debug(&dir, DEBUG_QUERY_LOG, &query).await;
            }
            executor
                .execute(&query)
                .await
                .map(Arc::new)
                .map_err(|e| {
                    tracing::warn!(error = %e, "Analytics query failed");
                    Arc::new(e)
                })
        }
        .boxed()
    }
}
