//! Dependency-aware fetch scheduler
//!
//! Runs a fixed set of fetchers to completion once per poll:
//! - Every fetcher whose dependencies are all done is claimed and spawned
//! - A finishing worker records its value and notifies the run loop
//! - The loop sweeps for newly ready fetchers until nothing is in flight
//!
//! Readiness is discovered lazily, there is no up-front topological order.
//! The fetcher graph is validated when the controller is built, so a run
//! can neither stall on an unknown dependency nor on a cycle.

use crate::error::{ContractViolation, Result};
use crate::fetcher::{Fetched, Fetcher, FetcherName};
use crate::query::QueryInfo;
use crate::state::{Dependencies, State};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, error, trace, Instrument};

/// Progress of one fetcher within a run. Not started is represented by the
/// fetcher having no entry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetcherStatus {
    Processing,
    Done,
}

/// Everything a run produced
#[derive(Debug, Default)]
pub struct FetchRun {
    pub state: State,
    pub queries: BTreeMap<FetcherName, Vec<QueryInfo>>,
}

/// Bookkeeping of one run, shared by the run loop and its workers behind a
/// single lock
#[derive(Debug, Default)]
pub struct RunState {
    status: HashMap<FetcherName, FetcherStatus>,
    state: State,
    queries: BTreeMap<FetcherName, Vec<QueryInfo>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, name: FetcherName) -> Option<FetcherStatus> {
        self.status.get(&name).copied()
    }

    fn is_ready(&self, fetcher: &dyn Fetcher) -> bool {
        !self.status.contains_key(&fetcher.name())
            && fetcher
                .dependencies()
                .iter()
                .all(|dep| self.status(*dep) == Some(FetcherStatus::Done))
    }

    /// Claim every unclaimed fetcher whose dependencies are done.
    ///
    /// Claimed fetchers are marked processing and returned together with the
    /// values of their dependencies, in declared order.
    pub fn claim_ready(
        &mut self,
        fetchers: &[Arc<dyn Fetcher>],
    ) -> Vec<(Arc<dyn Fetcher>, Dependencies)> {
        let mut claimed = Vec::new();

        for fetcher in fetchers {
            if !self.is_ready(fetcher.as_ref()) {
                continue;
            }

            let values = fetcher
                .dependencies()
                .iter()
                .map(|dep| (*dep, self.state.raw(*dep).cloned().unwrap_or_default()))
                .collect();

            self.status.insert(fetcher.name(), FetcherStatus::Processing);
            claimed.push((Arc::clone(fetcher), Dependencies::new(fetcher.name(), values)));
        }

        claimed
    }

    /// Record a finished fetcher and mark it done.
    pub fn complete(&mut self, name: FetcherName, fetched: Fetched) {
        debug_assert_eq!(self.status(name), Some(FetcherStatus::Processing));

        self.state.insert(name, fetched.value);
        self.queries.insert(name, fetched.queries);
        self.status.insert(name, FetcherStatus::Done);
    }

    /// Fetchers from `fetchers` that have not reached done
    pub fn unfinished(&self, fetchers: &[Arc<dyn Fetcher>]) -> Vec<FetcherName> {
        fetchers
            .iter()
            .map(|f| f.name())
            .filter(|name| self.status(*name) != Some(FetcherStatus::Done))
            .collect()
    }

    fn into_run(self) -> FetchRun {
        FetchRun {
            state: self.state,
            queries: self.queries,
        }
    }
}

/// Executes a validated fetcher set
pub struct Controller {
    /// Used in logs only
    label: String,
    fetchers: Vec<Arc<dyn Fetcher>>,
}

impl Controller {
    /// Create a controller, rejecting duplicate names, unknown dependencies
    /// and dependency cycles.
    pub fn new(label: impl Into<String>, fetchers: Vec<Arc<dyn Fetcher>>) -> Result<Self> {
        validate(&fetchers)?;

        Ok(Self {
            label: label.into(),
            fetchers,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fetcher_names(&self) -> Vec<FetcherName> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }

    /// Run every fetcher once.
    ///
    /// Returns the collected state and the query outcomes per fetcher. A
    /// contract violation in any worker aborts the whole run; workers still
    /// in flight are cancelled when the run is dropped.
    pub async fn fetch_all(&self) -> Result<FetchRun> {
        let started = Instant::now();
        let run = Arc::new(Mutex::new(RunState::new()));
        let mut workers: JoinSet<Result<FetcherName>> = JoinSet::new();

        loop {
            let ready = run.lock().claim_ready(&self.fetchers);

            for (fetcher, deps) in ready {
                let span = tracing::debug_span!(
                    "fetcher",
                    node = %self.label,
                    fetcher = %fetcher.name()
                );
                workers.spawn(execute(fetcher, deps, Arc::clone(&run)).instrument(span));
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };

            match joined {
                Ok(Ok(name)) => trace!(node = %self.label, fetcher = %name, "Fetcher done"),
                Ok(Err(violation)) => {
                    error!(node = %self.label, error = %violation, "Fetch run aborted");
                    return Err(violation);
                }
                // A worker that died outside `catch_unwind` left its fetcher unfinished.
                Err(e) => {
                    error!(node = %self.label, error = %e, "Fetcher worker lost");
                    return Err(ContractViolation::WorkerLost(e.to_string()));
                }
            }
        }

        let run = std::mem::take(&mut *run.lock());
        debug_assert!(run.unfinished(&self.fetchers).is_empty());

        debug!(
            node = %self.label,
            fetchers = self.fetchers.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetch run completed"
        );

        Ok(run.into_run())
    }
}

/// One worker: invoke the fetcher if enabled, then record its result.
async fn execute(
    fetcher: Arc<dyn Fetcher>,
    deps: Dependencies,
    run: Arc<Mutex<RunState>>,
) -> Result<FetcherName> {
    let name = fetcher.name();

    let fetched = if fetcher.enabled() {
        match AssertUnwindSafe(fetcher.get(deps)).catch_unwind().await {
            Ok(result) => result?,
            Err(panic) => {
                return Err(ContractViolation::WorkerPanicked {
                    fetcher: name,
                    message: panic_message(panic.as_ref()),
                })
            }
        }
    } else {
        trace!("Fetcher disabled");
        Fetched::absent()
    };

    run.lock().complete(name, fetched);
    Ok(name)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Pre-flight check of a fetcher set.
pub fn validate(fetchers: &[Arc<dyn Fetcher>]) -> Result<()> {
    let mut names = HashSet::new();
    for fetcher in fetchers {
        if !names.insert(fetcher.name()) {
            return Err(ContractViolation::DuplicateFetcher(fetcher.name()));
        }
    }

    for fetcher in fetchers {
        if let Some(dep) = fetcher
            .dependencies()
            .iter()
            .find(|dep| !names.contains(*dep))
        {
            return Err(ContractViolation::UnknownDependency {
                fetcher: fetcher.name(),
                dependency: *dep,
            });
        }
    }

    // Peel off fetchers whose dependencies are all resolved; whatever
    // remains sits on or behind a cycle.
    let mut resolved = HashSet::new();
    loop {
        let next: Vec<_> = fetchers
            .iter()
            .filter(|f| !resolved.contains(&f.name()))
            .filter(|f| f.dependencies().iter().all(|d| resolved.contains(d)))
            .map(|f| f.name())
            .collect();

        if next.is_empty() {
            break;
        }
        resolved.extend(next);
    }

    if resolved.len() < fetchers.len() {
        let mut stuck: Vec<_> = fetchers
            .iter()
            .map(|f| f.name())
            .filter(|n| !resolved.contains(n))
            .collect();
        stuck.sort();
        return Err(ContractViolation::DependencyCycle(stuck));
    }

    Ok(())
}
