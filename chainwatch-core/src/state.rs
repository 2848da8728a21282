//! Per-poll result bag shared between fetchers and generators
//!
//! Every fetcher writes exactly one [`StateValue`] per run. Readers go through
//! [`State::get`] or [`Dependencies::get`], which is the only place a stored
//! value is matched against the type its consumer expects. A mismatch means
//! the wiring is wrong and is reported as [`ContractViolation::WrongType`].

use crate::error::{ContractViolation, Result};
use crate::fetcher::FetcherName;
use crate::types::{NodeConfig, NodeStatus, UpgradePlan, VersionInfo};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Value produced by one fetcher
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StateValue {
    /// Nothing was fetched: disabled, failed, or nothing to report
    #[default]
    Absent,
    NodeStatus(NodeStatus),
    BlockTime(Duration),
    UpgradePlan(UpgradePlan),
    VersionInfo(VersionInfo),
    Version(String),
    UpgradeBinaries(BTreeSet<String>),
    NodeConfig(NodeConfig),
    Timestamp(DateTime<Utc>),
}

impl StateValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, StateValue::Absent)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StateValue::Absent => "Absent",
            StateValue::NodeStatus(_) => "NodeStatus",
            StateValue::BlockTime(_) => "BlockTime",
            StateValue::UpgradePlan(_) => "UpgradePlan",
            StateValue::VersionInfo(_) => "VersionInfo",
            StateValue::Version(_) => "Version",
            StateValue::UpgradeBinaries(_) => "UpgradeBinaries",
            StateValue::NodeConfig(_) => "NodeConfig",
            StateValue::Timestamp(_) => "Timestamp",
        }
    }

    /// Interpret the value as `T`, treating [`StateValue::Absent`] as `None`.
    pub fn downcast<T: StateKind>(&self, fetcher: FetcherName) -> Result<Option<&T>> {
        if self.is_absent() {
            return Ok(None);
        }
        T::from_value(self)
            .map(Some)
            .ok_or(ContractViolation::WrongType {
                fetcher,
                expected: T::KIND,
                actual: self.kind(),
            })
    }
}

/// Types that can be stored in and read back from a [`StateValue`]
pub trait StateKind: Sized {
    const KIND: &'static str;

    fn from_value(value: &StateValue) -> Option<&Self>;

    fn into_value(self) -> StateValue;
}

macro_rules! state_kind {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl StateKind for $ty {
                const KIND: &'static str = stringify!($variant);

                fn from_value(value: &StateValue) -> Option<&Self> {
                    match value {
                        StateValue::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn into_value(self) -> StateValue {
                    StateValue::$variant(self)
                }
            }

            impl From<$ty> for StateValue {
                fn from(value: $ty) -> Self {
                    StateValue::$variant(value)
                }
            }
        )*
    };
}

state_kind! {
    NodeStatus => NodeStatus,
    Duration => BlockTime,
    UpgradePlan => UpgradePlan,
    VersionInfo => VersionInfo,
    String => Version,
    BTreeSet<String> => UpgradeBinaries,
    NodeConfig => NodeConfig,
    DateTime<Utc> => Timestamp,
}

impl<T: StateKind> From<Option<T>> for StateValue {
    fn from(value: Option<T>) -> Self {
        value.map(T::into_value).unwrap_or_default()
    }
}

/// Results of one scheduling run, keyed by fetcher
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    entries: BTreeMap<FetcherName, StateValue>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetcher's value.
    ///
    /// Entries are append-only: returns `false` and keeps the existing value
    /// if `name` was already written during this run.
    pub fn insert(&mut self, name: FetcherName, value: StateValue) -> bool {
        match self.entries.entry(name) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Builder-style insert, mostly for tests.
    pub fn with(mut self, name: FetcherName, value: impl Into<StateValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Raw entry. `None` means the fetcher never ran in this state.
    pub fn raw(&self, name: FetcherName) -> Option<&StateValue> {
        self.entries.get(&name)
    }

    /// Typed lookup. Missing and absent entries both yield `Ok(None)`.
    pub fn get<T: StateKind>(&self, name: FetcherName) -> Result<Option<&T>> {
        match self.entries.get(&name) {
            Some(value) => value.downcast(name),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = FetcherName> + '_ {
        self.entries.keys().copied()
    }
}

/// Dependency values handed to [`Fetcher::get`](crate::Fetcher::get), in the
/// order the fetcher declared them
#[derive(Debug, Clone)]
pub struct Dependencies {
    owner: FetcherName,
    values: Vec<(FetcherName, StateValue)>,
}

impl Dependencies {
    pub fn new(owner: FetcherName, values: Vec<(FetcherName, StateValue)>) -> Self {
        Self { owner, values }
    }

    /// No dependencies, for fetchers that declare none.
    pub fn none(owner: FetcherName) -> Self {
        Self::new(owner, Vec::new())
    }

    pub fn owner(&self) -> FetcherName {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed positional access. Absent values yield `Ok(None)`.
    pub fn get<T: StateKind>(&self, index: usize) -> Result<Option<&T>> {
        let (name, value) =
            self.values
                .get(index)
                .ok_or_else(|| ContractViolation::MissingDependency {
                    fetcher: self.owner,
                    index,
                    provided: self.values.len(),
                })?;
        value.downcast(*name)
    }
}
