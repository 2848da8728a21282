//! chainwatch core library
//!
//! The fetch-scheduling and metric-generation pipeline shared by every
//! monitored node:
//! - [`Fetcher`]: named unit of work producing one [`State`] entry
//! - [`Controller`]: dependency-aware concurrent executor for a fetcher set
//! - [`Generator`]: pure transformation of a finished [`State`] into metrics
//! - Domain values, query outcomes and metric records

pub mod controller;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod metric;
pub mod query;
pub mod state;
pub mod types;

pub use controller::{Controller, FetchRun, FetcherStatus, RunState};
pub use error::{ContractViolation, Result};
pub use fetcher::{Fetched, Fetcher, FetcherName};
pub use generator::Generator;
pub use metric::{MetricInfo, MetricName};
pub use query::{QueryInfo, QueryModule};
pub use state::{Dependencies, State, StateKind, StateValue};
pub use types::{GasPrice, NodeConfig, NodeStatus, UpgradePlan, UpgradeSource, VersionInfo};
