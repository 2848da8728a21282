//! Error types for chainwatch
//!
//! Query failures never reach this layer: fetchers turn them into
//! [`QueryInfo`](crate::QueryInfo) records. What is left are wiring defects,
//! where a fetcher set or a generator disagrees with what is stored in the
//! state. Those abort the poll of the affected node only.

use crate::fetcher::FetcherName;
use thiserror::Error;

/// Result type alias for operations that can detect a contract violation
pub type Result<T> = std::result::Result<T, ContractViolation>;

/// Programmer-contract violation in the fetch pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    // ===== State Access =====
    #[error("State entry {fetcher} holds {actual}, expected {expected}")]
    WrongType {
        fetcher: FetcherName,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Fetcher {fetcher} asked for dependency #{index}, got {provided}")]
    MissingDependency {
        fetcher: FetcherName,
        index: usize,
        provided: usize,
    },

    // ===== Fetcher Graph =====
    #[error("Fetcher {fetcher} depends on {dependency}, which is not part of the run")]
    UnknownDependency {
        fetcher: FetcherName,
        dependency: FetcherName,
    },

    #[error("Fetcher {0} is registered more than once")]
    DuplicateFetcher(FetcherName),

    #[error("Dependency cycle between fetchers: {}", format_names(.0))]
    DependencyCycle(Vec<FetcherName>),

    // ===== Execution =====
    #[error("Worker for fetcher {fetcher} panicked: {message}")]
    WorkerPanicked {
        fetcher: FetcherName,
        message: String,
    },

    #[error("Fetcher worker did not complete: {0}")]
    WorkerLost(String),
}

fn format_names(names: &[FetcherName]) -> String {
    names
        .iter()
        .map(|n| n.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContractViolation::WrongType {
            fetcher: FetcherName::NodeStatus,
            expected: "NodeStatus",
            actual: "BlockTime",
        };
        assert_eq!(
            err.to_string(),
            "State entry node_status holds BlockTime, expected NodeStatus"
        );
    }

    #[test]
    fn test_cycle_display() {
        let err = ContractViolation::DependencyCycle(vec![
            FetcherName::NodeStatus,
            FetcherName::BlockTime,
        ]);
        assert_eq!(
            err.to_string(),
            "Dependency cycle between fetchers: node_status, block_time"
        );
    }
}
