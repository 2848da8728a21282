//! Generator contract

use crate::error::Result;
use crate::metric::MetricInfo;
use crate::state::State;

/// Pure transformation of a completed [`State`] into metric samples
///
/// Implementations must not perform I/O or read the clock: the same state
/// always produces the same samples. Missing inputs produce no samples;
/// inputs of the wrong type are reported as a contract violation.
pub trait Generator: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>>;
}
