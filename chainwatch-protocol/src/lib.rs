//! chainwatch Protocol Definitions
//!
//! Generated Rust code from a trimmed subset of the Cosmos SDK protobuf
//! definitions, limited to the queries the exporter issues.
//!
//! # Services
//! - `cosmos.upgrade.v1beta1.Query/CurrentPlan` - pending governance upgrade,
//!   queried through Tendermint ABCI
//! - `cosmos.base.node.v1beta1.Service/Config` - node application config, over gRPC

pub mod cosmos;

// Re-export commonly used types
pub use cosmos::base::node::v1beta1::service_client::ServiceClient as NodeServiceClient;
pub use cosmos::base::node::v1beta1::{ConfigRequest, ConfigResponse};
pub use cosmos::upgrade::v1beta1::{
    Plan, QueryCurrentPlanRequest, QueryCurrentPlanResponse, CURRENT_PLAN_PATH,
};
