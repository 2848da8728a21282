//! Operator configuration served by the node

use chainwatch_core::{FetcherName, Generator, MetricInfo, MetricName, NodeConfig, Result, State};

/// `minimum_gas_price{denom}` per configured denom, plus `halt_height`
pub struct NodeConfigGenerator;

impl Generator for NodeConfigGenerator {
    fn name(&self) -> &'static str {
        "node_config"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        let Some(config) = state.get::<NodeConfig>(FetcherName::NodeConfig)? else {
            return Ok(vec![]);
        };

        let mut metrics: Vec<MetricInfo> = config
            .gas_prices()
            .into_iter()
            .map(|price| {
                MetricInfo::new(MetricName::MinimumGasPrice, price.amount)
                    .with_label("denom", price.denom)
            })
            .collect();
        metrics.push(MetricInfo::new(
            MetricName::HaltHeight,
            config.halt_height as f64,
        ));
        Ok(metrics)
    }
}
