//! Generated `cosmos.*` packages

/// Upgrade plan messages
pub mod upgrade {
    pub mod v1beta1 {
        tonic::include_proto!("cosmos.upgrade.v1beta1");

        /// ABCI query path of the current-plan query
        pub const CURRENT_PLAN_PATH: &str = "/cosmos.upgrade.v1beta1.Query/CurrentPlan";
    }
}

pub mod base {
    /// Node service messages and client
    pub mod node {
        pub mod v1beta1 {
            tonic::include_proto!("cosmos.base.node.v1beta1");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::upgrade::v1beta1::{Plan, QueryCurrentPlanResponse};
    use prost::Message;

    #[test]
    fn test_decode_current_plan_response() {
        // plan { name: "v15", height: 100 }
        let bytes = [0x0a, 0x07, 0x0a, 0x03, b'v', b'1', b'5', 0x18, 0x64];

        let response = QueryCurrentPlanResponse::decode(&bytes[..]).unwrap();
        assert_eq!(
            response.plan,
            Some(Plan {
                name: "v15".to_string(),
                height: 100,
                info: String::new(),
            })
        );
    }

    #[test]
    fn test_decode_empty_response_has_no_plan() {
        let response = QueryCurrentPlanResponse::decode(&[][..]).unwrap();
        assert!(response.plan.is_none());
    }

    #[test]
    fn test_decode_skips_deprecated_fields() {
        // plan { name: "v2", time: {seconds: 1}, height: 5 }
        let bytes = [
            0x0a, 0x0a, 0x0a, 0x02, b'v', b'2', 0x12, 0x02, 0x08, 0x01, 0x18, 0x05,
        ];

        let plan = QueryCurrentPlanResponse::decode(&bytes[..])
            .unwrap()
            .plan
            .unwrap();
        assert_eq!(plan.name, "v2");
        assert_eq!(plan.height, 5);
    }
}
