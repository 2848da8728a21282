//! Outcome records for individual client calls

/// Data source a query was sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryModule {
    Tendermint,
    Cosmovisor,
    Grpc,
    Github,
}

impl QueryModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryModule::Tendermint => "tendermint",
            QueryModule::Cosmovisor => "cosmovisor",
            QueryModule::Grpc => "grpc",
            QueryModule::Github => "github",
        }
    }
}

impl std::fmt::Display for QueryModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse outcome of one underlying client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInfo {
    pub module: QueryModule,
    pub action: &'static str,
    pub success: bool,
}

impl QueryInfo {
    pub fn new(module: QueryModule, action: &'static str, success: bool) -> Self {
        Self {
            module,
            action,
            success,
        }
    }

    pub fn succeeded(module: QueryModule, action: &'static str) -> Self {
        Self::new(module, action, true)
    }

    pub fn failed(module: QueryModule, action: &'static str) -> Self {
        Self::new(module, action, false)
    }
}
