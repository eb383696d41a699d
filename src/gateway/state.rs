use crate::wallet::WalletService;

/// Gateway application state (shared)
pub struct AppState {
    /// The wallet engine facade; all state lives in the store behind it
    pub service: WalletService,
    /// Service name reported by the health endpoint
    pub service_name: &'static str,
}

impl AppState {
    pub fn new(service: WalletService) -> Self {
        Self {
            service,
            service_name: "gamevault",
        }
    }
}
