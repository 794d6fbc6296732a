use std::sync::Arc;

use {
    relay_config::RelayConfig,
    relay_dispatch::{ActionRouter, Orchestrator},
    relay_messenger::{GraphSendApi, MessengerOutbound},
    relay_nlu::{HttpNluClient, NluClient},
    secrecy::Secret,
};

use crate::session::SessionMap;

/// Shared state for all webhook handlers.
pub struct GatewayState {
    pub version: String,
    pub sessions: SessionMap,
    pub nlu: Arc<dyn NluClient>,
    pub outbound: Arc<dyn MessengerOutbound>,
    pub orchestrator: Orchestrator,
    pub(crate) app_secret: Secret<String>,
    pub(crate) verify_token: String,
    pub(crate) typing_indicator: bool,
    pub(crate) fallback_text: String,
}

impl GatewayState {
    pub fn new(
        config: &RelayConfig,
        nlu: Arc<dyn NluClient>,
        outbound: Arc<dyn MessengerOutbound>,
    ) -> anyhow::Result<Self> {
        let router = ActionRouter::with_builtin(Arc::clone(&outbound), &config.actions)?;
        let orchestrator = Orchestrator::new(Arc::clone(&outbound), router, &config.dispatch);
        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions: SessionMap::new(),
            nlu,
            outbound,
            orchestrator,
            app_secret: config.messenger.app_secret.clone(),
            verify_token: config.messenger.verify_token.clone(),
            typing_indicator: config.messenger.typing_indicator,
            fallback_text: config.dispatch.fallback_text.clone(),
        })
    }

    /// State wired to the live NLU service and Graph Send API.
    pub fn from_config(config: &RelayConfig) -> anyhow::Result<Self> {
        let nlu = Arc::new(HttpNluClient::new(&config.nlu)?);
        let outbound = Arc::new(GraphSendApi::new(&config.messenger));
        Self::new(config, nlu, outbound)
    }
}
