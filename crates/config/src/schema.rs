//! Config schema types (server, messenger, nlu, dispatch, actions).
use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub messenger: MessengerConfig,
    pub nlu: NluConfig,
    pub dispatch: DispatchConfig,
    pub actions: ActionsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "0.0.0.0" since the platform must reach
    /// the webhook from outside.
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

/// Messenger platform credentials and Send API settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessengerConfig {
    /// Page access token used for every Send API call.
    #[serde(serialize_with = "serialize_secret")]
    pub page_access_token: Secret<String>,

    /// App secret used to verify `X-Hub-Signature` on inbound webhooks.
    #[serde(serialize_with = "serialize_secret")]
    pub app_secret: Secret<String>,

    /// Token the platform echoes back during webhook subscription.
    pub verify_token: String,

    /// Graph API base URL, including the version segment.
    pub graph_api_url: String,

    /// Send a typing indicator before dispatching a reply.
    pub typing_indicator: bool,
}

impl std::fmt::Debug for MessengerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessengerConfig")
            .field("page_access_token", &"[REDACTED]")
            .field("app_secret", &"[REDACTED]")
            .field("verify_token", &self.verify_token)
            .field("graph_api_url", &self.graph_api_url)
            .field("typing_indicator", &self.typing_indicator)
            .finish()
    }
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            page_access_token: Secret::new(String::new()),
            app_secret: Secret::new(String::new()),
            verify_token: "secret".into(),
            graph_api_url: "https://graph.facebook.com/v2.6".into(),
            typing_indicator: true,
        }
    }
}

/// NLU service endpoint settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NluConfig {
    pub base_url: String,

    /// Client access token sent as a bearer token.
    #[serde(serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,

    /// Protocol version date passed as `?v=`.
    pub protocol_version: String,

    pub lang: String,

    pub timeout_secs: u64,
}

impl std::fmt::Debug for NluConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NluConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .field("protocol_version", &self.protocol_version)
            .field("lang", &self.lang)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.api.ai/v1".into(),
            access_token: Secret::new(String::new()),
            protocol_version: "20150910".into(),
            lang: "en".into(),
            timeout_secs: 10,
        }
    }
}

impl NluConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reply pacing and fallback behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Spacing between consecutive outbound units of one reply.
    pub pace_interval_ms: u64,

    /// Reply used when the NLU response carries nothing to say.
    pub fallback_text: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pace_interval_ms: 1100,
            fallback_text: "I'm not sure what you want. Can you be more specific?".into(),
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn pace_interval(&self) -> Duration {
        Duration::from_millis(self.pace_interval_ms)
    }
}

/// Settings for the built-in action handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub transit: TransitConfig,

    /// Intro text of the `help.links` button template.
    pub help_text: String,

    /// Links offered by the `help.links` action.
    pub help_links: Vec<HelpLink>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            transit: TransitConfig::default(),
            help_text: "Here are some places to find help:".into(),
            help_links: Vec::new(),
        }
    }
}

/// Live departure-times source used by the `transit.times` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    /// Base URL of the departures API. The action is not registered when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub timeout_secs: u64,

    /// Maximum number of departures listed in one reply.
    pub max_departures: usize,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 5,
            max_departures: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpLink {
    pub title: String,
    pub url: String,
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
