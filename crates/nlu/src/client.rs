use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    tracing::debug,
};

use relay_config::NluConfig;

use crate::{
    error::{Context, Error, Result},
    types::NluResponse,
    wire::QueryResponse,
};

/// Natural-language-understanding backend.
#[async_trait]
pub trait NluClient: Send + Sync {
    /// Resolve one user utterance within a conversation session.
    async fn query(&self, utterance: &str, session_token: &str) -> Result<NluResponse>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    session_id: &'a str,
    lang: &'a str,
}

/// HTTP client for the `query` endpoint.
pub struct HttpNluClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Secret<String>,
    protocol_version: String,
    lang: String,
}

impl HttpNluClient {
    pub fn new(config: &NluConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: reqwest::Client, config: &NluConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            protocol_version: config.protocol_version.clone(),
            lang: config.lang.clone(),
        }
    }
}

#[async_trait]
impl NluClient for HttpNluClient {
    async fn query(&self, utterance: &str, session_token: &str) -> Result<NluResponse> {
        let url = format!("{}/query", self.base_url);
        let resp = self
            .http
            .post(url)
            .query(&[("v", self.protocol_version.as_str())])
            .bearer_auth(self.access_token.expose_secret())
            .json(&QueryRequest {
                query: utterance,
                session_id: session_token,
                lang: &self.lang,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let body = resp
            .bytes()
            .await
            .context("reading NLU response body")?;
        let decoded: QueryResponse = serde_json::from_slice(&body)?;
        if let Some(status) = decoded.status.as_ref()
            && !status.is_success()
        {
            return Err(Error::Rejected {
                code: status.code,
                message: status.describe(),
            });
        }

        let result = decoded.result.unwrap_or_default();
        let response = NluResponse::from(result);
        debug!(
            session = session_token,
            intent = response.intent_name.as_deref().unwrap_or(""),
            action = response.action.as_deref().unwrap_or(""),
            fragments = response.fragments.len(),
            "NLU query resolved"
        );
        Ok(response)
    }
}
