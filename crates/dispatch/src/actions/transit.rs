//! `transit.times`: live departures for a stop.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    relay_config::TransitConfig,
    relay_messenger::{MessengerOutbound, QuickReply},
    reqwest::Url,
    serde::Deserialize,
    tracing::debug,
};

use {
    super::{ActionHandler, ActionRequest, ParamRequirement, ResolvedParams},
    crate::error::{Context, Error, Result},
};

pub const ACTION: &str = "transit.times";

const CONTEXT: &str = "transit";

const FOLLOW_UPS: [&str; 3] = ["Refresh", "Another stop", "Done"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Departure {
    pub line: String,
    pub destination: String,
    pub minutes: u32,
}

/// Source of upcoming departures.
#[async_trait]
pub trait TransitSource: Send + Sync {
    async fn departures(&self, stop: &str, line: Option<&str>) -> Result<Vec<Departure>>;
}

#[derive(Deserialize)]
struct DeparturesResponse {
    #[serde(default)]
    departures: Vec<Departure>,
}

/// Departures API over HTTP: `GET {base}/stops/{stop}/departures[?line=]`.
pub struct HttpTransitSource {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransitSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid transit base URL '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::handler(format!(
                "transit base URL '{base_url}' cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building transit HTTP client")?;
        Ok(Self { http, base_url })
    }

    /// `None` when no base URL is configured.
    pub fn from_config(config: &TransitConfig) -> Result<Option<Self>> {
        config
            .base_url
            .as_deref()
            .map(|base| Self::new(base, Duration::from_secs(config.timeout_secs)))
            .transpose()
    }

    fn departures_url(&self, stop: &str, line: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::handler("transit base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["stops", stop, "departures"]);
        if let Some(line) = line {
            url.query_pairs_mut().append_pair("line", line);
        }
        Ok(url)
    }
}

#[async_trait]
impl TransitSource for HttpTransitSource {
    async fn departures(&self, stop: &str, line: Option<&str>) -> Result<Vec<Departure>> {
        let url = self.departures_url(stop, line)?;
        debug!(%url, "querying departures");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("departures request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::handler(format!(
                "departures source answered {status}"
            )));
        }
        let body: DeparturesResponse = resp.json().await.context("decoding departures")?;
        Ok(body.departures)
    }
}

/// Replies with the next departures and a fixed set of follow-up options.
pub struct TransitTimesHandler {
    source: Arc<dyn TransitSource>,
    max_departures: usize,
}

impl TransitTimesHandler {
    pub fn new(source: Arc<dyn TransitSource>, max_departures: usize) -> Self {
        Self {
            source,
            max_departures: max_departures.max(1),
        }
    }
}

const REQUIRES: [ParamRequirement; 1] = [ParamRequirement {
    context: CONTEXT,
    parameter: "stop",
}];

#[async_trait]
impl ActionHandler for TransitTimesHandler {
    fn requires(&self) -> &[ParamRequirement] {
        &REQUIRES
    }

    async fn handle(
        &self,
        request: &ActionRequest<'_>,
        params: &ResolvedParams,
        outbound: &dyn MessengerOutbound,
    ) -> Result<()> {
        let stop = params.require("stop")?;
        let line = request.context_param(CONTEXT, "line");
        let departures = self.source.departures(stop, line.as_deref()).await?;

        let text = summarize(stop, line.as_deref(), &departures, self.max_departures);
        let replies: Vec<QuickReply> = FOLLOW_UPS
            .iter()
            .map(|label| QuickReply::new(*label, *label))
            .collect();
        outbound
            .send_quick_replies(request.recipient, &text, &replies)
            .await?;
        Ok(())
    }
}

fn summarize(stop: &str, line: Option<&str>, departures: &[Departure], max: usize) -> String {
    if departures.is_empty() {
        return match line {
            Some(line) => format!("No upcoming line {line} departures from stop {stop}."),
            None => format!("No upcoming departures from stop {stop}."),
        };
    }
    let mut text = format!("Next departures from stop {stop}:");
    for d in departures.iter().take(max) {
        let when = match d.minutes {
            0 => "due now".to_string(),
            1 => "in 1 min".to_string(),
            m => format!("in {m} min"),
        };
        text.push_str(&format!("\nLine {} to {}: {when}", d.line, d.destination));
    }
    text
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            actions::ActionRouter,
            testing::{RecordingOutbound, Sent},
        },
        relay_nlu::Context as NluContext,
        serde_json::{Map, json},
        std::sync::Mutex,
    };

    struct FixedSource {
        departures: Vec<Departure>,
        queries: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl TransitSource for FixedSource {
        async fn departures(&self, stop: &str, line: Option<&str>) -> Result<Vec<Departure>> {
            self.queries
                .lock()
                .unwrap()
                .push((stop.to_string(), line.map(str::to_string)));
            Ok(self.departures.clone())
        }
    }

    fn departure(line: &str, destination: &str, minutes: u32) -> Departure {
        Departure {
            line: line.into(),
            destination: destination.into(),
            minutes,
        }
    }

    fn transit_context(params: serde_json::Value) -> NluContext {
        NluContext {
            name: "transit".into(),
            parameters: params.as_object().cloned().unwrap_or_default(),
            lifespan: Some(5),
        }
    }

    #[test]
    fn summary_lists_at_most_max() {
        let departures = vec![
            departure("7", "Airport", 0),
            departure("9", "Harbour", 1),
            departure("7", "Airport", 12),
        ];
        assert_eq!(
            summarize("1042", None, &departures, 2),
            "Next departures from stop 1042:\nLine 7 to Airport: due now\nLine 9 to Harbour: in 1 min"
        );
    }

    #[test]
    fn empty_summary_mentions_line() {
        assert_eq!(
            summarize("1042", Some("7"), &[], 3),
            "No upcoming line 7 departures from stop 1042."
        );
        assert_eq!(
            summarize("1042", None, &[], 3),
            "No upcoming departures from stop 1042."
        );
    }

    #[tokio::test]
    async fn replies_with_departures_and_follow_ups() {
        let source = Arc::new(FixedSource {
            departures: vec![departure("7", "Airport", 4)],
            queries: Mutex::new(Vec::new()),
        });
        let outbound = Arc::new(RecordingOutbound::new());
        let mut router = ActionRouter::new(outbound.clone());
        router.register(ACTION, Arc::new(TransitTimesHandler::new(source.clone(), 3)));

        router
            .route(
                ACTION,
                "Which stop?",
                &[transit_context(json!({"stop": "1042", "line": "7"}))],
                &Map::new(),
                "user-1",
            )
            .await
            .unwrap();

        assert_eq!(*source.queries.lock().unwrap(), vec![(
            "1042".to_string(),
            Some("7".to_string())
        )]);
        assert_eq!(outbound.sent(), vec![Sent::QuickReplies(
            "Next departures from stop 1042:\nLine 7 to Airport: in 4 min".into(),
            vec![
                QuickReply::new("Refresh", "Refresh"),
                QuickReply::new("Another stop", "Another stop"),
                QuickReply::new("Done", "Done"),
            ]
        )]);
    }

    #[tokio::test]
    async fn http_source_builds_path_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/stops/Main%20St/departures")
            .match_query(mockito::Matcher::UrlEncoded("line".into(), "7".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"departures": [{"line": "7", "destination": "Airport", "minutes": 3}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let source =
            HttpTransitSource::new(&format!("{}/api/", server.url()), Duration::from_secs(2))
                .unwrap();
        let departures = source.departures("Main St", Some("7")).await.unwrap();
        assert_eq!(departures, vec![departure("7", "Airport", 3)]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_source_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/stops/1/departures")
            .with_status(502)
            .create_async()
            .await;

        let source = HttpTransitSource::new(&server.url(), Duration::from_secs(2)).unwrap();
        let err = source.departures("1", None).await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn unconfigured_source_is_none() {
        assert!(
            HttpTransitSource::from_config(&TransitConfig::default())
                .unwrap()
                .is_none()
        );
        assert!(HttpTransitSource::new("not a url", Duration::from_secs(1)).is_err());
    }
}
