//! Top-level reply decision for one NLU response.

use std::{sync::Arc, time::Duration};

use {
    relay_config::DispatchConfig,
    relay_messenger::MessengerOutbound,
    relay_nlu::{MessageFragment, NluResponse},
    serde_json::Value,
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    actions::ActionRouter,
    aggregate::aggregate,
    classify::{FragmentKind, classify},
    error::{Error, Result},
    executor::Executor,
    pacer::{pace, schedule_with_cancel},
};

/// Which reply path a response takes. Evaluated in declaration order; the
/// first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Paced fragment pipeline.
    Fragments,
    /// Nothing usable came back.
    Fallback,
    Action,
    /// Platform-specific structured payload.
    StructuredData,
    Speech,
}

impl Route {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fragments => "fragments",
            Self::Fallback => "fallback",
            Self::Action => "action",
            Self::StructuredData => "structured_data",
            Self::Speech => "speech",
        }
    }
}

#[must_use]
pub fn decide(response: &NluResponse) -> Route {
    let single_text = matches!(
        response.fragments.as_slice(),
        [only] if classify(only) == FragmentKind::Text
    );
    if !response.fragments.is_empty() && !single_text {
        Route::Fragments
    } else if response.speech.is_empty() && response.action.is_none() {
        Route::Fallback
    } else if response.action.is_some() {
        Route::Action
    } else if response.platform_data().is_some() {
        Route::StructuredData
    } else {
        Route::Speech
    }
}

/// Text carried by a platform payload: either a bare string or an object
/// with a string `text` member.
pub fn structured_text(data: &Value) -> Result<String> {
    match data {
        Value::String(text) => Ok(text.clone()),
        Value::Object(map) => match map.get("text") {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(_) => Err(Error::malformed("`text` member is not a string")),
            None => Err(Error::malformed("object has no `text` member")),
        },
        other => Err(Error::malformed(format!(
            "expected a string or an object, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// What [`Orchestrator::respond`] did.
#[derive(Debug)]
pub struct Outcome {
    pub route: Route,
    /// Paced sends still in flight. Empty for every route but
    /// [`Route::Fragments`].
    pub pending: Vec<JoinHandle<()>>,
}

pub struct Orchestrator {
    executor: Arc<Executor>,
    router: ActionRouter,
    pace_interval: Duration,
    fallback_text: String,
    /// Handed to every paced sequence. Nothing cancels it yet.
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        outbound: Arc<dyn MessengerOutbound>,
        router: ActionRouter,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            executor: Arc::new(Executor::new(outbound)),
            router,
            pace_interval: config.pace_interval(),
            fallback_text: config.fallback_text.clone(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn router(&self) -> &ActionRouter {
        &self.router
    }

    /// Reply to `recipient` with `response`. Send failures are logged here
    /// and never surface to the caller.
    pub async fn respond(&self, response: NluResponse, recipient: &str) -> Outcome {
        let route = decide(&response);
        debug!(recipient, route = route.as_str(), "reply route chosen");

        let mut pending = Vec::new();
        let result = match route {
            Route::Fragments => {
                pending = self.dispatch_fragments(response.fragments, recipient);
                Ok(())
            },
            Route::Fallback => self.send_text(recipient, &self.fallback_text).await,
            Route::Action => {
                let action = response.action.as_deref().unwrap_or_default();
                let fallback = if response.speech.is_empty() {
                    self.fallback_text.as_str()
                } else {
                    response.speech.as_str()
                };
                self.router
                    .route(
                        action,
                        fallback,
                        &response.contexts,
                        &response.parameters,
                        recipient,
                    )
                    .await
            },
            Route::StructuredData => {
                let text = response
                    .platform_data()
                    .map(structured_text)
                    .unwrap_or_else(|| Ok(response.speech.clone()))
                    .unwrap_or_else(|e| {
                        warn!(recipient, error = %e, "replying with payload error");
                        e.to_string()
                    });
                self.send_text(recipient, &text).await
            },
            Route::Speech => self.send_text(recipient, &response.speech).await,
        };

        if let Err(e) = result {
            warn!(recipient, route = route.as_str(), error = %e, "reply failed");
        }
        Outcome { route, pending }
    }

    fn dispatch_fragments(
        &self,
        fragments: Vec<MessageFragment>,
        recipient: &str,
    ) -> Vec<JoinHandle<()>> {
        let units = pace(aggregate(fragments), recipient, self.pace_interval);
        info!(recipient, units = units.len(), "scheduling paced reply");
        schedule_with_cancel(units, Arc::clone(&self.executor), self.cancel.clone())
    }

    async fn send_text(&self, recipient: &str, text: &str) -> Result<()> {
        self.executor
            .outbound()
            .send_text(recipient, text)
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            actions::{ActionHandler, ActionRequest, ParamRequirement, ResolvedParams},
            testing::{RecordingOutbound, Sent},
        },
        async_trait::async_trait,
        relay_messenger::TemplateElement,
        relay_nlu::{Card, Context},
        rstest::rstest,
        serde_json::json,
    };

    const FALLBACK: &str = "I'm not sure what you want. Can you be more specific?";

    fn text(s: &str) -> MessageFragment {
        MessageFragment::PlainText { text: s.into() }
    }

    fn card(title: &str) -> MessageFragment {
        MessageFragment::CardContent(Card {
            title: title.into(),
            ..Default::default()
        })
    }

    fn element(title: &str) -> TemplateElement {
        TemplateElement {
            title: title.into(),
            subtitle: None,
            image_url: None,
            buttons: Vec::new(),
        }
    }

    struct Greeter;

    #[async_trait]
    impl ActionHandler for Greeter {
        fn requires(&self) -> &[ParamRequirement] {
            &[ParamRequirement {
                context: "greeting",
                parameter: "name",
            }]
        }

        async fn handle(
            &self,
            request: &ActionRequest<'_>,
            params: &ResolvedParams,
            outbound: &dyn MessengerOutbound,
        ) -> Result<()> {
            let name = params.require("name")?;
            outbound
                .send_text(request.recipient, &format!("Hello {name}"))
                .await?;
            Ok(())
        }
    }

    fn orchestrator() -> (Arc<RecordingOutbound>, Orchestrator) {
        let outbound = Arc::new(RecordingOutbound::new());
        let mut router = ActionRouter::new(outbound.clone());
        router.register("known-action-A", Arc::new(Greeter));
        let orchestrator = Orchestrator::new(outbound.clone(), router, &DispatchConfig::default());
        (outbound, orchestrator)
    }

    async fn run(orchestrator: &Orchestrator, response: NluResponse) -> Route {
        let outcome = orchestrator.respond(response, "user-1").await;
        for handle in outcome.pending {
            handle.await.unwrap();
        }
        outcome.route
    }

    #[rstest]
    #[case::empty(NluResponse::default(), Route::Fallback)]
    #[case::speech_only(
        NluResponse { speech: "hi".into(), ..Default::default() },
        Route::Speech
    )]
    #[case::single_text_fragment_falls_through(
        NluResponse { speech: "hi".into(), fragments: vec![text("hi")], ..Default::default() },
        Route::Speech
    )]
    #[case::single_card(
        NluResponse { speech: "hi".into(), fragments: vec![card("X")], ..Default::default() },
        Route::Fragments
    )]
    #[case::two_texts(
        NluResponse { fragments: vec![text("a"), text("b")], ..Default::default() },
        Route::Fragments
    )]
    #[case::fragments_beat_action(
        NluResponse {
            action: Some("known-action-A".into()),
            fragments: vec![text("a"), card("X")],
            ..Default::default()
        },
        Route::Fragments
    )]
    #[case::action_without_speech(
        NluResponse { action: Some("known-action-A".into()), ..Default::default() },
        Route::Action
    )]
    #[case::action_beats_structured_data(
        NluResponse {
            speech: "hi".into(),
            action: Some("a".into()),
            structured_data: Some(json!({"facebook": "x"})),
            ..Default::default()
        },
        Route::Action
    )]
    #[case::structured_data_beats_speech(
        NluResponse {
            speech: "hi".into(),
            structured_data: Some(json!({"facebook": "x"})),
            ..Default::default()
        },
        Route::StructuredData
    )]
    #[case::other_platform_data_ignored(
        NluResponse {
            speech: "hi".into(),
            structured_data: Some(json!({"slack": "x"})),
            ..Default::default()
        },
        Route::Speech
    )]
    #[case::structured_data_without_speech_is_fallback(
        NluResponse {
            structured_data: Some(json!({"facebook": "x"})),
            ..Default::default()
        },
        Route::Fallback
    )]
    fn route_priority(#[case] response: NluResponse, #[case] expected: Route) {
        assert_eq!(decide(&response), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn mixed_fragments_are_paced_with_cards_grouped() {
        let (outbound, orchestrator) = orchestrator();
        let route = run(&orchestrator, NluResponse {
            speech: "a".into(),
            fragments: vec![text("a"), card("X"), card("Y"), text("b")],
            ..Default::default()
        })
        .await;

        assert_eq!(route, Route::Fragments);
        assert_eq!(outbound.timeline(), vec![
            (Duration::ZERO, Sent::Text("a".into())),
            (
                Duration::from_millis(1100),
                Sent::Generic(vec![element("X"), element("Y")])
            ),
            (Duration::from_millis(2200), Sent::Text("b".into())),
        ]);
    }

    #[tokio::test]
    async fn empty_response_sends_fixed_fallback() {
        let (outbound, orchestrator) = orchestrator();
        run(&orchestrator, NluResponse::default()).await;
        assert_eq!(outbound.sent(), vec![Sent::Text(FALLBACK.into())]);
    }

    #[tokio::test]
    async fn speech_is_sent_verbatim() {
        let (outbound, orchestrator) = orchestrator();
        run(&orchestrator, NluResponse {
            speech: "The 7 leaves in 4 minutes.".into(),
            fragments: vec![text("The 7 leaves in 4 minutes.")],
            ..Default::default()
        })
        .await;
        assert_eq!(outbound.sent(), vec![Sent::Text(
            "The 7 leaves in 4 minutes.".into()
        )]);
    }

    #[tokio::test]
    async fn action_invokes_bound_handler() {
        let (outbound, orchestrator) = orchestrator();
        run(&orchestrator, NluResponse {
            speech: "Who are you?".into(),
            action: Some("known-action-A".into()),
            contexts: vec![Context {
                name: "greeting".into(),
                parameters: json!({"name": "Ana"}).as_object().cloned().unwrap(),
                lifespan: None,
            }],
            ..Default::default()
        })
        .await;
        assert_eq!(outbound.sent(), vec![Sent::Text("Hello Ana".into())]);
    }

    #[tokio::test]
    async fn action_missing_parameter_sends_speech() {
        let (outbound, orchestrator) = orchestrator();
        run(&orchestrator, NluResponse {
            speech: "Who are you?".into(),
            action: Some("known-action-A".into()),
            ..Default::default()
        })
        .await;
        assert_eq!(outbound.sent(), vec![Sent::Text("Who are you?".into())]);
    }

    #[tokio::test]
    async fn action_without_speech_falls_back_to_fixed_text() {
        let (outbound, orchestrator) = orchestrator();
        run(&orchestrator, NluResponse {
            action: Some("nobody.knows".into()),
            ..Default::default()
        })
        .await;
        assert_eq!(outbound.sent(), vec![Sent::Text(FALLBACK.into())]);
    }

    #[tokio::test]
    async fn structured_payload_text_is_sent() {
        let (outbound, orchestrator) = orchestrator();
        run(&orchestrator, NluResponse {
            speech: "plain".into(),
            structured_data: Some(json!({"facebook": {"text": "rich"}})),
            ..Default::default()
        })
        .await;
        assert_eq!(outbound.sent(), vec![Sent::Text("rich".into())]);
    }

    #[tokio::test]
    async fn malformed_structured_payload_sends_error_text() {
        let (outbound, orchestrator) = orchestrator();
        run(&orchestrator, NluResponse {
            speech: "plain".into(),
            structured_data: Some(json!({"facebook": 42})),
            ..Default::default()
        })
        .await;
        assert_eq!(outbound.sent(), vec![Sent::Text(
            "malformed structured payload: expected a string or an object, got a number".into()
        )]);
    }

    #[tokio::test]
    async fn only_unknown_fragments_send_nothing() {
        let (outbound, orchestrator) = orchestrator();
        let route = run(&orchestrator, NluResponse {
            speech: "x".into(),
            fragments: vec![MessageFragment::Unknown { tag: "9".into() }],
            ..Default::default()
        })
        .await;
        assert_eq!(route, Route::Fragments);
        assert!(outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_swallowed() {
        let outbound = Arc::new(RecordingOutbound::failing_on("down"));
        let orchestrator = Orchestrator::new(
            outbound.clone(),
            ActionRouter::new(outbound.clone()),
            &DispatchConfig::default(),
        );
        let outcome = orchestrator
            .respond(
                NluResponse {
                    speech: "down".into(),
                    ..Default::default()
                },
                "user-1",
            )
            .await;
        assert_eq!(outcome.route, Route::Speech);
        assert!(outbound.sent().is_empty());
    }

    #[test]
    fn structured_text_shapes() {
        assert_eq!(structured_text(&json!("hi")).unwrap(), "hi");
        assert_eq!(structured_text(&json!({"text": "hi", "x": 1})).unwrap(), "hi");
        assert!(matches!(
            structured_text(&json!({"text": 1})),
            Err(Error::MalformedStructuredPayload { .. })
        ));
        assert!(matches!(
            structured_text(&json!({"attachment": {}})),
            Err(Error::MalformedStructuredPayload { .. })
        ));
        assert!(matches!(
            structured_text(&json!([1])),
            Err(Error::MalformedStructuredPayload { .. })
        ));
    }
}
