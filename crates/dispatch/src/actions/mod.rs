//! Action directives: named server-side side effects requested by the NLU
//! service in place of a plain reply.

pub mod help;
pub mod transit;

use std::{collections::HashMap, sync::Arc};

use {
    async_trait::async_trait,
    relay_config::ActionsConfig,
    relay_messenger::MessengerOutbound,
    relay_nlu::{Context, find_context},
    serde_json::{Map, Value},
    tracing::{debug, info, warn},
};

use crate::error::{Error, Result};

pub use {
    help::HelpLinksHandler,
    transit::{Departure, HttpTransitSource, TransitSource, TransitTimesHandler},
};

/// A parameter an action reads, identified by context name and parameter
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRequirement {
    pub context: &'static str,
    pub parameter: &'static str,
}

/// Everything a handler can see about the triggering NLU turn.
#[derive(Debug, Clone, Copy)]
pub struct ActionRequest<'a> {
    pub action: &'a str,
    pub recipient: &'a str,
    pub contexts: &'a [Context],
    pub parameters: &'a Map<String, Value>,
}

impl ActionRequest<'_> {
    /// An optional parameter from a named context.
    #[must_use]
    pub fn context_param(&self, context: &str, parameter: &str) -> Option<String> {
        find_context(self.contexts, context)?.param_str(parameter)
    }
}

/// Required parameters after resolution, keyed by parameter name.
#[derive(Debug, Default, Clone)]
pub struct ResolvedParams(HashMap<&'static str, String>);

impl ResolvedParams {
    #[must_use]
    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.0.get(parameter).map(String::as_str)
    }

    /// A required parameter. Resolution guarantees presence for every
    /// declared requirement.
    pub fn require(&self, parameter: &str) -> Result<&str> {
        self.get(parameter)
            .ok_or_else(|| Error::handler(format!("parameter '{parameter}' was not declared")))
    }
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Parameters that must be present before [`ActionHandler::handle`] runs.
    fn requires(&self) -> &[ParamRequirement] {
        &[]
    }

    async fn handle(
        &self,
        request: &ActionRequest<'_>,
        params: &ResolvedParams,
        outbound: &dyn MessengerOutbound,
    ) -> Result<()>;
}

/// Resolve every declared requirement by name.
pub fn resolve(
    action: &str,
    requirements: &[ParamRequirement],
    contexts: &[Context],
) -> Result<ResolvedParams> {
    let mut resolved = HashMap::with_capacity(requirements.len());
    for req in requirements {
        let value = find_context(contexts, req.context)
            .and_then(|c| c.param_str(req.parameter))
            .ok_or_else(|| Error::MissingParameter {
                action: action.to_string(),
                context: req.context.to_string(),
                parameter: req.parameter.to_string(),
            })?;
        resolved.insert(req.parameter, value);
    }
    Ok(ResolvedParams(resolved))
}

/// Registry of action handlers.
pub struct ActionRouter {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
    outbound: Arc<dyn MessengerOutbound>,
}

impl ActionRouter {
    pub fn new(outbound: Arc<dyn MessengerOutbound>) -> Self {
        Self {
            handlers: HashMap::new(),
            outbound,
        }
    }

    /// Router with the built-in handlers. `transit.times` is only registered
    /// when a departures source is configured.
    pub fn with_builtin(
        outbound: Arc<dyn MessengerOutbound>,
        config: &ActionsConfig,
    ) -> Result<Self> {
        let mut router = Self::new(outbound);
        if let Some(source) = HttpTransitSource::from_config(&config.transit)? {
            router.register(
                transit::ACTION,
                Arc::new(TransitTimesHandler::new(
                    Arc::new(source),
                    config.transit.max_departures,
                )),
            );
        }
        router.register(
            help::ACTION,
            Arc::new(HelpLinksHandler::new(
                config.help_text.clone(),
                config.help_links.clone(),
            )),
        );
        Ok(router)
    }

    pub fn register(&mut self, action: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let action = action.into();
        debug!(action = %action, "registered action handler");
        self.handlers.insert(action, handler);
    }

    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler bound to `action`, replying with `fallback_text` when
    /// the action is unknown, a required parameter is missing, or the
    /// handler fails.
    pub async fn route(
        &self,
        action: &str,
        fallback_text: &str,
        contexts: &[Context],
        parameters: &Map<String, Value>,
        recipient: &str,
    ) -> Result<()> {
        let request = ActionRequest {
            action,
            recipient,
            contexts,
            parameters,
        };
        match self.run(&request).await {
            Ok(()) => {
                info!(action, recipient, "action handled");
                Ok(())
            },
            Err(e) => {
                warn!(action, recipient, error = %e, "action fell back to plain reply");
                self.outbound.send_text(recipient, fallback_text).await?;
                Ok(())
            },
        }
    }

    async fn run(&self, request: &ActionRequest<'_>) -> Result<()> {
        let handler = self
            .handlers
            .get(request.action)
            .ok_or_else(|| Error::UnknownAction {
                action: request.action.to_string(),
            })?;
        let params = resolve(request.action, handler.requires(), request.contexts)?;
        handler
            .handle(request, &params, self.outbound.as_ref())
            .await
    }
}
