//! Messaging event handling.

use std::sync::Arc;

use {
    relay_messenger::{
        SenderAction,
        event::{EventKind, MessagingEvent, WebhookPayload},
    },
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use crate::state::GatewayState;

const OPTIN_REPLY: &str = "Authentication successful";

/// Spawn one task per messaging event. Events are handled independently;
/// nothing orders one event's replies against another's.
pub fn dispatch_payload(state: Arc<GatewayState>, payload: WebhookPayload) -> Vec<JoinHandle<()>> {
    if payload.object != "page" {
        debug!(object = %payload.object, "ignoring non-page webhook");
        return Vec::new();
    }
    payload
        .entry
        .into_iter()
        .flat_map(|entry| entry.messaging)
        .map(|event| {
            let state = Arc::clone(&state);
            tokio::spawn(async move { handle_event(&state, event).await })
        })
        .collect()
}

pub async fn handle_event(state: &GatewayState, event: MessagingEvent) {
    let sender = event.sender.id.as_str();
    match event.kind() {
        EventKind::Message(message) => {
            if message.is_echo {
                debug!(sender, mid = ?message.mid, "ignoring echo");
                return;
            }
            match message.utterance() {
                Some(text) => reply_to(state, sender, text).await,
                None => info!(
                    sender,
                    attachments = message.attachments.len(),
                    "message without text, nothing to forward"
                ),
            }
        },
        EventKind::Postback(postback) => {
            info!(sender, payload = %postback.payload, "postback received");
            reply_to(state, sender, &postback.payload).await;
        },
        EventKind::Optin(optin) => {
            info!(sender, data_ref = ?optin.data_ref, "authentication received");
            if let Err(e) = state.outbound.send_text(sender, OPTIN_REPLY).await {
                warn!(sender, error = %e, "optin reply failed");
            }
        },
        EventKind::Delivery(delivery) => {
            for mid in &delivery.mids {
                debug!(sender, mid = %mid, "message delivered");
            }
            debug!(sender, watermark = delivery.watermark, "delivered up to watermark");
        },
        EventKind::Read(read) => {
            debug!(sender, watermark = read.watermark, "messages read");
        },
        EventKind::Unsupported => {
            debug!(sender, "ignoring unsupported messaging event");
        },
    }
}

/// Forward one utterance to the NLU service and reply with the result.
async fn reply_to(state: &GatewayState, sender: &str, utterance: &str) {
    if state.typing_indicator
        && let Err(e) = state
            .outbound
            .send_sender_action(sender, SenderAction::TypingOn)
            .await
    {
        debug!(sender, error = %e, "typing indicator failed");
    }

    let session = state.sessions.token_for(sender);
    match state.nlu.query(utterance, &session).await {
        Ok(response) => {
            let outcome = state.orchestrator.respond(response, sender).await;
            debug!(
                sender,
                route = outcome.route.as_str(),
                pending = outcome.pending.len(),
                "reply dispatched"
            );
        },
        Err(e) => {
            warn!(sender, error = %e, "NLU query failed");
            if let Err(e) = state.outbound.send_text(sender, &state.fallback_text).await {
                warn!(sender, error = %e, "fallback reply failed");
            }
        },
    }
}
