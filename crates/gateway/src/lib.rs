//! Webhook gateway: HTTP surface, per-sender sessions, and event routing
//! into the NLU service and reply dispatcher.

pub mod server;
pub mod session;
pub mod state;
pub mod webhook;

pub use {
    server::{AppState, build_gateway_app, start_gateway},
    session::SessionMap,
    state::GatewayState,
};
