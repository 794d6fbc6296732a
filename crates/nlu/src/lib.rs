//! NLU service integration.
//!
//! Decodes the service's `query` response into a typed [`NluResponse`] and
//! provides the [`NluClient`] seam used by the gateway.

pub mod client;
pub mod error;
pub mod types;
mod wire;

pub use {
    client::{HttpNluClient, NluClient},
    error::{Error, Result},
    types::{
        Button, Card, Context, MessageFragment, NluResponse, QuickReplyOption, find_context,
    },
};
