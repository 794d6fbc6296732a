//! Messenger platform adapter.
//!
//! Inbound webhook event model and signature verification, plus the
//! [`MessengerOutbound`] seam and its Graph Send API implementation.

pub mod error;
pub mod event;
pub mod graph;
pub mod outbound;
pub mod signature;

pub use {
    error::{Error, Result},
    graph::GraphSendApi,
    outbound::{MessengerOutbound, QuickReply, SenderAction, TemplateButton, TemplateElement},
};
