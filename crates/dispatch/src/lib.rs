//! Reply dispatch: turns one NLU response into a paced series of outbound
//! Messenger calls.
//!
//! Pipeline for fragment replies:
//! [`classify`] → [`aggregate`] → [`pace`] → [`Executor`]. The
//! [`Orchestrator`] picks between that pipeline, the [`ActionRouter`], and
//! the single-message reply paths.

pub mod actions;
pub mod aggregate;
pub mod classify;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod pacer;

#[cfg(test)]
mod testing;

pub use {
    actions::{ActionHandler, ActionRequest, ActionRouter, ParamRequirement, ResolvedParams},
    aggregate::{DispatchPayload, aggregate},
    classify::{ButtonAction, FragmentKind, classify, classify_button},
    error::{Error, Result},
    executor::Executor,
    orchestrator::{Orchestrator, Outcome, Route, decide},
    pacer::{DispatchUnit, pace, schedule, schedule_with_cancel},
};
