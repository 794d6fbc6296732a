//! Delay assignment and scheduling for multi-part replies.
//!
//! Offsets are computed once from the moment a reply is sequenced, so unit
//! `i` fires `i × interval` after that instant regardless of how long earlier
//! sends take to land.

use std::{sync::Arc, time::Duration};

use {
    tokio::{task::JoinHandle, time::Instant},
    tokio_util::sync::CancellationToken,
    tracing::debug,
};

use crate::{aggregate::DispatchPayload, executor::Executor};

/// A payload bound to a recipient and a send delay.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchUnit {
    pub payload: DispatchPayload,
    pub offset: Duration,
    pub recipient: String,
}

/// Assign unit `i` the offset `i × interval`, preserving order.
#[must_use]
pub fn pace(
    payloads: Vec<DispatchPayload>,
    recipient: &str,
    interval: Duration,
) -> Vec<DispatchUnit> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(i, payload)| DispatchUnit {
            payload,
            offset: interval.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)),
            recipient: recipient.to_string(),
        })
        .collect()
}

/// Spawn one task per unit. Tasks are independent: a slow or failed send
/// does not hold back the units after it.
pub fn schedule(units: Vec<DispatchUnit>, executor: Arc<Executor>) -> Vec<JoinHandle<()>> {
    schedule_with_cancel(units, executor, CancellationToken::new())
}

/// Like [`schedule`], but pending units are skipped once `cancel` fires.
pub fn schedule_with_cancel(
    units: Vec<DispatchUnit>,
    executor: Arc<Executor>,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let start = Instant::now();
    units
        .into_iter()
        .enumerate()
        .map(|(index, unit)| {
            let executor = Arc::clone(&executor);
            let cancel = cancel.clone();
            let deadline = start + unit.offset;
            tokio::spawn(async move {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!(recipient = %unit.recipient, index, "paced send cancelled");
                    },
                    () = tokio::time::sleep_until(deadline) => {
                        executor.execute(unit).await;
                    },
                }
            })
        })
        .collect()
}
