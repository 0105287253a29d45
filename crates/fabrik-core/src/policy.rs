//! Request-selection policies: which pending request a building works on
//! next.
//!
//! Policies are stateless strategies dispatched by enum match, the same
//! pattern the delivery variants use. `pop_request` mutates the queue on
//! success and is the only way a request leaves the pending queue.

use crate::catalog::Catalog;
use crate::error::InvalidOperation;
use crate::fixed::Ticks;
use crate::request::{Request, STOCK_SERVICE_LATENCY};
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Strategy for picking the next request off a producer's pending queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestPolicy {
    /// Strict insertion order.
    #[default]
    Fifo,
    /// Shortest job first: minimum recipe latency, ties broken by earliest
    /// queue position.
    Sjf,
    /// Oldest request whose needs are fully covered by current storage, or
    /// none. Favors fairness: serving an older ready request may consume
    /// ingredients that would have made a newer one ready too.
    Ready,
}

impl RequestPolicy {
    pub fn parse(name: &str) -> Result<Self, InvalidOperation> {
        match name {
            "fifo" => Ok(Self::Fifo),
            "sjf" => Ok(Self::Sjf),
            "ready" => Ok(Self::Ready),
            other => Err(InvalidOperation::UnknownPolicy(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fifo => "fifo",
            Self::Sjf => "sjf",
            Self::Ready => "ready",
        }
    }

    /// Remove and return the chosen request, or `None` to stay idle this
    /// tick. `storage` is the producer's ledger (consulted by `Ready`).
    pub fn pop_request(
        &self,
        storage: &Storage,
        queue: &mut VecDeque<Request>,
        catalog: &Catalog,
    ) -> Option<Request> {
        match self {
            Self::Fifo => queue.pop_front(),
            Self::Sjf => {
                let best = queue
                    .iter()
                    .enumerate()
                    .min_by_key(|(idx, req)| (service_latency(req, catalog), *idx))
                    .map(|(idx, _)| idx)?;
                queue.remove(best)
            }
            Self::Ready => {
                let ready = queue
                    .iter()
                    .position(|req| storage.covers(&req.needs(catalog)))?;
                queue.remove(ready)
            }
        }
    }
}

fn service_latency(req: &Request, catalog: &Catalog) -> Ticks {
    req.recipe()
        .map(|rid| catalog.latency_of(rid))
        .unwrap_or(STOCK_SERVICE_LATENCY)
}
