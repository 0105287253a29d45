//! Source-selection policies: which upstream building supplies a missing
//! ingredient.
//!
//! All three strategies share the same contract: score every candidate
//! (invoking `on_score` once per candidate, purely for observability), pick
//! the minimum, break ties by list position, and leave the candidates
//! untouched.
//!
//! `RecursiveLatency` estimates the wall-tick cost of one more unit through
//! each candidate's entire sourcing chain. The estimate reuses work already
//! in flight and storage already on hand, but must not count the same unit
//! twice across sibling branches -- that bookkeeping is the per-call
//! [`UsageLedger`], created fresh for each selection and discarded after.

use crate::building::Building;
use crate::error::InvalidOperation;
use crate::fixed::Ticks;
use crate::id::{BuildingId, ItemId};
use crate::request::{RequestStatus, STOCK_SERVICE_LATENCY};
use crate::usage::UsageLedger;
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Score assigned to a candidate that can never fulfill the request
/// (cycle, no capable source, dangling id). Far below saturation so
/// accumulated sums stay ordered.
pub const UNREACHABLE: Ticks = Ticks::MAX / 4;

/// Strategy for picking the supplier of one missing ingredient unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourcePolicy {
    /// Fewest pending requests.
    #[default]
    QueueLength,
    /// Smallest sum of remaining latencies across queued and active
    /// requests.
    SimpleLatency,
    /// Smallest recursive wall-tick estimate through the candidate's own
    /// sourcing chain.
    RecursiveLatency,
}

impl SourcePolicy {
    pub fn parse(name: &str) -> Result<Self, InvalidOperation> {
        match name {
            "qlen" => Ok(Self::QueueLength),
            "simplelat" => Ok(Self::SimpleLatency),
            "recursivelat" => Ok(Self::RecursiveLatency),
            other => Err(InvalidOperation::UnknownPolicy(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::QueueLength => "qlen",
            Self::SimpleLatency => "simplelat",
            Self::RecursiveLatency => "recursivelat",
        }
    }

    /// Pick the best candidate, or `None` when the list is empty.
    /// Side-effect-free on the candidates; `on_score` fires once per
    /// candidate.
    pub fn select_source(
        &self,
        item: ItemId,
        requester: BuildingId,
        candidates: &[BuildingId],
        world: &World,
        on_score: &mut dyn FnMut(BuildingId, Ticks),
    ) -> Option<BuildingId> {
        match self {
            Self::QueueLength => pick_min(
                candidates,
                |c| {
                    world
                        .get(c)
                        .map(|b| b.pending_len() as Ticks)
                        .unwrap_or(UNREACHABLE)
                },
                on_score,
            ),
            Self::SimpleLatency => {
                pick_min(candidates, |c| backlog_latency(world, c), on_score)
            }
            Self::RecursiveLatency => {
                // One ledger per top-level call: sibling branches share it,
                // separate calls never do.
                let mut usage = UsageLedger::new();
                pick_min(
                    candidates,
                    |c| {
                        let mut path = vec![requester];
                        let score = estimate(item, c, world, &mut usage, &mut path);
                        if score >= UNREACHABLE {
                            // A dead candidate's claims would only clutter
                            // the ledger.
                            usage.clear_reservations(&[requester, c]);
                        }
                        score
                    },
                    on_score,
                )
            }
        }
    }
}

/// Minimum score wins; a strict comparison keeps the first of equals.
fn pick_min(
    candidates: &[BuildingId],
    mut score_of: impl FnMut(BuildingId) -> Ticks,
    on_score: &mut dyn FnMut(BuildingId, Ticks),
) -> Option<BuildingId> {
    let mut best: Option<(Ticks, BuildingId)> = None;
    for &candidate in candidates {
        let score = score_of(candidate);
        on_score(candidate, score);
        if best.is_none_or(|(s, _)| score < s) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, c)| c)
}

/// Sum of remaining latencies across a building's queued and active
/// requests.
fn backlog_latency(world: &World, id: BuildingId) -> Ticks {
    let Some(b) = world.get(id) else {
        return UNREACHABLE;
    };
    let queued: Ticks = b.pending_requests().map(|r| r.remaining()).sum();
    let active = b.current_request().map(|r| r.remaining()).unwrap_or(0);
    queued.saturating_add(active)
}

/// Wall-tick estimate for fulfilling one more unit of `item` through
/// `building`, recursively through its sourcing chain.
///
/// `path` is the chain of visited building identities; claims recorded in
/// `usage` are keyed by it, so sibling branches that reach the same
/// building along the same chain share claims while unrelated paths do
/// not. Re-visiting a building on the current path is a cycle and scores
/// [`UNREACHABLE`].
pub(crate) fn estimate(
    item: ItemId,
    building: BuildingId,
    world: &World,
    usage: &mut UsageLedger,
    path: &mut Vec<BuildingId>,
) -> Ticks {
    if path.contains(&building) {
        return UNREACHABLE;
    }
    let Some(b) = world.get(building) else {
        return UNREACHABLE;
    };

    // Work already in flight is reused, not double-counted: a matching
    // current request whose countdown is running contributes exactly its
    // remaining ticks, at most once per call.
    if let Some(cur) = b.current_request()
        && cur.item() == item
        && cur.status() == RequestStatus::Working
        && !usage.is_counted(building, cur.order())
    {
        usage.count_in_progress(building, cur.order());
        return cur.remaining();
    }

    path.push(building);
    let score = estimate_here(item, b, world, usage, path);
    path.pop();
    score
}

fn estimate_here(
    item: ItemId,
    b: &Building,
    world: &World,
    usage: &mut UsageLedger,
    path: &mut Vec<BuildingId>,
) -> Ticks {
    let catalog = world.catalog();
    match b.recipe_for(item, catalog) {
        Some(rid) => {
            let Some(recipe) = catalog.get_recipe(rid) else {
                return UNREACHABLE;
            };

            // Ingredients on hand, net of what this call already claimed
            // along this path.
            let mut shortfalls: Vec<ItemId> = Vec::new();
            for (&ing, &need) in &recipe.ingredients {
                let net = b
                    .storage()
                    .quantity(ing)
                    .saturating_sub(usage.storage_used(ing, path));
                if net < need {
                    shortfalls.push(ing);
                }
                usage.add_storage_used(ing, path, net.min(need));
            }
            if shortfalls.is_empty() {
                return recipe.latency;
            }

            // Production is single-threaded per building, so ingredient
            // sub-estimates accumulate sequentially on top of the
            // producer's own latency.
            let mut total = recipe.latency;
            for ing in shortfalls {
                total = total.saturating_add(best_sub_estimate(ing, b, world, usage, path));
            }
            total.min(UNREACHABLE)
        }
        None => {
            if !b.can_produce(item, catalog) {
                return UNREACHABLE;
            }
            // Serving from stock: one unit of current stock, or a refill
            // through the store's own sourcing chain.
            let net = b
                .storage()
                .quantity(item)
                .saturating_sub(usage.storage_used(item, path));
            if net >= 1 {
                usage.add_storage_used(item, path, 1);
                return STOCK_SERVICE_LATENCY;
            }
            STOCK_SERVICE_LATENCY
                .saturating_add(best_sub_estimate(item, b, world, usage, path))
                .min(UNREACHABLE)
        }
    }
}

/// Best estimate among a building's capable, work-accepting sources.
fn best_sub_estimate(
    item: ItemId,
    b: &Building,
    world: &World,
    usage: &mut UsageLedger,
    path: &mut Vec<BuildingId>,
) -> Ticks {
    let mut best = UNREACHABLE;
    for &src in b.sources() {
        let Some(sb) = world.get(src) else {
            continue;
        };
        if !sb.can_accept_work() || !sb.can_produce(item, world.catalog()) {
            continue;
        }
        let score = estimate(item, src, world, usage, path);
        if score < best {
            best = score;
        }
    }
    best
}
