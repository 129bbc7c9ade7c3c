//! Per-tick target assignment.
//!
//! For every live gladiator the resolver picks the nearest other live
//! gladiator as its hostile target and the nearest power-up as its
//! beneficial target, the latter only if it lies within the pickup radius.
//! Distances are Euclidean; on equal distance the candidate seen first in
//! arena order wins.
//!
//! The scan is O(n²) in the number of gladiators. Assignments are computed
//! from an immutable snapshot in parallel and then written back in id order,
//! so the result does not depend on thread scheduling.

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::EntityId;

/// Targets chosen for one gladiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Gladiator being assigned.
    pub gladiator: EntityId,
    /// Nearest other live gladiator.
    pub target: Option<EntityId>,
    /// Nearest power-up within the pickup radius.
    pub power_up: Option<EntityId>,
}

/// Assigns hostile and beneficial targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetingResolver {
    pickup_radius: f32,
}

impl TargetingResolver {
    /// Creates a resolver ignoring power-ups farther than `pickup_radius`.
    #[must_use]
    pub const fn new(pickup_radius: f32) -> Self {
        Self { pickup_radius }
    }

    /// Computes assignments without touching the arena.
    #[must_use]
    pub fn compute(&self, arena: &Arena) -> Vec<Assignment> {
        let agents: Vec<(EntityId, Vec2)> = arena
            .active_gladiators()
            .map(|g| (g.id(), g.position()))
            .collect();
        let power_ups: Vec<(EntityId, Vec2)> =
            arena.power_ups().map(|e| (e.id, e.position)).collect();

        let radius_sq = self.pickup_radius * self.pickup_radius;
        agents
            .par_iter()
            .map(|&(id, position)| Assignment {
                gladiator: id,
                target: nearest(position, agents.iter().filter(|(other, _)| *other != id))
                    .map(|(target, _)| target),
                power_up: nearest(position, power_ups.iter())
                    .filter(|(_, d)| *d <= radius_sq)
                    .map(|(power_up, _)| power_up),
            })
            .collect()
    }

    /// Computes and stores assignments on every live gladiator.
    pub fn assign(&self, arena: &mut Arena) -> Vec<Assignment> {
        let assignments = self.compute(arena);
        for a in &assignments {
            if let Some(g) = arena.active_gladiator_mut(a.gladiator) {
                g.set_targets(a.target, a.power_up);
            }
        }
        assignments
    }
}

/// Closest candidate and its squared distance; strict `<` keeps the first on ties.
fn nearest<'a>(
    from: Vec2,
    candidates: impl Iterator<Item = &'a (EntityId, Vec2)>,
) -> Option<(EntityId, f32)> {
    let mut best: Option<(EntityId, f32)> = None;
    for &(id, position) in candidates {
        let d = from.distance_squared(position);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((id, d));
        }
    }
    best
}
