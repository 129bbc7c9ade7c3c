//! Physics host seam.
//!
//! The core never integrates motion itself. A host engine takes the
//! [`Command`]s returned by each tick, moves bodies, and reports back
//! positions and overlaps as [`Contact`]s.
//!
//! [`KinematicHost`] is a minimal host: straight-line integration clamped
//! to the world, circle bodies for gladiators and box bodies for effects.
//! It drives headless matches and tests.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::config::WorldConfig;
use crate::entity::EntityId;
use crate::output::Command;
use crate::simulation::Simulation;

/// Body radius of a gladiator, in world units.
pub const GLADIATOR_RADIUS: f32 = 16.0;

/// An overlap reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contact {
    /// Two gladiators touch.
    Gladiators(EntityId, EntityId),
    /// A gladiator touches a power-up.
    PowerUp {
        /// Gladiator.
        gladiator: EntityId,
        /// Power-up.
        effect: EntityId,
    },
    /// A gladiator touches a hazard.
    Hazard {
        /// Gladiator.
        gladiator: EntityId,
        /// Hazard.
        effect: EntityId,
    },
}

// =============================================================================
// KinematicHost
// =============================================================================

/// Straight-line physics host.
#[derive(Debug, Clone)]
pub struct KinematicHost {
    world: WorldConfig,
    radius: f32,
    velocities: BTreeMap<EntityId, Vec2>,
}

impl KinematicHost {
    /// Creates a host for the given world.
    #[must_use]
    pub fn new(world: WorldConfig) -> Self {
        Self::with_radius(world, GLADIATOR_RADIUS)
    }

    /// Creates a host with a custom gladiator radius.
    #[must_use]
    pub fn with_radius(world: WorldConfig, radius: f32) -> Self {
        Self {
            world,
            radius,
            velocities: BTreeMap::new(),
        }
    }

    /// Stores the velocities requested by a tick.
    pub fn apply(&mut self, commands: &[Command]) {
        self.velocities.clear();
        for command in commands {
            match *command {
                Command::SetVelocity { target, velocity } => {
                    self.velocities.insert(target, velocity);
                }
            }
        }
    }

    /// Velocity last requested for a gladiator.
    #[must_use]
    pub fn velocity(&self, gladiator: EntityId) -> Vec2 {
        self.velocities.get(&gladiator).copied().unwrap_or(Vec2::ZERO)
    }

    /// Moves every gladiator by `dt` seconds, reports new positions and
    /// feeds the resulting contacts back into the simulation.
    ///
    /// Returns the contacts reported.
    pub fn step(&mut self, sim: &mut Simulation, dt: f32) -> Vec<Contact> {
        let max = self.world.size() - Vec2::splat(self.radius);
        let min = Vec2::splat(self.radius).min(max);
        let moves: Vec<(EntityId, Vec2)> = sim
            .arena()
            .gladiators()
            .map(|g| {
                let next = g.position() + self.velocity(g.id()) * dt;
                (g.id(), next.clamp(min, max))
            })
            .collect();
        for (id, position) in moves {
            sim.sync_position(id, position);
        }

        let contacts = self.detect(sim.arena());
        for contact in &contacts {
            sim.handle_contact(*contact);
        }
        contacts
    }

    /// Lists current overlaps between live gladiators and between
    /// gladiators and effects, in id order.
    #[must_use]
    pub fn detect(&self, arena: &Arena) -> Vec<Contact> {
        let bodies: Vec<(EntityId, Vec2)> = arena
            .active_gladiators()
            .map(|g| (g.id(), g.position()))
            .collect();
        let reach = 2.0 * self.radius;
        let mut contacts = Vec::new();

        for (i, &(a, pa)) in bodies.iter().enumerate() {
            for &(b, pb) in &bodies[i + 1..] {
                if pa.distance_squared(pb) <= reach * reach {
                    contacts.push(Contact::Gladiators(a, b));
                }
            }
        }

        for &(gladiator, position) in &bodies {
            for effect in arena.effects() {
                if !effect.overlaps_circle(position, self.radius) {
                    continue;
                }
                contacts.push(if effect.is_power_up() {
                    Contact::PowerUp {
                        gladiator,
                        effect: effect.id,
                    }
                } else {
                    Contact::Hazard {
                        gladiator,
                        effect: effect.id,
                    }
                });
            }
        }
        contacts
    }
}
