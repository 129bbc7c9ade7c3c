//! Hazards: spike walls and fireballs.
//!
//! Hazards move on their own. The simulation advances them every running
//! tick with [`step`], and the host only reports which gladiator touched
//! which hazard.
//!
//! Spike walls enter from a random edge and sweep across the arena at a
//! fixed speed, bouncing off the world bounds. They are lethal, never expire
//! by timer and are only destroyed once they end up far outside the world.
//! Fireballs drop in from above with some lateral drift, accelerate under
//! gravity and are consumed by the first gladiator they hit.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Effect, EffectKind, HazardKind, Payload};
use crate::config::{HazardConfig, WorldConfig};
use crate::entity::{EntityId, Gladiator};

/// Result of a hazard contact.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HazardHit {
    /// Damage dealt.
    pub damage: f32,
    /// True if the contact knocked the gladiator out.
    pub knocked_out: bool,
    /// True if the hazard is used up and must be removed.
    pub consumed: bool,
}

/// Creates a hazard of a random kind.
pub fn spawn<R: Rng + ?Sized>(
    id: EntityId,
    world: &WorldConfig,
    config: &HazardConfig,
    now_ms: u64,
    rng: &mut R,
) -> Effect {
    match HazardKind::ALL[rng.gen_range(0..HazardKind::ALL.len())] {
        HazardKind::SpikeWall => spike_wall(id, world, config, now_ms, rng),
        HazardKind::Fireball => fireball(id, world, config, now_ms, rng),
    }
}

/// Creates a spike wall on a random edge, moving inward.
///
/// A wall travelling horizontally is tall and thin; one travelling
/// vertically is wide and flat.
pub fn spike_wall<R: Rng + ?Sized>(
    id: EntityId,
    world: &WorldConfig,
    config: &HazardConfig,
    now_ms: u64,
    rng: &mut R,
) -> Effect {
    let horizontal = rng.gen_bool(0.5);
    let from_low_side = rng.gen_bool(0.5);
    let speed = if from_low_side { config.spike_speed } else { -config.spike_speed };
    let inset = 100.0_f32.min(world.width / 4.0).min(world.height / 4.0);

    let (position, velocity, half_extents) = if horizontal {
        let x = if from_low_side { 0.0 } else { world.width };
        let y = inset + rng.gen::<f32>() * (world.height - 2.0 * inset);
        (
            Vec2::new(x, y),
            Vec2::new(speed, 0.0),
            Vec2::new(config.spike_half_thickness, config.spike_half_length),
        )
    } else {
        let x = inset + rng.gen::<f32>() * (world.width - 2.0 * inset);
        let y = if from_low_side { 0.0 } else { world.height };
        (
            Vec2::new(x, y),
            Vec2::new(0.0, speed),
            Vec2::new(config.spike_half_length, config.spike_half_thickness),
        )
    };

    Effect {
        id,
        kind: EffectKind::Hazard(HazardKind::SpikeWall),
        position,
        velocity,
        half_extents,
        payload: Payload {
            duration_ms: 0,
            multiplier: 1.0,
            damage: config.spike_damage,
        },
        created_at_ms: now_ms,
        lifespan_ms: None,
        gravity: 0.0,
    }
}

/// Creates a fireball above the arena.
pub fn fireball<R: Rng + ?Sized>(
    id: EntityId,
    world: &WorldConfig,
    config: &HazardConfig,
    now_ms: u64,
    rng: &mut R,
) -> Effect {
    let inset = 50.0_f32.min(world.width / 4.0);
    let x = inset + rng.gen::<f32>() * (world.width - 2.0 * inset);
    let velocity = Vec2::new(
        config.fireball_drift.lerp(rng.gen()),
        config.fireball_speed.lerp(rng.gen()),
    );
    Effect {
        id,
        kind: EffectKind::Hazard(HazardKind::Fireball),
        position: Vec2::new(x, -50.0),
        velocity,
        half_extents: Vec2::splat(config.fireball_radius),
        payload: Payload {
            duration_ms: 0,
            multiplier: 1.0,
            damage: config.fireball_damage.lerp(rng.gen()).floor(),
        },
        created_at_ms: now_ms,
        lifespan_ms: Some(config.fireball_lifespan_ms),
        gravity: config.fireball_gravity,
    }
}

/// Advances a hazard by `dt` seconds.
///
/// Spike walls reflect off the world edges they are moving toward. Power-ups
/// are left untouched.
pub fn step(effect: &mut Effect, dt: f32, world: &WorldConfig) {
    let Some(kind) = effect.hazard_kind() else {
        return;
    };
    match kind {
        HazardKind::SpikeWall => {
            effect.position += effect.velocity * dt;
            let size = world.size();
            for axis in 0..2 {
                let (p, v) = (effect.position[axis], effect.velocity[axis]);
                if (p <= 0.0 && v < 0.0) || (p >= size[axis] && v > 0.0) {
                    effect.velocity[axis] = -v;
                    effect.position[axis] = p.clamp(0.0, size[axis]);
                }
            }
        }
        HazardKind::Fireball => {
            effect.velocity.y += effect.gravity * dt;
            effect.position += effect.velocity * dt;
        }
    }
}

/// Applies a hazard to a gladiator.
///
/// Fireballs are consumed by the hit; spike walls keep going.
pub fn apply(gladiator: &mut Gladiator, effect: &Effect) -> HazardHit {
    let Some(kind) = effect.hazard_kind() else {
        return HazardHit::default();
    };
    if !gladiator.is_active() {
        return HazardHit::default();
    }
    let damage = effect.payload.damage;
    let knocked_out = gladiator.take_damage(damage);
    tracing::debug!(gladiator = %gladiator.id(), hazard = %effect.id, ?kind, damage, "hazard hit");
    HazardHit {
        damage,
        knocked_out,
        consumed: kind == HazardKind::Fireball,
    }
}
