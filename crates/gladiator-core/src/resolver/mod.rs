//! Resolver module: the per-tick passes that read the whole arena.
//!
//! Resolvers are the write phase of a tick. Gladiators decide on their own,
//! but anything that needs to look at more than one entity at a time lives
//! here:
//!
//! - [`TargetingResolver`]: nearest hostile and nearest in-range power-up
//!   for every live gladiator
//! - [`CombatResolver`]: dodge, critical and damage rolls for one strike,
//!   applied to the defender
//!
//! # Invariants
//!
//! - Resolvers only act on gladiators that are still active
//! - Ties are broken by arena iteration order (lowest id first)

mod combat;
mod targeting;

pub use combat::{
    base_damage, resolve_attack, resolve_attack_with_rolls, AttackOutcome, AttackRolls,
    CombatResolver, StrikeReport,
};
pub use targeting::{Assignment, TargetingResolver};
