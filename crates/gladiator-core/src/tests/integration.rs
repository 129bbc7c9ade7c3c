//! End-to-end tests through the public simulation API.
//!
//! These drive the simulation the way a host does: ticks, position sync
//! and contact reports, plus viewer predictions and MVP votes.

use std::collections::BTreeSet;

use glam::Vec2;
use proptest::prelude::*;

use crate::config::{ArenaConfig, StatRange};
use crate::effects::{hazard, ChaosRoll, EffectKind, Payload, PowerUpKind};
use crate::entity::{EffectFlags, EntityId, FsmState};
use crate::error::{LedgerError, PredictionError, VoteError};
use crate::host::Contact;
use crate::lifecycle::MatchState;
use crate::output::{Command, Event};

use super::helpers::{
    count, drop_power_up, knock_out, live_ids, run_hosted, set_health, simulation_with, started,
    tick_until, FUNDS,
};

fn payload(duration_ms: u64, multiplier: f32, damage: f32) -> Payload {
    Payload {
        duration_ms,
        multiplier,
        damage,
    }
}

fn position(sim: &crate::Simulation, id: EntityId) -> Vec2 {
    sim.arena().gladiator(id).expect("gladiator exists").position()
}

// =============================================================================
// Power-ups
// =============================================================================

#[test]
fn trap_slows_then_restores_and_hurts_once() {
    let mut sim = started(11);
    sim.tick(100);
    let id = live_ids(&sim)[0];
    let base = sim.gladiator_stats(id).expect("present");
    let at = position(&sim, id);
    let trap = drop_power_up(&mut sim, PowerUpKind::Trap, at, payload(3000, 0.5, 10.0));

    sim.handle_contact(Contact::PowerUp { gladiator: id, effect: trap });
    sim.handle_contact(Contact::PowerUp { gladiator: id, effect: trap });

    let slowed = sim.gladiator_stats(id).expect("present");
    assert_eq!(slowed.speed, base.speed * 0.5);
    assert_eq!(slowed.health, base.health - 10.0);
    assert!(sim.arena().effect(trap).is_none());

    let mut events = sim.take_events();
    events.extend(tick_until(&mut sim, 100, 3000, 100));
    assert_eq!(sim.gladiator_stats(id).expect("present").speed, base.speed * 0.5);

    sim.tick(3100);
    let restored = sim.gladiator_stats(id).expect("present");
    assert_eq!(restored.speed, base.speed);
    assert_eq!(restored.health, base.health - 10.0);

    events.extend(sim.take_events());
    let collected = count(&events, |e| matches!(e, Event::PowerUpCollected { .. }));
    assert_eq!(collected, 1);
    assert_eq!(sim.snapshot().stats.power_ups_collected, 1);
}

#[test]
fn overlapping_effects_revert_independently() {
    let mut sim = started(12);
    sim.tick(100);
    let id = live_ids(&sim)[1];
    let base = sim.gladiator_stats(id).expect("present");

    let at = position(&sim, id);
    let shield = drop_power_up(&mut sim, PowerUpKind::Shield, at, payload(2000, 0.5, 0.0));
    sim.handle_contact(Contact::PowerUp { gladiator: id, effect: shield });
    assert_eq!(sim.gladiator_stats(id).expect("present").defense, base.defense * 1.5);

    tick_until(&mut sim, 100, 500, 100);
    let at = position(&sim, id);
    let trap = drop_power_up(&mut sim, PowerUpKind::Trap, at, payload(3000, 0.5, 0.0));
    sim.handle_contact(Contact::PowerUp { gladiator: id, effect: trap });

    tick_until(&mut sim, 500, 2100, 100);
    let mid = sim.gladiator_stats(id).expect("present");
    assert_eq!(mid.defense, base.defense);
    assert_eq!(mid.speed, base.speed * 0.5);

    tick_until(&mut sim, 2100, 3500, 100);
    let done = sim.gladiator_stats(id).expect("present");
    assert_eq!(done.defense, base.defense);
    assert_eq!(done.speed, base.speed);
}

#[test]
fn lethal_trap_knocks_out_and_removes_after_grace() {
    let mut sim = started(13);
    sim.tick(100);
    let id = live_ids(&sim)[2];
    let at = position(&sim, id);
    let trap = drop_power_up(&mut sim, PowerUpKind::Trap, at, payload(3000, 0.5, 10_000.0));

    sim.handle_contact(Contact::PowerUp { gladiator: id, effect: trap });

    let g = sim.arena().gladiator(id).expect("kept during grace");
    assert!(!g.is_active());
    assert_eq!(g.health(), 0.0);
    assert_eq!(*g.stats(), g.effective_stats());
    assert_eq!(sim.snapshot().stats.knockouts, 1);

    tick_until(&mut sim, 100, 1000, 100);
    assert!(sim.arena().gladiator(id).is_some());
    sim.tick(1100);
    assert!(sim.arena().gladiator(id).is_none());

    // Nothing else may touch the removed gladiator
    tick_until(&mut sim, 1100, 4000, 100);
    assert_eq!(sim.snapshot().live_count, 3);
}

// =============================================================================
// Hazards
// =============================================================================

#[test]
fn fireball_hits_once_and_is_consumed() {
    let mut sim = started(14);
    sim.tick(100);
    let id = live_ids(&sim)[0];
    let at = position(&sim, id);
    let world = sim.config().world.clone();
    let hazards = sim.config().hazards.clone();
    let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(1);
    let fireball = sim.arena_mut().spawn_effect(|effect| {
        let mut e = hazard::fireball(effect, &world, &hazards, 100, &mut rng);
        e.position = at;
        e
    });
    let damage = sim.arena().effect(fireball).expect("spawned").payload.damage;
    let before = sim.health(id).expect("present");

    sim.handle_contact(Contact::Hazard { gladiator: id, effect: fireball });
    sim.handle_contact(Contact::Hazard { gladiator: id, effect: fireball });

    assert_eq!(sim.health(id), Some(before - damage));
    assert!(sim.arena().effect(fireball).is_none());
    assert_eq!(sim.snapshot().stats.hazards_triggered, 1);
    let events = sim.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::HazardTriggered { gladiator, .. } if *gladiator == id
    )));
}

#[test]
fn spike_wall_survives_contact() {
    let mut sim = started(15);
    sim.tick(100);
    let id = live_ids(&sim)[3];
    let at = position(&sim, id);
    let world = sim.config().world.clone();
    let hazards = sim.config().hazards.clone();
    let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(2);
    let wall = sim.arena_mut().spawn_effect(|effect| {
        let mut e = hazard::spike_wall(effect, &world, &hazards, 100, &mut rng);
        e.position = at;
        e
    });

    sim.handle_contact(Contact::Hazard { gladiator: id, effect: wall });

    assert!(sim.arena().effect(wall).is_some());
    assert_eq!(sim.health(id), Some(0.0));
    let events = sim.take_events();
    assert_eq!(count(&events, |e| matches!(e, Event::KnockedOut { .. })), 1);
}

#[test]
fn spawned_effects_expire_or_leave() {
    let mut sim = started(16);
    let events = tick_until(&mut sim, 0, 40_000, 50);

    let spawned: Vec<EntityId> = events
        .iter()
        .filter_map(|e| match e {
            Event::PowerUpSpawned { effect, .. } => Some(*effect),
            _ => None,
        })
        .collect();
    assert!(!spawned.is_empty());
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::PowerUpExpired { effect } if *effect == spawned[0])));
    assert!(count(&events, |e| matches!(e, Event::HazardSpawned { .. })) >= 1);
    for effect in sim.arena().effects() {
        if let EffectKind::PowerUp(_) = effect.kind {
            assert!(sim.now_ms() - effect.created_at_ms <= 10_000);
        }
    }
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn adjacent_gladiators_fight() {
    let mut sim = started(17);
    let ids = live_ids(&sim);
    let (a, b) = (ids[0], ids[1]);
    let at = position(&sim, a);
    sim.sync_position(b, at + Vec2::new(50.0, 0.0));

    let events = tick_until(&mut sim, 0, 5000, 100);

    let strikes: Vec<(EntityId, EntityId)> = events
        .iter()
        .filter_map(|e| match e {
            Event::AttackResolved { attacker, defender, .. } => Some((*attacker, *defender)),
            _ => None,
        })
        .collect();
    assert!(!strikes.is_empty());
    assert!(strikes.iter().all(|&(x, y)| (x == a && y == b) || (x == b && y == a)));
    assert_eq!(sim.snapshot().stats.attacks as usize, strikes.len());
}

#[test]
fn contact_strikes_respect_cooldown() {
    let mut sim = started(18);
    let ids = live_ids(&sim);
    let (a, b) = (ids[0], ids[1]);
    let at = position(&sim, a);
    sim.sync_position(b, at + Vec2::new(50.0, 0.0));

    let mut now = 0;
    let striker = loop {
        now += 100;
        assert!(now < 10_000, "no strike happened");
        sim.tick(now);
        let hit = sim.take_events().into_iter().find_map(|e| match e {
            Event::AttackResolved { attacker, .. } => Some(attacker),
            _ => None,
        });
        if let Some(attacker) = hit {
            break attacker;
        }
    };
    let other = if striker == a { b } else { a };

    sim.handle_contact(Contact::Gladiators(striker, other));

    let again = sim.take_events().into_iter().any(|e| {
        matches!(e, Event::AttackResolved { attacker, .. } if attacker == striker)
    });
    assert!(!again);
}

fn commanded(commands: &[Command], id: EntityId) -> Vec2 {
    commands
        .iter()
        .find_map(|c| match *c {
            Command::SetVelocity { target, velocity } if target == id => Some(velocity),
            Command::SetVelocity { .. } => None,
        })
        .expect("command for gladiator")
}

#[test]
fn attack_recoil_reaches_the_host() {
    let mut config = ArenaConfig::default();
    config.matches.gladiator_count = 2;
    config.stats.aggression = StatRange::new(1.0, 1.0);
    config.stats.intelligence = StatRange::new(0.0, 0.0);
    let mut sim = simulation_with(config, 19);
    sim.start(0);
    let ids = live_ids(&sim);
    let (a, b) = (ids[0], ids[1]);
    let at = position(&sim, a);
    sim.sync_position(b, at + Vec2::new(50.0, 0.0));

    sim.tick(100);
    let events = sim.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::AttackResolved { attacker, .. } if *attacker == a)));
    assert_eq!(commanded(&sim.tick(200), a), Vec2::ZERO);

    // Recoil is due 200 ms after the strike and outlives the attack stance
    let commands = sim.tick(300);
    let g = sim.arena().gladiator(a).expect("present");
    assert_eq!(g.state(), FsmState::Attack);
    let speed = g.effective_stats().speed;
    let kick = commanded(&commands, a);
    assert!((kick.length() - speed * 0.4).abs() < 1e-3, "kick {kick:?} at speed {speed}");

    let commands = sim.tick(500);
    assert_eq!(sim.arena().gladiator(a).expect("present").state(), FsmState::Attack);
    assert_eq!(commanded(&commands, a), Vec2::ZERO);
}

/// Drops chaos power-ups under `id` until one rolls confusion.
fn confuse(sim: &mut crate::Simulation, id: EntityId, duration_ms: u64) {
    for _ in 0..64 {
        let max_health = sim.gladiator_stats(id).expect("present").max_health;
        set_health(sim, id, max_health);
        let at = position(sim, id);
        let chaos = drop_power_up(sim, PowerUpKind::Chaos, at, payload(duration_ms, 10.0, 30.0));
        sim.handle_contact(Contact::PowerUp { gladiator: id, effect: chaos });
        let rolled = sim.take_events().into_iter().find_map(|e| match e {
            Event::PowerUpCollected { chaos, .. } => chaos,
            _ => None,
        });
        if rolled == Some(ChaosRoll::Confusion) {
            return;
        }
    }
    panic!("chaos never rolled confusion");
}

#[test]
fn confusion_rerolls_heading_until_it_wears_off() {
    let mut sim = started(20);
    sim.tick(100);
    let id = live_ids(&sim)[0];
    confuse(&mut sim, id, 2000);
    let velocity = |sim: &crate::Simulation| sim.arena().gladiator(id).expect("present").velocity();
    let speed = sim.gladiator_stats(id).expect("present").speed;

    // Ticks re-arm every 500 ms while strictly before the end at 2100
    let mut headings = Vec::new();
    for at in [600, 1100, 1600] {
        let from = sim.now_ms();
        tick_until(&mut sim, from, at, 100);
        let v = velocity(&sim);
        assert!((v.length() - speed).abs() < 1e-3);
        assert!(sim.gladiator_snapshots()[0].flags.contains(EffectFlags::CONFUSED));
        headings.push(v);
    }
    assert_ne!(headings[0], headings[1]);
    assert_ne!(headings[1], headings[2]);

    tick_until(&mut sim, 1600, 2000, 100);
    assert_eq!(velocity(&sim), headings[2]);

    tick_until(&mut sim, 2000, 2100, 100);
    assert!(!sim.gladiator_snapshots()[0].flags.contains(EffectFlags::CONFUSED));
}

#[test]
fn confusion_stops_once_the_match_is_ending() {
    let mut sim = started(21);
    sim.tick(100);
    let ids = live_ids(&sim);
    let survivor = ids[0];
    confuse(&mut sim, survivor, 4000);
    for &id in &ids[1..] {
        knock_out(&mut sim, id);
    }

    sim.tick(200);
    assert_eq!(sim.match_state(), MatchState::Ending);
    for _ in 0..40 {
        let now = sim.now_ms() + 100;
        for command in sim.tick(now) {
            let Command::SetVelocity { velocity, .. } = command;
            assert_eq!(velocity, Vec2::ZERO);
        }
        let g = sim.arena().gladiator(survivor).expect("kept while ending");
        assert_eq!(g.velocity(), Vec2::ZERO);
    }
    assert_eq!(sim.match_state(), MatchState::Ending);
}

// =============================================================================
// Predictions and MVP
// =============================================================================

#[test]
fn predictions_are_validated_and_charged() {
    let mut sim = simulation_with(ArenaConfig::default(), 19);
    assert_eq!(
        sim.place_prediction("alice", EntityId::new(0), 10),
        Err(PredictionError::MatchNotRunning)
    );

    sim.start(0);
    let ids = live_ids(&sim);
    sim.place_prediction("alice", ids[0], 10).expect("funded");
    assert_eq!(sim.ledger().balance("alice"), FUNDS - 10);
    assert_eq!(
        sim.place_prediction("alice", ids[1], 10),
        Err(PredictionError::AlreadyPredicted("alice".to_string()))
    );
    assert_eq!(
        sim.place_prediction("bob", EntityId::new(999), 10),
        Err(PredictionError::UnknownGladiator(EntityId::new(999)))
    );
    assert!(matches!(
        sim.place_prediction("bob", ids[0], FUNDS + 1),
        Err(PredictionError::Ledger(LedgerError::InsufficientBalance { .. }))
    ));
    assert_eq!(sim.ledger().balance("bob"), FUNDS);

    knock_out(&mut sim, ids[3]);
    assert_eq!(
        sim.place_prediction("bob", ids[3], 10),
        Err(PredictionError::UnknownGladiator(ids[3]))
    );

    let events = sim.take_events();
    assert_eq!(count(&events, |e| matches!(e, Event::PredictionMade { .. })), 1);
}

#[test]
fn correct_predictions_are_paid_double() {
    let mut sim = started(20);
    let ids = live_ids(&sim);
    sim.place_prediction("alice", ids[0], 10).expect("funded");
    sim.place_prediction("bob", ids[1], 10).expect("funded");
    for &id in &ids[1..] {
        knock_out(&mut sim, id);
    }
    sim.tick(100);

    let result = sim.last_result().cloned().expect("match ended");
    assert_eq!(result.winner, Some(ids[0]));
    assert_eq!(result.predictions.len(), 2);
    assert!(result.predictions[0].correct);
    assert!(!result.predictions[1].correct);

    assert_eq!(sim.pay_rewards(&result), Ok(20));
    assert_eq!(sim.ledger().balance("alice"), FUNDS + 10);
    assert_eq!(sim.ledger().balance("bob"), FUNDS - 10);
    assert_eq!(
        sim.place_prediction("carol", ids[0], 1),
        Err(PredictionError::MatchNotRunning)
    );
}

#[test]
fn mvp_vote_closes_ballot_early() {
    let mut sim = started(21);
    assert_eq!(sim.cast_mvp_vote("alice", EntityId::new(0)), Err(VoteError::NotActive));

    let ids = live_ids(&sim);
    for &id in &ids[1..] {
        knock_out(&mut sim, id);
    }
    sim.tick(100);
    sim.take_events();

    sim.cast_mvp_vote("alice", ids[2]).expect("eligible");
    assert_eq!(sim.ledger().balance("alice"), FUNDS - 1);
    assert_eq!(
        sim.cast_mvp_vote("alice", ids[1]),
        Err(VoteError::AlreadyVoted("alice".to_string()))
    );
    assert_eq!(
        sim.cast_mvp_vote("bob", EntityId::new(999)),
        Err(VoteError::Ineligible(EntityId::new(999)))
    );

    let events = tick_until(&mut sim, 100, 5100, 100);

    assert!(events.iter().any(|e| matches!(
        e,
        Event::MvpDecided {
            match_id: 1,
            gladiator,
            votes: 1,
            random: false,
        } if *gladiator == ids[2]
    )));
    let mvp = sim.last_mvp().expect("ballot closed");
    assert_eq!(mvp.mvp, Some(ids[2]));
    assert!(sim.ballot().is_none());
    assert_eq!(sim.match_id(), 2);
}

#[test]
fn unattended_ballot_picks_at_random() {
    let mut sim = started(22);
    let ids = live_ids(&sim);
    for &id in &ids[1..] {
        knock_out(&mut sim, id);
    }
    sim.tick(100);

    let events = tick_until(&mut sim, 100, 15_000, 100);
    assert!(!events.iter().any(|e| matches!(e, Event::MvpDecided { .. })));
    assert!(sim.ballot().is_some());

    let events = tick_until(&mut sim, 15_000, 15_100, 100);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::MvpDecided { match_id: 1, random: true, .. })));
    let mvp = sim.last_mvp().expect("ballot closed");
    assert!(ids.contains(&mvp.mvp.expect("someone eligible")));
}

#[test]
fn selecting_a_gladiator_emits_event() {
    let mut sim = started(23);
    sim.take_events();
    let id = live_ids(&sim)[0];
    assert!(sim.select_gladiator(id));
    assert!(!sim.select_gladiator(EntityId::new(999)));
    assert_eq!(sim.take_events(), vec![Event::GladiatorSelected { gladiator: id }]);
}

// =============================================================================
// Hosted runs
// =============================================================================

#[test]
fn hosted_matches_cycle() {
    let mut sim = started(24);
    let mut ended = Vec::new();
    let mut started_ids = Vec::new();

    run_hosted(&mut sim, 1500, 50, |_, events| {
        for e in events {
            match e {
                Event::MatchEnd { match_id, .. } => ended.push(*match_id),
                Event::MatchStarted { match_id, .. } => started_ids.push(*match_id),
                _ => {}
            }
        }
    });

    assert!(ended.contains(&1));
    assert!(started_ids.contains(&2));
    let unique: BTreeSet<u64> = ended.iter().copied().collect();
    assert_eq!(unique.len(), ended.len());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn health_stays_bounded_and_knocked_out_never_strike(seed in any::<u64>()) {
        let mut sim = started(seed);
        let mut down: BTreeSet<EntityId> = BTreeSet::new();
        let mut violations = Vec::new();

        run_hosted(&mut sim, 800, 50, |sim, events| {
            for e in events {
                match e {
                    Event::MatchStarted { .. } => down.clear(),
                    Event::KnockedOut { gladiator } => {
                        down.insert(*gladiator);
                    }
                    Event::AttackResolved { attacker, .. } if down.contains(attacker) => {
                        violations.push(format!("{attacker} struck after knockout"));
                    }
                    _ => {}
                }
            }
            for g in sim.gladiator_snapshots() {
                if g.health < 0.0 || g.health > g.max_health {
                    violations.push(format!("{} health {} of {}", g.id, g.health, g.max_health));
                }
                if !g.active && g.health != 0.0 {
                    violations.push(format!("{} inactive with health {}", g.id, g.health));
                }
            }
        });

        prop_assert!(violations.is_empty(), "{:?}", violations);
    }
}
