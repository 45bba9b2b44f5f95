//! Tests for the engine, scheduler, and the AI, combat, tower and resource
//! systems.

use std::cell::RefCell;
use std::rc::Rc;

use bastion_core::components::*;
use bastion_core::config::SimConfig;
use bastion_core::enums::*;
use bastion_core::events::SimEvent;
use bastion_core::types::{EntityId, Position, Velocity};

use crate::context::TickContext;
use crate::ecs::{ComponentKind, KindSet, World};
use crate::engine::SimulationEngine;
use crate::schedule::{Scheduler, System};

const DT: f64 = 0.1;

fn engine() -> SimulationEngine {
    SimulationEngine::new(SimConfig::default())
}

fn spawn_unit(engine: &mut SimulationEngine, team: Team, at: Position, ai: AiBehavior) -> EntityId {
    let id = engine.create_entity();
    engine.attach(id, at).unwrap();
    engine.attach(id, Velocity::ZERO).unwrap();
    engine.attach(id, Faction { team }).unwrap();
    engine.attach(id, Health::new(100.0)).unwrap();
    engine.attach(id, ai).unwrap();
    id
}

fn spawn_dummy(engine: &mut SimulationEngine, team: Team, at: Position, hp: f64) -> EntityId {
    let id = engine.create_entity();
    engine.attach(id, at).unwrap();
    engine.attach(id, Faction { team }).unwrap();
    engine.attach(id, Health::new(hp)).unwrap();
    id
}

fn spawn_enemy(engine: &mut SimulationEngine, at: Position, health: Health) -> EntityId {
    let id = engine.create_entity();
    engine.attach(id, at).unwrap();
    engine.attach(id, health).unwrap();
    engine.attach(id, Enemy::default()).unwrap();
    id
}

fn spawn_tower(engine: &mut SimulationEngine, at: Position, stats: TowerStats) -> EntityId {
    let id = engine.create_entity();
    engine.attach(id, at).unwrap();
    engine.attach(id, stats).unwrap();
    id
}

fn hp(engine: &SimulationEngine, id: EntityId) -> f64 {
    engine.world().get::<Health>(id).unwrap().current
}

fn ai_state(engine: &SimulationEngine, id: EntityId) -> AiState {
    engine.world().get::<AiBehavior>(id).unwrap().current_state
}

fn scout() -> AiBehavior {
    AiBehavior {
        detection_range: 100.0,
        attack_range: 10.0,
        patrol_speed: 2.0,
        chase_speed: 4.0,
        flee_speed: 3.0,
        ..AiBehavior::default()
    }
}

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "{what}: expected {expected}, got {actual}"
    );
}

/// A small brawl with randomness in play: crits and idle patrol rolls.
fn skirmish(seed: u64) -> SimulationEngine {
    let mut engine = SimulationEngine::new(SimConfig {
        seed,
        ..SimConfig::default()
    });
    for i in 0..4 {
        let id = spawn_unit(
            &mut engine,
            Team::Invaders,
            Position::new(i as f64 * 15.0, 0.0),
            AiBehavior {
                state_timer: 0.0,
                patrol_points: vec![Position::new(0.0, 0.0), Position::new(0.0, 50.0)],
                ..scout()
            },
        );
        engine
            .attach(
                id,
                Damage {
                    melee_damage: Some(3.0),
                    critical_chance: 0.5,
                    critical_multiplier: 2.0,
                    ..Damage::default()
                },
            )
            .unwrap();
    }
    for i in 0..3 {
        let id = spawn_dummy(
            &mut engine,
            Team::Defenders,
            Position::new(i as f64 * 20.0, 40.0),
            200.0,
        );
        engine
            .attach(
                id,
                Damage {
                    ranged_damage: Some(4.0),
                    ranged_range: Some(80.0),
                    ranged_cooldown_max: Some(0.5),
                    critical_chance: 0.3,
                    critical_multiplier: 1.5,
                    ..Damage::default()
                },
            )
            .unwrap();
    }
    engine
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let mut engine_a = skirmish(12345);
    let mut engine_b = skirmish(12345);

    for _ in 0..200 {
        engine_a.advance(DT);
        engine_b.advance(DT);

        let json_a = serde_json::to_string(&engine_a.snapshot()).unwrap();
        let json_b = serde_json::to_string(&engine_b.snapshot()).unwrap();
        assert_eq!(json_a, json_b, "Snapshots diverged with same seed");

        let events_a = serde_json::to_string(&engine_a.drain_events()).unwrap();
        let events_b = serde_json::to_string(&engine_b.drain_events()).unwrap();
        assert_eq!(events_a, events_b, "Events diverged with same seed");
    }
}

#[test]
fn test_determinism_different_seeds() {
    let mut engine_a = skirmish(111);
    let mut engine_b = skirmish(222);

    let mut diverged = false;
    for _ in 0..200 {
        engine_a.advance(DT);
        engine_b.advance(DT);
        let events_a = serde_json::to_string(&engine_a.drain_events()).unwrap();
        let events_b = serde_json::to_string(&engine_b.drain_events()).unwrap();
        if events_a != events_b {
            diverged = true;
            break;
        }
    }
    assert!(diverged, "Different seeds should produce divergent critical rolls");
}

// ---- Scheduler ----

struct Probe {
    name: &'static str,
    priority: i32,
    required: KindSet,
    log: Rc<RefCell<Vec<(&'static str, Vec<EntityId>)>>>,
}

impl System for Probe {
    fn name(&self) -> &'static str {
        self.name
    }

    fn required(&self) -> KindSet {
        self.required
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn update(&mut self, _world: &mut World, _ctx: &mut TickContext<'_>, entities: &[EntityId]) {
        self.log.borrow_mut().push((self.name, entities.to_vec()));
    }
}

/// Removes one entity and spawns a replacement mid-tick.
struct Churn {
    victim: EntityId,
    spawned: Rc<RefCell<Option<EntityId>>>,
}

impl System for Churn {
    fn name(&self) -> &'static str {
        "churn"
    }

    fn required(&self) -> KindSet {
        KindSet::EMPTY
    }

    fn priority(&self) -> i32 {
        1
    }

    fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>, _entities: &[EntityId]) {
        let _ = world.remove(self.victim);
        let fresh = world.create_entity();
        let _ = world.attach(fresh, Position::new(1.0, 1.0));
        *self.spawned.borrow_mut() = Some(fresh);
    }
}

#[test]
fn test_default_system_order() {
    assert_eq!(
        engine().system_order(),
        vec!["ai_behavior", "movement", "combat", "tower_targeting", "resources"]
    );
}

#[test]
fn test_priority_ties_keep_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let probe = |name, priority| -> Box<dyn System> {
        Box::new(Probe {
            name,
            priority,
            required: KindSet::EMPTY,
            log: Rc::clone(&log),
        })
    };

    let mut scheduler = Scheduler::new();
    scheduler.add(probe("late", 9));
    scheduler.add(probe("first_tie", 5));
    scheduler.add(probe("second_tie", 5));
    scheduler.add(probe("early", -3));
    assert_eq!(
        scheduler.order(),
        vec!["early", "first_tie", "second_tie", "late"]
    );

    let mut engine = SimulationEngine::with_systems(
        SimConfig::default(),
        vec![probe("b", 2), probe("a", 1), probe("c", 2)],
    );
    engine.advance(DT);
    let ran: Vec<_> = log.borrow().iter().map(|(name, _)| *name).collect();
    assert_eq!(ran, vec!["a", "b", "c"]);
}

#[test]
fn test_mid_tick_changes_visible_to_later_systems() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let spawned = Rc::new(RefCell::new(None));

    let mut engine = SimulationEngine::with_systems(SimConfig::default(), Vec::new());
    let victim = engine.create_entity();
    engine.attach(victim, Position::new(0.0, 0.0)).unwrap();
    let survivor = engine.create_entity();
    engine.attach(survivor, Position::new(2.0, 0.0)).unwrap();

    let positioned = KindSet::of(&[ComponentKind::Position]);
    engine.add_system(Box::new(Probe {
        name: "before",
        priority: 0,
        required: positioned,
        log: Rc::clone(&log),
    }));
    engine.add_system(Box::new(Churn {
        victim,
        spawned: Rc::clone(&spawned),
    }));
    engine.add_system(Box::new(Probe {
        name: "after",
        priority: 2,
        required: positioned,
        log: Rc::clone(&log),
    }));

    engine.advance(DT);

    let fresh = spawned.borrow().expect("churn ran");
    let log = log.borrow();
    assert_eq!(log[0], ("before", vec![victim, survivor]));
    assert_eq!(log.len(), 2);
    assert_eq!(
        log[1],
        ("after", vec![survivor, fresh]),
        "removed entity excluded, new entity included"
    );
}

// ---- AI behavior ----

#[test]
fn test_idle_detects_hostile_and_chases() {
    let mut engine = engine();
    let unit = spawn_unit(&mut engine, Team::Invaders, Position::new(0.0, 0.0), scout());
    let hostile = spawn_dummy(&mut engine, Team::Defenders, Position::new(50.0, 0.0), 100.0);

    engine.advance(DT);

    assert_eq!(ai_state(&engine, unit), AiState::Chase);
    let ai = engine.world().get::<AiBehavior>(unit).unwrap();
    assert_eq!(ai.previous_state, AiState::Idle);
    assert_close(ai.state_timer, 5.0, "timer reset to configured duration");

    let velocity = engine.world().get::<Velocity>(unit).unwrap();
    assert_close(velocity.dx, 4.0, "chase speed toward hostile");
    assert_close(velocity.dy, 0.0, "no lateral drift");

    let batch = engine.drain_events();
    assert!(batch.events.contains(&SimEvent::StateChanged {
        id: unit,
        from: AiState::Idle,
        to: AiState::Chase,
    }));
    assert!(engine.world().is_live(hostile));
}

#[test]
fn test_idle_ignores_hostile_out_of_detection() {
    let mut engine = engine();
    let unit = spawn_unit(&mut engine, Team::Invaders, Position::new(0.0, 0.0), scout());
    spawn_dummy(&mut engine, Team::Defenders, Position::new(150.0, 0.0), 100.0);

    engine.advance(DT);
    assert_eq!(ai_state(&engine, unit), AiState::Idle);
    assert_eq!(*engine.world().get::<Velocity>(unit).unwrap(), Velocity::ZERO);
}

#[test]
fn test_idle_patrol_roll_follows_configured_chance() {
    let mut always = SimulationEngine::new(SimConfig {
        ai: bastion_core::config::AiTuning {
            idle_patrol_chance: 1.0,
            ..Default::default()
        },
        ..SimConfig::default()
    });
    let ready = AiBehavior {
        state_timer: 0.0,
        patrol_points: vec![Position::new(100.0, 0.0)],
        ..scout()
    };
    let unit = spawn_unit(&mut always, Team::Invaders, Position::new(0.0, 0.0), ready.clone());
    always.advance(DT);
    assert_eq!(ai_state(&always, unit), AiState::Patrol);

    let mut never = SimulationEngine::new(SimConfig {
        ai: bastion_core::config::AiTuning {
            idle_patrol_chance: 0.0,
            ..Default::default()
        },
        ..SimConfig::default()
    });
    let unit = spawn_unit(&mut never, Team::Invaders, Position::new(0.0, 0.0), ready);
    for _ in 0..50 {
        never.advance(DT);
    }
    assert_eq!(ai_state(&never, unit), AiState::Idle);
}

#[test]
fn test_patrol_advances_waypoint_cyclically() {
    let mut engine = engine();
    let unit = spawn_unit(
        &mut engine,
        Team::Invaders,
        Position::new(5.0, 0.0),
        AiBehavior {
            current_state: AiState::Patrol,
            patrol_points: vec![Position::new(0.0, 0.0), Position::new(100.0, 0.0)],
            ..scout()
        },
    );

    engine.advance(DT);

    let ai = engine.world().get::<AiBehavior>(unit).unwrap();
    assert_eq!(ai.current_state, AiState::Patrol);
    assert_eq!(ai.current_patrol_index, 1);
    let velocity = *engine.world().get::<Velocity>(unit).unwrap();
    assert_close(velocity.dx, 2.0, "patrol speed toward next waypoint");
    let position = *engine.world().get::<Position>(unit).unwrap();
    assert_close(position.x, 5.2, "moved the same tick");

    engine
        .world_mut()
        .get_mut::<Position>(unit)
        .unwrap()
        .x = 99.0;
    engine.advance(DT);
    assert_eq!(
        engine.world().get::<AiBehavior>(unit).unwrap().current_patrol_index,
        0,
        "wraps back to the first waypoint"
    );
}

#[test]
fn test_chase_to_attack_raises_is_attacking() {
    let mut engine = engine();
    let unit = spawn_unit(
        &mut engine,
        Team::Invaders,
        Position::new(0.0, 0.0),
        AiBehavior {
            current_state: AiState::Chase,
            ..scout()
        },
    );
    spawn_dummy(&mut engine, Team::Defenders, Position::new(8.0, 0.0), 100.0);

    engine.advance(DT);

    let ai = engine.world().get::<AiBehavior>(unit).unwrap();
    assert_eq!(ai.current_state, AiState::Attack);
    assert!(ai.is_attacking);
    assert_eq!(*engine.world().get::<Velocity>(unit).unwrap(), Velocity::ZERO);
}

#[test]
fn test_chase_gives_up_past_leash() {
    let mut engine = engine();
    let unit = spawn_unit(
        &mut engine,
        Team::Invaders,
        Position::new(0.0, 0.0),
        AiBehavior {
            current_state: AiState::Chase,
            ..scout()
        },
    );
    spawn_dummy(&mut engine, Team::Defenders, Position::new(160.0, 0.0), 100.0);

    engine.advance(DT);
    assert_eq!(ai_state(&engine, unit), AiState::Idle);
}

#[test]
fn test_wounded_attacker_flees() {
    let mut engine = engine();
    let unit = spawn_unit(
        &mut engine,
        Team::Invaders,
        Position::new(0.0, 0.0),
        AiBehavior {
            current_state: AiState::Attack,
            flee_threshold: 0.3,
            ..scout()
        },
    );
    engine.world_mut().get_mut::<Health>(unit).unwrap().current = 20.0;
    spawn_dummy(&mut engine, Team::Defenders, Position::new(5.0, 0.0), 100.0);

    engine.advance(DT);

    let ai = engine.world().get::<AiBehavior>(unit).unwrap();
    assert_eq!(ai.current_state, AiState::Flee);
    assert!(!ai.is_attacking);
    let velocity = *engine.world().get::<Velocity>(unit).unwrap();
    assert_close(velocity.dx, -3.0, "flee speed away from hostile");
}

#[test]
fn test_attack_without_hostile_goes_idle() {
    let mut engine = engine();
    let unit = spawn_unit(
        &mut engine,
        Team::Invaders,
        Position::new(0.0, 0.0),
        AiBehavior {
            current_state: AiState::Attack,
            is_attacking: true,
            ..scout()
        },
    );

    engine.advance(DT);
    let ai = engine.world().get::<AiBehavior>(unit).unwrap();
    assert_eq!(ai.current_state, AiState::Idle);
    assert!(!ai.is_attacking);
}

// ---- Combat ----

#[test]
fn test_melee_hits_every_hostile_in_reach() {
    let mut engine = engine();
    let unit = spawn_unit(
        &mut engine,
        Team::Invaders,
        Position::new(0.0, 0.0),
        AiBehavior {
            current_state: AiState::Attack,
            ..scout()
        },
    );
    engine
        .attach(
            unit,
            Damage {
                melee_damage: Some(4.0),
                ..Damage::default()
            },
        )
        .unwrap();
    let near = spawn_dummy(&mut engine, Team::Defenders, Position::new(5.0, 0.0), 50.0);
    let edge = spawn_dummy(&mut engine, Team::Defenders, Position::new(0.0, 8.0), 50.0);
    let far = spawn_dummy(&mut engine, Team::Defenders, Position::new(20.0, 0.0), 50.0);
    let friend = spawn_dummy(&mut engine, Team::Invaders, Position::new(1.0, 0.0), 50.0);

    engine.advance(DT);

    assert_eq!(hp(&engine, near), 46.0);
    assert_eq!(hp(&engine, edge), 46.0);
    assert_eq!(hp(&engine, far), 50.0, "out of melee reach");
    assert_eq!(hp(&engine, friend), 50.0, "no friendly fire");
}

#[test]
fn test_melee_cooldown_paces_strikes() {
    let mut engine = engine();
    let unit = spawn_unit(
        &mut engine,
        Team::Invaders,
        Position::new(0.0, 0.0),
        AiBehavior {
            current_state: AiState::Attack,
            ..scout()
        },
    );
    engine
        .attach(
            unit,
            Damage {
                melee_damage: Some(1.0),
                melee_cooldown: Some(0.0),
                melee_cooldown_max: Some(0.5),
                ..Damage::default()
            },
        )
        .unwrap();
    let target = spawn_dummy(&mut engine, Team::Defenders, Position::new(5.0, 0.0), 50.0);

    for _ in 0..5 {
        engine.advance(DT);
    }
    // Strikes on ticks 1 and 6 only; five ticks in, one landed.
    assert_eq!(hp(&engine, target), 49.0);
    engine.advance(DT);
    assert_eq!(hp(&engine, target), 48.0);
}

#[test]
fn test_ranged_fires_on_cooldown() {
    let mut engine = engine();
    let archer = spawn_dummy(&mut engine, Team::Defenders, Position::new(0.0, 0.0), 50.0);
    engine
        .attach(
            archer,
            Damage {
                ranged_damage: Some(5.0),
                ranged_range: Some(50.0),
                ranged_cooldown_max: Some(1.0),
                ..Damage::default()
            },
        )
        .unwrap();
    let target = spawn_dummy(&mut engine, Team::Invaders, Position::new(30.0, 0.0), 20.0);
    let _out_of_range = spawn_dummy(&mut engine, Team::Invaders, Position::new(80.0, 0.0), 20.0);

    engine.advance(0.25);
    assert_eq!(hp(&engine, target), 15.0);
    for _ in 0..3 {
        engine.advance(0.25);
        assert_eq!(hp(&engine, target), 15.0, "still cooling down");
    }
    engine.advance(0.25);
    assert_eq!(hp(&engine, target), 10.0);
}

#[test]
fn test_ranged_splash_and_chain() {
    let mut engine = engine();
    let archer = spawn_dummy(&mut engine, Team::Defenders, Position::new(0.0, 0.0), 50.0);
    engine
        .attach(
            archer,
            Damage {
                ranged_damage: Some(10.0),
                ranged_range: Some(40.0),
                ranged_cooldown_max: Some(10.0),
                area_damage: Some(2.0),
                area_range: Some(5.0),
                ..Damage::default()
            },
        )
        .unwrap();
    let primary = spawn_dummy(&mut engine, Team::Invaders, Position::new(30.0, 0.0), 100.0);
    let splashed = spawn_dummy(&mut engine, Team::Invaders, Position::new(33.0, 0.0), 100.0);
    let clear = spawn_dummy(&mut engine, Team::Invaders, Position::new(45.0, 0.0), 100.0);

    engine.advance(DT);
    assert_eq!(hp(&engine, primary), 90.0);
    assert_eq!(hp(&engine, splashed), 98.0);
    assert_eq!(hp(&engine, clear), 100.0);

    let mut engine = self::engine();
    let archer = spawn_dummy(&mut engine, Team::Defenders, Position::new(0.0, 0.0), 50.0);
    engine
        .attach(
            archer,
            Damage {
                ranged_damage: Some(10.0),
                ranged_range: Some(40.0),
                ranged_cooldown_max: Some(10.0),
                chain_count: Some(1),
                chain_range: Some(15.0),
                ..Damage::default()
            },
        )
        .unwrap();
    let primary = spawn_dummy(&mut engine, Team::Invaders, Position::new(30.0, 0.0), 100.0);
    let hop = spawn_dummy(&mut engine, Team::Invaders, Position::new(40.0, 0.0), 100.0);
    let beyond = spawn_dummy(&mut engine, Team::Invaders, Position::new(50.0, 0.0), 100.0);

    engine.advance(DT);
    assert_eq!(hp(&engine, primary), 90.0);
    assert_eq!(hp(&engine, hop), 90.0);
    assert_eq!(hp(&engine, beyond), 100.0, "one extra hop only");
}

#[test]
fn test_regen_clamped_to_max() {
    let mut engine = engine();
    let id = engine.create_entity();
    engine
        .attach(
            id,
            Health {
                current: 99.5,
                regen_per_second: Some(10.0),
                ..Health::new(100.0)
            },
        )
        .unwrap();

    engine.advance(DT);
    assert_eq!(hp(&engine, id), 100.0);
}

#[test]
fn test_invulnerability_timer_counts_down() {
    let mut engine = engine();
    let id = engine.create_entity();
    engine
        .attach(
            id,
            Health {
                invulnerability_timer: 0.15,
                ..Health::new(100.0)
            },
        )
        .unwrap();

    engine.advance(DT);
    assert_close(
        engine.world().get::<Health>(id).unwrap().invulnerability_timer,
        0.05,
        "first tick",
    );
    engine.advance(DT);
    assert_eq!(
        engine.world().get::<Health>(id).unwrap().invulnerability_timer,
        0.0,
        "never below zero"
    );
}

#[test]
fn test_health_stays_in_bounds_every_tick() {
    let mut engine = skirmish(9);
    for _ in 0..300 {
        engine.advance(DT);
        for id in engine.query(KindSet::of(&[ComponentKind::Health])) {
            let health = engine.world().get::<Health>(id).unwrap();
            assert!(
                health.current >= 0.0 && health.current <= health.max,
                "health out of bounds for {id}: {}",
                health.current
            );
        }
    }
}

#[test]
fn test_death_marked_same_tick_and_removed_after_delay() {
    let mut engine = engine();
    let doomed = engine.create_entity();
    engine
        .attach(
            doomed,
            Health {
                current: 0.0,
                death_delay: 1.0,
                ..Health::new(100.0)
            },
        )
        .unwrap();

    engine.advance(0.25);
    assert!(engine.world().get::<Health>(doomed).unwrap().is_dead);
    assert!(engine.world().is_live(doomed));
    let batch = engine.drain_events();
    assert!(batch
        .events
        .contains(&SimEvent::EntityDied { id: doomed, killer: None }));

    for step in 0..3 {
        engine.advance(0.25);
        assert!(
            engine.world().is_live(doomed),
            "removed early after {} extra ticks",
            step + 1
        );
    }
    engine.advance(0.25);
    assert!(!engine.world().is_live(doomed));
    assert!(engine.pending_removals().is_empty());
    assert!(engine
        .drain_events()
        .events
        .contains(&SimEvent::EntityRemoved { id: doomed }));
}

#[test]
fn test_zero_delay_death_removed_same_tick() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            damage: 50.0,
            range: 100.0,
            attack_rate: 10.0,
            ..TowerStats::default()
        },
    );
    let victim = spawn_enemy(&mut engine, Position::new(10.0, 0.0), Health::new(30.0));

    engine.advance(DT);

    assert!(!engine.world().is_live(victim));
    let stats = engine.world().get::<TowerStats>(tower).unwrap();
    assert_eq!(stats.kills, 1);
    assert_eq!(stats.total_damage_dealt, 30.0, "only damage actually applied");
    let events = engine.drain_events().events;
    assert!(events.contains(&SimEvent::EntityDied {
        id: victim,
        killer: Some(tower),
    }));
    assert!(events.contains(&SimEvent::EntityRemoved { id: victim }));
}

#[test]
fn test_dead_units_do_not_move() {
    let mut engine = engine();
    let id = engine.create_entity();
    engine.attach(id, Position::new(0.0, 0.0)).unwrap();
    engine.attach(id, Velocity::new(5.0, 0.0)).unwrap();
    engine
        .attach(
            id,
            Health {
                is_dead: true,
                death_delay: 10.0,
                ..Health::new(10.0)
            },
        )
        .unwrap();

    engine.advance(DT);
    assert_eq!(
        *engine.world().get::<Position>(id).unwrap(),
        Position::new(0.0, 0.0)
    );
}

// ---- Tower targeting ----

fn basic_tower() -> TowerStats {
    TowerStats {
        damage: 10.0,
        range: 100.0,
        attack_rate: 1.0,
        ..TowerStats::default()
    }
}

#[test]
fn test_tower_prefers_low_health_at_equal_distance() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            targeting: TargetingPreferences {
                target_low_health: true,
                ..Default::default()
            },
            ..basic_tower()
        },
    );
    let healthy = spawn_enemy(
        &mut engine,
        Position::new(0.0, 50.0),
        Health {
            current: 80.0,
            ..Health::new(100.0)
        },
    );
    let wounded = spawn_enemy(
        &mut engine,
        Position::new(50.0, 0.0),
        Health {
            current: 30.0,
            ..Health::new(100.0)
        },
    );

    engine.advance(DT);

    assert_eq!(hp(&engine, wounded), 20.0);
    assert_eq!(hp(&engine, healthy), 80.0);
    assert!(engine.drain_events().events.contains(&SimEvent::TowerFired {
        tower,
        target: wounded,
        damage: 10.0,
    }));
    assert_close(
        engine.world().get::<TowerStats>(tower).unwrap().attack_cooldown,
        1.0,
        "cooldown reset to attack rate",
    );
}

#[test]
fn test_tower_prioritizes_bosses() {
    let mut engine = engine();
    spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            targeting: TargetingPreferences {
                prefer_closer: true,
                prioritize_bosses: true,
                ..Default::default()
            },
            ..basic_tower()
        },
    );
    let grunt = spawn_enemy(&mut engine, Position::new(10.0, 0.0), Health::new(100.0));
    let boss = spawn_enemy(&mut engine, Position::new(90.0, 0.0), Health::new(100.0));
    engine.attach(boss, Boss).unwrap();

    engine.advance(DT);
    assert_eq!(hp(&engine, boss), 90.0);
    assert_eq!(hp(&engine, grunt), 100.0);
}

#[test]
fn test_tower_without_candidate_holds_fire() {
    let mut engine = engine();
    let tower = spawn_tower(&mut engine, Position::new(0.0, 0.0), basic_tower());
    let far = spawn_enemy(&mut engine, Position::new(150.0, 0.0), Health::new(100.0));
    // Not an enemy: no marker.
    let bystander = engine.create_entity();
    engine.attach(bystander, Position::new(5.0, 0.0)).unwrap();
    engine.attach(bystander, Health::new(100.0)).unwrap();

    engine.advance(DT);

    assert_eq!(hp(&engine, far), 100.0);
    assert_eq!(hp(&engine, bystander), 100.0);
    assert_eq!(
        engine.world().get::<TowerStats>(tower).unwrap().attack_cooldown,
        0.0,
        "cooldown stays ready"
    );
    assert!(engine.drain_events().is_empty());
}

#[test]
fn test_tower_projectile_delivery_emits_intent() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(1.0, 2.0),
        TowerStats {
            delivery: Delivery::Projectile { speed: 300.0 },
            damage_type: DamageType::Fire,
            ..basic_tower()
        },
    );
    let target = spawn_enemy(&mut engine, Position::new(20.0, 2.0), Health::new(100.0));

    engine.advance(DT);

    assert_eq!(hp(&engine, target), 100.0, "impact is the host's job");
    let batch = engine.drain_events();
    assert_eq!(batch.projectiles.len(), 1);
    let intent = batch.projectiles[0];
    assert_eq!(intent.source, tower);
    assert_eq!(intent.target, target);
    assert_eq!(intent.origin, Position::new(1.0, 2.0));
    assert_eq!(intent.profile.amount, 10.0);
    assert_eq!(intent.profile.damage_type, DamageType::Fire);
}

#[test]
fn test_chain_lightning_stops_at_enemy_out_of_reach() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            targeting: TargetingPreferences {
                prefer_closer: true,
                ..Default::default()
            },
            special_ability: Some(SpecialAbility::ChainLightning),
            special_damage: Some(5.0),
            special_cooldown_max: 4.0,
            chain_count: Some(3),
            chain_range: Some(30.0),
            ..basic_tower()
        },
    );
    let a = spawn_enemy(&mut engine, Position::new(50.0, 0.0), Health::new(100.0));
    let b = spawn_enemy(&mut engine, Position::new(70.0, 0.0), Health::new(100.0));
    let c = spawn_enemy(&mut engine, Position::new(90.0, 0.0), Health::new(100.0));
    let d = spawn_enemy(&mut engine, Position::new(125.0, 0.0), Health::new(100.0));

    engine.advance(DT);

    assert_eq!(hp(&engine, a), 85.0, "primary shot plus chain");
    assert_eq!(hp(&engine, b), 95.0);
    assert_eq!(hp(&engine, c), 95.0);
    assert_eq!(hp(&engine, d), 100.0, "fourth enemy out of chain range");

    let events = engine.drain_events().events;
    assert!(events.contains(&SimEvent::SpecialTriggered {
        tower,
        ability: SpecialAbility::ChainLightning,
        targets: vec![a, b, c],
    }));
    assert_close(
        engine.world().get::<TowerStats>(tower).unwrap().special_cooldown,
        4.0,
        "special cooldown reset",
    );
}

#[test]
fn test_chain_lightning_hop_limit_caps_chain() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            range: 150.0,
            targeting: TargetingPreferences {
                prefer_closer: true,
                ..Default::default()
            },
            special_ability: Some(SpecialAbility::ChainLightning),
            special_damage: Some(5.0),
            chain_count: Some(3),
            chain_range: Some(30.0),
            ..basic_tower()
        },
    );
    // Every enemy is within chain range of the previous one.
    let line: Vec<EntityId> = (0..5)
        .map(|i| {
            spawn_enemy(
                &mut engine,
                Position::new(50.0 + i as f64 * 20.0, 0.0),
                Health::new(100.0),
            )
        })
        .collect();

    engine.advance(DT);

    assert_eq!(hp(&engine, line[0]), 85.0, "primary shot plus chain");
    for &hopped in &line[1..4] {
        assert_eq!(hp(&engine, hopped), 95.0);
    }
    assert_eq!(hp(&engine, line[4]), 100.0, "three hops used up");
    assert!(engine.drain_events().events.contains(&SimEvent::SpecialTriggered {
        tower,
        ability: SpecialAbility::ChainLightning,
        targets: line[..4].to_vec(),
    }));
}

#[test]
fn test_chain_lightning_default_is_one_hop() {
    let mut engine = engine();
    spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            attack_cooldown: 100.0,
            targeting: TargetingPreferences {
                prefer_closer: true,
                ..Default::default()
            },
            special_ability: Some(SpecialAbility::ChainLightning),
            special_damage: Some(5.0),
            chain_range: Some(30.0),
            ..basic_tower()
        },
    );
    let a = spawn_enemy(&mut engine, Position::new(50.0, 0.0), Health::new(100.0));
    let b = spawn_enemy(&mut engine, Position::new(60.0, 0.0), Health::new(100.0));
    let c = spawn_enemy(&mut engine, Position::new(70.0, 0.0), Health::new(100.0));

    engine.advance(DT);

    assert_eq!(hp(&engine, a), 95.0);
    assert_eq!(hp(&engine, b), 95.0);
    assert_eq!(hp(&engine, c), 100.0);
}

#[test]
fn test_chain_lightning_stops_when_nobody_in_reach() {
    let mut engine = engine();
    spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            attack_cooldown: 100.0,
            targeting: TargetingPreferences {
                prefer_closer: true,
                ..Default::default()
            },
            special_ability: Some(SpecialAbility::ChainLightning),
            chain_count: Some(5),
            chain_range: Some(30.0),
            ..basic_tower()
        },
    );
    let a = spawn_enemy(&mut engine, Position::new(50.0, 0.0), Health::new(100.0));
    let b = spawn_enemy(&mut engine, Position::new(70.0, 0.0), Health::new(100.0));
    let c = spawn_enemy(&mut engine, Position::new(95.0, 0.0), Health::new(100.0));
    let d = spawn_enemy(&mut engine, Position::new(130.0, 0.0), Health::new(100.0));

    engine.advance(DT);

    // Fallback chain damage is 70% of tower damage.
    assert_close(hp(&engine, a), 93.0, "primary");
    assert_close(hp(&engine, b), 93.0, "first hop");
    assert_close(hp(&engine, c), 93.0, "second hop");
    assert_eq!(hp(&engine, d), 100.0, "gap of 35 breaks the chain");
}

#[test]
fn test_area_special_uses_fallback_damage() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            attack_cooldown: 100.0,
            special_ability: Some(SpecialAbility::AreaDamage),
            special_range: Some(40.0),
            special_cooldown_max: 3.0,
            ..basic_tower()
        },
    );
    let inner = spawn_enemy(&mut engine, Position::new(20.0, 0.0), Health::new(100.0));
    let rim = spawn_enemy(&mut engine, Position::new(0.0, 35.0), Health::new(100.0));
    let outside = spawn_enemy(&mut engine, Position::new(60.0, 0.0), Health::new(100.0));

    engine.advance(DT);

    assert_eq!(hp(&engine, inner), 95.0);
    assert_eq!(hp(&engine, rim), 95.0);
    assert_eq!(hp(&engine, outside), 100.0);
    let stats = engine.world().get::<TowerStats>(tower).unwrap();
    assert_close(stats.special_cooldown, 3.0, "special cooldown reset");
    assert_eq!(stats.total_damage_dealt, 10.0);

    engine.advance(DT);
    assert_eq!(hp(&engine, inner), 95.0, "special waits for its cooldown");
}

#[test]
fn test_slow_special_emits_status_intents() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            attack_cooldown: 100.0,
            special_ability: Some(SpecialAbility::Slow),
            special_damage: Some(0.4),
            special_range: Some(30.0),
            ..basic_tower()
        },
    );
    let slowed = spawn_enemy(&mut engine, Position::new(10.0, 0.0), Health::new(100.0));
    let _spared = spawn_enemy(&mut engine, Position::new(80.0, 0.0), Health::new(100.0));

    engine.advance(DT);

    let batch = engine.drain_events();
    assert_eq!(batch.statuses.len(), 1);
    assert_eq!(batch.statuses[0].source, tower);
    assert_eq!(batch.statuses[0].target, slowed);
    assert_eq!(batch.statuses[0].effect, StatusEffect::Slow);
    assert_eq!(batch.statuses[0].magnitude, 0.4);
    assert_eq!(hp(&engine, slowed), 100.0, "status only, no damage");
}

#[test]
fn test_tower_boost_multiplies_then_expires() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            attack_rate: 0.1,
            ..basic_tower()
        },
    );
    let target = spawn_enemy(&mut engine, Position::new(10.0, 0.0), Health::new(1_000.0));
    engine.boost_tower(tower, 2.0, 0.3).unwrap();

    engine.advance(DT);
    assert_eq!(hp(&engine, target), 980.0);

    for _ in 0..4 {
        engine.advance(DT);
    }
    assert!(engine
        .world()
        .get::<TowerStats>(tower)
        .unwrap()
        .damage_boost
        .is_none());
    let before = hp(&engine, target);
    engine.advance(DT);
    assert_close(before - hp(&engine, target), 10.0, "unboosted shot");

    assert!(engine.boost_tower(target, 2.0, 1.0).is_err(), "not a tower");
}

// ---- Resources ----

fn gold_mine() -> Resource {
    Resource {
        resource_type: ResourceType::Gold,
        amount: 30.0,
        max_amount: 30.0,
        collection_timer: 0.0,
        collection_interval: 1.0,
        respawn_timer: 0.0,
        respawn_time: 2.0,
        quality: 0.5,
        is_depleted: false,
        yield_boost: None,
    }
}

#[test]
fn test_resource_collect_deplete_and_respawn() {
    let mut engine = engine();
    let mine = engine.create_entity();
    engine.attach(mine, gold_mine()).unwrap();

    let harvest = engine.collect_resource(mine, 20.0).unwrap();
    assert_eq!(harvest.taken, 20.0);
    assert_eq!(harvest.credited, 10.0, "scaled by quality");
    assert!(!harvest.depleted);
    assert_eq!(engine.stockpile().balance(ResourceType::Gold), 10.0);

    assert!(engine.collect_resource(mine, 5.0).is_none(), "on interval");
    engine.advance(0.5);
    engine.advance(0.5);

    let harvest = engine.collect_resource(mine, 20.0).unwrap();
    assert_eq!(harvest.taken, 10.0);
    assert!(harvest.depleted);
    assert!(engine.drain_events().events.contains(&SimEvent::ResourceDepleted {
        id: mine,
        resource_type: ResourceType::Gold,
    }));

    for _ in 0..3 {
        engine.advance(0.5);
        assert!(engine.world().get::<Resource>(mine).unwrap().is_depleted);
    }
    engine.advance(0.5);
    let node = engine.world().get::<Resource>(mine).unwrap();
    assert!(!node.is_depleted);
    assert_eq!(node.amount, 30.0);
    assert!(engine
        .drain_events()
        .events
        .contains(&SimEvent::ResourceRespawned {
            id: mine,
            resource_type: ResourceType::Gold,
        }));
}

#[test]
fn test_resource_yield_boost() {
    let mut engine = engine();
    let mine = engine.create_entity();
    engine.attach(mine, gold_mine()).unwrap();
    engine.boost_resource(mine, 3.0, 0.2).unwrap();

    let harvest = engine.collect_resource(mine, 4.0).unwrap();
    assert_eq!(harvest.credited, 6.0, "4 x 0.5 quality x 3 boost");

    engine.advance(DT);
    engine.advance(DT);
    assert!(engine.world().get::<Resource>(mine).unwrap().yield_boost.is_none());
}

// ---- Engine surface ----

#[test]
fn test_snapshot_lists_drawable_entities() {
    let mut engine = engine();
    let unit = spawn_unit(&mut engine, Team::Invaders, Position::new(3.0, 4.0), scout());
    engine
        .attach(
            unit,
            Sprite {
                key: "goblin".into(),
                layer: 2,
            },
        )
        .unwrap();
    let _hidden = spawn_dummy(&mut engine, Team::Defenders, Position::new(500.0, 0.0), 10.0);

    engine.advance(DT);
    let snapshot = engine.snapshot();

    assert_eq!(snapshot.time.tick, 1);
    assert_eq!(snapshot.entities.len(), 1);
    let view = &snapshot.entities[0];
    assert_eq!(view.id, unit);
    assert_eq!(view.sprite, "goblin");
    assert_eq!(view.layer, 2);
    assert_eq!(view.health, Some(1.0));
    assert_eq!(view.ai_state, Some(AiState::Idle));
    assert!(!view.is_dead);
}

#[test]
fn test_invalid_delta_is_clamped() {
    let mut engine = engine();
    let id = engine.create_entity();
    engine.attach(id, Position::new(0.0, 0.0)).unwrap();
    engine.attach(id, Velocity::new(1.0, 0.0)).unwrap();

    engine.advance(f64::NAN);
    engine.advance(-1.0);

    assert_eq!(engine.time().elapsed_secs, 0.0);
    assert_eq!(engine.time().tick, 2);
    assert_eq!(
        *engine.world().get::<Position>(id).unwrap(),
        Position::new(0.0, 0.0)
    );
}

#[test]
fn test_operations_on_removed_entity_are_no_ops() {
    let mut engine = engine();
    let id = engine.create_entity();
    engine.remove(id).unwrap();

    assert!(engine.attach(id, Position::new(0.0, 0.0)).is_err());
    assert!(engine.remove(id).is_err());
    assert!(engine.collect_resource(id, 1.0).is_none());
    assert!(engine.boost_resource(id, 2.0, 1.0).is_err());
    engine.advance(DT);
}

// ---- Tower death ----

fn tower_fired(events: &[SimEvent], tower: EntityId) -> bool {
    events.iter().any(|event| {
        matches!(event, SimEvent::TowerFired { tower: t, .. } if *t == tower)
            || matches!(event, SimEvent::SpecialTriggered { tower: t, .. } if *t == tower)
    })
}

fn area_tower() -> TowerStats {
    TowerStats {
        special_ability: Some(SpecialAbility::AreaDamage),
        special_damage: Some(5.0),
        special_cooldown_max: 1.0,
        ..basic_tower()
    }
}

#[test]
fn test_dead_tower_with_delay_holds_fire() {
    let mut engine = engine();
    let tower = spawn_tower(&mut engine, Position::new(0.0, 0.0), area_tower());
    engine
        .attach(
            tower,
            Health {
                current: 0.0,
                death_delay: 5.0,
                ..Health::new(100.0)
            },
        )
        .unwrap();
    let enemy = spawn_enemy(&mut engine, Position::new(10.0, 0.0), Health::new(100.0));

    for _ in 0..3 {
        engine.advance(DT);
        assert!(engine.world().is_live(tower), "still waiting out its delay");
        assert!(engine.world().get::<Health>(tower).unwrap().is_dead);
        assert_eq!(hp(&engine, enemy), 100.0);
        assert!(!tower_fired(&engine.drain_events().events, tower));
    }
}

#[test]
fn test_tower_killed_by_combat_holds_fire_same_tick() {
    let mut engine = engine();
    let tower = spawn_tower(&mut engine, Position::new(0.0, 0.0), area_tower());
    engine.attach(tower, Faction { team: Team::Defenders }).unwrap();
    engine
        .attach(
            tower,
            Health {
                death_delay: 2.0,
                ..Health::new(5.0)
            },
        )
        .unwrap();
    let raider = spawn_enemy(&mut engine, Position::new(10.0, 0.0), Health::new(100.0));
    engine.attach(raider, Faction { team: Team::Invaders }).unwrap();
    engine
        .attach(
            raider,
            Damage {
                ranged_damage: Some(10.0),
                ranged_range: Some(50.0),
                ranged_cooldown_max: Some(1.0),
                ..Damage::default()
            },
        )
        .unwrap();

    engine.advance(DT);

    assert!(engine.world().get::<Health>(tower).unwrap().is_dead);
    assert_eq!(hp(&engine, raider), 100.0, "combat runs before towers");
    let events = engine.drain_events().events;
    assert!(events.contains(&SimEvent::EntityDied {
        id: tower,
        killer: Some(raider),
    }));
    assert!(!tower_fired(&events, tower));
}

#[test]
fn test_tower_removed_between_ticks_with_special_pending() {
    let mut engine = engine();
    let tower = spawn_tower(
        &mut engine,
        Position::new(0.0, 0.0),
        TowerStats {
            special_cooldown_max: 3.0,
            ..area_tower()
        },
    );
    engine.attach(tower, Health::new(100.0)).unwrap();
    let enemy = spawn_enemy(&mut engine, Position::new(10.0, 0.0), Health::new(100.0));

    engine.advance(DT);
    // Primary 10 plus area 5.
    assert_eq!(hp(&engine, enemy), 85.0);
    assert!(engine.world().get::<TowerStats>(tower).unwrap().special_cooldown > 0.0);
    engine.drain_events();

    engine.remove(tower).unwrap();
    assert!(engine.remove(tower).is_err());
    for _ in 0..40 {
        engine.advance(DT);
    }

    assert!(!engine.world().is_live(tower));
    assert_eq!(hp(&engine, enemy), 85.0);
    let events = engine.drain_events().events;
    assert!(events.contains(&SimEvent::EntityRemoved { id: tower }));
    assert!(!tower_fired(&events, tower));
}
