//! Integration tests for full sessions driven through `Simulation::tick`.
//!
//! Covers the scripted scenarios (collection run, hunting pursuit, contact,
//! restore) and the randomized property sweeps. Sweeps draw their inputs
//! from `StdRng::seed_from_u64`, so every failure is reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use whisper_core::components::{BehaviorState, MovementMode, PlayerInput, Vec2};
use whisper_core::config::{SimConfig, WorldConfig};
use whisper_core::engine::{initialize_world, Simulation};
use whisper_core::events::{Outcome, SimEvent};
use whisper_core::persistence::SaveSnapshot;

const DT: f32 = 1.0 / 60.0;

// ── Helpers ────────────────────────────────────────────────────────────

fn new_sim() -> Simulation {
    Simulation::new(SimConfig::default()).unwrap()
}

fn idle() -> PlayerInput {
    PlayerInput::default()
}

fn random_input(rng: &mut StdRng) -> PlayerInput {
    PlayerInput {
        move_x: rng.gen_range(-1.5..1.5),
        move_y: rng.gen_range(-1.5..1.5),
        look_dx: rng.gen_range(-80.0..80.0),
        look_dy: rng.gen_range(-80.0..80.0),
        sprint: rng.gen_bool(0.6),
        toggle_crouch: rng.gen_bool(0.02),
        toggle_torch: rng.gen_bool(0.02),
    }
}

fn count_events(events: &[SimEvent], pred: impl Fn(&SimEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn collection_run_opens_gate_exactly_at_five() {
    let mut sim = new_sim();
    assert_eq!(sim.seed(), 1337);
    assert_eq!(sim.config().world.bounds, 250.0);
    assert_eq!(sim.progression().required(), 5);

    let targets: Vec<Vec2> = sim.layout().collectibles().map(|(_, c)| c.position).collect();
    assert_eq!(targets.len(), 5);

    let mut counts = Vec::new();
    for target in &targets {
        sim.place_player(*target);
        let report = sim.tick(DT, &idle());
        counts.push(report.collected_count);
        assert_eq!(report.gate_active, report.collected_count == 5);
        let opened = count_events(&report.events, |e| *e == SimEvent::GateActivated);
        assert_eq!(opened, usize::from(report.collected_count == 5));
    }
    assert_eq!(counts, vec![1, 2, 3, 4, 5]);
}

#[test]
fn hunting_adversary_closes_in_every_tick() {
    let mut sim = new_sim();
    let player = Vec2::new(100.0, 100.0);
    sim.place_player(player);
    sim.place_adversary(Vec2::new(100.0, 140.0), BehaviorState::Hunting);

    let engagement = sim.config().adversary.engagement_radius;
    let mut previous = sim.adversary().position.distance(&player);
    assert_eq!(previous, 40.0);

    let mut ticks = 0;
    while previous > engagement {
        sim.tick(DT, &idle());
        let distance = sim.adversary().position.distance(&sim.player().position);
        assert!(
            distance < previous,
            "tick {}: distance {} did not drop below {}",
            ticks,
            distance,
            previous
        );
        previous = distance;
        ticks += 1;
        assert!(ticks < 1000, "adversary never reached engagement radius");
    }
    assert_eq!(sim.player().position, player);
}

#[test]
fn adversary_at_arms_length_kills_in_one_tick() {
    let mut sim = new_sim();
    sim.place_player(Vec2::new(60.0, -40.0));
    sim.place_adversary(Vec2::new(61.0, -40.0), BehaviorState::Hunting);

    let report = sim.tick(DT, &idle());
    assert_eq!(report.outcome, Some(Outcome::Loss));
}

#[test]
fn restore_with_missing_stamina_defaults_to_full() {
    let snapshot = SaveSnapshot::from_json_str(
        r#"{ "collected": [0, 2], "player": { "x": 40.0, "z": 12.0, "sanity": 0.8 }, "seed": 1337 }"#,
    )
    .unwrap();

    let mut sim = new_sim();
    sim.tick(DT, &PlayerInput::moving(0.0, 1.0));
    let fresh = initialize_world(1337, &WorldConfig::default()).unwrap();
    let layout = sim.restore_state(&snapshot).unwrap();
    assert_eq!(layout.fingerprint(), fresh.fingerprint());

    assert_eq!(sim.player().stamina, 1.0);
    assert_eq!(sim.player().sanity, 0.8);
    assert_eq!(sim.progression().collected_indices(), vec![0, 2]);
    assert!(!sim.progression().gate_active());
    assert_eq!(sim.layout().visible_collectibles(), vec![1, 3, 4]);

    // Older saves spell the collected list `collectedIndices`.
    let legacy = SaveSnapshot::from_json_str(
        r#"{ "collectedIndices": [0, 2], "player": { "x": 40.0, "z": 12.0 }, "seed": 1337 }"#,
    )
    .unwrap();
    assert_eq!(legacy.collected, vec![0, 2]);
    let mut resumed = new_sim();
    resumed.restore_state(&legacy).unwrap();
    assert_eq!(resumed.progression().collected_indices(), vec![0, 2]);
    assert_eq!(resumed.layout().visible_collectibles(), vec![1, 3, 4]);
}

#[test]
fn player_reads_last_ticks_proximity() {
    let mut sim = new_sim();
    // Adversary sits still (Illusion) 10 units from where the player will be.
    sim.place_adversary(Vec2::new(100.0, 110.0), BehaviorState::Illusion);
    sim.place_player(Vec2::new(100.0, 100.0));

    let first = sim.tick(DT, &idle());
    assert_eq!(first.player.sanity, 1.0, "stale proximity was far away");
    assert!((first.adversary.proximity - 10.0).abs() < 1e-4);

    let second = sim.tick(DT, &idle());
    assert!(second.player.sanity < 1.0);
}

// ── Properties ─────────────────────────────────────────────────────────

#[test]
fn generation_is_deterministic_across_seeds() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let config = WorldConfig::default();
    for _ in 0..8 {
        let seed: u32 = rng.gen_range(1..u32::MAX);
        let a = initialize_world(seed, &config).unwrap();
        let b = initialize_world(seed, &config).unwrap();
        assert_eq!(a, b, "seed {}", seed);
    }
}

#[test]
fn recollecting_is_a_no_op() {
    let mut sim = new_sim();
    let target = sim.layout().collectible_position(0).unwrap();

    sim.place_player(target);
    let first = sim.tick(DT, &idle());
    assert_eq!(first.collected_count, 1);

    sim.place_player(Vec2::new(target.x + 20.0, target.z));
    sim.tick(DT, &idle());
    sim.place_player(target);
    let again = sim.tick(DT, &idle());
    assert_eq!(again.collected_count, 1);
    assert_eq!(
        count_events(&again.events, |e| matches!(e, SimEvent::Collected { .. })),
        0
    );
}

#[test]
fn gate_opens_once_and_never_closes() {
    let mut rng = StdRng::seed_from_u64(77);
    let mut sim = new_sim();
    let targets: Vec<Vec2> = sim.layout().collectibles().map(|(_, c)| c.position).collect();

    let mut was_active = false;
    let mut openings = 0;
    for _ in 0..40 {
        let target = targets[rng.gen_range(0..targets.len())];
        sim.place_player(target);
        let report = sim.tick(DT, &idle());
        if was_active {
            assert!(report.gate_active);
        }
        if report.gate_active {
            assert_eq!(report.collected_count, 5);
        }
        openings += count_events(&report.events, |e| *e == SimEvent::GateActivated);
        was_active = report.gate_active;
    }
    assert!(was_active);
    assert_eq!(openings, 1);
}

#[test]
fn resources_stay_in_unit_range() {
    for seed in 0..6u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sim = new_sim();
        for _ in 0..3000 {
            let dt = rng.gen_range(-0.01..0.08);
            let report = sim.tick(dt, &random_input(&mut rng));
            let p = &report.player;
            assert!((0.0..=1.0).contains(&p.stamina), "seed {} stamina {}", seed, p.stamina);
            assert!((0.0..=1.0).contains(&p.sanity), "seed {} sanity {}", seed, p.sanity);
            assert!(p.position.is_finite());
            if report.outcome.is_some() {
                break;
            }
        }
    }
}

#[test]
fn sprint_is_gated_by_stamina_and_crouch() {
    let mut rng = StdRng::seed_from_u64(4242);
    let mut sim = new_sim();
    let cutoff = sim.config().player.sprint_cutoff_stamina;
    // Keep the adversary out of the way so the sweep runs to completion.
    sim.place_player(Vec2::new(120.0, 120.0));

    for _ in 0..4000 {
        let mut input = random_input(&mut rng);
        input.move_y = 1.0;
        let before = sim.player().mode;
        let report = sim.tick(DT, &input);
        let player = &report.player;

        if player.stamina <= cutoff {
            assert_ne!(player.mode, MovementMode::Sprint);
        }
        if input.toggle_crouch && before != MovementMode::Crouch {
            assert_eq!(player.mode, MovementMode::Crouch);
        }
        if report.outcome.is_some() {
            break;
        }
    }
}

#[test]
fn sprinting_until_empty_drops_to_walk() {
    let mut config = SimConfig::default();
    config.adversary.retarget_interval = 1000.0;
    let mut sim = Simulation::new(config).unwrap();
    sim.place_player(Vec2::new(-150.0, 150.0));
    let run = PlayerInput {
        sprint: true,
        ..PlayerInput::moving(0.0, 1.0)
    };

    let cutoff = sim.config().player.sprint_cutoff_stamina;

    sim.tick(DT, &run);
    assert!(sim.player().is_sprinting());

    let mut ticks = 0;
    while sim.player().is_sprinting() {
        sim.tick(DT, &run);
        ticks += 1;
        assert!(ticks < 1000, "sprint never ran out");
    }
    assert!(sim.player().stamina <= cutoff);

    // Holding the button does not restart the sprint once stamina recovers.
    for _ in 0..200 {
        sim.tick(DT, &run);
    }
    assert!(sim.player().stamina > 0.2);
    assert!(!sim.player().is_sprinting());
}

#[test]
fn loss_is_reported_once() {
    for seed in 0..5u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sim = new_sim();
        sim.place_player(Vec2::new(80.0, 80.0));
        sim.place_adversary(Vec2::new(80.5, 80.0), BehaviorState::Hunting);

        let mut outcomes = Vec::new();
        for _ in 0..500 {
            let report = sim.tick(DT, &random_input(&mut rng));
            outcomes.extend(report.outcome);
            let terminal = count_events(&report.events, |e| matches!(e, SimEvent::Outcome(_)));
            assert!(terminal <= 1);
        }
        assert_eq!(outcomes, vec![Outcome::Loss], "seed {}", seed);
    }
}

#[test]
fn frozen_session_ignores_input() {
    let mut sim = new_sim();
    sim.place_player(Vec2::new(30.0, 30.0));
    sim.place_adversary(Vec2::new(30.0, 31.0), BehaviorState::Lurking);
    assert_eq!(sim.tick(DT, &idle()).outcome, Some(Outcome::Loss));

    let snapshot = sim.serialize_state();
    let elapsed = sim.elapsed();
    for _ in 0..20 {
        let report = sim.tick(DT, &PlayerInput::moving(1.0, 1.0));
        assert!(report.events.is_empty());
        assert_eq!(report.outcome, None);
    }
    assert_eq!(sim.serialize_state(), snapshot);
    assert_eq!(sim.elapsed(), elapsed);
}
