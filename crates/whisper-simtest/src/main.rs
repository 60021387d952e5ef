//! Forest Whisper Headless Simulation Harness
//!
//! Drives the simulation core through scripted sessions and checks its
//! guarantees. Runs entirely in-process, with no rendering or audio.
//!
//! Usage:
//!   cargo run -p whisper-simtest
//!   cargo run -p whisper-simtest -- --verbose
//!   cargo run -p whisper-simtest -- --seed 4242 --config tuning.json

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use whisper_core::components::{BehaviorState, EntityKind, MovementMode, PlayerInput, Vec2};
use whisper_core::config::{QualityProfile, SimConfig};
use whisper_core::engine::{initialize_world, Simulation};
use whisper_core::events::{Outcome, SimEvent};
use whisper_core::persistence::{
    decode_snapshot, encode_snapshot, LoadOutcome, MemoryStore, SaveFormat, SaveSnapshot, SaveStore,
    SAVE_KEY,
};
use whisper_core::rng::{unit, Xorshift32};
use whisper_core::systems::behavior_for_roll;

const DT: f32 = 1.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

struct Options {
    verbose: bool,
    seed: Option<u32>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        verbose: false,
        seed: None,
        config: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" => options.verbose = true,
            "--seed" => {
                let raw = args.next().ok_or("--seed needs a value")?;
                let seed = raw
                    .parse()
                    .map_err(|e| format!("invalid seed '{}': {}", raw, e))?;
                options.seed = Some(seed);
            }
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                options.config = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(options)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("usage: whisper-simtest [--verbose] [--seed N] [--config PATH]");
            std::process::exit(2);
        }
    };
    init_tracing(options.verbose);

    let mut config = match &options.config {
        Some(path) => match SimConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    let verbose = options.verbose;

    println!("=== Forest Whisper Simulation Harness (seed {}) ===\n", config.seed);

    let mut results = Vec::new();

    // 1. World generation
    results.extend(validate_generation(&config, verbose));

    // 2. Collection and gate
    results.extend(validate_progression(&config, verbose));

    // 3. Adversary behavior
    results.extend(validate_adversary(&config, verbose));

    // 4. Player resources under a long scripted walk
    results.extend(validate_resources(&config, verbose));

    // 5. Save/load
    results.extend(validate_persistence(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn new_sim(config: &SimConfig) -> Option<Simulation> {
    match Simulation::new(config.clone()) {
        Ok(sim) => Some(sim),
        Err(e) => {
            eprintln!("  simulation failed to start: {}", e);
            None
        }
    }
}

// ── 1. World Generation ─────────────────────────────────────────────────

fn validate_generation(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- World Generation ---");
    let mut results = Vec::new();
    let world = &config.world;

    let (a, b) = match (
        initialize_world(config.seed, world),
        initialize_world(config.seed, world),
    ) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            results.push(check("generation_runs", false, e.to_string()));
            return results;
        }
    };

    results.push(check(
        "generation_deterministic",
        a == b,
        format!("fingerprint {:016x}", a.fingerprint()),
    ));

    let trees = a.count(EntityKind::Tree);
    let rocks = a.count(EntityKind::Rock);
    results.push(check(
        "decor_counts",
        trees == world.tree_count && rocks == world.rock_count,
        format!("{} trees, {} rocks", trees, rocks),
    ));

    let intruders = a
        .entities()
        .iter()
        .filter(|e| e.kind.is_decorative() && e.position.length() < world.spawn_exclusion_radius)
        .count();
    results.push(check(
        "spawn_zone_clear",
        intruders == 0,
        format!("{} decor inside r={}", intruders, world.spawn_exclusion_radius),
    ));

    let inset = world.bounds - world.collectible_margin;
    let outside = a
        .collectibles()
        .filter(|(_, c)| c.position.x.abs() > inset || c.position.z.abs() > inset)
        .count();
    results.push(check(
        "collectibles_inset",
        a.collectible_count() == world.collectible_count && outside == 0,
        format!("{} collectibles, {} outside ±{}", a.collectible_count(), outside, inset),
    ));

    results.push(check(
        "gate_fixed",
        a.gate().position == world.gate_position(),
        format!("gate at ({:.1}, {:.1})", a.gate().position.x, a.gate().position.z),
    ));

    let mut low = world.clone();
    let counts = QualityProfile::Low.decor_counts();
    low.tree_count = counts.trees;
    low.rock_count = counts.rocks;
    if let Ok(sparse) = initialize_world(config.seed, &low) {
        results.push(check(
            "quality_profile_counts",
            sparse.count(EntityKind::Tree) == counts.trees,
            format!("low profile: {} trees", sparse.count(EntityKind::Tree)),
        ));
    }

    if verbose {
        for (index, c) in a.collectibles() {
            println!(
                "  collectible #{} at ({:.1}, {:.1}) elev {:.2}",
                index, c.position.x, c.position.z, c.elevation
            );
        }
    }

    results
}

// ── 2. Progression ──────────────────────────────────────────────────────

fn validate_progression(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Progression ---");
    let mut results = Vec::new();
    let Some(mut sim) = new_sim(config) else {
        results.push(check("progression_setup", false, "simulation did not start"));
        return results;
    };

    let targets: Vec<Vec2> = sim.layout().collectibles().map(|(_, c)| c.position).collect();
    let required = sim.progression().required();
    let mut counts = Vec::new();
    let mut premature_gate = false;
    let mut openings = 0;

    for target in &targets {
        sim.place_player(*target);
        let report = sim.tick(DT, &PlayerInput::default());
        if report.gate_active && report.collected_count < required {
            premature_gate = true;
        }
        openings += report
            .events
            .iter()
            .filter(|e| **e == SimEvent::GateActivated)
            .count();
        counts.push(report.collected_count);
        if report.outcome.is_some() {
            break;
        }
    }

    let expected: Vec<usize> = (1..=required).collect();
    results.push(check(
        "collection_sequence",
        counts == expected,
        format!("counts {:?}", counts),
    ));
    results.push(check(
        "gate_opens_at_completion",
        !premature_gate && openings == 1 && sim.progression().gate_active(),
        format!("{} opening(s)", openings),
    ));

    // Revisit a collected marker
    if let Some(first) = targets.first() {
        sim.place_player(*first);
        let report = sim.tick(DT, &PlayerInput::default());
        results.push(check(
            "collection_idempotent",
            report.collected_count == required,
            format!("count after revisit {}", report.collected_count),
        ));
    }

    let gate = sim.layout().gate().position;
    sim.place_player(gate);
    let report = sim.tick(DT, &PlayerInput::default());
    results.push(check(
        "gate_exit_wins",
        report.outcome == Some(Outcome::Win),
        format!("outcome {:?}", report.outcome),
    ));

    let after = sim.tick(DT, &PlayerInput::moving(0.0, 1.0));
    results.push(check(
        "win_reported_once",
        after.outcome.is_none() && after.events.is_empty(),
        format!("{} events after win", after.events.len()),
    ));

    if verbose {
        println!("  won after {:.2}s", sim.elapsed());
    }

    results
}

// ── 3. Adversary ────────────────────────────────────────────────────────

fn validate_adversary(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Adversary ---");
    let mut results = Vec::new();
    let tuning = &config.adversary;

    // Band distribution from the world stream
    let mut rng = Xorshift32::new(config.seed);
    let mut tally = [0usize; 3];
    let rolls = 20_000;
    for _ in 0..rolls {
        match behavior_for_roll(unit(&mut rng), tuning) {
            BehaviorState::Illusion => tally[0] += 1,
            BehaviorState::Lurking => tally[1] += 1,
            BehaviorState::Hunting => tally[2] += 1,
        }
    }
    let share = |n: usize| n as f32 / rolls as f32;
    let expected = [
        tuning.illusion_band,
        tuning.lurking_band - tuning.illusion_band,
        1.0 - tuning.lurking_band,
    ];
    let close = tally
        .iter()
        .zip(expected)
        .all(|(&n, want)| (share(n) - want).abs() < 0.03);
    results.push(check(
        "behavior_bands",
        close,
        format!(
            "illusion {:.3} lurking {:.3} hunting {:.3}",
            share(tally[0]),
            share(tally[1]),
            share(tally[2])
        ),
    ));

    let Some(mut sim) = new_sim(config) else {
        results.push(check("adversary_setup", false, "simulation did not start"));
        return results;
    };

    // Pursuit from 40 units
    let player = Vec2::new(100.0, 100.0);
    sim.place_player(player);
    sim.place_adversary(Vec2::new(100.0, 140.0), BehaviorState::Hunting);
    let mut previous = sim.adversary().position.distance(&player);
    let mut monotonic = true;
    let mut ticks = 0;
    while previous > tuning.engagement_radius && ticks < 2000 {
        sim.tick(DT, &PlayerInput::default());
        let distance = sim.adversary().position.distance(&sim.player().position);
        monotonic &= distance < previous;
        previous = distance;
        ticks += 1;
    }
    results.push(check(
        "hunting_closes_in",
        monotonic && previous <= tuning.engagement_radius,
        format!("reached {:.2} after {} ticks", previous, ticks),
    ));

    // Decoy never kills
    sim.place_adversary(Vec2::new(100.5, 100.0), BehaviorState::Illusion);
    let mut harmless = true;
    for _ in 0..60 {
        harmless &= sim.tick(DT, &PlayerInput::default()).outcome.is_none();
    }
    results.push(check("illusion_harmless", harmless, "60 ticks at 0.5 units"));

    // Contact
    sim.place_adversary(Vec2::new(101.0, 100.0), BehaviorState::Hunting);
    let report = sim.tick(DT, &PlayerInput::default());
    let mut repeated = 0;
    for _ in 0..120 {
        if sim.tick(DT, &PlayerInput::moving(1.0, 0.0)).outcome.is_some() {
            repeated += 1;
        }
    }
    results.push(check(
        "contact_is_loss",
        report.outcome == Some(Outcome::Loss),
        format!("outcome {:?}", report.outcome),
    ));
    results.push(check(
        "loss_reported_once",
        repeated == 0,
        format!("{} repeated outcomes", repeated),
    ));

    // Retarget cadence
    if let Some(mut sim) = new_sim(config) {
        sim.place_player(Vec2::new(-120.0, 60.0));
        let mut retargets = Vec::new();
        let mut decoy_apart = true;
        for _ in 0..(20.0 / DT) as usize {
            let report = sim.tick(DT, &PlayerInput::default());
            for event in &report.events {
                if let SimEvent::AdversaryRetargeted { behavior } = event {
                    retargets.push((sim.elapsed(), *behavior));
                    decoy_apart &= report.adversary.decoy_position != report.adversary.position;
                }
            }
            if report.outcome.is_some() {
                break;
            }
        }
        let first_ok = retargets
            .first()
            .map_or(false, |(t, _)| *t > tuning.retarget_interval);
        results.push(check(
            "retarget_interval",
            first_ok && decoy_apart,
            format!("{} rolls in 20s", retargets.len()),
        ));
        if verbose {
            for (t, behavior) in &retargets {
                println!("  t={:.2}s -> {:?}", t, behavior);
            }
        }
    }

    results
}

// ── 4. Player Resources ─────────────────────────────────────────────────

fn validate_resources(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Player Resources ---");
    let mut results = Vec::new();
    let Some(mut sim) = new_sim(config) else {
        results.push(check("resources_setup", false, "simulation did not start"));
        return results;
    };

    // Inputs come from a stream independent of the simulation's own.
    let mut script = Xorshift32::new((config.seed ^ 0x5151_5151) | 1);
    let mut in_range = true;
    let mut sprint_violations = 0;
    let mut cues = 0;
    let mut ticks = 0;
    let mut outcome = None;
    let cutoff = config.player.sprint_cutoff_stamina;

    for _ in 0..(120.0 / DT) as usize {
        let input = PlayerInput {
            move_x: unit(&mut script) * 2.0 - 1.0,
            move_y: unit(&mut script) * 2.0 - 1.0,
            look_dx: (unit(&mut script) - 0.5) * 60.0,
            look_dy: (unit(&mut script) - 0.5) * 30.0,
            sprint: unit(&mut script) < 0.6,
            toggle_crouch: unit(&mut script) < 0.01,
            toggle_torch: unit(&mut script) < 0.01,
        };
        let report = sim.tick(DT, &input);
        let p = &report.player;
        in_range &= (0.0..=1.0).contains(&p.stamina) && (0.0..=1.0).contains(&p.sanity);
        if p.mode == MovementMode::Sprint && p.stamina <= cutoff {
            sprint_violations += 1;
        }
        cues += report
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::Cue(_)))
            .count();
        ticks += 1;
        if report.outcome.is_some() {
            outcome = report.outcome;
            break;
        }
    }

    results.push(check(
        "resources_bounded",
        in_range,
        format!(
            "stamina {:.2} sanity {:.2} after {} ticks",
            sim.player().stamina,
            sim.player().sanity,
            ticks
        ),
    ));
    results.push(check(
        "sprint_cutoff",
        sprint_violations == 0,
        format!("{} ticks sprinting on empty", sprint_violations),
    ));
    results.push(check(
        "cues_scheduled",
        cues > 0,
        format!("{} cues", cues),
    ));

    if verbose {
        println!("  session outcome: {:?}", outcome);
    }

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();
    let Some(mut sim) = new_sim(config) else {
        results.push(check("persistence_setup", false, "simulation did not start"));
        return results;
    };

    let targets: Vec<Vec2> = sim.layout().collectibles().map(|(_, c)| c.position).collect();
    for target in targets.iter().take(2) {
        sim.place_player(*target);
        sim.tick(DT, &PlayerInput::default());
    }
    let snapshot = sim.serialize_state();

    let mut store = MemoryStore::new();
    let mut fresh = match new_sim(config) {
        Some(fresh) => fresh,
        None => return results,
    };
    let empty = fresh.load_from(&store);
    results.push(check(
        "load_without_save",
        matches!(empty, Ok(LoadOutcome::NoSave)),
        format!("{:?}", empty.map(|o| matches!(o, LoadOutcome::NoSave))),
    ));

    for format in [SaveFormat::Json, SaveFormat::Binary] {
        let saved = sim.save_to(&mut store, format);
        let loaded = fresh.load_from(&store);
        let same_world = fresh.layout().fingerprint() == sim.layout().fingerprint();
        let ok = saved.is_ok()
            && matches!(&loaded, Ok(LoadOutcome::Restored(s)) if *s == snapshot)
            && same_world
            && fresh.progression().collected_indices() == snapshot.collected;
        results.push(check(
            &format!("roundtrip_{:?}", format).to_lowercase(),
            ok,
            format!("{} collected, world match {}", snapshot.collected.len(), same_world),
        ));
    }

    // A save in the legacy camelCase layout
    let legacy = serde_json::json!({
        "collected": [0, 2],
        "player": { "x": 10.0, "z": -5.0, "yaw": 1.0, "torchOn": true },
        "portalActive": false,
        "rngSeed": config.seed,
    });
    let repaired = SaveSnapshot::from_json_value(&legacy);
    results.push(check(
        "lenient_defaults",
        repaired.player.stamina == 1.0
            && repaired.player.sanity == 1.0
            && repaired.player.torch_on
            && repaired.collected == vec![0, 2],
        format!(
            "stamina {} sanity {} collected {:?}",
            repaired.player.stamina, repaired.player.sanity, repaired.collected
        ),
    ));

    let unreadable = store
        .set(SAVE_KEY, b"\x01\x02\x03".to_vec())
        .map_err(|e| e.to_string())
        .and_then(|_| fresh.load_from(&store).map_err(|e| e.to_string()));
    results.push(check(
        "corrupt_save_reported",
        matches!(unreadable, Ok(LoadOutcome::Unreadable(_))),
        "garbage blob",
    ));

    let blob = encode_snapshot(&snapshot, SaveFormat::Json);
    let decoded = blob.as_deref().map_err(|e| e.to_string()).and_then(|b| {
        decode_snapshot(b).map_err(|e| e.to_string())
    });
    if verbose {
        if let Ok(bytes) = &blob {
            println!("  json save: {}", String::from_utf8_lossy(bytes));
        }
    }
    results.push(check(
        "json_encoding",
        decoded.as_ref() == Ok(&snapshot),
        "encode/decode",
    ));

    results
}
