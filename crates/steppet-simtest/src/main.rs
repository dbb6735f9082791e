//! StepPet Headless Progression Harness
//!
//! Drives the progression core through scripted scenarios and a seeded
//! random walk of simulated days, checking economy and registry invariants
//! along the way. No UI, no step sensor, no storage.
//!
//! Usage:
//!   cargo run -p steppet-simtest
//!   cargo run -p steppet-simtest -- --verbose
//!   cargo run -p steppet-simtest -- --days 120 --seed 7 --json

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use steppet_logic::catalog::{AnimalCatalog, AnimalKind};
use steppet_logic::clock::ManualClock;
use steppet_logic::config::{validate_config, ConfigError, GameConfig, LoadError};
use steppet_logic::game::GameState;
use steppet_logic::pet::PetId;
use steppet_logic::pets::ChallengeRefusal;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Options {
    verbose: bool,
    json: bool,
    days: u32,
    seed: u64,
}

impl Options {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            verbose: args.iter().any(|a| a == "--verbose"),
            json: args.iter().any(|a| a == "--json"),
            days: flag_value(&args, "--days").unwrap_or(60),
            seed: flag_value(&args, "--seed").unwrap_or(42),
        }
    }
}

/// Value following `flag`, if present and parseable.
fn flag_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1)?.parse().ok()
}

fn main() {
    let opts = Options::from_args();
    let level = if opts.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    println!("=== StepPet Progression Harness ===\n");

    let mut results = Vec::new();

    // 1. Config & catalog
    results.extend(validate_config_loading(opts.verbose));

    // 2. Step economy scenarios
    results.extend(validate_economy(opts.verbose));

    // 3. Challenge lifecycle
    results.extend(validate_challenges(opts.verbose));

    // 4. Seeded random walk
    let (walk_results, final_game) = run_random_walk(&opts);
    results.extend(walk_results);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || opts.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    if opts.json {
        match serde_json::to_string_pretty(&final_game.snapshot()) {
            Ok(json) => println!("\n{}", json),
            Err(e) => println!("\nsnapshot serialization failed: {}", e),
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

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Default config with the puppy's daily requirement replaced.
fn config_with_puppy_quota(quota: u64) -> GameConfig {
    let entries: Vec<_> = AnimalCatalog::default()
        .iter()
        .cloned()
        .map(|mut info| {
            if info.kind == AnimalKind::Puppy {
                info.daily_requirement = quota;
            }
            info
        })
        .collect();
    GameConfig {
        catalog: AnimalCatalog::new(entries),
        ..GameConfig::default()
    }
}

/// A bootstrapped session with a puppy as main pet.
fn new_session(config: GameConfig) -> Result<(GameState, ManualClock), LoadError> {
    let clock = ManualClock::new(start_time());
    let mut game = GameState::new(config, clock.clone())?;
    game.bootstrap();
    game.select_main_pet(AnimalKind::Puppy, "Buddy");
    Ok((game, clock))
}

// ── 1. Config & Catalog ─────────────────────────────────────────────────

fn validate_config_loading(_verbose: bool) -> Vec<TestResult> {
    println!("--- Config & Catalog ---");
    let mut results = Vec::new();

    let defaults = GameConfig::default();
    let errors = validate_config(&defaults);
    results.push(TestResult::check(
        "config_defaults_valid",
        errors.is_empty(),
        format!("{} errors", errors.len()),
    ));

    let catalog = &defaults.catalog;
    results.push(TestResult::check(
        "catalog_complete",
        catalog.missing_kinds().is_empty() && catalog.len() == AnimalKind::ALL.len(),
        format!("{} kinds", catalog.len()),
    ));

    let starters: Vec<_> = catalog.starters().map(|i| i.kind).collect();
    results.push(TestResult::check(
        "catalog_starters",
        starters == [AnimalKind::Puppy, AnimalKind::Kitten, AnimalKind::Bunny],
        format!("{:?}", starters),
    ));

    let bad_goals: Vec<_> = catalog
        .challenge_pets()
        .filter(|i| i.unlock_goal == 0 || i.daily_requirement == 0)
        .map(|i| i.kind)
        .collect();
    results.push(TestResult::check(
        "catalog_challenge_numbers",
        bad_goals.is_empty(),
        if bad_goals.is_empty() {
            "every challenge pet has a goal and a requirement".to_string()
        } else {
            format!("bad entries: {:?}", bad_goals)
        },
    ));

    match GameConfig::from_json(r#"{ "rules": { "bank_percent": 25 } }"#) {
        Ok(config) => results.push(TestResult::check(
            "config_partial_json",
            config.rules.bank_percent == 25 && config.rules.challenge_duration_days == 14,
            format!("{:?}", config.rules),
        )),
        Err(e) => results.push(TestResult::check("config_partial_json", false, e.to_string())),
    }

    let rejected = GameConfig::from_json(r#"{ "rules": { "challenge_duration_days": 0 } }"#);
    results.push(TestResult::check(
        "config_rejects_zero_duration",
        matches!(
            &rejected,
            Err(LoadError::Invalid(errs)) if errs.contains(&ConfigError::InvalidChallengeDuration(0))
        ),
        format!("{:?}", rejected.err()),
    ));

    results.push(TestResult::check(
        "config_rejects_bad_json",
        matches!(GameConfig::from_json("{ rules"), Err(LoadError::Json(_))),
        "malformed JSON surfaces a parse error",
    ));

    results
}

// ── 2. Step Economy ─────────────────────────────────────────────────────

fn validate_economy(_verbose: bool) -> Vec<TestResult> {
    println!("--- Step Economy ---");
    let mut results = Vec::new();

    let (mut game, clock) = match new_session(config_with_puppy_quota(1000)) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult::check("economy_session", false, e.to_string()));
            return results;
        }
    };

    // 950 + 100 against a quota of 1000, no challenge running.
    game.record_steps(950);
    let forwarded = game.record_steps(100);
    results.push(TestResult::check(
        "economy_overflow_created",
        forwarded == 0 && game.ledger().overflow() == 50 && game.ledger().today_steps() == 1050,
        format!(
            "today {} overflow {} forwarded {}",
            game.ledger().today_steps(),
            game.ledger().overflow(),
            forwarded
        ),
    ));

    let first = game.process_overflow();
    let second = game.process_overflow();
    results.push(TestResult::check(
        "economy_process_overflow_once",
        first == 50 && second == 0 && game.ledger().wallet() == 50,
        format!("moved {} then {}, wallet {}", first, second, game.ledger().wallet()),
    ));

    // 30 fresh overflow left unflushed across midnight.
    game.record_steps(30);
    clock.advance(Duration::days(1));
    let rolled = game.check_day_rollover();
    results.push(TestResult::check(
        "economy_rollover_flushes",
        rolled && game.ledger().wallet() == 80 && game.ledger().today_steps() == 0,
        format!(
            "rolled {} wallet {} today {} lifetime {}",
            rolled,
            game.ledger().wallet(),
            game.ledger().today_steps(),
            game.ledger().lifetime_steps()
        ),
    ));

    game.record_steps(999);
    let early = game.try_spend_food(10);
    game.record_steps(1);
    let on_time = game.try_spend_food(10);
    results.push(TestResult::check(
        "economy_spend_gated_by_quota",
        !early && on_time && game.ledger().wallet() == 70,
        format!("below quota {}, at quota {}, wallet {}", early, on_time, game.ledger().wallet()),
    ));

    results.push(TestResult::check(
        "economy_overspend_refused",
        !game.try_spend_food(1_000_000) && game.ledger().wallet() == 70,
        format!("wallet {}", game.ledger().wallet()),
    ));

    results
}

// ── 3. Challenge Lifecycle ──────────────────────────────────────────────

fn validate_challenges(_verbose: bool) -> Vec<TestResult> {
    println!("--- Challenge Lifecycle ---");
    let mut results = Vec::new();

    let (mut game, clock) = match new_session(GameConfig::default()) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult::check("challenge_session", false, e.to_string()));
            return results;
        }
    };

    game.start_challenge(AnimalKind::Duckling);
    game.record_steps(300 + 8_000);
    let owned = game.registry().is_owned(AnimalKind::Duckling);
    results.push(TestResult::check(
        "challenge_duckling_unlocks",
        owned && !game.registry().has_active_challenge() && game.ledger().daily_quota() == 700,
        format!("owned {} quota {}", owned, game.ledger().daily_quota()),
    ));

    results.push(TestResult::check(
        "challenge_owned_refused",
        game.challenge_refusal(AnimalKind::Duckling) == Some(ChallengeRefusal::AlreadyOwned),
        format!("{:?}", game.challenge_refusal(AnimalKind::Duckling)),
    ));

    results.push(TestResult::check(
        "challenge_starter_refused",
        game.challenge_refusal(AnimalKind::Kitten) == Some(ChallengeRefusal::NotChallengeable),
        format!("{:?}", game.challenge_refusal(AnimalKind::Kitten)),
    ));

    // Goal met, but only checked after the deadline: a failure.
    clock.advance(Duration::days(1));
    game.resume();
    game.start_challenge(AnimalKind::BabyGiraffe);
    clock.advance(Duration::days(15));
    game.record_steps(700 + 15_000);
    let giraffe = game.registry().find_by_kind(AnimalKind::BabyGiraffe).cloned();
    results.push(TestResult::check(
        "challenge_deadline_before_goal",
        giraffe
            .as_ref()
            .is_some_and(|g| !g.is_owned && g.banked_progress == 1_500),
        format!("{:?}", giraffe.map(|g| (g.is_owned, g.banked_progress))),
    ));

    let refusal = game.challenge_refusal(AnimalKind::BabyGiraffe);
    results.push(TestResult::check(
        "challenge_cooldown_blocks_restart",
        matches!(refusal, Some(ChallengeRefusal::OnCooldown { .. })),
        format!("{:?}", refusal),
    ));

    clock.advance(Duration::days(14));
    game.resume();
    let restarted = game.start_challenge(AnimalKind::BabyGiraffe);
    let seeded = game.registry().active_challenge().map(|r| r.unlock_progress);
    results.push(TestResult::check(
        "challenge_restart_seeds_banked",
        restarted && seeded == Some(1_500),
        format!("restarted {} progress {:?}", restarted, seeded),
    ));

    game.abandon_challenge();
    let banked = game
        .registry()
        .find_by_kind(AnimalKind::BabyGiraffe)
        .map(|r| r.banked_progress);
    results.push(TestResult::check(
        "challenge_banking_accumulates",
        banked == Some(1_650),
        format!("banked {:?}", banked),
    ));

    let violations = game.registry().validate();
    results.push(TestResult::check(
        "challenge_registry_consistent",
        violations.is_empty(),
        format!("{:?}", violations),
    ));

    results
}

// ── 4. Random Walk ──────────────────────────────────────────────────────

#[derive(Default)]
struct WalkStats {
    steps: u64,
    abandoned: u32,
    spent: u64,
    violations: Vec<String>,
}

fn run_random_walk(opts: &Options) -> (Vec<TestResult>, GameState) {
    println!("--- Random Walk ({} days, seed {}) ---", opts.days, opts.seed);
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut stats = WalkStats::default();

    let clock = ManualClock::new(start_time());
    let mut game = match GameState::new(GameConfig::default(), clock.clone()) {
        Ok(g) => g,
        Err(e) => {
            // Default config is always valid; report and fall back anyway.
            results.push(TestResult::check("walk_session", false, e.to_string()));
            return (results, fallback_game());
        }
    };
    game.bootstrap();

    // Every challenge that leaves the active slot, however it resolved.
    let resolved: Rc<RefCell<Vec<PetId>>> = Rc::default();
    let last_active: RefCell<Option<PetId>> = RefCell::new(None);
    let sink = Rc::clone(&resolved);
    let _watch = game
        .registry_signals()
        .active_challenge
        .subscribe(move |active| {
            let current = active.as_ref().map(|r| r.id);
            let previous = last_active.replace(current);
            if let Some(id) = previous.filter(|&id| Some(id) != current) {
                sink.borrow_mut().push(id);
            }
        });

    let starters: Vec<AnimalKind> = game.config().catalog.starters().map(|i| i.kind).collect();
    let main = starters[rng.gen_range(0..starters.len())];
    game.select_main_pet(main, "Walker");

    for day in 0..opts.days {
        // A day is a handful of walking bursts spread over waking hours.
        let bursts = rng.gen_range(1..=8);
        for _ in 0..bursts {
            clock.advance(Duration::minutes(rng.gen_range(20..120)));
            let n: i64 = rng.gen_range(-50..3_000);
            let wallet_before = game.ledger().wallet();
            game.record_steps(n);
            stats.steps += n.max(0) as u64;
            if game.ledger().wallet() < wallet_before {
                stats.violations.push(format!("day {}: wallet fell on record_steps", day));
            }
            maybe_act(&mut game, &mut rng, &mut stats);
            check_invariants(&game, day, &mut stats);
        }

        if rng.gen_bool(0.7) {
            game.process_overflow();
        }

        // Jump to the next morning; occasionally skip a day entirely.
        let skip = if rng.gen_bool(0.1) { 2 } else { 1 };
        let next = game.now() + Duration::days(skip);
        clock.set(next.date_naive().and_hms_opt(7, 0, 0).map_or(next, |t| t.and_utc()));
        game.resume();
        check_invariants(&game, day, &mut stats);
        log::debug!("day {} done: {:?}", day, game.ledger().snapshot());
    }

    // A kind may fail several times before it unlocks, but unlocks once.
    let resolved = resolved.borrow();
    let mut distinct = resolved.clone();
    distinct.sort();
    distinct.dedup();
    let unlocked = distinct
        .iter()
        .filter(|&&id| game.registry().get(id).is_some_and(|r| r.is_owned))
        .count();
    let failed = resolved.len() - unlocked;

    let ledger = game.ledger();
    results.push(TestResult::check(
        "walk_lifetime_matches_input",
        ledger.lifetime_steps() == stats.steps,
        format!("{} recorded, {} lifetime", stats.steps, ledger.lifetime_steps()),
    ));
    results.push(TestResult::check(
        "walk_invariants_hold",
        stats.violations.is_empty(),
        match stats.violations.first() {
            None => format!(
                "{} unlocked, {} failed ({} abandoned by hand), {} spent",
                unlocked, failed, stats.abandoned, stats.spent
            ),
            Some(first) => format!("{} violations, first: {}", stats.violations.len(), first),
        },
    ));
    let owned = game.registry().owned_pets().len();
    results.push(TestResult::check(
        "walk_owned_count",
        owned == 1 + unlocked,
        format!("{} owned, {} unlocked", owned, unlocked),
    ));
    drop(resolved);

    (results, game)
}

/// Player actions between walks.
fn maybe_act(game: &mut GameState, rng: &mut StdRng, stats: &mut WalkStats) {
    if !game.registry().has_active_challenge() && rng.gen_bool(0.3) {
        let now = game.now();
        let candidates: Vec<AnimalKind> = game
            .registry()
            .available_pets()
            .iter()
            .filter(|l| !l.is_on_cooldown(now))
            .map(|l| l.kind)
            .collect();
        if !candidates.is_empty() {
            let kind = candidates[rng.gen_range(0..candidates.len())];
            if !game.start_challenge(kind) {
                stats
                    .violations
                    .push(format!("start_challenge({}) refused while listed", kind));
            }
        }
    } else if game.registry().has_active_challenge() && rng.gen_bool(0.02) {
        if game.abandon_challenge() {
            stats.abandoned += 1;
        }
    }

    if rng.gen_bool(0.2) {
        let amount = rng.gen_range(1..200);
        let quota_met = game.ledger().is_quota_met();
        let before = game.ledger().wallet();
        let ok = game.try_spend_food(amount);
        if ok && !quota_met {
            stats.violations.push("spent before quota was met".into());
        }
        if ok {
            stats.spent += amount as u64;
            if game.ledger().wallet() + amount as u64 != before {
                stats.violations.push("spend did not debit the wallet".into());
            }
        }
    }

    if let Some(outcome) = game.check_challenge_completion() {
        log::info!("challenge resolved: {:?}", outcome);
    }
}

fn check_invariants(game: &GameState, day: u32, stats: &mut WalkStats) {
    for v in game.registry().validate() {
        stats.violations.push(format!("day {}: {}", day, v));
    }

    let ledger = game.ledger();
    let expected_quota = game.registry().total_daily_requirement().max(1);
    if ledger.daily_quota() != expected_quota {
        stats.violations.push(format!(
            "day {}: quota {} but owned pets need {}",
            day,
            ledger.daily_quota(),
            expected_quota
        ));
    }
    if ledger.is_quota_met() != (ledger.steps_until_quota() == 0) {
        stats
            .violations
            .push(format!("day {}: quota flag disagrees with remaining steps", day));
    }
    if ledger.today_steps() > ledger.lifetime_steps() {
        stats
            .violations
            .push(format!("day {}: today exceeds lifetime", day));
    }
    if let Some(active) = game.registry().active_challenge() {
        if active.deadline_passed(game.now()) && active.goal_reached() {
            log::warn!("day {}: {} met its goal after the deadline", day, active.kind);
        }
    }
}

fn fallback_game() -> GameState {
    match GameState::new(GameConfig::default(), ManualClock::new(start_time())) {
        Ok(game) => game,
        Err(e) => {
            println!("default config rejected: {}", e);
            std::process::exit(1);
        }
    }
}
