//! Property tests for the step economy and challenge banking.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use steppet_logic::catalog::{AnimalCatalog, AnimalInfo, AnimalKind};
use steppet_logic::clock::ManualClock;
use steppet_logic::config::GameConfig;
use steppet_logic::game::GameState;

const QUOTA: u64 = 1000;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 9, 7, 30, 0).unwrap()
}

/// Bootstrapped session with a single main pet needing [`QUOTA`] a day.
fn session() -> (GameState, ManualClock) {
    let entries: Vec<AnimalInfo> = AnimalCatalog::default()
        .iter()
        .cloned()
        .map(|info| match info.kind {
            AnimalKind::Puppy => AnimalInfo::new(AnimalKind::Puppy, "Puppy", QUOTA, 0),
            _ => info,
        })
        .collect();
    let config = GameConfig {
        catalog: AnimalCatalog::new(entries),
        ..GameConfig::default()
    };
    let clock = ManualClock::new(t0());
    let mut game = GameState::new(config, clock.clone()).unwrap();
    game.bootstrap();
    game.select_main_pet(AnimalKind::Puppy, "Buddy");
    (game, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Overflow reaching the challenge is exactly the overflow created
    /// after it started, however the steps are split.
    #[test]
    fn forwarded_overflow_is_never_double_counted(
        before in 0i64..3_000,
        deltas in prop::collection::vec(-500i64..2_000, 0..15),
    ) {
        let (mut game, _) = session();
        game.record_steps(before);
        let initial_overflow = game.ledger().overflow();
        prop_assert!(game.start_challenge(AnimalKind::BabyPanda));

        let forwarded: u64 = deltas.iter().map(|&n| game.record_steps(n)).sum();
        let final_overflow = game.ledger().today_steps().saturating_sub(QUOTA);

        prop_assert_eq!(forwarded, final_overflow - initial_overflow);
        let progress = game.registry().active_challenge().map(|r| r.unlock_progress);
        prop_assert_eq!(progress, Some(forwarded));
        prop_assert_eq!(game.process_overflow(), initial_overflow);
    }

    /// No amount of savings lets the player spend before the quota is met.
    #[test]
    fn spending_needs_quota(
        savings in 1u64..5_000,
        today in 0i64..(QUOTA as i64),
        spend in 1i64..5_000,
    ) {
        let (mut game, clock) = session();
        game.record_steps((QUOTA + savings) as i64);
        game.process_overflow();
        clock.advance(Duration::days(1));
        game.check_day_rollover();

        game.record_steps(today);
        prop_assert!(!game.try_spend_food(spend));
        prop_assert_eq!(game.ledger().wallet(), savings);
    }

    /// Each failed attempt banks a tenth (truncated) of the progress it
    /// reached, including what it was seeded with.
    #[test]
    fn banked_progress_accumulates(attempts in prop::collection::vec(0u64..10_000, 1..4)) {
        let (mut game, clock) = session();
        let mut expected_banked = 0u64;

        for progress in attempts {
            prop_assert!(game.start_challenge(AnimalKind::BabyPanda));
            let seeded = game.registry().active_challenge().map(|r| r.unlock_progress);
            prop_assert_eq!(seeded, Some(expected_banked));

            game.record_steps((QUOTA + progress) as i64);
            prop_assert!(game.abandon_challenge());
            expected_banked += (expected_banked + progress) / 10;

            let banked = game
                .registry()
                .find_by_kind(AnimalKind::BabyPanda)
                .map(|r| r.banked_progress);
            prop_assert_eq!(banked, Some(expected_banked));

            // Restarting inside the cooldown always fails.
            prop_assert!(!game.start_challenge(AnimalKind::BabyPanda));
            clock.advance(Duration::days(14));
            game.resume();
        }
        prop_assert!(game.registry().validate().is_empty());
    }
}
