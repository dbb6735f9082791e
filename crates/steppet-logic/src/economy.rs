//! Step economy rules: quota, overflow routing, wallet spending, rollover.
//!
//! Steps first count toward the daily quota. Steps beyond it (overflow) go
//! to the active unlock challenge if there is one; otherwise they wait in
//! the ledger until [`EconomyCoordinator::process_overflow`] banks them into
//! the wallet. Each overflow step is claimed once, by one of the two.

use chrono::{DateTime, Utc};

use crate::config::ProgressionRules;
use crate::ledger::EconomyLedger;
use crate::pets::PetCoordinator;

pub struct EconomyCoordinator<'a> {
    ledger: &'a mut EconomyLedger,
    pets: PetCoordinator<'a>,
    rules: &'a ProgressionRules,
}

impl<'a> EconomyCoordinator<'a> {
    pub fn new(
        ledger: &'a mut EconomyLedger,
        pets: PetCoordinator<'a>,
        rules: &'a ProgressionRules,
    ) -> Self {
        Self {
            ledger,
            pets,
            rules,
        }
    }

    pub fn ledger(&self) -> &EconomyLedger {
        &*self.ledger
    }

    pub fn pets(&mut self) -> &mut PetCoordinator<'a> {
        &mut self.pets
    }

    /// Add `n` steps. Overflow created by this call (and only this call)
    /// is forwarded to the active challenge. Returns the amount forwarded.
    pub fn record_steps(&mut self, n: i64) -> u64 {
        let previous_overflow = self.ledger.overflow();
        self.ledger.add_steps(n);
        let current_overflow = self.ledger.overflow();

        if current_overflow <= previous_overflow || !self.pets.has_active_challenge() {
            return 0;
        }
        let fresh = current_overflow - previous_overflow;
        self.ledger.claim_overflow(fresh);
        self.pets.add_challenge_progress(fresh);
        fresh
    }

    /// Move unclaimed overflow into the wallet. Returns the amount moved;
    /// calling again before more steps arrive moves nothing.
    pub fn process_overflow(&mut self) -> u64 {
        let amount = self.ledger.unclaimed_overflow();
        if amount == 0 {
            return 0;
        }
        self.ledger.claim_overflow(amount);
        self.ledger.credit_wallet(amount);
        log::info!("banked {} overflow into wallet ({} total)", amount, self.ledger.wallet());
        amount
    }

    /// Spend from the wallet. Refused until today's quota is met.
    pub fn try_spend_food(&mut self, n: i64) -> bool {
        if !self.ledger.is_quota_met() {
            log::warn!(
                "cannot spend {}: quota not met ({}/{})",
                n,
                self.ledger.today_steps(),
                self.ledger.daily_quota()
            );
            return false;
        }
        self.ledger.try_spend_from_wallet(n)
    }

    /// Start a new day if `now` falls on a different date than the ledger's.
    /// Unclaimed overflow is banked before today's steps are cleared.
    pub fn check_day_rollover(&mut self, now: DateTime<Utc>) -> bool {
        let today = self.rules.day_of(now);
        let stored = self.ledger.today_date();
        if today == stored {
            return false;
        }
        self.process_overflow();
        self.ledger.reset_daily(today);
        log::info!("day rollover {} -> {}", stored, today);
        true
    }

    /// Recompute the daily quota from the pets currently owned.
    pub fn sync_daily_quota_from_pets(&mut self) {
        let total = self.pets.registry().total_daily_requirement();
        self.ledger.set_daily_quota(total);
        log::debug!("daily quota synced to {}", self.ledger.daily_quota());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AnimalCatalog, AnimalKind};
    use crate::registry::PetRegistry;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap()
    }

    struct Fixture {
        ledger: EconomyLedger,
        registry: PetRegistry,
        catalog: AnimalCatalog,
        rules: ProgressionRules,
    }

    impl Fixture {
        /// A session with `quota` steps required per day.
        fn with_quota(quota: u64) -> Self {
            let catalog = AnimalCatalog::default();
            let rules = ProgressionRules::default();
            let mut ledger = EconomyLedger::new(rules.day_of(t0()));
            ledger.set_daily_quota(quota);
            Self {
                ledger,
                registry: PetRegistry::new(&catalog),
                catalog,
                rules,
            }
        }

        fn economy(&mut self) -> EconomyCoordinator<'_> {
            EconomyCoordinator::new(
                &mut self.ledger,
                PetCoordinator::new(&mut self.registry, &self.catalog, &self.rules),
                &self.rules,
            )
        }
    }

    #[test]
    fn test_overflow_forwarded_to_challenge() {
        let mut fx = Fixture::with_quota(1000);
        fx.economy().pets().start_challenge(AnimalKind::Duckling, t0());
        fx.economy().record_steps(950);
        let forwarded = fx.economy().record_steps(100);

        assert_eq!(forwarded, 50);
        assert_eq!(fx.ledger.today_steps(), 1050);
        assert_eq!(fx.registry.active_challenge().unwrap().unlock_progress, 50);
        // Claimed by the challenge, so nothing left for the wallet.
        assert_eq!(fx.economy().process_overflow(), 0);
        assert_eq!(fx.ledger.wallet(), 0);
    }

    #[test]
    fn test_overflow_without_challenge_waits_for_wallet() {
        let mut fx = Fixture::with_quota(1000);
        fx.economy().record_steps(950);
        assert_eq!(fx.economy().record_steps(100), 0);
        assert_eq!(fx.ledger.unclaimed_overflow(), 50);

        assert_eq!(fx.economy().process_overflow(), 50);
        assert_eq!(fx.economy().process_overflow(), 0);
        assert_eq!(fx.ledger.wallet(), 50);
    }

    #[test]
    fn test_only_new_overflow_is_forwarded() {
        let mut fx = Fixture::with_quota(100);
        fx.economy().pets().start_challenge(AnimalKind::Duckling, t0());
        for _ in 0..5 {
            fx.economy().record_steps(60);
        }
        // 300 steps, quota 100: 200 overflow in total.
        assert_eq!(fx.registry.active_challenge().unwrap().unlock_progress, 200);
    }

    #[test]
    fn test_spend_requires_quota() {
        let mut fx = Fixture::with_quota(1000);
        fx.ledger.add_to_wallet(500);
        assert!(!fx.economy().try_spend_food(10));

        fx.economy().record_steps(1000);
        assert!(fx.economy().try_spend_food(10));
        assert!(!fx.economy().try_spend_food(1000));
        assert_eq!(fx.ledger.wallet(), 490);
    }

    #[test]
    fn test_rollover_flushes_then_resets() {
        let mut fx = Fixture::with_quota(1000);
        fx.economy().record_steps(1030);
        assert!(!fx.economy().check_day_rollover(t0() + Duration::hours(3)));

        assert!(fx.economy().check_day_rollover(t0() + Duration::days(1)));
        assert_eq!(fx.ledger.wallet(), 30);
        assert_eq!(fx.ledger.today_steps(), 0);
        assert_eq!(fx.ledger.lifetime_steps(), 1030);
        assert_eq!(fx.ledger.today_date(), NaiveDate::from_ymd_opt(2026, 8, 4).unwrap());
    }

    #[test]
    fn test_sync_quota_from_owned_pets() {
        let mut fx = Fixture::with_quota(1);
        fx.economy().pets().select_main_pet(AnimalKind::Bunny, "Clover", t0());
        fx.economy().sync_daily_quota_from_pets();
        assert_eq!(fx.ledger.daily_quota(), 400);
    }

    #[test]
    fn test_overflow_after_quota_rise_reaches_wallet() {
        let mut fx = Fixture::with_quota(300);
        fx.economy().pets().select_main_pet(AnimalKind::Puppy, "Buddy", t0());
        fx.economy().pets().start_challenge(AnimalKind::Duckling, t0());
        assert_eq!(fx.economy().record_steps(8_300), 8_000);
        assert!(fx.economy().pets().check_challenge_completion(t0()).is_some());
        fx.economy().sync_daily_quota_from_pets();
        assert_eq!(fx.ledger.daily_quota(), 700);
        assert_eq!(fx.ledger.unclaimed_overflow(), 0);

        // No challenge now, so every step past the new quota is the wallet's.
        assert_eq!(fx.economy().record_steps(500), 0);
        assert_eq!(fx.economy().process_overflow(), 500);
        assert_eq!(fx.ledger.wallet(), 500);
        assert_eq!(fx.economy().process_overflow(), 0);
    }

    #[test]
    fn test_sync_quota_with_no_pets_clamps_to_one() {
        let mut fx = Fixture::with_quota(500);
        fx.economy().sync_daily_quota_from_pets();
        assert_eq!(fx.ledger.daily_quota(), 1);
    }
}
