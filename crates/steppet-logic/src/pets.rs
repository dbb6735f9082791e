//! Unlock challenge state machine.
//!
//! Per animal kind:
//!
//! ```text
//! Available ──start──▶ Challenging ──goal met──▶ Owned
//!     ▲                     │
//!     │                abandon / deadline
//!     │                     ▼
//!     └──cooldown ends── Cooldown (banked progress kept)
//! ```
//!
//! Only one challenge may run at a time. A failed attempt keeps
//! `bank_percent` of its progress (truncated) and seeds the next attempt on
//! the same kind with it.
//!
//! Progress accrual and resolution are separate steps:
//! [`PetCoordinator::add_challenge_progress`] never completes a challenge on
//! its own; [`PetCoordinator::check_challenge_completion`] does. The check
//! looks at the deadline *before* the goal, so a goal that was met but only
//! checked after the deadline counts as a failure.

use chrono::{DateTime, Utc};

use crate::catalog::{AnimalCatalog, AnimalKind};
use crate::config::ProgressionRules;
use crate::pet::{PetId, PetRecord};
use crate::registry::PetRegistry;

/// How a challenge check resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Completed(PetId),
    Failed(PetId),
}

/// Why a challenge cannot start right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeRefusal {
    /// Another challenge is running.
    AlreadyChallenging,
    /// Starter pet, or no catalog entry.
    NotChallengeable,
    AlreadyOwned,
    OnCooldown { until: DateTime<Utc> },
}

/// Business rules for pet ownership and challenges.
///
/// Borrows the registry for the duration of one command; the application
/// state root builds a fresh coordinator per call.
pub struct PetCoordinator<'a> {
    registry: &'a mut PetRegistry,
    catalog: &'a AnimalCatalog,
    rules: &'a ProgressionRules,
}

impl<'a> PetCoordinator<'a> {
    pub fn new(
        registry: &'a mut PetRegistry,
        catalog: &'a AnimalCatalog,
        rules: &'a ProgressionRules,
    ) -> Self {
        Self {
            registry,
            catalog,
            rules,
        }
    }

    pub fn registry(&self) -> &PetRegistry {
        &*self.registry
    }

    pub fn has_active_challenge(&self) -> bool {
        self.registry.has_active_challenge()
    }

    fn active_id(&self) -> Option<PetId> {
        self.registry.active_challenge().map(|r| r.id)
    }

    /// Create the player's first pet. Only a starter kind qualifies, and
    /// only while no main pet exists.
    pub fn select_main_pet(&mut self, kind: AnimalKind, name: &str, now: DateTime<Utc>) -> bool {
        if let Some(existing) = self.registry.main_pet() {
            log::warn!("main pet already exists: {} ({})", existing.display_name, existing.kind);
            return false;
        }
        let Some(info) = self.catalog.get(kind).filter(|info| info.is_starter()) else {
            log::warn!("{} is not a starter pet", kind);
            return false;
        };

        let pet = PetRecord::main_pet(info, name, now);
        log::info!("created main pet: {} ({})", pet.display_name, pet.kind);
        let active = self.active_id();
        self.registry.commit(pet, active);
        true
    }

    /// Why `kind` cannot be challenged at `now`, or `None` if it can.
    pub fn challenge_refusal(&self, kind: AnimalKind, now: DateTime<Utc>) -> Option<ChallengeRefusal> {
        if self.registry.has_active_challenge() {
            return Some(ChallengeRefusal::AlreadyChallenging);
        }
        match self.catalog.get(kind) {
            Some(info) if !info.is_starter() => {}
            _ => return Some(ChallengeRefusal::NotChallengeable),
        }
        if self.registry.is_owned(kind) {
            return Some(ChallengeRefusal::AlreadyOwned);
        }
        if let Some(until) = self
            .registry
            .find_by_kind(kind)
            .and_then(|r| r.cooldown_until)
            .filter(|&until| until > now)
        {
            return Some(ChallengeRefusal::OnCooldown { until });
        }
        None
    }

    /// Begin a challenge for `kind`, reusing any earlier record for it so
    /// banked progress carries over.
    pub fn start_challenge(&mut self, kind: AnimalKind, now: DateTime<Utc>) -> bool {
        if let Some(refusal) = self.challenge_refusal(kind, now) {
            log::warn!("cannot start challenge for {}: {:?}", kind, refusal);
            return false;
        }
        let Some(info) = self.catalog.get(kind) else {
            return false;
        };
        let Some(deadline) = self.rules.challenge_deadline(now) else {
            log::warn!("cannot start challenge for {}: deadline out of range", kind);
            return false;
        };

        let mut pet = match self.registry.find_by_kind(kind) {
            Some(existing) => existing.clone(),
            None => PetRecord::challenger(info),
        };
        pet.daily_requirement = info.daily_requirement;
        pet.unlock_goal = info.unlock_goal;
        pet.is_owned = false;
        pet.unlock_progress = pet.banked_progress;
        pet.unlock_deadline = Some(deadline);
        pet.cooldown_until = None;

        log::info!(
            "challenge started: {} {}/{} (banked {}), due {}",
            pet.kind,
            pet.unlock_progress,
            pet.unlock_goal,
            pet.banked_progress,
            deadline
        );
        let id = pet.id;
        self.registry.commit(pet, Some(id));
        true
    }

    /// Add `n` to the active challenge's progress. Does not resolve it.
    pub fn add_challenge_progress(&mut self, n: u64) {
        if n == 0 {
            return;
        }
        let Some(mut pet) = self.registry.active_challenge().cloned() else {
            return;
        };
        pet.unlock_progress = pet.unlock_progress.saturating_add(n);
        log::debug!(
            "challenge progress {} +{} -> {}/{}",
            pet.kind,
            n,
            pet.unlock_progress,
            pet.unlock_goal
        );
        let id = pet.id;
        self.registry.commit(pet, Some(id));
    }

    /// Resolve the active challenge if its deadline passed or its goal is
    /// met, in that order.
    pub fn check_challenge_completion(&mut self, now: DateTime<Utc>) -> Option<ChallengeOutcome> {
        let pet = self.registry.active_challenge()?;
        let id = pet.id;
        if pet.deadline_passed(now) {
            self.abandon_challenge(now).then_some(ChallengeOutcome::Failed(id))
        } else if pet.goal_reached() {
            self.complete_challenge(now).then_some(ChallengeOutcome::Completed(id))
        } else {
            None
        }
    }

    /// Make the active challenge pet owned.
    pub fn complete_challenge(&mut self, now: DateTime<Utc>) -> bool {
        let Some(mut pet) = self.registry.active_challenge().cloned() else {
            return false;
        };
        pet.is_owned = true;
        pet.unlock_progress = 0;
        pet.banked_progress = 0;
        pet.unlock_deadline = None;
        pet.cooldown_until = None;
        pet.unlocked_at = Some(now);

        log::info!("challenge complete: {} is now yours", pet.display_name);
        self.registry.commit(pet, None);
        true
    }

    /// End the active challenge as a failure: bank part of the progress and
    /// start the cooldown. Used for both explicit abandonment and expiry.
    pub fn abandon_challenge(&mut self, now: DateTime<Utc>) -> bool {
        let Some(mut pet) = self.registry.active_challenge().cloned() else {
            return false;
        };
        let Some(cooldown_until) = self.rules.cooldown_end(now) else {
            log::warn!("cannot end challenge for {}: cooldown out of range", pet.kind);
            return false;
        };
        let banked = self.rules.banked_share(pet.unlock_progress);
        pet.banked_progress = pet.banked_progress.saturating_add(banked);
        pet.cooldown_until = Some(cooldown_until);
        pet.unlock_progress = 0;
        pet.unlock_deadline = None;
        pet.is_owned = false;

        log::info!(
            "challenge failed: {} banked +{} (total {}), cooldown until {}",
            pet.kind,
            banked,
            pet.banked_progress,
            cooldown_until
        );
        self.registry.commit(pet, None);
        true
    }

    pub fn navigate_to_pet(&mut self, index: usize) -> bool {
        self.registry.navigate_to(index)
    }

    pub fn navigate_to_next_pet(&mut self) -> bool {
        self.registry.navigate_by(1)
    }

    pub fn navigate_to_previous_pet(&mut self) -> bool {
        self.registry.navigate_by(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::PetStatus;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 10, 0, 0).unwrap()
    }

    struct Fixture {
        registry: PetRegistry,
        catalog: AnimalCatalog,
        rules: ProgressionRules,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = AnimalCatalog::default();
            Self {
                registry: PetRegistry::new(&catalog),
                catalog,
                rules: ProgressionRules::default(),
            }
        }

        fn pets(&mut self) -> PetCoordinator<'_> {
            PetCoordinator::new(&mut self.registry, &self.catalog, &self.rules)
        }
    }

    #[test]
    fn test_select_main_pet_once() {
        let mut fx = Fixture::new();
        assert!(fx.pets().select_main_pet(AnimalKind::Puppy, "Buddy", t0()));
        assert!(!fx.pets().select_main_pet(AnimalKind::Kitten, "Second", t0()));
        assert_eq!(fx.registry.records().len(), 1);
        assert_eq!(fx.registry.total_daily_requirement(), 300);
    }

    #[test]
    fn test_select_main_pet_rejects_challenge_kind() {
        let mut fx = Fixture::new();
        assert!(!fx.pets().select_main_pet(AnimalKind::Duckling, "Quack", t0()));
        assert!(fx.registry.main_pet().is_none());
    }

    #[test]
    fn test_start_challenge_sets_deadline() {
        let mut fx = Fixture::new();
        assert!(fx.pets().start_challenge(AnimalKind::Duckling, t0()));
        let pet = fx.registry.active_challenge().unwrap();
        assert_eq!(pet.unlock_goal, 8_000);
        assert_eq!(pet.unlock_progress, 0);
        assert_eq!(pet.unlock_deadline, Some(t0() + Duration::days(14)));
        assert_eq!(pet.status(t0()), PetStatus::Challenging);
    }

    #[test]
    fn test_start_challenge_refusals() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.pets().challenge_refusal(AnimalKind::Puppy, t0()),
            Some(ChallengeRefusal::NotChallengeable)
        );
        assert!(!fx.pets().start_challenge(AnimalKind::Puppy, t0()));

        assert!(fx.pets().start_challenge(AnimalKind::Duckling, t0()));
        assert!(!fx.pets().start_challenge(AnimalKind::BabyPanda, t0()));
        assert_eq!(
            fx.pets().challenge_refusal(AnimalKind::BabyPanda, t0()),
            Some(ChallengeRefusal::AlreadyChallenging)
        );
    }

    #[test]
    fn test_progress_does_not_complete_by_itself() {
        let mut fx = Fixture::new();
        fx.pets().start_challenge(AnimalKind::Duckling, t0());
        fx.pets().add_challenge_progress(9_000);
        let pet = fx.registry.active_challenge().unwrap();
        assert_eq!(pet.unlock_progress, 9_000);
        assert!(!pet.is_owned);
    }

    #[test]
    fn test_progress_without_challenge_is_ignored() {
        let mut fx = Fixture::new();
        fx.pets().add_challenge_progress(500);
        assert!(fx.registry.records().is_empty());
    }

    #[test]
    fn test_check_completes_when_goal_met() {
        let mut fx = Fixture::new();
        fx.pets().start_challenge(AnimalKind::Duckling, t0());
        fx.pets().add_challenge_progress(8_000);
        let now = t0() + Duration::days(2);
        let outcome = fx.pets().check_challenge_completion(now);

        let pet = fx.registry.find_by_kind(AnimalKind::Duckling).unwrap().clone();
        assert_eq!(outcome, Some(ChallengeOutcome::Completed(pet.id)));
        assert!(pet.is_owned);
        assert_eq!(pet.unlock_progress, 0);
        assert_eq!(pet.banked_progress, 0);
        assert_eq!(pet.unlocked_at, Some(now));
        assert!(!fx.registry.has_active_challenge());
        assert!(fx.registry.available_pets().iter().all(|l| l.kind != AnimalKind::Duckling));
        assert_eq!(
            fx.pets().challenge_refusal(AnimalKind::Duckling, now),
            Some(ChallengeRefusal::AlreadyOwned)
        );
    }

    #[test]
    fn test_check_is_noop_while_in_progress() {
        let mut fx = Fixture::new();
        fx.pets().start_challenge(AnimalKind::Duckling, t0());
        fx.pets().add_challenge_progress(100);
        assert_eq!(fx.pets().check_challenge_completion(t0()), None);
        assert_eq!(fx.pets().check_challenge_completion(t0()), None);
        assert_eq!(fx.registry.active_challenge().unwrap().unlock_progress, 100);
    }

    #[test]
    fn test_deadline_checked_before_goal() {
        let mut fx = Fixture::new();
        fx.pets().start_challenge(AnimalKind::Duckling, t0());
        fx.pets().add_challenge_progress(8_000);
        let late = t0() + Duration::days(15);
        let outcome = fx.pets().check_challenge_completion(late);

        let pet = fx.registry.find_by_kind(AnimalKind::Duckling).unwrap();
        assert_eq!(outcome, Some(ChallengeOutcome::Failed(pet.id)));
        assert!(!pet.is_owned);
        assert_eq!(pet.banked_progress, 800);
    }

    #[test]
    fn test_abandon_banks_ten_percent_and_cools_down() {
        let mut fx = Fixture::new();
        fx.pets().start_challenge(AnimalKind::BabyGiraffe, t0());
        fx.pets().add_challenge_progress(1_999);
        assert!(fx.pets().abandon_challenge(t0()));

        let pet = fx.registry.find_by_kind(AnimalKind::BabyGiraffe).unwrap().clone();
        assert_eq!(pet.banked_progress, 199);
        assert_eq!(pet.unlock_progress, 0);
        assert_eq!(pet.unlock_deadline, None);
        assert_eq!(pet.cooldown_until, Some(t0() + Duration::days(14)));
        assert!(!fx.registry.has_active_challenge());

        let listing = fx
            .registry
            .available_pets()
            .into_iter()
            .find(|l| l.kind == AnimalKind::BabyGiraffe)
            .unwrap();
        assert_eq!(listing.pet_id, Some(pet.id));
        assert_eq!(listing.banked_progress, 199);
        assert!(listing.is_on_cooldown(t0()));
    }

    #[test]
    fn test_abandon_without_challenge_fails() {
        let mut fx = Fixture::new();
        assert!(!fx.pets().abandon_challenge(t0()));
        assert!(!fx.pets().complete_challenge(t0()));
    }

    #[test]
    fn test_out_of_range_durations_refuse_without_panic() {
        let mut fx = Fixture::new();
        fx.rules.challenge_duration_days = 1_000_000_000;
        assert!(!fx.pets().start_challenge(AnimalKind::Duckling, t0()));
        assert!(!fx.registry.has_active_challenge());
        assert!(fx.registry.find_by_kind(AnimalKind::Duckling).is_none());

        fx.rules.challenge_duration_days = 14;
        fx.rules.cooldown_duration_days = 1_000_000_000;
        assert!(fx.pets().start_challenge(AnimalKind::Duckling, t0()));
        fx.pets().add_challenge_progress(500);
        assert!(!fx.pets().abandon_challenge(t0()));

        // Expiry cannot resolve either, so the challenge stays as it was.
        let late = t0() + Duration::days(15);
        assert_eq!(fx.pets().check_challenge_completion(late), None);
        let pet = fx.registry.active_challenge().unwrap();
        assert_eq!(pet.unlock_progress, 500);
        assert_eq!(pet.cooldown_until, None);
    }

    #[test]
    fn test_restart_after_cooldown_reuses_record() {
        let mut fx = Fixture::new();
        fx.pets().start_challenge(AnimalKind::Duckling, t0());
        let first_id = fx.registry.active_challenge().unwrap().id;
        fx.pets().add_challenge_progress(3_000);
        fx.pets().abandon_challenge(t0());

        let during = t0() + Duration::days(13);
        assert!(matches!(
            fx.pets().challenge_refusal(AnimalKind::Duckling, during),
            Some(ChallengeRefusal::OnCooldown { .. })
        ));
        assert!(!fx.pets().start_challenge(AnimalKind::Duckling, during));

        let after = t0() + Duration::days(14);
        assert!(fx.pets().start_challenge(AnimalKind::Duckling, after));
        let pet = fx.registry.active_challenge().unwrap();
        assert_eq!(pet.id, first_id);
        assert_eq!(pet.unlock_progress, 300);
        assert_eq!(pet.cooldown_until, None);
        assert_eq!(fx.registry.records().len(), 1);
    }

    #[test]
    fn test_registry_stays_valid_through_lifecycle() {
        let mut fx = Fixture::new();
        fx.pets().select_main_pet(AnimalKind::Bunny, "Clover", t0());
        fx.pets().start_challenge(AnimalKind::Duckling, t0());
        fx.pets().add_challenge_progress(8_000);
        fx.pets().check_challenge_completion(t0());
        fx.pets().start_challenge(AnimalKind::BabyPanda, t0());
        fx.pets().abandon_challenge(t0());
        assert!(fx.registry.validate().is_empty(), "{:?}", fx.registry.validate());
        assert_eq!(fx.registry.owned_pets().len(), 2);
        assert_eq!(fx.registry.total_daily_requirement(), 800);
    }
}
