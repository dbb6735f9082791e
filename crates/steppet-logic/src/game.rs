//! Application state root.
//!
//! [`GameState`] owns one ledger, one registry, the config and the clock
//! for a session. Presentation code reads through [`GameState::ledger_signals`]
//! and [`GameState::registry_signals`] and writes only through the command
//! methods here, which build short-lived coordinators over the owned state.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use steppet_logic::catalog::AnimalKind;
//! use steppet_logic::clock::ManualClock;
//! use steppet_logic::config::GameConfig;
//! use steppet_logic::game::GameState;
//!
//! let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap());
//! let mut game = GameState::new(GameConfig::default(), clock).unwrap();
//! game.bootstrap();
//! assert!(game.select_main_pet(AnimalKind::Puppy, "Buddy"));
//! assert_eq!(game.ledger().daily_quota(), 300);
//!
//! game.record_steps(450);
//! assert_eq!(game.process_overflow(), 150);
//! assert_eq!(game.ledger().wallet(), 150);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{AnimalKind, UnknownAnimal};
use crate::clock::Clock;
use crate::config::{validate_config, GameConfig, LoadError};
use crate::economy::EconomyCoordinator;
use crate::ledger::{EconomyLedger, LedgerSignals, LedgerSnapshot};
use crate::pet::{PetId, PetListing, PetRecord};
use crate::pets::{ChallengeOutcome, ChallengeRefusal, PetCoordinator};
use crate::registry::{PetRegistry, RegistrySignals};

/// Serializable picture of a whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub taken_at: DateTime<Utc>,
    pub ledger: LedgerSnapshot,
    pub pets: Vec<PetRecord>,
    pub available: Vec<PetListing>,
    pub active_challenge: Option<PetId>,
}

pub struct GameState {
    config: GameConfig,
    clock: Box<dyn Clock>,
    ledger: EconomyLedger,
    registry: PetRegistry,
}

impl GameState {
    /// Build a session from a validated config.
    pub fn new(config: GameConfig, clock: impl Clock + 'static) -> Result<Self, LoadError> {
        let errors = validate_config(&config);
        if !errors.is_empty() {
            return Err(LoadError::Invalid(errors));
        }
        let today = config.rules.day_of(clock.now());
        let ledger = EconomyLedger::new(today);
        let registry = PetRegistry::new(&config.catalog);
        Ok(Self {
            config,
            clock: Box::new(clock),
            ledger,
            registry,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn ledger(&self) -> &EconomyLedger {
        &self.ledger
    }

    pub fn registry(&self) -> &PetRegistry {
        &self.registry
    }

    pub fn ledger_signals(&self) -> LedgerSignals {
        self.ledger.signals()
    }

    pub fn registry_signals(&self) -> RegistrySignals {
        self.registry.signals()
    }

    fn economy(&mut self) -> EconomyCoordinator<'_> {
        EconomyCoordinator::new(
            &mut self.ledger,
            PetCoordinator::new(&mut self.registry, &self.config.catalog, &self.config.rules),
            &self.config.rules,
        )
    }

    fn pets(&mut self) -> PetCoordinator<'_> {
        PetCoordinator::new(&mut self.registry, &self.config.catalog, &self.config.rules)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Session start.
    pub fn bootstrap(&mut self) {
        log::info!("session start at {}", self.now());
        self.resume();
    }

    /// App came back to the foreground: catch up on day changes, the
    /// quota, and the active challenge.
    pub fn resume(&mut self) {
        self.check_day_rollover();
        self.economy().sync_daily_quota_from_pets();
        self.check_challenge_completion();
    }

    // ── Economy commands ────────────────────────────────────────────────

    /// Record a step delta from the step source, then resolve the active
    /// challenge if the new progress finished it. Returns the overflow
    /// forwarded to the challenge.
    pub fn record_steps(&mut self, n: i64) -> u64 {
        let forwarded = self.economy().record_steps(n);
        if forwarded > 0 {
            self.check_challenge_completion();
        }
        forwarded
    }

    pub fn process_overflow(&mut self) -> u64 {
        self.economy().process_overflow()
    }

    pub fn try_spend_food(&mut self, n: i64) -> bool {
        self.economy().try_spend_food(n)
    }

    pub fn check_day_rollover(&mut self) -> bool {
        let now = self.now();
        self.economy().check_day_rollover(now)
    }

    // ── Pet commands ────────────────────────────────────────────────────

    pub fn select_main_pet(&mut self, kind: AnimalKind, name: &str) -> bool {
        let now = self.now();
        let mut economy = self.economy();
        let created = economy.pets().select_main_pet(kind, name, now);
        if created {
            economy.sync_daily_quota_from_pets();
        }
        created
    }

    /// [`GameState::select_main_pet`] for a textual kind key.
    pub fn select_main_pet_by_key(&mut self, key: &str, name: &str) -> Result<bool, UnknownAnimal> {
        let kind: AnimalKind = key.parse()?;
        Ok(self.select_main_pet(kind, name))
    }

    pub fn challenge_refusal(&mut self, kind: AnimalKind) -> Option<ChallengeRefusal> {
        let now = self.now();
        self.pets().challenge_refusal(kind, now)
    }

    pub fn start_challenge(&mut self, kind: AnimalKind) -> bool {
        let now = self.now();
        self.pets().start_challenge(kind, now)
    }

    /// [`GameState::start_challenge`] for a textual kind key.
    pub fn start_challenge_by_key(&mut self, key: &str) -> Result<bool, UnknownAnimal> {
        let kind: AnimalKind = key.parse()?;
        Ok(self.start_challenge(kind))
    }

    pub fn abandon_challenge(&mut self) -> bool {
        let now = self.now();
        let mut economy = self.economy();
        let abandoned = economy.pets().abandon_challenge(now);
        if abandoned {
            economy.sync_daily_quota_from_pets();
        }
        abandoned
    }

    pub fn check_challenge_completion(&mut self) -> Option<ChallengeOutcome> {
        let now = self.now();
        let mut economy = self.economy();
        let outcome = economy.pets().check_challenge_completion(now);
        if outcome.is_some() {
            economy.sync_daily_quota_from_pets();
        }
        outcome
    }

    pub fn navigate_to_pet(&mut self, index: usize) -> bool {
        self.pets().navigate_to_pet(index)
    }

    pub fn navigate_to_next_pet(&mut self) -> bool {
        self.pets().navigate_to_next_pet()
    }

    pub fn navigate_to_previous_pet(&mut self) -> bool {
        self.pets().navigate_to_previous_pet()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            taken_at: self.now(),
            ledger: self.ledger.snapshot(),
            pets: self.registry.records().to_vec(),
            available: self.registry.available_pets(),
            active_challenge: self.registry.active_challenge().map(|r| r.id),
        }
    }
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("now", &self.now())
            .field("ledger", &self.ledger)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
