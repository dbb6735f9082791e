//! The set of pet records and the views published from it.
//!
//! Records are never deleted. Every change goes through
//! [`PetRegistry::commit`], which stores the new record, updates the active
//! challenge slot, and republishes every view as a fresh snapshot, so a
//! subscriber never sees a half-applied transition.
//!
//! Views:
//!
//! | View | Contents |
//! |------|----------|
//! | `all_pets` | every record, in creation order |
//! | `owned_pets` | owned records, main pet first, then by unlock time |
//! | `active_challenge` | the record in the single challenge slot |
//! | `available_pets` | challenge kinds neither owned nor active, with banked/cooldown data |
//! | `main_pet` | the onboarding pet |
//! | `current_pet_index` | which owned pet the player is looking at |

use std::collections::HashMap;

use crate::catalog::{AnimalCatalog, AnimalInfo, AnimalKind};
use crate::pet::{PetId, PetListing, PetRecord};
use crate::reactive::{ReadOnly, Reactive};

/// Observable handles onto the registry views.
#[derive(Debug, Clone)]
pub struct RegistrySignals {
    pub all_pets: ReadOnly<Vec<PetRecord>>,
    pub owned_pets: ReadOnly<Vec<PetRecord>>,
    pub active_challenge: ReadOnly<Option<PetRecord>>,
    pub available_pets: ReadOnly<Vec<PetListing>>,
    pub main_pet: ReadOnly<Option<PetRecord>>,
    pub current_pet_index: ReadOnly<usize>,
}

/// A broken registry invariant, reported by [`PetRegistry::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryViolation {
    #[error("{0} records have an unlock deadline")]
    MultipleChallenges(usize),
    #[error("owned pet {0} still has an unlock deadline")]
    OwnedWithDeadline(PetId),
    #[error("owned pet {0} has leftover unlock progress")]
    OwnedWithProgress(PetId),
    #[error("{0} records are marked as main pet")]
    MultipleMainPets(usize),
    #[error("main pet {0} is not owned")]
    MainPetNotOwned(PetId),
    #[error("active slot {0} does not point at a challenging record")]
    DanglingActiveSlot(PetId),
    #[error("challenging record {0} is not in the active slot")]
    UntrackedChallenge(PetId),
}

#[derive(Debug)]
pub struct PetRegistry {
    roster: Vec<AnimalInfo>,
    records: Vec<PetRecord>,
    index: HashMap<PetId, usize>,
    active: Option<PetId>,
    all_pets: Reactive<Vec<PetRecord>>,
    owned_pets: Reactive<Vec<PetRecord>>,
    active_challenge: Reactive<Option<PetRecord>>,
    available_pets: Reactive<Vec<PetListing>>,
    main_pet: Reactive<Option<PetRecord>>,
    current_pet_index: Reactive<usize>,
}

impl PetRegistry {
    /// An empty registry offering every challenge pet in `catalog`.
    pub fn new(catalog: &AnimalCatalog) -> Self {
        let roster: Vec<AnimalInfo> = catalog.challenge_pets().cloned().collect();
        let available = roster.iter().map(PetListing::from_info).collect();
        Self {
            roster,
            records: Vec::new(),
            index: HashMap::new(),
            active: None,
            all_pets: Reactive::new(Vec::new()),
            owned_pets: Reactive::new(Vec::new()),
            active_challenge: Reactive::new(None),
            available_pets: Reactive::new(available),
            main_pet: Reactive::new(None),
            current_pet_index: Reactive::new(0),
        }
    }

    pub fn signals(&self) -> RegistrySignals {
        RegistrySignals {
            all_pets: self.all_pets.read_only(),
            owned_pets: self.owned_pets.read_only(),
            active_challenge: self.active_challenge.read_only(),
            available_pets: self.available_pets.read_only(),
            main_pet: self.main_pet.read_only(),
            current_pet_index: self.current_pet_index.read_only(),
        }
    }

    // ── Lookups ─────────────────────────────────────────────────────────

    pub fn get(&self, id: PetId) -> Option<&PetRecord> {
        self.index.get(&id).map(|&i| &self.records[i])
    }

    pub fn find_by_kind(&self, kind: AnimalKind) -> Option<&PetRecord> {
        self.records.iter().find(|r| r.kind == kind)
    }

    pub fn records(&self) -> &[PetRecord] {
        &self.records
    }

    pub fn active_challenge(&self) -> Option<&PetRecord> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn has_active_challenge(&self) -> bool {
        self.active.is_some()
    }

    pub fn main_pet(&self) -> Option<&PetRecord> {
        self.records.iter().find(|r| r.is_main_pet)
    }

    pub fn owned_pets(&self) -> Vec<PetRecord> {
        self.owned_pets.get()
    }

    pub fn available_pets(&self) -> Vec<PetListing> {
        self.available_pets.get()
    }

    pub fn is_owned(&self, kind: AnimalKind) -> bool {
        self.records.iter().any(|r| r.kind == kind && r.is_owned)
    }

    /// Sum of daily requirements over owned pets.
    pub fn total_daily_requirement(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| r.is_owned)
            .map(|r| r.daily_requirement)
            .sum()
    }

    pub fn current_pet_index(&self) -> usize {
        self.current_pet_index.get()
    }

    pub fn current_pet(&self) -> Option<PetRecord> {
        self.owned_pets
            .with(|owned| owned.get(self.current_pet_index.get()).cloned())
    }

    // ── Mutation (pet coordinator only) ─────────────────────────────────

    /// Insert or replace `record`, point the active slot at `active`, and
    /// publish.
    pub(crate) fn commit(&mut self, record: PetRecord, active: Option<PetId>) {
        match self.index.get(&record.id) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.id, self.records.len());
                self.records.push(record);
            }
        }
        self.active = active;
        self.publish();
    }

    pub(crate) fn navigate_to(&mut self, index: usize) -> bool {
        let count = self.owned_pets.with(Vec::len);
        if index >= count {
            return false;
        }
        self.current_pet_index.set(index);
        true
    }

    /// Step the current index by `delta`, wrapping around the owned list.
    pub(crate) fn navigate_by(&mut self, delta: isize) -> bool {
        let count = self.owned_pets.with(Vec::len) as isize;
        if count == 0 {
            return false;
        }
        let current = self.current_pet_index.get() as isize;
        let next = (current + delta).rem_euclid(count) as usize;
        self.current_pet_index.set(next);
        true
    }

    fn publish(&mut self) {
        let mut owned: Vec<PetRecord> = self.records.iter().filter(|r| r.is_owned).cloned().collect();
        // Main pet first, then oldest unlock; never-unlocked records last.
        owned.sort_by_key(|r| (!r.is_main_pet, r.unlocked_at.is_none(), r.unlocked_at));

        let active = self.active_challenge().cloned();
        let available: Vec<PetListing> = self
            .roster
            .iter()
            .filter_map(|info| match self.find_by_kind(info.kind) {
                Some(r) if r.is_owned || Some(r.id) == self.active => None,
                Some(r) => Some(PetListing::from_record(r)),
                None => Some(PetListing::from_info(info)),
            })
            .collect();
        let main = self.main_pet().cloned();

        let owned_count = owned.len();
        self.all_pets.replace(self.records.clone());
        self.owned_pets.set(owned);
        self.active_challenge.set(active);
        self.available_pets.set(available);
        self.main_pet.set(main);

        let index = self.current_pet_index.get();
        if index >= owned_count {
            self.current_pet_index.set(owned_count.saturating_sub(1));
        }
    }

    // ── Invariants ──────────────────────────────────────────────────────

    /// Check every registry invariant, returning all violations found.
    pub fn validate(&self) -> Vec<RegistryViolation> {
        let mut violations = Vec::new();

        let challenging: Vec<&PetRecord> = self
            .records
            .iter()
            .filter(|r| r.unlock_deadline.is_some())
            .collect();
        if challenging.len() > 1 {
            violations.push(RegistryViolation::MultipleChallenges(challenging.len()));
        }
        for r in &challenging {
            if Some(r.id) != self.active {
                violations.push(RegistryViolation::UntrackedChallenge(r.id));
            }
        }
        if let Some(id) = self.active {
            if !self.get(id).is_some_and(PetRecord::is_challenging) {
                violations.push(RegistryViolation::DanglingActiveSlot(id));
            }
        }

        for r in self.records.iter().filter(|r| r.is_owned) {
            if r.unlock_deadline.is_some() {
                violations.push(RegistryViolation::OwnedWithDeadline(r.id));
            }
            if r.unlock_progress != 0 {
                violations.push(RegistryViolation::OwnedWithProgress(r.id));
            }
        }

        let mains: Vec<&PetRecord> = self.records.iter().filter(|r| r.is_main_pet).collect();
        if mains.len() > 1 {
            violations.push(RegistryViolation::MultipleMainPets(mains.len()));
        }
        for r in mains.iter().filter(|r| !r.is_owned) {
            violations.push(RegistryViolation::MainPetNotOwned(r.id));
        }

        violations
    }
}
