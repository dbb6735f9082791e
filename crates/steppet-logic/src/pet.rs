//! Pet records and the read-side views built from them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{AnimalInfo, AnimalKind};

/// Stable identifier of a pet record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PetId(Uuid);

impl PetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a record sits in the unlock lifecycle at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PetStatus {
    Owned,
    Challenging,
    /// Failed or abandoned recently; cannot be challenged yet.
    Cooldown,
    Available,
}

/// A pet, owned or in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetRecord {
    pub id: PetId,
    pub kind: AnimalKind,
    pub display_name: String,
    pub daily_requirement: u64,
    pub is_main_pet: bool,
    pub is_owned: bool,
    pub unlock_goal: u64,
    pub unlock_progress: u64,
    /// Progress carried over from failed attempts.
    pub banked_progress: u64,
    /// Set only while challenging.
    pub unlock_deadline: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl PetRecord {
    /// The player's first pet: owned from the start.
    pub fn main_pet(info: &AnimalInfo, name: &str, now: DateTime<Utc>) -> Self {
        let name = name.trim();
        Self {
            id: PetId::new(),
            kind: info.kind,
            display_name: if name.is_empty() {
                info.display_name.clone()
            } else {
                name.to_string()
            },
            daily_requirement: info.daily_requirement,
            is_main_pet: true,
            is_owned: true,
            unlock_goal: 0,
            unlock_progress: 0,
            banked_progress: 0,
            unlock_deadline: None,
            cooldown_until: None,
            unlocked_at: Some(now),
        }
    }

    /// A fresh, never-attempted challenge record.
    pub fn challenger(info: &AnimalInfo) -> Self {
        Self {
            id: PetId::new(),
            kind: info.kind,
            display_name: info.display_name.clone(),
            daily_requirement: info.daily_requirement,
            is_main_pet: false,
            is_owned: false,
            unlock_goal: info.unlock_goal,
            unlock_progress: 0,
            banked_progress: 0,
            unlock_deadline: None,
            cooldown_until: None,
            unlocked_at: None,
        }
    }

    pub fn is_challenging(&self) -> bool {
        !self.is_owned && self.unlock_deadline.is_some()
    }

    pub fn is_on_cooldown(&self, now: DateTime<Utc>) -> bool {
        !self.is_owned && self.cooldown_until.is_some_and(|until| until > now)
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.unlock_deadline.is_some_and(|deadline| now > deadline)
    }

    pub fn goal_reached(&self) -> bool {
        self.unlock_progress >= self.unlock_goal
    }

    pub fn status(&self, now: DateTime<Utc>) -> PetStatus {
        if self.is_owned {
            PetStatus::Owned
        } else if self.is_challenging() {
            PetStatus::Challenging
        } else if self.is_on_cooldown(now) {
            PetStatus::Cooldown
        } else {
            PetStatus::Available
        }
    }

    pub fn can_start_challenge(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == PetStatus::Available
    }
}

/// One entry of the available-pets list.
///
/// Kinds that were never attempted have no backing record yet, so
/// `pet_id` is `None` and the progress fields are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetListing {
    pub pet_id: Option<PetId>,
    pub kind: AnimalKind,
    pub display_name: String,
    pub daily_requirement: u64,
    pub unlock_goal: u64,
    pub banked_progress: u64,
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl PetListing {
    pub fn from_info(info: &AnimalInfo) -> Self {
        Self {
            pet_id: None,
            kind: info.kind,
            display_name: info.display_name.clone(),
            daily_requirement: info.daily_requirement,
            unlock_goal: info.unlock_goal,
            banked_progress: 0,
            cooldown_until: None,
        }
    }

    pub fn from_record(record: &PetRecord) -> Self {
        Self {
            pet_id: Some(record.id),
            kind: record.kind,
            display_name: record.display_name.clone(),
            daily_requirement: record.daily_requirement,
            unlock_goal: record.unlock_goal,
            banked_progress: record.banked_progress,
            cooldown_until: record.cooldown_until,
        }
    }

    pub fn is_on_cooldown(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.is_some_and(|until| until > now)
    }

    /// Fraction of the goal already banked (0.0–1.0).
    pub fn banked_fraction(&self) -> f32 {
        if self.unlock_goal == 0 {
            0.0
        } else {
            (self.banked_progress as f32 / self.unlock_goal as f32).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AnimalCatalog;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn duckling() -> PetRecord {
        let catalog = AnimalCatalog::default();
        PetRecord::challenger(catalog.get(AnimalKind::Duckling).unwrap())
    }

    #[test]
    fn test_main_pet_is_owned() {
        let catalog = AnimalCatalog::default();
        let pet = PetRecord::main_pet(catalog.get(AnimalKind::Puppy).unwrap(), "Buddy", t0());
        assert!(pet.is_owned && pet.is_main_pet);
        assert_eq!(pet.display_name, "Buddy");
        assert_eq!(pet.status(t0()), PetStatus::Owned);
        assert_eq!(pet.unlocked_at, Some(t0()));
    }

    #[test]
    fn test_blank_name_falls_back_to_catalog_name() {
        let catalog = AnimalCatalog::default();
        let pet = PetRecord::main_pet(catalog.get(AnimalKind::Bunny).unwrap(), "  ", t0());
        assert_eq!(pet.display_name, "Bunny");
    }

    #[test]
    fn test_status_progression() {
        let mut pet = duckling();
        assert_eq!(pet.status(t0()), PetStatus::Available);

        pet.unlock_deadline = Some(t0() + Duration::days(14));
        assert_eq!(pet.status(t0()), PetStatus::Challenging);
        assert!(!pet.deadline_passed(t0() + Duration::days(14)));
        assert!(pet.deadline_passed(t0() + Duration::days(14) + Duration::seconds(1)));

        pet.unlock_deadline = None;
        pet.cooldown_until = Some(t0() + Duration::days(14));
        assert_eq!(pet.status(t0()), PetStatus::Cooldown);
        assert!(!pet.can_start_challenge(t0()));
        assert!(pet.can_start_challenge(t0() + Duration::days(14)));
    }

    #[test]
    fn test_listing_banked_fraction() {
        let mut pet = duckling();
        pet.banked_progress = 2_000;
        let listing = PetListing::from_record(&pet);
        assert!((listing.banked_fraction() - 0.25).abs() < 0.001);
        assert_eq!(listing.pet_id, Some(pet.id));
    }
}
