//! Animal kinds and their static economy numbers.
//!
//! The catalog maps each [`AnimalKind`] to its daily food requirement and
//! unlock goal. Starter pets (goal 0) are chosen at onboarding; everything
//! else is earned through an unlock challenge.
//!
//! Parsing a kind from text is the one place an unknown key can enter the
//! system, so it fails hard:
//!
//! ```
//! use steppet_logic::catalog::AnimalKind;
//!
//! assert_eq!("Duckling".parse::<AnimalKind>().unwrap(), AnimalKind::Duckling);
//! assert!("Dragon".parse::<AnimalKind>().is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every animal the game knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnimalKind {
    // Starters
    Puppy,
    Kitten,
    Bunny,
    // Unlock challenge pets
    Duckling,
    BabyGiraffe,
    BabyElephant,
    BabyPenguin,
    BabyPanda,
}

impl AnimalKind {
    pub const ALL: [AnimalKind; 8] = [
        AnimalKind::Puppy,
        AnimalKind::Kitten,
        AnimalKind::Bunny,
        AnimalKind::Duckling,
        AnimalKind::BabyGiraffe,
        AnimalKind::BabyElephant,
        AnimalKind::BabyPenguin,
        AnimalKind::BabyPanda,
    ];

    /// Stable key used in config files and command input.
    pub fn key(&self) -> &'static str {
        match self {
            AnimalKind::Puppy => "Puppy",
            AnimalKind::Kitten => "Kitten",
            AnimalKind::Bunny => "Bunny",
            AnimalKind::Duckling => "Duckling",
            AnimalKind::BabyGiraffe => "BabyGiraffe",
            AnimalKind::BabyElephant => "BabyElephant",
            AnimalKind::BabyPenguin => "BabyPenguin",
            AnimalKind::BabyPanda => "BabyPanda",
        }
    }
}

impl fmt::Display for AnimalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An animal key that is not in [`AnimalKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown animal kind: {0:?}")]
pub struct UnknownAnimal(pub String);

impl FromStr for AnimalKind {
    type Err = UnknownAnimal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        AnimalKind::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| UnknownAnimal(s.to_string()))
    }
}

/// Static numbers for one animal kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalInfo {
    pub kind: AnimalKind,
    pub display_name: String,
    /// Food needed per day once owned.
    pub daily_requirement: u64,
    /// Total progress needed to unlock. 0 marks a starter pet.
    pub unlock_goal: u64,
}

impl AnimalInfo {
    pub fn new(kind: AnimalKind, display_name: &str, daily_requirement: u64, unlock_goal: u64) -> Self {
        Self {
            kind,
            display_name: display_name.to_string(),
            daily_requirement,
            unlock_goal,
        }
    }

    pub fn is_starter(&self) -> bool {
        self.unlock_goal == 0
    }
}

/// Keyed lookup of [`AnimalInfo`], iterated in [`AnimalKind`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AnimalInfo>", into = "Vec<AnimalInfo>")]
pub struct AnimalCatalog {
    entries: BTreeMap<AnimalKind, AnimalInfo>,
}

impl AnimalCatalog {
    pub fn new(entries: impl IntoIterator<Item = AnimalInfo>) -> Self {
        Self {
            entries: entries.into_iter().map(|info| (info.kind, info)).collect(),
        }
    }

    pub fn get(&self, kind: AnimalKind) -> Option<&AnimalInfo> {
        self.entries.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimalInfo> {
        self.entries.values()
    }

    /// Kinds offered at onboarding.
    pub fn starters(&self) -> impl Iterator<Item = &AnimalInfo> {
        self.iter().filter(|info| info.is_starter())
    }

    /// Kinds that can only be earned through a challenge.
    pub fn challenge_pets(&self) -> impl Iterator<Item = &AnimalInfo> {
        self.iter().filter(|info| !info.is_starter())
    }

    /// Kinds with no entry in this catalog.
    pub fn missing_kinds(&self) -> Vec<AnimalKind> {
        AnimalKind::ALL
            .into_iter()
            .filter(|kind| !self.entries.contains_key(kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AnimalCatalog {
    fn default() -> Self {
        Self::new([
            AnimalInfo::new(AnimalKind::Puppy, "Puppy", 300, 0),
            AnimalInfo::new(AnimalKind::Kitten, "Kitten", 300, 0),
            AnimalInfo::new(AnimalKind::Bunny, "Bunny", 400, 0),
            AnimalInfo::new(AnimalKind::Duckling, "Duckling", 400, 8_000),
            AnimalInfo::new(AnimalKind::BabyGiraffe, "Baby Giraffe", 600, 15_000),
            AnimalInfo::new(AnimalKind::BabyElephant, "Baby Elephant", 800, 20_000),
            AnimalInfo::new(AnimalKind::BabyPenguin, "Baby Penguin", 700, 25_000),
            AnimalInfo::new(AnimalKind::BabyPanda, "Baby Panda", 1_000, 35_000),
        ])
    }
}

impl From<Vec<AnimalInfo>> for AnimalCatalog {
    fn from(entries: Vec<AnimalInfo>) -> Self {
        Self::new(entries)
    }
}

impl From<AnimalCatalog> for Vec<AnimalInfo> {
    fn from(catalog: AnimalCatalog) -> Self {
        catalog.entries.into_values().collect()
    }
}
