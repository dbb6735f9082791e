//! Progression core for StepPet.
//!
//! Walking fills a daily quota set by the pets the player owns; steps past
//! the quota either feed a timed unlock challenge for a new pet or land in
//! a food wallet. This crate holds that whole economy with no UI, storage,
//! or step-sensor code: presentation layers subscribe to the published
//! signals and call commands on [`game::GameState`].
//!
//! All state is single-threaded and owned by one `GameState` per session.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Animal kinds, display names, daily requirements, unlock goals |
//! | [`clock`] | Injectable time source (system and manual) |
//! | [`config`] | Progression rules, catalog loading, config validation |
//! | [`economy`] | Overflow routing, wallet spending, day rollover, quota sync |
//! | [`game`] | Session root: owns the state and exposes the command surface |
//! | [`ledger`] | Wallet, today's steps, quota, and derived quota/overflow values |
//! | [`pet`] | Pet records, status, and listings for the challenge picker |
//! | [`pets`] | Unlock challenge state machine and owned-pet navigation |
//! | [`reactive`] | Observable value container with disposable subscriptions |
//! | [`registry`] | Pet record store and the views published from it |

pub mod catalog;
pub mod clock;
pub mod config;
pub mod economy;
pub mod game;
pub mod ledger;
pub mod pet;
pub mod pets;
pub mod reactive;
pub mod registry;
