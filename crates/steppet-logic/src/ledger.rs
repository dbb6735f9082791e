//! Daily step economy: wallet, today's progress, and the quota.
//!
//! The ledger only stores numbers and derives quota-met / overflow from
//! them. It never looks at the clock and never decides when a day ends;
//! the economy coordinator does both.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reactive::{ReadOnly, Reactive};

/// Smallest quota the ledger will hold, even with no pets owned.
pub const MIN_DAILY_QUOTA: u64 = 1;

/// Observable handles onto every ledger value.
#[derive(Debug, Clone)]
pub struct LedgerSignals {
    pub wallet: ReadOnly<u64>,
    pub today_steps: ReadOnly<u64>,
    pub daily_quota: ReadOnly<u64>,
    pub today_date: ReadOnly<NaiveDate>,
    pub lifetime_steps: ReadOnly<u64>,
    pub quota_met: ReadOnly<bool>,
    pub overflow: ReadOnly<u64>,
    pub steps_until_quota: ReadOnly<u64>,
}

/// Plain copy of the ledger for display or diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub wallet: u64,
    pub today_steps: u64,
    pub daily_quota: u64,
    pub today_date: NaiveDate,
    pub lifetime_steps: u64,
    pub quota_met: bool,
    pub overflow: u64,
    pub claimed_overflow: u64,
}

#[derive(Debug)]
pub struct EconomyLedger {
    wallet: Reactive<u64>,
    today_steps: Reactive<u64>,
    daily_quota: Reactive<u64>,
    today_date: Reactive<NaiveDate>,
    lifetime_steps: Reactive<u64>,
    quota_met: Reactive<bool>,
    overflow: Reactive<u64>,
    steps_until_quota: Reactive<u64>,
    /// Part of today's overflow already sent to a challenge or the wallet.
    claimed_overflow: u64,
}

impl EconomyLedger {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            wallet: Reactive::new(0),
            today_steps: Reactive::new(0),
            daily_quota: Reactive::new(MIN_DAILY_QUOTA),
            today_date: Reactive::new(today),
            lifetime_steps: Reactive::new(0),
            quota_met: Reactive::new(false),
            overflow: Reactive::new(0),
            steps_until_quota: Reactive::new(MIN_DAILY_QUOTA),
            claimed_overflow: 0,
        }
    }

    pub fn signals(&self) -> LedgerSignals {
        LedgerSignals {
            wallet: self.wallet.read_only(),
            today_steps: self.today_steps.read_only(),
            daily_quota: self.daily_quota.read_only(),
            today_date: self.today_date.read_only(),
            lifetime_steps: self.lifetime_steps.read_only(),
            quota_met: self.quota_met.read_only(),
            overflow: self.overflow.read_only(),
            steps_until_quota: self.steps_until_quota.read_only(),
        }
    }

    pub fn wallet(&self) -> u64 {
        self.wallet.get()
    }

    pub fn today_steps(&self) -> u64 {
        self.today_steps.get()
    }

    pub fn daily_quota(&self) -> u64 {
        self.daily_quota.get()
    }

    pub fn today_date(&self) -> NaiveDate {
        self.today_date.get()
    }

    pub fn lifetime_steps(&self) -> u64 {
        self.lifetime_steps.get()
    }

    pub fn is_quota_met(&self) -> bool {
        self.today_steps() >= self.daily_quota()
    }

    /// Steps beyond today's quota.
    pub fn overflow(&self) -> u64 {
        self.today_steps().saturating_sub(self.daily_quota())
    }

    pub fn steps_until_quota(&self) -> u64 {
        self.daily_quota().saturating_sub(self.today_steps())
    }

    /// Overflow not yet forwarded to a challenge or flushed to the wallet.
    pub fn unclaimed_overflow(&self) -> u64 {
        self.overflow().saturating_sub(self.claimed_overflow)
    }

    pub fn claimed_overflow(&self) -> u64 {
        self.claimed_overflow
    }

    /// Add `n` steps to today and lifetime. Non-positive `n` does nothing.
    pub fn add_steps(&mut self, n: i64) {
        if n <= 0 {
            return;
        }
        let n = n as u64;
        self.today_steps
            .set(self.today_steps.get().saturating_add(n));
        self.lifetime_steps
            .set(self.lifetime_steps.get().saturating_add(n));
        self.refresh_derived();
        log::debug!(
            "steps +{} -> {}/{} today, {} lifetime",
            n,
            self.today_steps(),
            self.daily_quota(),
            self.lifetime_steps()
        );
    }

    /// Replace the quota, clamped to [`MIN_DAILY_QUOTA`].
    ///
    /// Only quota synchronization from owned pets may call this.
    pub(crate) fn set_daily_quota(&mut self, quota: u64) {
        let quota = quota.max(MIN_DAILY_QUOTA);
        let previous = self.daily_quota.get();
        if self.daily_quota.set(quota) {
            log::debug!("daily quota {} -> {}", previous, quota);
        }
        // Claims cannot exceed the overflow that exists under the new quota.
        self.claimed_overflow = self.claimed_overflow.min(self.overflow());
        self.refresh_derived();
    }

    pub fn add_to_wallet(&mut self, n: i64) {
        if n > 0 {
            self.credit_wallet(n as u64);
        }
    }

    pub(crate) fn credit_wallet(&mut self, n: u64) {
        if n == 0 {
            return;
        }
        let previous = self.wallet.get();
        self.wallet.set(previous.saturating_add(n));
        log::debug!("wallet {} + {} = {}", previous, n, self.wallet.get());
    }

    /// Spend `n` from the wallet. Fails without change if `n` is not
    /// positive or the balance is short.
    pub fn try_spend_from_wallet(&mut self, n: i64) -> bool {
        if n <= 0 {
            return false;
        }
        let n = n as u64;
        let previous = self.wallet.get();
        if previous < n {
            return false;
        }
        self.wallet.set(previous - n);
        log::debug!("wallet {} - {} = {}", previous, n, previous - n);
        true
    }

    /// Start a new day: today's steps and claims go back to zero.
    pub fn reset_daily(&mut self, today: NaiveDate) {
        self.claimed_overflow = 0;
        self.today_steps.set(0);
        self.today_date.set(today);
        self.refresh_derived();
    }

    /// Mark `n` steps of today's overflow as spent.
    pub(crate) fn claim_overflow(&mut self, n: u64) {
        self.claimed_overflow = self.claimed_overflow.saturating_add(n);
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            wallet: self.wallet(),
            today_steps: self.today_steps(),
            daily_quota: self.daily_quota(),
            today_date: self.today_date(),
            lifetime_steps: self.lifetime_steps(),
            quota_met: self.is_quota_met(),
            overflow: self.overflow(),
            claimed_overflow: self.claimed_overflow,
        }
    }

    fn refresh_derived(&self) {
        self.quota_met.set(self.is_quota_met());
        self.overflow.set(self.overflow());
        self.steps_until_quota.set(self.steps_until_quota());
    }
}
