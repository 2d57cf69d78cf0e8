//! Daily bonus and daily reward.
//!
//! Both live outside PlayerProgress: each is keyed off its own stored
//! last-claim stamp. A claim is eligible once the cooldown has elapsed
//! since that stamp (or when nothing was ever claimed), pays a uniform
//! random integer in the configured range, and stamps the claim time
//! immediately.

use crate::{
    engine::GameEngine,
    event::GameEvent,
    types::TimestampMs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyClaim {
    Bonus,
    Reward,
}

impl DailyClaim {
    pub fn all() -> &'static [DailyClaim] {
        &[DailyClaim::Bonus, DailyClaim::Reward]
    }

    /// Store key of the last-claim stamp.
    pub fn store_key(&self) -> &'static str {
        match self {
            DailyClaim::Bonus  => "lastDailyBonusClaim",
            DailyClaim::Reward => "lastDailyRewardClaim",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DailyClaim::Bonus  => "daily_bonus",
            DailyClaim::Reward => "daily_reward",
        }
    }
}

impl GameEngine {
    /// Milliseconds until `claim` is available; 0 when eligible now.
    pub fn daily_remaining_ms(&self, claim: DailyClaim) -> TimestampMs {
        let last = match self.store.timestamp(claim.store_key()) {
            Ok(last) => last,
            Err(e) => {
                log::error!("Failed to read {}: {e}", claim.store_key());
                None
            }
        };
        match last {
            Some(last) => (self.config.daily.cooldown_ms - (self.now_ms() - last)).max(0),
            None => 0,
        }
    }

    pub fn daily_eligible(&self, claim: DailyClaim) -> bool {
        self.daily_remaining_ms(claim) == 0
    }

    /// Claim a daily payout. Returns the coins granted, or None while
    /// the cooldown is running.
    pub fn claim_daily(&mut self, claim: DailyClaim) -> Option<u64> {
        if !self.daily_eligible(claim) {
            return None;
        }
        let (lo, hi) = (self.config.daily.reward_min, self.config.daily.reward_max);
        let amount = match claim {
            DailyClaim::Bonus  => self.bonus_rng.range_inclusive(lo, hi),
            DailyClaim::Reward => self.reward_rng.range_inclusive(lo, hi),
        };
        let now = self.now_ms();

        if let Err(e) = self.store.set_timestamp(claim.store_key(), now) {
            log::error!("Failed to stamp {}: {e}", claim.store_key());
        }
        if claim == DailyClaim::Reward {
            self.add_experience(self.config.daily.reward_xp);
        }
        self.add_coins(amount as f64);
        self.record(GameEvent::DailyClaimed {
            kind: claim.name().to_string(),
            amount,
            claimed_at: now,
        });
        log::info!("{} claimed: {amount} coins", claim.name());
        Some(amount)
    }
}
