//! The economy engine: sole owner and mutator of PlayerProgress.
//!
//! TICK ORDER (fixed, documented, never reordered):
//!   1. Advance the clock by one 100 ms tick.
//!   2. Passive income: coins += coins_per_second / 10.
//!   3. On second boundaries only:
//!      a. Energy regeneration, capped at max_energy.
//!      b. Play time += 1 second.
//!   4. Persist the snapshot if anything changed.
//!
//! RULES:
//!   - Gameplay operations are total: invalid requests are no-ops that
//!     return false/None, never errors.
//!   - Every mutation is followed by a snapshot save. Save failures are
//!     logged and never surfaced to the caller.
//!   - Aggregate rates are recomputed from the upgrade collections on
//!     every purchase; they are never adjusted incrementally.
//!   - All randomness flows through the RngBank.

use crate::{
    achievement::{self, Achievement},
    clock::GameClock,
    config::GameConfig,
    error::GameResult,
    event::{EventLogEntry, GameEvent, UpgradeKind},
    progress::PlayerProgress,
    rng::{FeatureRng, RngBank, RngSlot},
    store::GameStore,
    types::{SessionId, Tick, TimestampMs},
    upgrade::{PassiveTarget, Upgrade},
};

/// Fixed start time for test engines: 2023-11-14T22:13:20Z.
pub const TEST_EPOCH_MS: TimestampMs = 1_700_000_000_000;

pub struct GameEngine {
    pub session_id:          SessionId,
    pub clock:               GameClock,
    pub config:              GameConfig,
    pub store:               GameStore,
    pub(crate) progress:     PlayerProgress,
    pub(crate) rng_bank:     RngBank,
    pub(crate) bonus_rng:    FeatureRng,
    pub(crate) reward_rng:   FeatureRng,
    pub(crate) drop_rng:     FeatureRng,
    pub(crate) quiz_rng:     FeatureRng,
}

impl GameEngine {
    /// A fresh engine with default progress. Does not touch stored state.
    pub fn new(
        session_id: SessionId,
        seed: u64,
        config: GameConfig,
        store: GameStore,
        start_ms: TimestampMs,
    ) -> Self {
        let rng_bank = RngBank::new(seed);
        Self {
            clock:      GameClock::new(session_id.clone(), start_ms),
            progress:   PlayerProgress::new(&config, start_ms),
            bonus_rng:  rng_bank.for_slot(RngSlot::DailyBonus),
            reward_rng: rng_bank.for_slot(RngSlot::DailyReward),
            drop_rng:   rng_bank.for_slot(RngSlot::DropGame),
            quiz_rng:   rng_bank.for_slot(RngSlot::AlbumQuiz),
            rng_bank,
            config,
            store,
            session_id,
        }
    }

    /// Build a session: register it, rehydrate stored progress, and save
    /// the reconciled result. Call this instead of new() + load().
    pub fn build(
        session_id: SessionId,
        seed: u64,
        config: GameConfig,
        store: GameStore,
        start_ms: TimestampMs,
    ) -> GameResult<Self> {
        config.validate()?;
        store.insert_session(&session_id, seed, env!("CARGO_PKG_VERSION"), start_ms)?;
        let mut engine = GameEngine::new(session_id, seed, config, store, start_ms);
        let restored = engine.load()?;
        engine.save()?;
        engine.record(GameEvent::SessionStarted {
            session_id: engine.session_id.clone(),
            seed,
            restored,
        });
        log::info!(
            "Session {} started (seed={seed}, restored={restored}, coins={:.2})",
            engine.session_id,
            engine.progress.coins
        );
        Ok(engine)
    }

    /// In-memory store, test config, fixed start time.
    pub fn build_test(session_id: SessionId, seed: u64) -> GameResult<Self> {
        let store = GameStore::in_memory()?;
        store.migrate()?;
        Self::build(session_id, seed, GameConfig::default_test(), store, TEST_EPOCH_MS)
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Replace in-memory progress with the stored snapshot, if any.
    /// Returns whether a snapshot was restored.
    pub fn load(&mut self) -> GameResult<bool> {
        match self.store.load_progress(&self.config, self.clock.now_ms)? {
            Some(progress) => {
                self.progress = progress;
                Ok(true)
            }
            None => {
                self.progress = PlayerProgress::new(&self.config, self.clock.now_ms);
                Ok(false)
            }
        }
    }

    pub fn save(&self) -> GameResult<()> {
        self.store.save_progress(&self.progress, self.clock.now_ms)
    }

    /// Fire-and-forget save after a mutation.
    pub(crate) fn persist(&self) {
        if let Err(e) = self.save() {
            log::error!("Failed to save game state: {e}");
        }
    }

    pub(crate) fn record(&self, event: GameEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(p) => p,
            Err(e) => {
                log::error!("Failed to encode {} event: {e}", event.type_name());
                return;
            }
        };
        let entry = EventLogEntry {
            id:         None,
            session_id: self.session_id.clone(),
            tick:       self.clock.current_tick,
            event_type: event.type_name().to_string(),
            payload,
        };
        if let Err(e) = self.store.append_event(&entry) {
            log::error!("Failed to append {} event: {e}", entry.event_type);
        }
    }

    // ── Read access ────────────────────────────────────────────

    pub fn progress(&self) -> &PlayerProgress {
        &self.progress
    }

    pub fn now_ms(&self) -> TimestampMs {
        self.clock.now_ms
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    pub fn events(&self) -> GameResult<Vec<EventLogEntry>> {
        self.store.events_for_session(&self.session_id)
    }

    // ── Coins ──────────────────────────────────────────────────

    /// coins += amount. Negative or non-finite amounts are ignored.
    pub fn add_coins(&mut self, amount: f64) {
        if !(amount.is_finite() && amount >= 0.0) {
            log::debug!("add_coins ignored invalid amount {amount}");
            return;
        }
        self.progress.coins += amount;
        self.persist();
    }

    /// coins = max(0, coins - amount). Never goes negative.
    pub fn remove_coins(&mut self, amount: f64) {
        if !(amount.is_finite() && amount >= 0.0) {
            log::debug!("remove_coins ignored invalid amount {amount}");
            return;
        }
        self.progress.coins = (self.progress.coins - amount).max(0.0);
        self.persist();
    }

    // ── Clicks and energy ──────────────────────────────────────

    /// Count one click. Coin and energy effects are separate calls.
    pub fn record_click(&mut self) {
        self.progress.total_clicks += 1;
        self.persist();
    }

    /// Spend energy if enough is available.
    pub fn use_energy(&mut self, amount: f64) -> bool {
        if !(amount.is_finite() && amount >= 0.0) || self.progress.energy < amount {
            return false;
        }
        self.progress.energy -= amount;
        self.persist();
        true
    }

    // ── Upgrades ───────────────────────────────────────────────

    pub fn purchase_click_upgrade(&mut self, index: usize) -> bool {
        self.purchase(UpgradeKind::Click, index)
    }

    pub fn purchase_passive_upgrade(&mut self, index: usize) -> bool {
        self.purchase(UpgradeKind::Passive, index)
    }

    fn purchase(&mut self, kind: UpgradeKind, index: usize) -> bool {
        let coins = self.progress.coins;
        let upgrades = match kind {
            UpgradeKind::Click   => &mut self.progress.click_upgrades,
            UpgradeKind::Passive => &mut self.progress.passive_upgrades,
        };
        let Some(upgrade) = upgrades.get_mut(index) else {
            log::debug!("purchase {kind:?}[{index}] ignored: no such upgrade");
            return false;
        };
        if !upgrade.can_afford(coins) {
            log::debug!(
                "purchase '{}' rejected: coins={coins:.2} cost={} level={}/{}",
                upgrade.name,
                upgrade.cost,
                upgrade.level,
                upgrade.max_level
            );
            return false;
        }

        let cost = upgrade.cost;
        let effect_before = upgrade.effect;
        upgrade.level_up();
        let Upgrade { name, level, .. } = upgrade.clone();

        self.progress.coins -= cost;
        self.progress.total_upgrades_cost += cost;
        self.progress.total_upgrades_purchased += 1;
        self.progress.recompute_rates(self.config.base_coins_per_click);

        if kind == UpgradeKind::Passive {
            match PassiveTarget::for_upgrade(&name) {
                PassiveTarget::MaxEnergy   => self.progress.max_energy += effect_before,
                PassiveTarget::EnergyRegen => self.progress.energy_regen_rate += effect_before,
                PassiveTarget::Income      => {}
            }
        }

        log::debug!(
            "tick={} bought '{name}' level {level} for {cost}: cpc={:.3} cps={:.3}",
            self.clock.current_tick,
            self.progress.coins_per_click,
            self.progress.coins_per_second
        );
        self.persist();
        self.record(GameEvent::UpgradePurchased { kind, name, level, cost });
        true
    }

    // ── Social, tasks, achievements ────────────────────────────

    /// Record a referral code and pay the referral reward.
    /// The same code may be submitted more than once.
    pub fn add_referral(&mut self, code: &str) {
        let reward = self.config.referral_reward;
        self.progress.referrals.push(code.to_string());
        self.add_coins(reward);
        self.record(GameEvent::ReferralAdded { code: code.to_string(), reward });
    }

    /// Mark a task completed and pay the task reward.
    /// A task already completed is a no-op.
    pub fn complete_task(&mut self, task_id: &str) -> bool {
        if self.progress.has_completed_task(task_id) {
            return false;
        }
        let reward = self.config.task_reward;
        self.progress.completed_tasks.push(task_id.to_string());
        self.add_coins(reward);
        self.record(GameEvent::TaskCompleted { task_id: task_id.to_string(), reward });
        true
    }

    /// Claim an achievement's reward, once per id. The unlock condition
    /// is not checked here; see [`GameEngine::claimable_achievements`].
    pub fn claim_achievement(&mut self, achievement_id: &str) -> bool {
        if self.progress.has_unlocked(achievement_id) {
            return false;
        }
        let Some(achievement) = self.config.achievement(achievement_id) else {
            log::debug!("claim_achievement ignored unknown id '{achievement_id}'");
            return false;
        };
        let reward_coins = achievement.reward_coins;
        let reward_xp = achievement.reward_xp;

        self.progress.unlocked_achievements.push(achievement_id.to_string());
        self.progress.experience += reward_xp;
        self.add_coins(reward_coins);
        self.record(GameEvent::AchievementClaimed {
            achievement_id: achievement_id.to_string(),
            reward_coins,
            reward_xp,
        });
        true
    }

    pub fn claimable_achievements(&self) -> Vec<&Achievement> {
        achievement::claimable(&self.config.achievements, &self.progress)
    }

    pub(crate) fn add_experience(&mut self, amount: u64) {
        self.progress.experience += amount;
    }

    // ── Wallet ─────────────────────────────────────────────────

    pub fn set_wallet_address(&mut self, address: &str) -> bool {
        let address = address.trim();
        if address.is_empty() {
            return false;
        }
        self.progress.wallet_address = Some(address.to_string());
        self.persist();
        self.record(GameEvent::WalletConnected { address: address.to_string() });
        true
    }

    // ── Time ───────────────────────────────────────────────────

    /// Advance one tick. This is the core economy step.
    /// Panics if the clock is paused. The clock starts paused; drive it
    /// through [`GameEngine::run_ticks`] or resume `self.clock` first.
    pub fn tick(&mut self) -> Tick {
        let tick = self.clock.advance();
        let mut changed = false;

        if self.progress.coins_per_second > 0.0 {
            self.progress.coins += self.progress.coins_per_second / 10.0;
            changed = true;
        }

        if self.clock.is_second_boundary() {
            self.progress.regenerate_energy();
            self.progress.total_play_time_secs += 1;
            changed = true;
        }

        if changed {
            self.persist();
        }
        tick
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) {
        self.clock.resume();
        for _ in 0..n {
            self.tick();
        }
        self.clock.pause();
    }

    /// Let wall time pass without running the economy.
    pub fn skip_time(&mut self, ms: TimestampMs) {
        self.clock.skip(ms);
    }

    // ── Test support ───────────────────────────────────────────

    /// Direct state access for test setup. Production code never uses this.
    #[doc(hidden)]
    pub fn progress_mut_for_test(&mut self) -> &mut PlayerProgress {
        &mut self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> GameEngine {
        GameEngine::build_test("engine-unit".into(), 1).expect("test engine")
    }

    #[test]
    fn negative_amounts_are_ignored() {
        let mut e = engine();
        e.add_coins(10.0);
        e.add_coins(-5.0);
        e.remove_coins(-5.0);
        assert_eq!(e.progress().coins, 10.0);
    }

    #[test]
    fn out_of_range_index_is_a_no_op() {
        let mut e = engine();
        e.add_coins(1_000_000.0);
        assert!(!e.purchase_click_upgrade(99));
        assert!(!e.purchase_passive_upgrade(99));
        assert_eq!(e.progress().coins, 1_000_000.0);
    }

    #[test]
    fn passive_income_pays_in_tenths() {
        let mut e = engine();
        e.progress_mut_for_test().coins_per_second = 2.0;
        e.run_ticks(1);
        assert!((e.progress().coins - 0.2).abs() < 1e-9);
        e.run_ticks(9);
        assert!((e.progress().coins - 2.0).abs() < 1e-9);
    }

    #[test]
    fn play_time_counts_whole_seconds() {
        let mut e = engine();
        e.run_ticks(25);
        assert_eq!(e.progress().total_play_time_secs, 2);
        e.run_ticks(5);
        assert_eq!(e.progress().total_play_time_secs, 3);
    }

    #[test]
    fn rewards_are_credited_through_add_coins() {
        let mut e = engine();
        e.config.referral_reward = -1_000.0;
        e.config.task_reward = f64::NAN;
        e.add_referral("NEG");
        assert!(e.complete_task("telegram"));
        assert_eq!(e.progress().coins, 0.0);
        assert_eq!(e.progress().referrals.len(), 1);

        e.config.referral_reward = 1_000.0;
        e.add_referral("POS");
        assert_eq!(e.progress().coins, 1_000.0);
    }

    #[test]
    #[should_panic(expected = "paused clock")]
    fn tick_on_paused_clock_panics() {
        let mut e = engine();
        e.tick();
    }

    #[test]
    fn tick_after_resume_advances() {
        let mut e = engine();
        e.clock.resume();
        assert_eq!(e.tick(), 1);
        assert_eq!(e.now_ms(), TEST_EPOCH_MS + 100);
    }

    #[test]
    fn empty_wallet_address_rejected() {
        let mut e = engine();
        assert!(!e.set_wallet_address("   "));
        assert!(e.progress().wallet_address.is_none());
    }

    #[test]
    fn session_start_is_logged() {
        let e = engine();
        let events = e.events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "session_started");
    }
}
