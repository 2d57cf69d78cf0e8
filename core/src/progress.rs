//! PlayerProgress: the complete mutable progression state.
//!
//! RULE: Only the engine mutates a PlayerProgress that belongs to a
//! running session. Everything here is plain data plus the derived-rate
//! recomputation, which is the canonical source of `coins_per_click`
//! and `coins_per_second`.

use crate::{
    config::GameConfig,
    types::{EntityId, TimestampMs},
    upgrade::{total_contribution, PassiveTarget, Upgrade},
};

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProgress {
    pub coins:                    f64,
    pub coins_per_click:          f64,
    pub coins_per_second:         f64,
    pub click_upgrades:           Vec<Upgrade>,
    pub passive_upgrades:         Vec<Upgrade>,
    pub energy:                   f64,
    pub max_energy:               f64,
    pub energy_regen_rate:        f64,
    pub total_clicks:             u64,
    pub total_upgrades_purchased: u64,
    pub total_upgrades_cost:      f64,
    pub total_play_time_secs:     u64,
    pub first_play_timestamp:     TimestampMs,
    pub last_drop_game_timestamp: TimestampMs,
    pub wallet_address:           Option<String>,
    /// Referral codes in submission order. Duplicates are allowed.
    pub referrals:                Vec<String>,
    pub completed_tasks:          Vec<EntityId>,
    /// Achievements already claimed.
    pub unlocked_achievements:    Vec<EntityId>,
    pub experience:               u64,
}

impl PlayerProgress {
    /// Fresh progress for a first run.
    pub fn new(config: &GameConfig, now_ms: TimestampMs) -> Self {
        let mut progress = Self {
            coins:                    0.0,
            coins_per_click:          config.base_coins_per_click,
            coins_per_second:         0.0,
            click_upgrades:           config.click_upgrades.clone(),
            passive_upgrades:         config.passive_upgrades.clone(),
            energy:                   config.starting_energy,
            max_energy:               config.starting_max_energy,
            energy_regen_rate:        config.starting_energy_regen,
            total_clicks:             0,
            total_upgrades_purchased: 0,
            total_upgrades_cost:      0.0,
            total_play_time_secs:     0,
            first_play_timestamp:     now_ms,
            last_drop_game_timestamp: 0,
            wallet_address:           None,
            referrals:                Vec::new(),
            completed_tasks:          Vec::new(),
            unlocked_achievements:    Vec::new(),
            experience:               0,
        };
        progress.recompute_rates(config.base_coins_per_click);
        progress
    }

    /// Rebuild both aggregate rates from the upgrade collections.
    pub fn recompute_rates(&mut self, base_coins_per_click: f64) {
        self.coins_per_click = base_coins_per_click + total_contribution(&self.click_upgrades);
        self.coins_per_second = total_contribution(
            self.passive_upgrades
                .iter()
                .filter(|u| PassiveTarget::for_upgrade(&u.name) == PassiveTarget::Income),
        );
    }

    /// One energy regeneration step, capped at `max_energy`.
    pub fn regenerate_energy(&mut self) {
        self.energy = (self.energy + self.energy_regen_rate).min(self.max_energy);
    }

    pub fn has_completed_task(&self, task_id: &str) -> bool {
        self.completed_tasks.iter().any(|t| t == task_id)
    }

    pub fn has_unlocked(&self, achievement_id: &str) -> bool {
        self.unlocked_achievements.iter().any(|a| a == achievement_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_progress_uses_config_defaults() {
        let config = GameConfig::default_test();
        let p = PlayerProgress::new(&config, 1_234);
        assert_eq!(p.coins, 0.0);
        assert!((p.coins_per_click - 0.1).abs() < 1e-12);
        assert_eq!(p.coins_per_second, 0.0);
        assert_eq!(p.energy, 100.0);
        assert_eq!(p.max_energy, 100.0);
        assert_eq!(p.energy_regen_rate, 1.0);
        assert_eq!(p.first_play_timestamp, 1_234);
        assert_eq!(p.last_drop_game_timestamp, 0);
        assert!(p.wallet_address.is_none());
    }

    #[test]
    fn energy_upgrades_do_not_feed_income() {
        let config = GameConfig::default_test();
        let mut p = PlayerProgress::new(&config, 0);
        for upgrade in &mut p.passive_upgrades {
            if PassiveTarget::for_upgrade(&upgrade.name) != PassiveTarget::Income {
                upgrade.level_up();
            }
        }
        p.recompute_rates(config.base_coins_per_click);
        assert_eq!(p.coins_per_second, 0.0);
    }

    #[test]
    fn regeneration_caps_at_max() {
        let config = GameConfig::default_test();
        let mut p = PlayerProgress::new(&config, 0);
        p.energy = 99.5;
        p.regenerate_energy();
        assert_eq!(p.energy, 100.0);
        p.regenerate_energy();
        assert_eq!(p.energy, 100.0);
    }
}
