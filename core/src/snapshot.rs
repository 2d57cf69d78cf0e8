//! Snapshot serialization: PlayerProgress to/from the persisted JSON record.
//!
//! The record has no version field. Decoding is tolerant: every field may
//! be missing or null and falls back to its default, then the result is
//! reconciled against the current catalog so derived values stay consistent.

use crate::{
    config::GameConfig,
    error::GameResult,
    progress::PlayerProgress,
    types::{EntityId, TimestampMs},
    upgrade::Upgrade,
};
use serde::{Deserialize, Serialize};

/// Store key holding the serialized progress record.
pub const PROGRESS_KEY: &str = "clickerState";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressSnapshot {
    pub coins:                    Option<f64>,
    pub coins_per_click:          Option<f64>,
    pub coins_per_second:         Option<f64>,
    pub click_upgrades:           Option<Vec<SavedUpgrade>>,
    pub passive_upgrades:         Option<Vec<SavedUpgrade>>,
    pub wallet_address:           Option<String>,
    pub referrals:                Option<Vec<String>>,
    pub completed_tasks:          Option<Vec<EntityId>>,
    pub unlocked_achievements:    Option<Vec<EntityId>>,
    pub total_clicks:             Option<u64>,
    pub total_upgrades_purchased: Option<u64>,
    pub total_upgrades_cost:      Option<f64>,
    pub total_play_time:          Option<u64>,
    pub first_play_timestamp:     Option<TimestampMs>,
    pub last_drop_game_timestamp: Option<TimestampMs>,
    pub energy:                   Option<f64>,
    pub max_energy:               Option<f64>,
    pub energy_regen_rate:        Option<f64>,
    pub experience:               Option<u64>,
}

/// One saved upgrade. Only the name is required; older records carry
/// no base values at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedUpgrade {
    pub name:              String,
    #[serde(default)]
    pub base_cost:         Option<f64>,
    #[serde(default)]
    pub cost:              Option<f64>,
    #[serde(default)]
    pub base_effect:       Option<f64>,
    #[serde(default)]
    pub effect:            Option<f64>,
    #[serde(default)]
    pub level:             Option<u32>,
    #[serde(default)]
    pub max_level:         Option<u32>,
    #[serde(default)]
    pub cost_multiplier:   Option<f64>,
    #[serde(default)]
    pub effect_multiplier: Option<f64>,
}

impl From<&Upgrade> for SavedUpgrade {
    fn from(u: &Upgrade) -> Self {
        Self {
            name:              u.name.clone(),
            base_cost:         Some(u.base_cost),
            cost:              Some(u.cost),
            base_effect:       Some(u.base_effect),
            effect:            Some(u.effect),
            level:             Some(u.level),
            max_level:         Some(u.max_level),
            cost_multiplier:   Some(u.cost_multiplier),
            effect_multiplier: Some(u.effect_multiplier),
        }
    }
}

impl From<&PlayerProgress> for ProgressSnapshot {
    fn from(p: &PlayerProgress) -> Self {
        Self {
            coins:                    Some(p.coins),
            coins_per_click:          Some(p.coins_per_click),
            coins_per_second:         Some(p.coins_per_second),
            click_upgrades:           Some(p.click_upgrades.iter().map(SavedUpgrade::from).collect()),
            passive_upgrades:         Some(p.passive_upgrades.iter().map(SavedUpgrade::from).collect()),
            wallet_address:           p.wallet_address.clone(),
            referrals:                Some(p.referrals.clone()),
            completed_tasks:          Some(p.completed_tasks.clone()),
            unlocked_achievements:    Some(p.unlocked_achievements.clone()),
            total_clicks:             Some(p.total_clicks),
            total_upgrades_purchased: Some(p.total_upgrades_purchased),
            total_upgrades_cost:      Some(p.total_upgrades_cost),
            total_play_time:          Some(p.total_play_time_secs),
            first_play_timestamp:     Some(p.first_play_timestamp),
            last_drop_game_timestamp: Some(p.last_drop_game_timestamp),
            energy:                   Some(p.energy),
            max_energy:               Some(p.max_energy),
            energy_regen_rate:        Some(p.energy_regen_rate),
            experience:               Some(p.experience),
        }
    }
}

pub fn encode(progress: &PlayerProgress) -> GameResult<String> {
    Ok(serde_json::to_string(&ProgressSnapshot::from(progress))?)
}

/// Parse and reconcile a stored record. Fails only on unparsable JSON.
pub fn decode(json: &str, config: &GameConfig, now_ms: TimestampMs) -> GameResult<PlayerProgress> {
    let snapshot: ProgressSnapshot = serde_json::from_str(json)?;
    Ok(snapshot.reconcile(config, now_ms))
}

impl ProgressSnapshot {
    /// Fill defaults for missing fields and restore invariants.
    pub fn reconcile(self, config: &GameConfig, now_ms: TimestampMs) -> PlayerProgress {
        let defaults = PlayerProgress::new(config, now_ms);
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

        let max_energy = finite(self.max_energy).unwrap_or(defaults.max_energy).max(0.0);
        let mut progress = PlayerProgress {
            coins:                    finite(self.coins).unwrap_or(0.0).max(0.0),
            coins_per_click:          defaults.coins_per_click,
            coins_per_second:         defaults.coins_per_second,
            click_upgrades:           reconcile_upgrades(&config.click_upgrades, self.click_upgrades),
            passive_upgrades:         reconcile_upgrades(&config.passive_upgrades, self.passive_upgrades),
            energy:                   finite(self.energy).unwrap_or(defaults.energy).clamp(0.0, max_energy),
            max_energy,
            energy_regen_rate:        finite(self.energy_regen_rate).unwrap_or(defaults.energy_regen_rate),
            total_clicks:             self.total_clicks.unwrap_or(0),
            total_upgrades_purchased: self.total_upgrades_purchased.unwrap_or(0),
            total_upgrades_cost:      finite(self.total_upgrades_cost).unwrap_or(0.0),
            total_play_time_secs:     self.total_play_time.unwrap_or(0),
            first_play_timestamp:     self.first_play_timestamp.unwrap_or(now_ms),
            last_drop_game_timestamp: self.last_drop_game_timestamp.unwrap_or(0),
            wallet_address:           self.wallet_address.filter(|a| !a.is_empty()),
            referrals:                self.referrals.unwrap_or_default(),
            completed_tasks:          self.completed_tasks.unwrap_or_default(),
            unlocked_achievements:    self.unlocked_achievements.unwrap_or_default(),
            experience:               self.experience.unwrap_or(0),
        };
        progress.recompute_rates(config.base_coins_per_click);

        if let Some(saved) = finite(self.coins_per_click) {
            if (saved - progress.coins_per_click).abs() > 1e-9 {
                log::debug!(
                    "coins_per_click drifted in snapshot: saved={saved} recomputed={}",
                    progress.coins_per_click
                );
            }
        }
        progress
    }
}

/// Match saved upgrades to the catalog by name, in catalog order.
/// Catalog entries the record lacks start fresh; unknown names are dropped.
fn reconcile_upgrades(catalog: &[Upgrade], saved: Option<Vec<SavedUpgrade>>) -> Vec<Upgrade> {
    let saved = saved.unwrap_or_default();
    for s in &saved {
        if !catalog.iter().any(|c| c.name == s.name) {
            log::warn!("Dropping unknown upgrade '{}' from snapshot", s.name);
        }
    }

    catalog
        .iter()
        .map(|entry| {
            let mut upgrade = entry.clone();
            let Some(s) = saved.iter().find(|s| s.name == entry.name) else {
                return upgrade;
            };
            if let Some(v) = s.base_cost         { upgrade.base_cost = v; }
            if let Some(v) = s.base_effect       { upgrade.base_effect = v; }
            if let Some(v) = s.cost_multiplier   { upgrade.cost_multiplier = v; }
            if let Some(v) = s.effect_multiplier { upgrade.effect_multiplier = v; }

            let level = s.level.unwrap_or(0);
            match (s.cost, s.effect) {
                (Some(cost), Some(effect)) if level <= upgrade.max_level => {
                    upgrade.level = level;
                    upgrade.cost = cost;
                    upgrade.effect = effect;
                    if s.base_effect.is_none() {
                        upgrade.base_effect =
                            effect / upgrade.effect_multiplier.powi(level as i32);
                    }
                }
                _ => {
                    if level > upgrade.max_level {
                        log::warn!(
                            "Upgrade '{}' saved at level {level} above max {}; clamping",
                            upgrade.name,
                            upgrade.max_level
                        );
                    }
                    upgrade.replay_to(level);
                }
            }
            upgrade
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig::default_test()
    }

    #[test]
    fn floats_survive_encoding_exactly() {
        let mut p = PlayerProgress::new(&config(), 7);
        p.coins = 930_984_805.660_425_1;
        p.energy = 99.900_000_000_000_01;
        let fashion = p.passive_upgrades.iter_mut().find(|u| u.name == "Fashion Line").unwrap();
        fashion.replay_to(2);
        p.recompute_rates(config().base_coins_per_click);

        let restored = decode(&encode(&p).unwrap(), &config(), 0).unwrap();
        assert_eq!(restored.coins.to_bits(), p.coins.to_bits());
        assert_eq!(restored, p);
    }

    #[test]
    fn empty_object_yields_defaults() {
        let p = decode("{}", &config(), 42).unwrap();
        assert_eq!(p, PlayerProgress::new(&config(), 42));
    }

    #[test]
    fn nulls_fall_back_to_defaults() {
        let p = decode(r#"{"coins":null,"energy":null,"walletAddress":null}"#, &config(), 0).unwrap();
        assert_eq!(p.coins, 0.0);
        assert_eq!(p.energy, 100.0);
        assert!(p.wallet_address.is_none());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode("not json", &config(), 0).is_err());
    }

    #[test]
    fn legacy_upgrade_without_base_values_is_rebuilt() {
        let json = r#"{"clickUpgrades":[{"name":"Microphone","cost":91,"effect":0.12,"level":1,
                        "maxLevel":20,"costMultiplier":1.5,"effectMultiplier":1.2}]}"#;
        let p = decode(json, &config(), 0).unwrap();
        let mic = &p.click_upgrades[0];
        assert_eq!(mic.level, 1);
        assert_eq!(mic.cost, 91.0);
        assert!((mic.base_effect - 0.1).abs() < 1e-9);
        assert!((p.coins_per_click - 0.2).abs() < 1e-9);
        assert_eq!(p.click_upgrades.len(), 3);
    }

    #[test]
    fn level_above_max_is_clamped() {
        let json = r#"{"passiveUpgrades":[{"name":"Power Nap","level":9,"cost":1,"effect":1}]}"#;
        let p = decode(json, &config(), 0).unwrap();
        let nap = p.passive_upgrades.iter().find(|u| u.name == "Power Nap").unwrap();
        assert_eq!(nap.level, nap.max_level);
    }

    #[test]
    fn unknown_upgrades_are_dropped() {
        let json = r#"{"clickUpgrades":[{"name":"Autotune","level":3}]}"#;
        let p = decode(json, &config(), 0).unwrap();
        assert!(p.click_upgrades.iter().all(|u| u.name != "Autotune"));
        assert!(p.click_upgrades.iter().all(|u| u.level == 0));
    }

    #[test]
    fn energy_is_clamped_into_range() {
        let p = decode(r#"{"energy":250,"maxEnergy":120}"#, &config(), 0).unwrap();
        assert_eq!(p.energy, 120.0);
        let p = decode(r#"{"energy":-4}"#, &config(), 0).unwrap();
        assert_eq!(p.energy, 0.0);
    }

    #[test]
    fn encoded_record_uses_camel_case_keys() {
        let json = encode(&PlayerProgress::new(&config(), 7)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in [
            "coins", "coinsPerClick", "coinsPerSecond", "clickUpgrades", "passiveUpgrades",
            "walletAddress", "referrals", "completedTasks", "totalClicks",
            "totalUpgradesPurchased", "totalUpgradesCost", "totalPlayTime",
            "firstPlayTimestamp", "lastDropGameTimestamp", "energy", "maxEnergy",
            "energyRegenRate", "unlockedAchievements", "experience",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }
}
