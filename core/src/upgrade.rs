//! Upgrades: tiered purchases that raise per-click or per-second yield.
//!
//! An upgrade moves through `Locked → Leveled → Maxed` only by purchase.
//! Each purchase applies:
//!   cost'   = floor(cost * cost_multiplier^1.5)
//!   effect' = effect * effect_multiplier

use serde::{Deserialize, Serialize};

/// Exponent applied to the cost multiplier on every purchase.
pub const COST_GROWTH_EXPONENT: f64 = 1.5;

/// Passive upgrade that raises max energy instead of income.
pub const ENERGY_DRINK: &str = "Energy Drink";

/// Passive upgrade that raises energy regeneration instead of income.
pub const POWER_NAP: &str = "Power Nap";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub name:              String,
    pub base_cost:         f64,
    pub cost:              f64,
    /// Effect at level 1. Derived rates are computed from this.
    pub base_effect:       f64,
    /// Effect contributed by the next level.
    pub effect:            f64,
    pub level:             u32,
    pub max_level:         u32,
    pub cost_multiplier:   f64,
    pub effect_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStage {
    Locked,
    Leveled(u32),
    Maxed,
}

/// What a passive upgrade's effect feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassiveTarget {
    Income,
    MaxEnergy,
    EnergyRegen,
}

impl PassiveTarget {
    pub fn for_upgrade(name: &str) -> Self {
        match name {
            ENERGY_DRINK => Self::MaxEnergy,
            POWER_NAP    => Self::EnergyRegen,
            _            => Self::Income,
        }
    }
}

impl Upgrade {
    pub fn new(
        name: &str,
        cost: f64,
        effect: f64,
        max_level: u32,
        cost_multiplier: f64,
        effect_multiplier: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            base_cost: cost,
            cost,
            base_effect: effect,
            effect,
            level: 0,
            max_level,
            cost_multiplier,
            effect_multiplier,
        }
    }

    pub fn stage(&self) -> UpgradeStage {
        if self.level >= self.max_level {
            UpgradeStage::Maxed
        } else if self.level == 0 {
            UpgradeStage::Locked
        } else {
            UpgradeStage::Leveled(self.level)
        }
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.max_level
    }

    pub fn can_afford(&self, coins: f64) -> bool {
        coins >= self.cost && !self.is_maxed()
    }

    /// Advance one level. Caller has already checked affordability.
    pub(crate) fn level_up(&mut self) {
        debug_assert!(!self.is_maxed(), "level_up() on maxed upgrade {}", self.name);
        self.level += 1;
        self.cost = next_cost(self.cost, self.cost_multiplier);
        self.effect *= self.effect_multiplier;
    }

    /// Yield contributed at the current level:
    /// `base_effect * effect_multiplier^(level-1) * level`.
    pub fn contribution(&self) -> f64 {
        if self.level == 0 {
            return 0.0;
        }
        let level = self.level as f64;
        self.base_effect * self.effect_multiplier.powi(self.level as i32 - 1) * level
    }

    /// Cost and effect the upgrade would have after `level` purchases.
    /// Used to rebuild snapshots that predate the current catalog.
    pub(crate) fn replay_to(&mut self, level: u32) {
        self.level = 0;
        self.cost = self.base_cost;
        self.effect = self.base_effect;
        for _ in 0..level.min(self.max_level) {
            self.level_up();
        }
    }
}

pub fn next_cost(cost: f64, cost_multiplier: f64) -> f64 {
    (cost * cost_multiplier.powf(COST_GROWTH_EXPONENT)).floor()
}

/// Sum of contributions over leveled upgrades.
pub fn total_contribution<'a>(upgrades: impl IntoIterator<Item = &'a Upgrade>) -> f64 {
    upgrades.into_iter().map(Upgrade::contribution).sum()
}

pub fn default_click_upgrades() -> Vec<Upgrade> {
    vec![
        Upgrade::new("Microphone",     50.0,   0.1, 20, 1.5, 1.2),
        Upgrade::new("Gold Chain",     500.0,  0.5, 15, 1.8, 1.3),
        Upgrade::new("Designer Shoes", 5000.0, 2.0, 10, 2.2, 1.4),
    ]
}

pub fn default_passive_upgrades() -> Vec<Upgrade> {
    vec![
        Upgrade::new("Fan Base",     100.0,   0.05, 20, 1.6, 1.2),
        Upgrade::new("Record Deal",  1000.0,  0.2,  15, 1.9, 1.3),
        Upgrade::new("Fashion Line", 10000.0, 1.0,  10, 2.3, 1.4),
        Upgrade::new(ENERGY_DRINK,   500.0,   10.0, 10, 1.5, 1.2),
        Upgrade::new(POWER_NAP,      2000.0,  0.2,  5,  2.0, 1.5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn microphone_cost_after_first_level() {
        let mut mic = default_click_upgrades().remove(0);
        mic.level_up();
        assert_eq!(mic.level, 1);
        assert_eq!(mic.cost, 91.0);
        assert!((mic.effect - 0.12).abs() < 1e-12);
    }

    #[test]
    fn stage_transitions() {
        let mut nap = Upgrade::new(POWER_NAP, 10.0, 0.2, 2, 2.0, 1.5);
        assert_eq!(nap.stage(), UpgradeStage::Locked);
        nap.level_up();
        assert_eq!(nap.stage(), UpgradeStage::Leveled(1));
        nap.level_up();
        assert_eq!(nap.stage(), UpgradeStage::Maxed);
        assert!(!nap.can_afford(f64::MAX));
    }

    #[test]
    fn contribution_uses_level_one_effect() {
        let mut fan = Upgrade::new("Fan Base", 100.0, 0.05, 20, 1.6, 1.2);
        assert_eq!(fan.contribution(), 0.0);
        fan.level_up();
        assert!((fan.contribution() - 0.05).abs() < 1e-12);
        fan.level_up();
        assert!((fan.contribution() - 0.05 * 1.2 * 2.0).abs() < 1e-12);
    }

    #[test]
    fn replay_matches_sequential_purchases() {
        let mut bought = default_click_upgrades().remove(1);
        for _ in 0..4 {
            bought.level_up();
        }
        let mut replayed = default_click_upgrades().remove(1);
        replayed.replay_to(4);
        assert_eq!(bought, replayed);
    }

    #[test]
    fn passive_targets_by_name() {
        assert_eq!(PassiveTarget::for_upgrade(ENERGY_DRINK), PassiveTarget::MaxEnergy);
        assert_eq!(PassiveTarget::for_upgrade(POWER_NAP), PassiveTarget::EnergyRegen);
        assert_eq!(PassiveTarget::for_upgrade("Fan Base"), PassiveTarget::Income);
    }
}
