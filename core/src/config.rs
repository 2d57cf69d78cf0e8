//! Game configuration: economy constants and catalogs.
//!
//! Built-in defaults describe the shipped game. A JSON file may override
//! any subset of fields; everything it omits keeps the default.

use crate::{
    achievement::{default_achievements, Achievement},
    error::{GameError, GameResult},
    types::{EntityId, TimestampMs},
    upgrade::{default_click_upgrades, default_passive_upgrades, Upgrade},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const HOUR_MS: TimestampMs = 60 * 60 * 1000;
pub const DAY_MS:  TimestampMs = 24 * HOUR_MS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub base_coins_per_click:  f64,
    pub starting_energy:       f64,
    pub starting_max_energy:   f64,
    pub starting_energy_regen: f64,
    pub referral_reward:       f64,
    pub task_reward:           f64,
    pub click:                 ClickConfig,
    pub drop_game:             DropGameConfig,
    pub daily:                 DailyConfig,
    pub quiz:                  QuizConfig,
    pub wallet:                WalletConfig,
    pub click_upgrades:        Vec<Upgrade>,
    pub passive_upgrades:      Vec<Upgrade>,
    pub achievements:          Vec<Achievement>,
    pub tasks:                 Vec<TaskConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_coins_per_click:  0.1,
            starting_energy:       100.0,
            starting_max_energy:   100.0,
            starting_energy_regen: 1.0,
            referral_reward:       1000.0,
            task_reward:           500.0,
            click:                 ClickConfig::default(),
            drop_game:             DropGameConfig::default(),
            daily:                 DailyConfig::default(),
            quiz:                  QuizConfig::default(),
            wallet:                WalletConfig::default(),
            click_upgrades:        default_click_upgrades(),
            passive_upgrades:      default_passive_upgrades(),
            achievements:          default_achievements(),
            tasks:                 default_tasks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    pub cooldown_ms: TimestampMs,
    pub energy_cost: f64,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self { cooldown_ms: 200, energy_cost: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DropGameConfig {
    pub cooldown_ms:          TimestampMs,
    pub duration_secs:        u32,
    pub spawn_interval_ms:    TimestampMs,
    pub bomb_chance:          f64,
    /// Probability that a non-bomb item is a microphone.
    pub mic_chance:           f64,
    pub item_lifetime_min_ms: TimestampMs,
    pub item_lifetime_max_ms: TimestampMs,
    pub catch_energy_cost:    f64,
    pub combo_window_ms:      TimestampMs,
    pub max_combo:            u32,
    pub mic_score:            u64,
    pub disc_score:           u64,
    pub coins_per_point:      f64,
}

impl Default for DropGameConfig {
    fn default() -> Self {
        Self {
            cooldown_ms:          2 * HOUR_MS,
            duration_secs:        60,
            spawn_interval_ms:    500,
            bomb_chance:          0.15,
            mic_chance:           0.7,
            item_lifetime_min_ms: 1_000,
            item_lifetime_max_ms: 2_000,
            catch_energy_cost:    5.0,
            combo_window_ms:      1_000,
            max_combo:            5,
            mic_score:            1,
            disc_score:           2,
            coins_per_point:      10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyConfig {
    pub cooldown_ms:      TimestampMs,
    pub reward_min:       u64,
    pub reward_max:       u64,
    /// Experience granted by the daily reward (not the daily bonus).
    pub reward_xp:        u64,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DAY_MS,
            reward_min:  100,
            reward_max:  1000,
            reward_xp:   50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub albums:      Vec<String>,
    pub options:     usize,
    pub reward:      f64,
    pub cooldown_ms: TimestampMs,
}

impl Default for QuizConfig {
    fn default() -> Self {
        let albums = [
            "The College Dropout",
            "Late Registration",
            "Graduation",
            "808s & Heartbreak",
            "My Beautiful Dark Twisted Fantasy",
            "Yeezus",
            "The Life of Pablo",
            "ye",
            "Jesus Is King",
            "Donda",
        ];
        Self {
            albums:      albums.iter().map(|s| s.to_string()).collect(),
            options:     4,
            reward:      500.0,
            cooldown_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub min_withdrawal:     u64,
    pub currency:           String,
    pub connect_latency_ms: u64,
    pub withdraw_latency_ms: u64,
    pub balance_latency_ms: u64,
    /// Simulated balances are drawn from [0, max_balance).
    pub max_balance:        u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            min_withdrawal:      10_000,
            currency:            "$KNYE".into(),
            connect_latency_ms:  1_500,
            withdraw_latency_ms: 2_000,
            balance_latency_ms:  1_000,
            max_balance:         10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskConfig {
    pub id:   EntityId,
    pub name: String,
}

fn default_tasks() -> Vec<TaskConfig> {
    [
        ("telegram", "Subscribe to Telegram Channel"),
        ("twitter",  "Follow on Twitter"),
        ("discord",  "Join Discord Server"),
    ]
    .iter()
    .map(|(id, name)| TaskConfig { id: id.to_string(), name: name.to_string() })
    .collect()
}

impl GameConfig {
    /// Load a JSON override file. Fields it omits keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read game config {path}"))?;
        let config: GameConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse game config {path}"))?;
        config.validate()?;
        log::info!(
            "Loaded game config from {path}: {} click upgrades, {} passive upgrades, {} achievements",
            config.click_upgrades.len(),
            config.passive_upgrades.len(),
            config.achievements.len()
        );
        Ok(config)
    }

    /// Defaults with every simulated latency removed.
    pub fn default_test() -> Self {
        let mut config = Self::default();
        config.wallet.connect_latency_ms = 0;
        config.wallet.withdraw_latency_ms = 0;
        config.wallet.balance_latency_ms = 0;
        config
    }

    pub fn validate(&self) -> GameResult<()> {
        let invalid = |reason: String| Err(GameError::InvalidConfig { reason });

        let mut names = HashSet::new();
        for upgrade in self.click_upgrades.iter().chain(&self.passive_upgrades) {
            if !names.insert(upgrade.name.as_str()) {
                return invalid(format!("duplicate upgrade name '{}'", upgrade.name));
            }
            if upgrade.cost_multiplier < 1.0 || upgrade.effect_multiplier < 1.0 {
                return invalid(format!("upgrade '{}' has a shrinking multiplier", upgrade.name));
            }
        }

        let mut ids = HashSet::new();
        for achievement in &self.achievements {
            if !ids.insert(achievement.id.as_str()) {
                return invalid(format!("duplicate achievement id '{}'", achievement.id));
            }
        }

        if self.daily.reward_min > self.daily.reward_max {
            return invalid(format!(
                "daily reward range {}..={} is empty",
                self.daily.reward_min, self.daily.reward_max
            ));
        }
        if self.quiz.options < 2 || self.quiz.options > self.quiz.albums.len() {
            return invalid(format!(
                "quiz needs between 2 and {} options, got {}",
                self.quiz.albums.len(),
                self.quiz.options
            ));
        }
        let drop = &self.drop_game;
        if drop.spawn_interval_ms <= 0 {
            return invalid(format!(
                "drop game spawn interval must be positive, got {}",
                drop.spawn_interval_ms
            ));
        }
        if drop.item_lifetime_min_ms < 0 {
            return invalid(format!(
                "drop game item lifetime must not be negative, got {}",
                drop.item_lifetime_min_ms
            ));
        }
        if drop.item_lifetime_min_ms > drop.item_lifetime_max_ms {
            return invalid("drop game item lifetime range is empty".into());
        }
        if drop.max_combo == 0 {
            return invalid("drop game max combo must be at least 1".into());
        }
        Ok(())
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }
}
