//! Achievement catalog and unlock evaluation.
//!
//! The engine only enforces "claim once per id". Whether an achievement
//! is unlocked is evaluated here, against the counter its `metric` names.

use crate::progress::PlayerProgress;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementMetric {
    TotalClicks,
    Coins,
    UpgradesPurchased,
}

impl AchievementMetric {
    /// Legacy selection by id prefix, for catalog entries without a metric.
    pub fn from_id_prefix(id: &str) -> Self {
        if id.starts_with("clicks") {
            Self::TotalClicks
        } else if id.starts_with("coins") {
            Self::Coins
        } else {
            Self::UpgradesPurchased
        }
    }

    pub fn read(&self, progress: &PlayerProgress) -> f64 {
        match self {
            Self::TotalClicks       => progress.total_clicks as f64,
            Self::Coins             => progress.coins,
            Self::UpgradesPurchased => progress.total_upgrades_purchased as f64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id:           EntityId,
    pub name:         String,
    pub description:  String,
    #[serde(default)]
    pub metric:       Option<AchievementMetric>,
    pub requirement:  f64,
    pub reward_coins: f64,
    #[serde(rename = "rewardXP")]
    pub reward_xp:    u64,
}

impl Achievement {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        metric: AchievementMetric,
        requirement: f64,
        reward_coins: f64,
        reward_xp: u64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            metric: Some(metric),
            requirement,
            reward_coins,
            reward_xp,
        }
    }

    pub fn effective_metric(&self) -> AchievementMetric {
        self.metric
            .unwrap_or_else(|| AchievementMetric::from_id_prefix(&self.id))
    }

    pub fn is_met(&self, progress: &PlayerProgress) -> bool {
        self.effective_metric().read(progress) >= self.requirement
    }

    /// Amount still missing before the requirement is met ("N to go").
    pub fn remaining(&self, progress: &PlayerProgress) -> f64 {
        (self.requirement - self.effective_metric().read(progress)).max(0.0)
    }
}

/// Achievements whose requirement is met and which have not been claimed.
pub fn claimable<'a>(catalog: &'a [Achievement], progress: &PlayerProgress) -> Vec<&'a Achievement> {
    catalog
        .iter()
        .filter(|a| !progress.unlocked_achievements.contains(&a.id))
        .filter(|a| a.is_met(progress))
        .collect()
}

pub fn default_achievements() -> Vec<Achievement> {
    use AchievementMetric::*;
    vec![
        Achievement::new("clicks_100",  "Beginner Clicker",   "Click 100 times",                TotalClicks,       100.0,   500.0,  100),
        Achievement::new("clicks_1000", "Dedicated Clicker",  "Click 1,000 times",              TotalClicks,       1000.0,  2000.0, 300),
        Achievement::new("coins_10000", "$KNYE Hoarder",      "Accumulate 10,000 $KNYE coins",  Coins,             10000.0, 1000.0, 200),
        Achievement::new("upgrades_5",  "Upgrade Enthusiast", "Purchase 5 upgrades",            UpgradesPurchased, 5.0,     1500.0, 250),
    ]
}
