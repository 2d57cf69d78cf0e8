//! Game events: the append-only record of discrete player actions.
//!
//! Continuous accrual (passive income, energy regeneration, play time)
//! is never logged; only actions a player took or a claim they made.

use crate::types::{EntityId, SessionId, Tick, TimestampMs};
use serde::{Deserialize, Serialize};

/// Variants are appended over time, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ── Session ────────────────────────────────────
    SessionStarted {
        session_id: SessionId,
        seed: u64,
        restored: bool,
    },

    // ── Economy ────────────────────────────────────
    UpgradePurchased {
        kind: UpgradeKind,
        name: String,
        level: u32,
        cost: f64,
    },
    ReferralAdded {
        code: String,
        reward: f64,
    },
    TaskCompleted {
        task_id: EntityId,
        reward: f64,
    },
    AchievementClaimed {
        achievement_id: EntityId,
        reward_coins: f64,
        reward_xp: u64,
    },
    DailyClaimed {
        kind: String,
        amount: u64,
        claimed_at: TimestampMs,
    },

    // ── Mini-games ─────────────────────────────────
    DropGameStarted {
        started_at: TimestampMs,
    },
    DropGameRewarded {
        score: u64,
        coins: f64,
    },
    QuizAnswered {
        correct: bool,
        reward: f64,
    },

    // ── Wallet ─────────────────────────────────────
    WalletConnected {
        address: String,
    },
    CoinsWithdrawn {
        address: String,
        amount: u64,
        transaction_id: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    Click,
    Passive,
}

impl GameEvent {
    /// Stable name used for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. }     => "session_started",
            Self::UpgradePurchased { .. }   => "upgrade_purchased",
            Self::ReferralAdded { .. }      => "referral_added",
            Self::TaskCompleted { .. }      => "task_completed",
            Self::AchievementClaimed { .. } => "achievement_claimed",
            Self::DailyClaimed { .. }       => "daily_claimed",
            Self::DropGameStarted { .. }    => "drop_game_started",
            Self::DropGameRewarded { .. }   => "drop_game_rewarded",
            Self::QuizAnswered { .. }       => "quiz_answered",
            Self::WalletConnected { .. }    => "wallet_connected",
            Self::CoinsWithdrawn { .. }     => "coins_withdrawn",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub session_id: SessionId,
    pub tick: Tick,
    pub event_type: String,
    pub payload: String, // JSON-serialized GameEvent
}

impl EventLogEntry {
    pub fn decode(&self) -> serde_json::Result<GameEvent> {
        serde_json::from_str(&self.payload)
    }
}
