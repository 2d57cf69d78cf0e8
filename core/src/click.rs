//! Click pad: the tap rate limiter in front of the engine.
//!
//! This is a presentation-side gate, not an engine invariant: the engine
//! will happily record clicks with no energy. The pad rejects taps during
//! a short cooldown after each accepted tap and when energy is too low.

use crate::{config::ClickConfig, engine::GameEngine, types::TimestampMs};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapOutcome {
    Accepted { earned: f64 },
    CoolingDown,
    NoEnergy,
}

#[derive(Debug, Clone)]
pub struct ClickPad {
    config:        ClickConfig,
    last_accepted: Option<TimestampMs>,
}

impl ClickPad {
    pub fn new(config: ClickConfig) -> Self {
        Self { config, last_accepted: None }
    }

    pub fn can_tap(&self, now_ms: TimestampMs) -> bool {
        self.last_accepted
            .is_none_or(|last| now_ms - last >= self.config.cooldown_ms)
    }

    pub fn tap(&mut self, engine: &mut GameEngine) -> TapOutcome {
        let now = engine.now_ms();
        if !self.can_tap(now) {
            return TapOutcome::CoolingDown;
        }
        if engine.progress().energy < self.config.energy_cost {
            return TapOutcome::NoEnergy;
        }

        let earned = engine.progress().coins_per_click;
        engine.record_click();
        engine.add_coins(earned);
        engine.use_energy(self.config.energy_cost);
        self.last_accepted = Some(now);
        TapOutcome::Accepted { earned }
    }
}
