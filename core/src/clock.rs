//! Game clock: owns tick state, wall time, and pause.
//!
//! Every periodic timer of the game is expressed as a multiple of one
//! 100 ms tick. Wall time advances with ticks, so cooldowns measured in
//! milliseconds stay consistent with the tick-driven economy.

use crate::types::{SessionId, Tick, TimestampMs};
use serde::{Deserialize, Serialize};

/// Milliseconds of game time per tick.
pub const TICK_MS: TimestampMs = 100;

/// Ticks per second of game time.
pub const TICKS_PER_SECOND: Tick = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameClock {
    pub session_id:   SessionId,
    pub current_tick: Tick,
    pub now_ms:       TimestampMs,
    pub paused:       bool,
}

impl GameClock {
    pub fn new(session_id: SessionId, start_ms: TimestampMs) -> Self {
        Self {
            session_id,
            current_tick: 0,
            now_ms: start_ms,
            paused: true,
        }
    }

    /// Advance one tick. Returns the new tick number.
    /// Panics if called while paused. Callers must check.
    pub fn advance(&mut self) -> Tick {
        assert!(!self.paused, "advance() called on paused clock");
        self.current_tick += 1;
        self.now_ms += TICK_MS;
        self.current_tick
    }

    /// Move wall time forward without producing ticks.
    /// Models time that passes while the game is not running.
    pub fn skip(&mut self, ms: TimestampMs) {
        self.now_ms += ms.max(0);
    }

    /// True on ticks that close a full second of game time.
    pub fn is_second_boundary(&self) -> bool {
        self.current_tick > 0 && self.current_tick.is_multiple_of(TICKS_PER_SECOND)
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }
}

/// Current wall-clock time in epoch milliseconds.
pub fn wall_clock_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}
