//! Shared primitive types used across the whole game core.

/// A game tick. One tick = 100 ms of game time.
pub type Tick = u64;

/// Wall-clock time in epoch milliseconds.
pub type TimestampMs = i64;

/// Stable identifier for achievements, tasks and similar catalog entries.
pub type EntityId = String;

/// Identifier of one play session (one engine lifetime).
pub type SessionId = String;
