//! Drop mini-game: catch falling items for coins, avoid bombs.
//!
//! Gating: playable once `now - last_drop_game_timestamp >= cooldown`.
//! Starting a game stamps the timestamp immediately, so quitting and
//! restarting cannot shorten the cooldown.
//!
//! A session runs on its own energy pool, seeded from the player's energy
//! and regenerating at the player's rate. It never writes back to
//! PlayerProgress; only the final coin reward does, through the engine.

use crate::{
    config::DropGameConfig,
    engine::GameEngine,
    event::GameEvent,
    rng::FeatureRng,
    types::TimestampMs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Mic,
    Disc,
    Bomb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallingItem {
    pub id:         u64,
    pub kind:       ItemKind,
    pub spawned_at: TimestampMs,
    /// The item has fallen out of reach at this time.
    pub expires_at: TimestampMs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropGameStatus {
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CatchOutcome {
    Scored { points: u64, combo: u32 },
    Bomb,
    NoEnergy,
    Missed,
    NotPlaying,
}

pub struct DropGameSession {
    pub status:         DropGameStatus,
    pub score:          u64,
    pub combo:          u32,
    pub time_left_secs: u32,
    pub energy:         f64,
    pub items:          Vec<FallingItem>,
    pub started_at:     TimestampMs,
    max_energy:         f64,
    energy_regen_rate:  f64,
    next_spawn_at:      TimestampMs,
    next_second_at:     TimestampMs,
    last_catch_at:      Option<TimestampMs>,
    next_item_id:       u64,
    config:             DropGameConfig,
    rng:                FeatureRng,
}

impl DropGameSession {
    pub fn new(
        config: DropGameConfig,
        started_at: TimestampMs,
        energy: f64,
        max_energy: f64,
        energy_regen_rate: f64,
        rng: FeatureRng,
    ) -> Self {
        Self {
            status: DropGameStatus::Playing,
            score: 0,
            combo: 0,
            time_left_secs: config.duration_secs,
            energy,
            items: Vec::new(),
            started_at,
            max_energy,
            energy_regen_rate,
            next_spawn_at: started_at + config.spawn_interval_ms,
            next_second_at: started_at + 1_000,
            last_catch_at: None,
            next_item_id: 1,
            config,
            rng,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status == DropGameStatus::GameOver
    }

    /// Coins the session pays out when claimed.
    pub fn earned_coins(&self) -> f64 {
        self.score as f64 * self.config.coins_per_point
    }

    /// Catch-up to `now_ms`: spawn items and count down whole seconds in
    /// chronological order, then drop items that fell out of reach.
    pub fn update(&mut self, now_ms: TimestampMs) {
        while self.status == DropGameStatus::Playing {
            let next = self.next_spawn_at.min(self.next_second_at);
            if next > now_ms {
                break;
            }
            if self.next_spawn_at <= self.next_second_at {
                self.spawn(self.next_spawn_at);
                self.next_spawn_at += self.config.spawn_interval_ms;
            } else {
                self.second_elapsed();
                self.next_second_at += 1_000;
            }
        }
        self.items.retain(|item| item.expires_at > now_ms);
    }

    fn spawn(&mut self, at: TimestampMs) {
        let kind = if self.rng.chance(self.config.bomb_chance) {
            ItemKind::Bomb
        } else if self.rng.chance(self.config.mic_chance) {
            ItemKind::Mic
        } else {
            ItemKind::Disc
        };
        let lifetime = self.rng.range_inclusive(
            self.config.item_lifetime_min_ms as u64,
            self.config.item_lifetime_max_ms as u64,
        ) as TimestampMs;
        self.items.push(FallingItem {
            id: self.next_item_id,
            kind,
            spawned_at: at,
            expires_at: at + lifetime,
        });
        self.next_item_id += 1;
    }

    fn second_elapsed(&mut self) {
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        self.energy = (self.energy + self.energy_regen_rate).min(self.max_energy);
        if self.time_left_secs == 0 {
            self.end();
        }
    }

    fn end(&mut self) {
        self.status = DropGameStatus::GameOver;
        self.items.clear();
    }

    /// Attempt to catch item `item_id` at `now_ms`.
    pub fn catch(&mut self, item_id: u64, now_ms: TimestampMs) -> CatchOutcome {
        if self.is_over() {
            return CatchOutcome::NotPlaying;
        }
        let Some(pos) = self
            .items
            .iter()
            .position(|i| i.id == item_id && i.expires_at > now_ms)
        else {
            return CatchOutcome::Missed;
        };
        if self.energy < self.config.catch_energy_cost {
            return CatchOutcome::NoEnergy;
        }
        self.energy -= self.config.catch_energy_cost;

        let item = self.items.remove(pos);
        let score = match item.kind {
            ItemKind::Bomb => {
                self.combo = 0;
                self.end();
                return CatchOutcome::Bomb;
            }
            ItemKind::Mic  => self.config.mic_score,
            ItemKind::Disc => self.config.disc_score,
        };

        let in_window = self
            .last_catch_at
            .is_some_and(|last| now_ms - last < self.config.combo_window_ms);
        self.combo = if in_window { self.combo + 1 } else { 1 };
        self.last_catch_at = Some(now_ms);

        let points = score * u64::from(self.combo.min(self.config.max_combo));
        self.score += points;
        CatchOutcome::Scored { points, combo: self.combo }
    }
}

impl GameEngine {
    /// Milliseconds until the drop game can be started; 0 when playable.
    pub fn drop_game_remaining_ms(&self) -> TimestampMs {
        let since = self.now_ms() - self.progress.last_drop_game_timestamp;
        (self.config.drop_game.cooldown_ms - since).max(0)
    }

    pub fn drop_game_eligible(&self) -> bool {
        self.now_ms() - self.progress.last_drop_game_timestamp >= self.config.drop_game.cooldown_ms
    }

    /// Start a session if the cooldown allows, stamping the start time.
    pub fn start_drop_game(&mut self) -> Option<DropGameSession> {
        if !self.drop_game_eligible() {
            log::debug!(
                "drop game on cooldown: {} ms left",
                self.drop_game_remaining_ms()
            );
            return None;
        }
        let now = self.now_ms();
        self.progress.last_drop_game_timestamp = now;
        self.persist();
        self.record(GameEvent::DropGameStarted { started_at: now });

        let rng = self.drop_rng.fork("drop_game_session");
        Some(DropGameSession::new(
            self.config.drop_game.clone(),
            now,
            self.progress.energy,
            self.progress.max_energy,
            self.progress.energy_regen_rate,
            rng,
        ))
    }

    /// Pay out a finished session. A session still in play pays nothing
    /// and is handed back.
    pub fn claim_drop_game(&mut self, session: DropGameSession) -> Result<f64, DropGameSession> {
        if !session.is_over() {
            return Err(session);
        }
        let coins = session.earned_coins();
        self.add_coins(coins);
        self.record(GameEvent::DropGameRewarded { score: session.score, coins });
        log::info!("drop game finished: score={} coins={coins}", session.score);
        Ok(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, RngSlot};

    fn session(energy: f64) -> DropGameSession {
        DropGameSession::new(
            DropGameConfig::default(),
            0,
            energy,
            100.0,
            1.0,
            RngBank::new(5).for_slot(RngSlot::DropGame),
        )
    }

    fn plant(s: &mut DropGameSession, kind: ItemKind) -> u64 {
        let id = 1_000 + s.items.len() as u64;
        s.items.push(FallingItem { id, kind, spawned_at: 0, expires_at: 60_000 });
        id
    }

    #[test]
    fn spawns_every_half_second() {
        let mut s = session(100.0);
        s.update(499);
        assert!(s.items.is_empty());
        s.update(500);
        assert_eq!(s.items.len(), 1);
        s.update(900);
        assert_eq!(s.items.len(), 1);
    }

    #[test]
    fn items_expire_after_their_lifetime() {
        let mut s = session(100.0);
        s.update(500);
        let expires = s.items[0].expires_at;
        assert!((1_500..=2_500).contains(&expires));
        s.update(expires);
        assert!(s.items.iter().all(|i| i.id != 1));
    }

    #[test]
    fn game_ends_after_duration() {
        let mut s = session(100.0);
        s.update(59_999);
        assert_eq!(s.status, DropGameStatus::Playing);
        assert_eq!(s.time_left_secs, 1);
        s.update(60_000);
        assert!(s.is_over());
        assert!(s.items.is_empty());
    }

    #[test]
    fn combo_multiplies_quick_catches() {
        let mut s = session(100.0);
        let a = plant(&mut s, ItemKind::Mic);
        let b = plant(&mut s, ItemKind::Disc);
        let c = plant(&mut s, ItemKind::Mic);
        assert_eq!(s.catch(a, 100), CatchOutcome::Scored { points: 1, combo: 1 });
        assert_eq!(s.catch(b, 600), CatchOutcome::Scored { points: 4, combo: 2 });
        assert_eq!(s.catch(c, 2_000), CatchOutcome::Scored { points: 1, combo: 1 });
        assert_eq!(s.score, 6);
        assert_eq!(s.earned_coins(), 60.0);
    }

    #[test]
    fn combo_bonus_caps_at_five() {
        let mut s = session(100.0);
        let ids: Vec<u64> = (0..7).map(|_| plant(&mut s, ItemKind::Mic)).collect();
        let mut last = CatchOutcome::Missed;
        for (n, id) in ids.into_iter().enumerate() {
            last = s.catch(id, n as TimestampMs * 100);
        }
        assert_eq!(last, CatchOutcome::Scored { points: 5, combo: 7 });
    }

    #[test]
    fn bomb_ends_the_game() {
        let mut s = session(100.0);
        let bomb = plant(&mut s, ItemKind::Bomb);
        let mic = plant(&mut s, ItemKind::Mic);
        assert_eq!(s.catch(bomb, 10), CatchOutcome::Bomb);
        assert!(s.is_over());
        assert_eq!(s.catch(mic, 20), CatchOutcome::NotPlaying);
    }

    #[test]
    fn catching_costs_energy() {
        let mut s = session(7.0);
        let a = plant(&mut s, ItemKind::Mic);
        let b = plant(&mut s, ItemKind::Mic);
        assert!(matches!(s.catch(a, 10), CatchOutcome::Scored { .. }));
        assert_eq!(s.energy, 2.0);
        assert_eq!(s.catch(b, 20), CatchOutcome::NoEnergy);
        assert_eq!(s.items.len(), 1);
    }

    #[test]
    fn unknown_item_is_a_miss() {
        let mut s = session(100.0);
        assert_eq!(s.catch(42, 10), CatchOutcome::Missed);
        assert_eq!(s.energy, 100.0);
    }

    #[test]
    fn session_energy_regenerates_each_second() {
        let mut s = session(50.0);
        s.update(3_000);
        assert_eq!(s.energy, 53.0);
    }
}
