use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{LEAK_DAMPING, LEVEL_CLEAR_LEAK_HEAL, MAX_LEAK};
use crate::levels::{final_level, level_config, level_config_or_first, LevelConfig};
use crate::rng::Rng;
use crate::types::{AudioCue, GameStatus, RuntimeEvent, Seat, Snapshot};

mod interaction;
mod seat_system;

fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

/// One play-through of the cinema floor. Owns the seat grid, the leak
/// meter, and the status machine; drivers call `start_game`, `step`,
/// `interact` and `advance_level` from a single execution context.
#[derive(Clone, Debug)]
pub struct GameSession {
    status: GameStatus,
    score: i32,
    leak_level: f32,
    level: u32,
    high_score: i32,
    seats: Vec<Seat>,

    rng: Rng,
    events: Vec<RuntimeEvent>,

    /// Incremented each time GameOver is entered; dedupes late narrative
    /// results that race a session reset.
    episode: u64,
    end_message: Option<String>,

    started_at_ms: u64,
    elapsed_ms: u64,
    tick_counter: u64,
}

impl GameSession {
    pub fn new(seed: u32) -> Self {
        Self {
            status: GameStatus::Idle,
            score: 0,
            leak_level: 0.0,
            level: 1,
            high_score: 0,
            seats: Vec::new(),
            rng: Rng::new(seed),
            events: Vec::new(),
            episode: 0,
            end_message: None,
            started_at_ms: now_ms(),
            elapsed_ms: 0,
            tick_counter: 0,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn leak_level(&self) -> f32 {
        self.leak_level
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn high_score(&self) -> i32 {
        self.high_score
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn current_level(&self) -> &'static LevelConfig {
        level_config_or_first(self.level)
    }

    /// Full reset to a fresh level-1 floor. Only `high_score` survives.
    pub fn start_game(&mut self) {
        let config = level_config_or_first(1);
        self.status = GameStatus::Playing;
        self.score = 0;
        self.leak_level = 0.0;
        self.level = config.level;
        self.seats = Self::fresh_seats(config.rows);
        self.end_message = None;
        self.started_at_ms = now_ms();
        self.elapsed_ms = 0;
        self.tick_counter = 0;
        self.events.push(RuntimeEvent::Cue {
            cue: AudioCue::Start,
        });
    }

    /// One logical tick. No-op unless Playing.
    ///
    /// Order matters: a reached score target ends the tick before the seat
    /// simulation runs; otherwise the seat leak delta is folded in and a
    /// full meter ends the run.
    pub fn step(&mut self, dt_ms: u64) {
        if self.status != GameStatus::Playing {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.started_at_ms.saturating_add(self.elapsed_ms);

        let config = level_config_or_first(self.level);
        if self.score >= config.target_score {
            if self.level < final_level() {
                self.status = GameStatus::LevelTransition;
                self.events.push(RuntimeEvent::Cue {
                    cue: AudioCue::LevelUp,
                });
            } else {
                self.enter_victory();
            }
            return;
        }

        let leak_contribution = self.step_seats(config, now_ms);
        self.leak_level =
            (self.leak_level + leak_contribution * LEAK_DAMPING).clamp(0.0, MAX_LEAK);
        if self.leak_level >= MAX_LEAK {
            self.leak_level = MAX_LEAK;
            self.enter_game_over();
        }
    }

    /// Delayed LevelTransition -> Playing move, fired by the driver after
    /// the transition delay. Dropped silently when the status moved on in
    /// the meantime (e.g. a new game was started during the delay).
    pub fn advance_level(&mut self) {
        if self.status != GameStatus::LevelTransition {
            return;
        }
        match level_config(self.level + 1) {
            Some(config) => {
                self.level = config.level;
                self.leak_level = (self.leak_level - LEVEL_CLEAR_LEAK_HEAL).max(0.0);
                self.seats = Self::fresh_seats(config.rows);
                self.status = GameStatus::Playing;
                self.events.push(RuntimeEvent::Cue {
                    cue: AudioCue::Start,
                });
            }
            None => self.enter_victory(),
        }
    }

    /// Stores the narrative result for the current game-over episode.
    /// Late or duplicate results are discarded; returns whether the
    /// message was accepted.
    pub fn apply_end_message(&mut self, episode: u64, text: String) -> bool {
        if self.status != GameStatus::GameOver
            || episode != self.episode
            || self.end_message.is_some()
        {
            return false;
        }
        self.end_message = Some(text);
        true
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let config = level_config_or_first(self.level);
        let snapshot = Snapshot {
            tick: self.tick_counter,
            status: self.status,
            score: self.score,
            high_score: self.high_score,
            leak_level: self.leak_level,
            level: self.level,
            level_name: config.name,
            target_score: config.target_score,
            seats: self.seats.clone(),
            end_message: self.end_message.clone(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn enter_victory(&mut self) {
        self.status = GameStatus::Victory;
        self.events.push(RuntimeEvent::Cue { cue: AudioCue::Win });
    }

    fn enter_game_over(&mut self) {
        self.status = GameStatus::GameOver;
        self.episode += 1;
        self.end_message = None;
        self.events.push(RuntimeEvent::Cue {
            cue: AudioCue::Error,
        });
        self.events.push(RuntimeEvent::NarrativeRequested {
            episode: self.episode,
            score: self.score,
        });
    }
}
