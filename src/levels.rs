use crate::constants::SEATS_PER_ROW;

#[derive(Clone, Copy, Debug)]
pub struct LevelConfig {
    pub level: u32,
    pub rows: usize,
    pub target_score: i32,
    pub spawn_rate: f32,
    pub record_rate: f32,
    pub leak_multiplier: f32,
    pub name: &'static str,
}

impl LevelConfig {
    pub fn seat_count(&self) -> usize {
        self.rows * SEATS_PER_ROW
    }
}

pub const LEVELS: [LevelConfig; 3] = [
    LevelConfig {
        level: 1,
        rows: 1,
        target_score: 500,
        spawn_rate: 0.02,
        record_rate: 0.02,
        leak_multiplier: 1.0,
        name: "Trailers",
    },
    LevelConfig {
        level: 2,
        rows: 2,
        target_score: 1_500,
        spawn_rate: 0.03,
        record_rate: 0.04,
        leak_multiplier: 1.2,
        name: "Feature Presentation",
    },
    LevelConfig {
        level: 3,
        rows: 4,
        target_score: 5_000,
        spawn_rate: 0.08,
        record_rate: 0.12,
        leak_multiplier: 1.5,
        name: "The Final Act",
    },
];

pub fn level_config(level: u32) -> Option<&'static LevelConfig> {
    LEVELS.iter().find(|config| config.level == level)
}

/// Lookup used during active play: a session pointing at a level with no
/// table entry keeps ticking on level 1 parameters instead of failing.
pub fn level_config_or_first(level: u32) -> &'static LevelConfig {
    level_config(level).unwrap_or(&LEVELS[0])
}

/// Highest defined level. Clearing it ends the run in Victory.
pub fn final_level() -> u32 {
    LEVELS[LEVELS.len() - 1].level
}
