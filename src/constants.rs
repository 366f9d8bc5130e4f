pub const TICK_RATE: u32 = 10;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const SEATS_PER_ROW: usize = 5;

pub const MAX_LEAK: f32 = 100.0;

/// Chance per tick that an occupied, non-recording viewer leaves.
/// Fixed across levels.
pub const DESPAWN_RATE: f32 = 0.005;

/// Leak contributed by one recording seat in one tick, before the
/// level multiplier and damping are applied.
pub const BASE_LEAK_PER_TICK: f32 = 1.5;

/// Damping applied to the summed per-tick leak contribution before it is
/// folded into the session's leak level.
pub const LEAK_DAMPING: f32 = 0.1;

pub const CATCH_REWARD: i32 = 100;
pub const CATCH_LEAK_HEAL: f32 = 5.0;
pub const DISTURB_PENALTY: i32 = 50;

/// Flat leak heal granted when advancing to the next level.
pub const LEVEL_CLEAR_LEAK_HEAL: f32 = 20.0;

/// Delay between entering LevelTransition and the automatic advance.
pub const LEVEL_TRANSITION_MS: u64 = 2_500;
