use crate::constants::{BASE_LEAK_PER_TICK, DESPAWN_RATE, SEATS_PER_ROW};
use crate::levels::LevelConfig;
use crate::types::{Occupant, Seat};

use super::GameSession;

impl GameSession {
    pub(super) fn fresh_seats(rows: usize) -> Vec<Seat> {
        (0..rows * SEATS_PER_ROW).map(Seat::empty).collect()
    }

    /// One simulation pass over the seat grid. Returns the summed raw leak
    /// contribution for this tick; the caller applies damping and clamping.
    ///
    /// Each seat takes exactly one branch per tick: empty seats may gain a
    /// viewer, recording seats keep recording and leak, and occupied quiet
    /// seats may leave or start recording (in that draw order).
    pub(super) fn step_seats(&mut self, config: &LevelConfig, now_ms: u64) -> f32 {
        let mut leak = 0.0;
        for seat in &mut self.seats {
            if !seat.is_occupied {
                if self.rng.chance(config.spawn_rate) {
                    seat.is_occupied = true;
                    seat.occupant =
                        Occupant::VARIANTS[self.rng.pick_index(Occupant::VARIANTS.len())];
                }
            } else if seat.is_recording {
                seat.recording_duration += 1;
                leak += BASE_LEAK_PER_TICK * config.leak_multiplier;
            } else if self.rng.chance(DESPAWN_RATE) {
                *seat = Seat::empty(seat.id);
            } else if self.rng.chance(config.record_rate) {
                seat.is_recording = true;
                seat.recording_started_at_ms = now_ms;
                seat.recording_duration = 0;
            }
        }
        leak
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{BASE_LEAK_PER_TICK, LEAK_DAMPING, SEATS_PER_ROW};
    use crate::levels::LevelConfig;
    use crate::types::Occupant;

    use super::super::GameSession;

    fn test_config(spawn_rate: f32, record_rate: f32, leak_multiplier: f32) -> LevelConfig {
        LevelConfig {
            level: 1,
            rows: 1,
            target_score: 500,
            spawn_rate,
            record_rate,
            leak_multiplier,
            name: "test reel",
        }
    }

    fn session_with_rows(seed: u32, rows: usize) -> GameSession {
        let mut session = GameSession::new(seed);
        session.seats = GameSession::fresh_seats(rows);
        session
    }

    fn occupy_all(session: &mut GameSession) {
        for seat in &mut session.seats {
            seat.is_occupied = true;
            seat.occupant = Occupant::Nick;
        }
    }

    #[test]
    fn fresh_seats_are_empty_and_sequentially_numbered() {
        let seats = GameSession::fresh_seats(4);
        assert_eq!(seats.len(), 4 * SEATS_PER_ROW);
        for (idx, seat) in seats.iter().enumerate() {
            assert_eq!(seat.id, idx);
            assert!(!seat.is_occupied);
            assert!(!seat.is_recording);
            assert_eq!(seat.occupant, Occupant::None);
        }
    }

    #[test]
    fn guaranteed_spawn_fills_every_empty_seat() {
        let mut session = session_with_rows(21, 2);
        let config = test_config(1.0, 0.0, 1.0);

        session.step_seats(&config, 1_000);
        for seat in &session.seats {
            assert!(seat.is_occupied);
            assert!(Occupant::VARIANTS.contains(&seat.occupant));
            assert!(!seat.is_recording);
        }
    }

    #[test]
    fn zero_spawn_rate_keeps_the_floor_empty() {
        let mut session = session_with_rows(22, 2);
        let config = test_config(0.0, 0.0, 1.0);

        for _ in 0..1_000 {
            session.step_seats(&config, 1_000);
        }
        assert!(session.seats.iter().all(|seat| !seat.is_occupied));
    }

    #[test]
    fn recording_seat_accrues_duration_and_leak() {
        let mut session = session_with_rows(23, 1);
        occupy_all(&mut session);
        session.seats[0].is_recording = true;
        // Quiet the rest of the row so only seat 0 contributes.
        for seat in &mut session.seats[1..] {
            seat.is_occupied = false;
            seat.occupant = Occupant::None;
        }
        let config = test_config(0.0, 0.0, 1.0);

        let mut raw_leak = 0.0;
        for _ in 0..10 {
            raw_leak += session.step_seats(&config, 1_000);
        }
        assert_eq!(session.seats[0].recording_duration, 10);
        assert!((raw_leak - 10.0 * BASE_LEAK_PER_TICK).abs() < 0.0001);
        assert!((raw_leak * LEAK_DAMPING - 1.5).abs() < 0.0001);
    }

    #[test]
    fn leak_multiplier_scales_the_contribution() {
        let mut session = session_with_rows(24, 1);
        occupy_all(&mut session);
        session.seats[0].is_recording = true;
        for seat in &mut session.seats[1..] {
            seat.is_occupied = false;
            seat.occupant = Occupant::None;
        }
        let config = test_config(0.0, 0.0, 1.5);

        let raw_leak = session.step_seats(&config, 1_000);
        assert!((raw_leak - BASE_LEAK_PER_TICK * 1.5).abs() < 0.0001);
    }

    #[test]
    fn guaranteed_record_rate_starts_recording_with_a_timestamp() {
        let mut session = session_with_rows(25, 1);
        occupy_all(&mut session);
        let config = test_config(0.0, 1.0, 1.0);

        session.step_seats(&config, 7_777);
        // The rare despawn draw may clear a seat before the record draw;
        // every seat is either recording now or left empty.
        for seat in &session.seats {
            if seat.is_occupied {
                assert!(seat.is_recording);
                assert_eq!(seat.recording_started_at_ms, 7_777);
                assert_eq!(seat.recording_duration, 0);
            } else {
                assert_eq!(seat.occupant, Occupant::None);
            }
        }
        assert!(session.seats.iter().any(|seat| seat.is_recording));
    }

    #[test]
    fn despawn_eventually_clears_quiet_seats_completely() {
        let mut session = session_with_rows(26, 1);
        occupy_all(&mut session);
        let config = test_config(0.0, 0.0, 1.0);

        for _ in 0..10_000 {
            session.step_seats(&config, 1_000);
        }
        assert!(session.seats.iter().any(|seat| !seat.is_occupied));
        for seat in &session.seats {
            if !seat.is_occupied {
                assert_eq!(seat.occupant, Occupant::None);
                assert!(!seat.is_recording);
                assert_eq!(seat.recording_duration, 0);
            }
        }
    }

    #[test]
    fn recording_seats_never_despawn_mid_recording() {
        let mut session = session_with_rows(27, 1);
        occupy_all(&mut session);
        for seat in &mut session.seats {
            seat.is_recording = true;
        }
        let config = test_config(0.0, 0.0, 1.0);

        for _ in 0..1_000 {
            session.step_seats(&config, 1_000);
        }
        for seat in &session.seats {
            assert!(seat.is_occupied);
            assert!(seat.is_recording);
            assert_eq!(seat.recording_duration, 1_000);
        }
    }
}
