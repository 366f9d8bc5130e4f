use crate::constants::{CATCH_LEAK_HEAL, CATCH_REWARD, DISTURB_PENALTY};
use crate::types::{AudioCue, GameStatus, RuntimeEvent};

use super::GameSession;

impl GameSession {
    /// Player click on a seat. Catching a recording viewer scores and
    /// relieves the leak meter; bothering an innocent viewer costs points.
    /// Clicks outside Playing, on empty seats or on unknown ids do nothing.
    pub fn interact(&mut self, seat_id: usize) {
        if self.status != GameStatus::Playing {
            return;
        }
        let Some(seat) = self.seats.iter_mut().find(|seat| seat.id == seat_id) else {
            return;
        };

        if seat.is_recording {
            seat.is_recording = false;
            seat.recording_duration = 0;
            self.score += CATCH_REWARD;
            self.leak_level = (self.leak_level - CATCH_LEAK_HEAL).max(0.0);
            self.events.push(RuntimeEvent::Feedback {
                seat_id,
                text: format!("+{CATCH_REWARD}"),
            });
            self.events.push(RuntimeEvent::Cue { cue: AudioCue::Zap });
        } else if seat.is_occupied {
            self.score = (self.score - DISTURB_PENALTY).max(0);
            self.events.push(RuntimeEvent::Feedback {
                seat_id,
                text: format!("-{DISTURB_PENALTY}"),
            });
            self.events.push(RuntimeEvent::Cue {
                cue: AudioCue::Error,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{AudioCue, GameStatus, Occupant, RuntimeEvent};

    use super::super::GameSession;

    fn playing_session(seed: u32) -> GameSession {
        let mut session = GameSession::new(seed);
        session.start_game();
        session.build_snapshot(true); // drain the start cue
        session
    }

    fn seat_recording(session: &mut GameSession, seat_idx: usize) {
        let seat = &mut session.seats[seat_idx];
        seat.occupant = Occupant::Flash;
        seat.is_occupied = true;
        seat.is_recording = true;
        seat.recording_started_at_ms = 5_000;
        seat.recording_duration = 12;
    }

    fn seat_occupied(session: &mut GameSession, seat_idx: usize) {
        let seat = &mut session.seats[seat_idx];
        seat.occupant = Occupant::Clawhauser;
        seat.is_occupied = true;
        seat.is_recording = false;
    }

    #[test]
    fn catching_a_recording_seat_scores_and_heals_the_leak() {
        let mut session = playing_session(31);
        session.leak_level = 40.0;
        seat_recording(&mut session, 2);

        session.interact(2);
        assert_eq!(session.score(), 100);
        assert!((session.leak_level() - 35.0).abs() < 0.0001);

        let seat = &session.seats()[2];
        assert!(seat.is_occupied);
        assert!(!seat.is_recording);
        assert_eq!(seat.recording_duration, 0);

        let events = session.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::Feedback {
            seat_id: 2,
            text: "+100".to_string(),
        }));
        assert!(events.contains(&RuntimeEvent::Cue { cue: AudioCue::Zap }));
    }

    #[test]
    fn catch_heal_floors_the_leak_at_zero() {
        let mut session = playing_session(32);
        session.leak_level = 3.0;
        seat_recording(&mut session, 0);

        session.interact(0);
        assert_eq!(session.leak_level(), 0.0);
    }

    #[test]
    fn disturbing_an_innocent_viewer_costs_points() {
        let mut session = playing_session(33);
        session.score = 300;
        seat_occupied(&mut session, 1);

        session.interact(1);
        assert_eq!(session.score(), 250);

        let events = session.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::Feedback {
            seat_id: 1,
            text: "-50".to_string(),
        }));
        assert!(events.contains(&RuntimeEvent::Cue {
            cue: AudioCue::Error
        }));
    }

    #[test]
    fn score_never_drops_below_zero() {
        let mut session = playing_session(34);
        session.score = 30;
        seat_occupied(&mut session, 3);

        session.interact(3);
        assert_eq!(session.score(), 0);
        session.interact(3);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn second_click_on_a_caught_seat_is_a_disturbance() {
        let mut session = playing_session(35);
        seat_recording(&mut session, 4);

        session.interact(4);
        assert_eq!(session.score(), 100);
        session.interact(4);
        assert_eq!(session.score(), 50);
    }

    #[test]
    fn clicks_on_empty_seats_do_nothing() {
        let mut session = playing_session(36);
        session.score = 120;

        session.interact(0);
        assert_eq!(session.score(), 120);
        assert!(session.build_snapshot(true).events.is_empty());
    }

    #[test]
    fn clicks_on_unknown_seat_ids_do_nothing() {
        let mut session = playing_session(37);
        seat_recording(&mut session, 0);

        session.interact(9_999);
        assert_eq!(session.score(), 0);
        assert!(session.seats()[0].is_recording);
    }

    #[test]
    fn clicks_outside_playing_are_ignored() {
        for status in [
            GameStatus::Idle,
            GameStatus::LevelTransition,
            GameStatus::GameOver,
            GameStatus::Victory,
        ] {
            let mut session = playing_session(38);
            seat_recording(&mut session, 0);
            session.status = status;

            session.interact(0);
            assert_eq!(session.score(), 0);
            assert!(session.seats()[0].is_recording);
            assert!(session.build_snapshot(true).events.is_empty());
        }
    }
}
