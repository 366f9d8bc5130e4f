use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupant {
    None,
    Judy,
    Nick,
    Flash,
    Clawhauser,
}

impl Occupant {
    /// Spawnable variants. Cosmetic only; presence is what matters.
    pub const VARIANTS: [Occupant; 4] = [
        Occupant::Judy,
        Occupant::Nick,
        Occupant::Flash,
        Occupant::Clawhauser,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Idle,
    Playing,
    LevelTransition,
    GameOver,
    Victory,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Seat {
    pub id: usize,
    pub occupant: Occupant,
    #[serde(rename = "isOccupied")]
    pub is_occupied: bool,
    #[serde(rename = "isRecording")]
    pub is_recording: bool,
    #[serde(rename = "recordingStartedAtMs")]
    pub recording_started_at_ms: u64,
    #[serde(rename = "recordingDuration")]
    pub recording_duration: u32,
}

impl Seat {
    pub fn empty(id: usize) -> Self {
        Self {
            id,
            occupant: Occupant::None,
            is_occupied: false,
            is_recording: false,
            recording_started_at_ms: 0,
            recording_duration: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Start,
    Zap,
    Error,
    LevelUp,
    Win,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    Cue {
        cue: AudioCue,
    },
    Feedback {
        #[serde(rename = "seatId")]
        seat_id: usize,
        text: String,
    },
    NarrativeRequested {
        episode: u64,
        score: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub status: GameStatus,
    pub score: i32,
    #[serde(rename = "highScore")]
    pub high_score: i32,
    #[serde(rename = "leakLevel")]
    pub leak_level: f32,
    pub level: u32,
    #[serde(rename = "levelName")]
    pub level_name: &'static str,
    #[serde(rename = "targetScore")]
    pub target_score: i32,
    pub seats: Vec<Seat>,
    #[serde(rename = "endMessage")]
    pub end_message: Option<String>,
    pub events: Vec<RuntimeEvent>,
}
