use std::future;
use std::io::{self, Write};
use std::time::Duration;

use chrono::Local;
use cinema_patrol::constants::{LEVEL_TRANSITION_MS, MAX_LEAK, SEATS_PER_ROW, TICK_MS};
use cinema_patrol::engine::GameSession;
use cinema_patrol::narrative::{ChiefReport, NarrativeService};
use cinema_patrol::types::{GameStatus, Occupant, RuntimeEvent, Seat, Snapshot};
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use futures_util::StreamExt;
use rand::Rng as _;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant};

const LEAK_BAR_WIDTH: usize = 24;
const FEEDBACK_TTL_TICKS: u8 = 15;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Seat simulation seed. Random when omitted.
    #[arg(long)]
    seed: Option<u32>,
    /// Suppress the terminal bell used for audio cues.
    #[arg(long)]
    mute: bool,
}

struct FeedbackLine {
    seat_id: usize,
    text: String,
    ttl: u8,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let result = run(&mut stdout, seed, cli.mute).await;

    execute!(stdout, LeaveAlternateScreen, cursor::Show)?;
    terminal::disable_raw_mode()?;
    result
}

async fn run(stdout: &mut io::Stdout, seed: u32, mute: bool) -> io::Result<()> {
    let mut session = GameSession::new(seed);
    let mut input = EventStream::new();
    let mut ticker = interval(Duration::from_millis(TICK_MS));
    let (verdict_tx, mut verdict_rx) = mpsc::channel::<(u64, String)>(4);
    let mut advance_at: Option<Instant> = None;
    let mut cursor_idx = 0usize;
    let mut feedback: Vec<FeedbackLine> = Vec::new();

    let snapshot = session.build_snapshot(true);
    draw(stdout, &snapshot, cursor_idx, &feedback)?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.step(TICK_MS);
                let snapshot = session.build_snapshot(true);

                for line in &mut feedback {
                    line.ttl = line.ttl.saturating_sub(1);
                }
                feedback.retain(|line| line.ttl > 0);

                for event in &snapshot.events {
                    match event {
                        RuntimeEvent::Cue { .. } => {
                            if !mute {
                                queue!(stdout, Print("\u{7}"))?;
                            }
                        }
                        RuntimeEvent::Feedback { seat_id, text } => {
                            feedback.push(FeedbackLine {
                                seat_id: *seat_id,
                                text: text.clone(),
                                ttl: FEEDBACK_TTL_TICKS,
                            });
                        }
                        RuntimeEvent::NarrativeRequested { episode, score } => {
                            let tx = verdict_tx.clone();
                            let episode = *episode;
                            let score = *score;
                            // Off the game loop so a slow generator never
                            // stalls rendering or input.
                            tokio::spawn(async move {
                                let verdict = ChiefReport.generate_end_message(score);
                                let _ = tx.send((episode, verdict)).await;
                            });
                        }
                    }
                }

                if snapshot.status == GameStatus::LevelTransition && advance_at.is_none() {
                    advance_at = Some(Instant::now() + Duration::from_millis(LEVEL_TRANSITION_MS));
                }
                draw(stdout, &snapshot, cursor_idx, &feedback)?;
            }
            _ = wait_for(advance_at) => {
                session.advance_level();
                advance_at = None;
                cursor_idx = 0;
            }
            Some((episode, verdict)) = verdict_rx.recv() => {
                session.apply_end_message(episode, verdict);
            }
            maybe_event = input.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        let keep_running = handle_key(
                            key,
                            &mut session,
                            &mut cursor_idx,
                            &mut advance_at,
                            &mut feedback,
                        );
                        if !keep_running {
                            return Ok(());
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => return Err(error),
                    None => return Ok(()),
                }
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}

fn handle_key(
    key: KeyEvent,
    session: &mut GameSession,
    cursor_idx: &mut usize,
    advance_at: &mut Option<Instant>,
    feedback: &mut Vec<FeedbackLine>,
) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Enter | KeyCode::Char('r')
            if matches!(
                session.status(),
                GameStatus::Idle | GameStatus::GameOver | GameStatus::Victory
            ) =>
        {
            session.start_game();
            *advance_at = None;
            *cursor_idx = 0;
            feedback.clear();
        }
        KeyCode::Char(' ') | KeyCode::Enter => session.interact(*cursor_idx),
        KeyCode::Left | KeyCode::Char('h') => move_cursor(session, cursor_idx, -1),
        KeyCode::Right | KeyCode::Char('l') => move_cursor(session, cursor_idx, 1),
        KeyCode::Up | KeyCode::Char('k') => {
            move_cursor(session, cursor_idx, -(SEATS_PER_ROW as isize))
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_cursor(session, cursor_idx, SEATS_PER_ROW as isize)
        }
        _ => {}
    }
    true
}

fn move_cursor(session: &GameSession, cursor_idx: &mut usize, delta: isize) {
    let len = session.seats().len();
    if len == 0 {
        return;
    }
    let moved = (*cursor_idx as isize + delta).clamp(0, len as isize - 1);
    *cursor_idx = moved as usize;
}

fn draw(
    stdout: &mut io::Stdout,
    snapshot: &Snapshot,
    cursor_idx: usize,
    feedback: &[FeedbackLine],
) -> io::Result<()> {
    queue!(stdout, cursor::MoveTo(0, 0), Clear(ClearType::All))?;

    queue!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print(format!(
            "NOW SHOWING: {}  (level {})    {}",
            snapshot.level_name,
            snapshot.level,
            Local::now().format("%H:%M")
        )),
        cursor::MoveTo(0, 1),
        ResetColor,
        Print(format!(
            "SCORE {:>6}   TARGET {:>6}   HIGH {:>6}",
            snapshot.score, snapshot.target_score, snapshot.high_score
        )),
    )?;

    let filled = ((snapshot.leak_level / MAX_LEAK) * LEAK_BAR_WIDTH as f32).round() as usize;
    let filled = filled.min(LEAK_BAR_WIDTH);
    let bar_color = if snapshot.leak_level >= 80.0 {
        Color::Red
    } else if snapshot.leak_level >= 50.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    queue!(
        stdout,
        cursor::MoveTo(0, 2),
        Print("LEAK ["),
        SetForegroundColor(bar_color),
        Print("#".repeat(filled)),
        ResetColor,
        Print("-".repeat(LEAK_BAR_WIDTH - filled)),
        Print(format!("] {:>3.0}%", snapshot.leak_level)),
    )?;

    let mut row = 4u16;
    for (row_idx, seats) in snapshot.seats.chunks(SEATS_PER_ROW).enumerate() {
        queue!(stdout, cursor::MoveTo(2, row + row_idx as u16))?;
        for seat in seats {
            draw_seat(stdout, seat, seat.id == cursor_idx)?;
        }
    }
    row += snapshot.seats.len().div_ceil(SEATS_PER_ROW) as u16 + 1;

    for line in feedback {
        queue!(
            stdout,
            cursor::MoveTo(2, row),
            SetForegroundColor(if line.text.starts_with('+') {
                Color::Green
            } else {
                Color::Red
            }),
            Print(format!("seat {:>2}: {}", line.seat_id, line.text)),
            ResetColor,
        )?;
        row += 1;
    }
    row += 1;

    match snapshot.status {
        GameStatus::Idle => {
            queue!(
                stdout,
                cursor::MoveTo(2, row),
                Print("Opening night. Press enter to start your shift."),
            )?;
        }
        GameStatus::Playing => {}
        GameStatus::LevelTransition => {
            queue!(
                stdout,
                cursor::MoveTo(2, row),
                SetForegroundColor(Color::Yellow),
                Print("SCREEN CLEAR. Moving to the next showing..."),
                ResetColor,
            )?;
        }
        GameStatus::GameOver => {
            let verdict = snapshot
                .end_message
                .as_deref()
                .unwrap_or("The chief is writing up your report...");
            queue!(
                stdout,
                cursor::MoveTo(2, row),
                SetForegroundColor(Color::Red),
                Print("GAME OVER. The cut leaked."),
                cursor::MoveTo(2, row + 1),
                ResetColor,
                Print(verdict),
                cursor::MoveTo(2, row + 3),
                Print("Press enter to take another shift, q to quit."),
            )?;
        }
        GameStatus::Victory => {
            queue!(
                stdout,
                cursor::MoveTo(2, row),
                SetForegroundColor(Color::Green),
                Print("PREMIERE SAVED. Not a single frame got out."),
                ResetColor,
                cursor::MoveTo(2, row + 2),
                Print("Press enter to take another shift, q to quit."),
            )?;
        }
    }

    queue!(
        stdout,
        cursor::MoveTo(0, row + 5),
        SetForegroundColor(Color::DarkGrey),
        Print("arrows/hjkl move | space zap | enter start | q quit"),
        ResetColor,
    )?;
    stdout.flush()
}

fn draw_seat(stdout: &mut io::Stdout, seat: &Seat, selected: bool) -> io::Result<()> {
    let glyph = occupant_glyph(seat.occupant);
    let color = if seat.is_recording {
        Color::Red
    } else if seat.is_occupied {
        Color::White
    } else {
        Color::DarkGrey
    };
    let (open, close) = if selected { ('>', '<') } else { ('[', ']') };
    queue!(
        stdout,
        Print(" "),
        SetForegroundColor(if selected { Color::Yellow } else { color }),
        Print(open),
        SetForegroundColor(color),
        Print(glyph),
        Print(if seat.is_recording { '!' } else { ' ' }),
        SetForegroundColor(if selected { Color::Yellow } else { color }),
        Print(close),
        ResetColor,
    )
}

fn occupant_glyph(occupant: Occupant) -> char {
    match occupant {
        Occupant::None => '.',
        Occupant::Judy => 'J',
        Occupant::Nick => 'N',
        Occupant::Flash => 'F',
        Occupant::Clawhauser => 'C',
    }
}
