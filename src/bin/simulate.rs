use cinema_patrol::constants::{LEVEL_TRANSITION_MS, TICK_MS};
use cinema_patrol::engine::GameSession;
use cinema_patrol::levels::level_config;
use cinema_patrol::narrative::{ChiefReport, NarrativeService};
use cinema_patrol::rng::Rng;
use cinema_patrol::types::{GameStatus, RuntimeEvent, Snapshot};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    policy: Option<String>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

/// Automated stand-in for the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Policy {
    /// Catches the first recording seat every tick.
    Perfect,
    /// Usually catches, occasionally bothers an innocent viewer.
    Sloppy,
    /// Never touches a seat; the leak meter decides the run.
    Idle,
}

impl Policy {
    fn parse(value: &str) -> Option<Policy> {
        match value.to_ascii_lowercase().as_str() {
            "perfect" => Some(Policy::Perfect),
            "sloppy" => Some(Policy::Sloppy),
            "idle" => Some(Policy::Idle),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum OutcomeReason {
    GameOver,
    Victory,
    Timeout,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    policy: Policy,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
    seed: u32,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    policy: Policy,
    reason: OutcomeReason,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: i32,
    #[serde(rename = "maxLeak")]
    max_leak: f32,
    #[serde(rename = "maxLevel")]
    max_level: u32,
    catches: i32,
    disturbances: i32,
    #[serde(rename = "narrativeRequests")]
    narrative_requests: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: i32,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_score = 0i64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "policy": scenario.policy,
                "maxTicks": scenario.max_ticks,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_score += scenario_run.result.score as i64;
        *reason_counts
            .entry(outcome_reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "reason": scenario_run.result.reason,
                "score": scenario_run.result.score,
                "maxLeak": scenario_run.result.max_leak,
                "maxLevel": scenario_run.result.max_level,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        reason_counts,
        total_anomalies,
        total_score,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut session = GameSession::new(scenario.seed);
    // Separate stream for the player stand-in so its draws never perturb
    // the seat simulation.
    let mut policy_rng = Rng::new(scenario.seed ^ 0x9e37_79b9);
    session.start_game();

    let transition_ticks = LEVEL_TRANSITION_MS / TICK_MS;
    let mut pending_advance_at: Option<u64> = None;
    let mut max_leak = 0.0f32;
    let mut max_level = 1u32;
    let mut catches = 0;
    let mut disturbances = 0;
    let mut narrative_requests = 0;
    let mut episodes_requested = HashSet::new();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut tick = 0u64;

    while tick < scenario.max_ticks {
        tick += 1;

        if let Some(due_at) = pending_advance_at {
            if tick >= due_at {
                session.advance_level();
                pending_advance_at = None;
            }
        }

        apply_policy(scenario.policy, &mut session, &mut policy_rng);
        session.step(TICK_MS);
        let snapshot = session.build_snapshot(true);

        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                tick,
                message,
            );
        }

        max_leak = max_leak.max(snapshot.leak_level);
        max_level = max_level.max(snapshot.level);

        for event in &snapshot.events {
            match event {
                RuntimeEvent::Feedback { text, .. } => {
                    if text.starts_with('+') {
                        catches += 1;
                    } else {
                        disturbances += 1;
                    }
                }
                RuntimeEvent::NarrativeRequested { episode, score } => {
                    narrative_requests += 1;
                    if !episodes_requested.insert(*episode) {
                        push_anomaly(
                            &mut anomalies,
                            &mut anomaly_records,
                            &mut anomaly_seen,
                            tick,
                            format!("duplicate narrative request for episode {episode}"),
                        );
                    }
                    let verdict = ChiefReport.generate_end_message(*score);
                    if !session.apply_end_message(*episode, verdict) {
                        push_anomaly(
                            &mut anomalies,
                            &mut anomaly_records,
                            &mut anomaly_seen,
                            tick,
                            format!("narrative for episode {episode} was rejected"),
                        );
                    }
                }
                RuntimeEvent::Cue { .. } => {}
            }
        }

        match snapshot.status {
            GameStatus::LevelTransition => {
                if pending_advance_at.is_none() {
                    pending_advance_at = Some(tick + transition_ticks);
                }
            }
            GameStatus::GameOver | GameStatus::Victory => break,
            _ => {}
        }
    }

    let final_snapshot = session.build_snapshot(true);
    if final_snapshot.status == GameStatus::GameOver && final_snapshot.end_message.is_none() {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            tick,
            "game over without a chief's report".to_string(),
        );
    }

    let reason = match final_snapshot.status {
        GameStatus::GameOver => OutcomeReason::GameOver,
        GameStatus::Victory => OutcomeReason::Victory,
        _ => OutcomeReason::Timeout,
    };

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            policy: scenario.policy,
            reason,
            ticks: tick,
            duration_ms: tick * TICK_MS,
            score: final_snapshot.score,
            max_leak: (max_leak * 10.0).round() / 10.0,
            max_level,
            catches,
            disturbances,
            narrative_requests,
            anomalies,
        },
        anomaly_records,
        finished_tick: tick,
    }
}

fn apply_policy(policy: Policy, session: &mut GameSession, rng: &mut Rng) {
    if session.status() != GameStatus::Playing {
        return;
    }
    let recording = session
        .seats()
        .iter()
        .find(|seat| seat.is_recording)
        .map(|seat| seat.id);
    match policy {
        Policy::Idle => {}
        Policy::Perfect => {
            if let Some(seat_id) = recording {
                session.interact(seat_id);
            }
        }
        Policy::Sloppy => {
            if let Some(seat_id) = recording {
                if rng.chance(0.5) {
                    session.interact(seat_id);
                }
            }
            if rng.chance(0.02) {
                let seat_id = rng.pick_index(session.seats().len());
                session.interact(seat_id);
            }
        }
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    if !snapshot.leak_level.is_finite()
        || snapshot.leak_level < 0.0
        || snapshot.leak_level > 100.0
    {
        anomalies.push(format!("leak level out of range: {}", snapshot.leak_level));
    }

    if snapshot.score < 0 {
        anomalies.push(format!("negative score: {}", snapshot.score));
    }

    if level_config(snapshot.level).is_none() {
        anomalies.push(format!("undefined level reached: {}", snapshot.level));
    }

    for (idx, seat) in snapshot.seats.iter().enumerate() {
        if seat.id != idx {
            anomalies.push(format!("seat id mismatch at index {idx}: {}", seat.id));
        }
        if seat.is_recording && !seat.is_occupied {
            anomalies.push(format!("recording seat {} is unoccupied", seat.id));
        }
        if !seat.is_recording && seat.recording_duration != 0 {
            anomalies.push(format!(
                "quiet seat {} carries recording duration {}",
                seat.id, seat.recording_duration
            ));
        }
    }

    if snapshot.status == GameStatus::Playing && snapshot.seats.is_empty() {
        anomalies.push("playing with an empty seat grid".to_string());
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }));
    let policy = cli
        .policy
        .as_deref()
        .and_then(Policy::parse)
        .unwrap_or(Policy::Sloppy);
    let max_ticks = cli.max_ticks.unwrap_or(30_000).clamp(1, 1_000_000);

    if cli.single || cli.policy.is_some() || cli.max_ticks.is_some() {
        return vec![Scenario {
            name: format!("custom-{}", policy_key(policy)),
            policy,
            max_ticks,
            seed,
        }];
    }

    vec![
        Scenario {
            name: "idle-wipeout".to_string(),
            policy: Policy::Idle,
            max_ticks,
            seed,
        },
        Scenario {
            name: "steady-patrol".to_string(),
            policy: Policy::Sloppy,
            max_ticks,
            seed: normalize_seed(seed as u64 + 1),
        },
        Scenario {
            name: "perfect-sweep".to_string(),
            policy: Policy::Perfect,
            max_ticks,
            seed: normalize_seed(seed as u64 + 2),
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_score: i64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as i64) as i32
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_score,
        reason_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn outcome_reason_key(reason: OutcomeReason) -> String {
    match reason {
        OutcomeReason::GameOver => "game_over",
        OutcomeReason::Victory => "victory",
        OutcomeReason::Timeout => "timeout",
    }
    .to_string()
}

fn policy_key(policy: Policy) -> &'static str {
    match policy {
        Policy::Perfect => "perfect",
        Policy::Sloppy => "sloppy",
        Policy::Idle => "idle",
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
