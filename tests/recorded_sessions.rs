use std::io::Write;

use rep_counter::{
    CounterInfo, Exercise, build_counter,
    config::Config,
    counter::JumpState,
    pipeline::{BlankFrameSource, Delivery, RecordedLandmarks, Session, spawn_session},
};
use serde_json::{Value, json};
use tempfile::NamedTempFile;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn point(x: f32, y: f32) -> Value {
    json!({ "x": x, "y": y, "visibility": 0.95 })
}

fn torso_record(hip_px: f32, shoulder_px: f32) -> Value {
    let hip = hip_px / HEIGHT as f32;
    let shoulder = shoulder_px / HEIGHT as f32;
    json!({
        "width": WIDTH,
        "height": HEIGHT,
        "landmarks": {
            "left_hip": point(0.45, hip),
            "right_hip": point(0.55, hip),
            "left_shoulder": point(0.42, shoulder),
            "right_shoulder": point(0.58, shoulder),
        }
    })
}

/// Left side bent to `degrees` at the hip; right side barely visible.
fn situp_record(degrees: f32) -> Value {
    let theta = degrees.to_radians();
    json!({
        "landmarks": {
            "left_shoulder": point(0.5 + 0.3 * theta.cos(), 0.5 - 0.3 * theta.sin()),
            "left_hip": point(0.5, 0.5),
            "left_knee": point(0.8, 0.5),
            "right_shoulder": { "x": 0.1, "y": 0.1, "visibility": 0.2 },
            "right_hip": { "x": 0.1, "y": 0.2, "visibility": 0.2 },
            "right_knee": { "x": 0.1, "y": 0.3, "visibility": 0.2 },
        }
    })
}

fn write_recording(records: &[Value]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp recording");
    for record in records {
        writeln!(file, "{record}").expect("write record");
    }
    file.flush().expect("flush recording");
    file
}

fn replay(exercise: Exercise, records: &[Value]) -> (Vec<CounterInfo>, rep_counter::SessionSummary) {
    let file = write_recording(records);
    let recorded = RecordedLandmarks::load(file.path()).expect("load recording");
    let (width, height) = recorded.frame_size().unwrap_or((WIDTH, HEIGHT));
    let source = BlankFrameSource::new(width, height, Some(recorded.frame_count()));
    let session = Session::new(
        source,
        recorded.into_provider(),
        build_counter(exercise, &Config::default()),
    );

    let mut infos = Vec::new();
    let summary = session
        .run(|update| infos.push(update.info.clone()))
        .expect("session run");
    (infos, summary)
}

fn repeat(record: Value, frames: usize) -> impl Iterator<Item = Value> {
    std::iter::repeat_n(record, frames)
}

#[test]
fn standing_still_calibrates_jump_baseline() {
    let records: Vec<Value> = repeat(torso_record(300.0, 200.0), 61).collect();
    let (infos, summary) = replay(Exercise::Jump, &records);

    assert_eq!(infos.len(), 61);
    let states: Vec<JumpState> = infos
        .iter()
        .map(|info| match info {
            CounterInfo::Jump(jump) => jump.state,
            CounterInfo::Situp(_) => panic!("expected jump output"),
        })
        .collect();
    assert!(states[..60].iter().all(|state| *state == JumpState::Calibrating));

    let CounterInfo::Jump(last) = &infos[60] else {
        panic!("expected jump output");
    };
    assert_eq!(last.state, JumpState::Idle);
    assert_eq!(last.count, 0);
    assert_eq!(last.feedback, "Calibration Complete! Ready to Jump.");
    let threshold = last.crouch_threshold.expect("calibrated threshold");
    assert!((threshold - 320.0).abs() < 0.05, "threshold {threshold}");

    assert_eq!(summary.reps, 0);
    assert_eq!(summary.frames, 61);
    assert_eq!(summary.frames_without_body, 0);
}

#[test]
fn background_session_delivers_every_frame() {
    let mut records = Vec::new();
    for _ in 0..20 {
        records.extend(repeat(situp_record(45.0), 20));
        records.extend(repeat(situp_record(175.0), 30));
    }
    let file = write_recording(&records);
    let recorded = RecordedLandmarks::load(file.path()).expect("load recording");
    let source = BlankFrameSource::new(WIDTH, HEIGHT, Some(recorded.frame_count()));
    let session = Session::new(
        source,
        recorded.into_provider(),
        build_counter(Exercise::Situp, &Config::default()),
    );

    let handle = spawn_session(session, 8, Delivery::Every);
    let mut delivered = 0u64;
    let mut last_count = 0;
    for update in handle.updates().iter() {
        assert_eq!(update.index, delivered);
        delivered += 1;
        last_count = update.info.count();
        std::thread::sleep(std::time::Duration::from_micros(20));
    }
    let summary = handle.join().expect("join");

    assert_eq!(delivered, summary.frames);
    assert_eq!(summary.frames, 1_000);
    assert_eq!(last_count, 20);
    assert_eq!(summary.reps, 20);
}

#[test]
fn recorded_jump_is_counted_with_height() {
    let mut records = vec![json!({ "landmarks": null })];
    records.extend(repeat(torso_record(300.0, 200.0), 60));
    records.extend(repeat(torso_record(340.0, 200.0), 10));
    records.extend(repeat(torso_record(240.0, 200.0), 10));
    records.extend(repeat(torso_record(300.0, 200.0), 11));

    let (infos, summary) = replay(Exercise::Jump, &records);

    let states: Vec<JumpState> = infos
        .iter()
        .filter_map(|info| match info {
            CounterInfo::Jump(jump) => Some(jump.state),
            CounterInfo::Situp(_) => None,
        })
        .collect();
    assert!(states.contains(&JumpState::Crouching));
    assert!(states.contains(&JumpState::Jumping));

    assert_eq!(summary.exercise, Exercise::Jump);
    assert_eq!(summary.frames, records.len() as u64);
    assert_eq!(summary.frames_without_body, 1);
    assert_eq!(summary.reps, 1);

    let height = summary.metrics.best_jump_cm.expect("jump height");
    assert!((height - 30.0).abs() < 0.1, "height {height}");
    assert_eq!(summary.metrics.consistency_score, Some(1.0));

    let json = serde_json::to_value(&summary).expect("serialize summary");
    assert_eq!(json["final"]["exercise"], "jump");
    assert_eq!(json["final"]["state"], "IDLE");
    assert_eq!(json["final"]["last_jump_cm"], 30.0);
}

#[test]
fn recorded_situps_are_counted() {
    let mut records = Vec::new();
    for _ in 0..3 {
        records.extend(repeat(situp_record(45.0), 20));
        records.extend(repeat(situp_record(175.0), 30));
    }

    let (infos, summary) = replay(Exercise::Situp, &records);

    assert_eq!(infos.last().map(CounterInfo::count), Some(3));
    assert_eq!(summary.reps, 3);
    let depth = summary.metrics.average_depth_angle.expect("depth");
    assert!(depth > 44.0 && depth < 90.0, "depth {depth}");
    assert!(summary.metrics.average_jump_cm.is_none());
}

#[test]
fn gaps_in_frame_numbers_read_as_missing_body() {
    let mut first = situp_record(175.0);
    first["frame"] = json!(0);
    let mut last = situp_record(175.0);
    last["frame"] = json!(4);

    let (infos, summary) = replay(Exercise::Situp, &[first, last]);

    assert_eq!(infos.len(), 5);
    assert_eq!(summary.frames_without_body, 3);
    let json = serde_json::to_value(&infos[2]).expect("serialize");
    assert_eq!(json["skipped"]["reason"], "no_landmarks");
}

#[test]
fn config_file_overrides_thresholds() {
    let mut file = NamedTempFile::new().expect("temp config");
    writeln!(
        file,
        "[situp]\ndown_angle = 60.0\n\n[jump]\ncalibration_frames = 10\nvelocity_reference = \"previous_raw\""
    )
    .expect("write config");

    let config = Config::load(file.path()).expect("load config");
    assert_eq!(config.situp.down_angle, 60.0);
    assert_eq!(config.situp.up_angle, 150.0);
    assert_eq!(config.jump.calibration_frames, 10);

    let mut counter = build_counter(Exercise::Jump, &config);
    // Ten frames fill the buffer; the eleventh finalizes calibration.
    let records: Vec<Value> = repeat(torso_record(300.0, 200.0), 11).collect();
    let recording = write_recording(&records);
    let mut provider = RecordedLandmarks::load(recording.path())
        .expect("load recording")
        .into_provider();

    let mut last = None;
    for index in 0..11 {
        let frame = rep_counter::Frame::blank(WIDTH, HEIGHT, index);
        let landmarks =
            rep_counter::pipeline::LandmarkProvider::process(&mut provider, &frame).expect("landmarks");
        last = Some(counter.process(landmarks.as_ref(), HEIGHT));
    }
    let Some(CounterInfo::Jump(info)) = last else {
        panic!("expected jump output");
    };
    assert_eq!(info.state, JumpState::Idle);
}

#[test]
fn invalid_config_is_rejected() {
    let mut file = NamedTempFile::new().expect("temp config");
    writeln!(file, "[situp]\ndown_angle = 160.0").expect("write config");
    assert!(Config::load(file.path()).is_err());
}
