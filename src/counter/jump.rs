use serde::{Serialize, Serializer};

use super::{CounterInfo, Exercise, RepCounter, SkipReason};
use crate::{
    config::{JumpConfig, VelocityReference},
    geometry::mean,
    landmarks::{LandmarkSet, PoseLandmark},
    smoothing::{EmaSmoother, RollingMean},
};

const BODY_NOT_VISIBLE: &str = "Body not visible. Please step back.";
const CALIBRATION_DONE: &str = "Calibration Complete! Ready to Jump.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JumpState {
    Calibrating,
    Idle,
    Crouching,
    Jumping,
}

impl JumpState {
    pub fn label(&self) -> &'static str {
        match self {
            JumpState::Calibrating => "CALIBRATING",
            JumpState::Idle => "IDLE",
            JumpState::Crouching => "CROUCHING",
            JumpState::Jumping => "JUMPING",
        }
    }
}

/// Baseline learned while the person stands still. Heights are in pixels,
/// growing downwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Calibration {
    pub standing_hip: f32,
    pub standing_shoulder: f32,
    pub pixels_to_cm: f32,
    pub crouch_threshold: f32,
}

impl Calibration {
    fn from_samples(hips: &[f32], shoulders: &[f32], fallback: TorsoSample, config: &JumpConfig) -> Self {
        let standing_hip = mean(hips).unwrap_or(fallback.hip);
        let standing_shoulder = mean(shoulders).unwrap_or(fallback.shoulder);
        let torso = (standing_hip - standing_shoulder).abs();
        let pixels_to_cm = if torso > 0.0 {
            config.torso_length_cm / torso
        } else {
            1.0
        };

        Self {
            standing_hip,
            standing_shoulder,
            pixels_to_cm,
            crouch_threshold: standing_hip + config.crouch_depth_cm / pixels_to_cm,
        }
    }
}

enum Phase {
    Collecting {
        remaining: u32,
        hips: Vec<f32>,
        shoulders: Vec<f32>,
    },
    Calibrated(Calibration),
}

#[derive(Clone, Copy, Debug)]
struct TorsoSample {
    hip: f32,
    shoulder: f32,
}

impl TorsoSample {
    fn measure(landmarks: &LandmarkSet, frame_height: u32) -> Result<Self, SkipReason> {
        if frame_height == 0 {
            return Err(SkipReason::Unexpected("frame height is zero".to_string()));
        }
        let height = frame_height as f32;

        let left_hip = landmarks.require(PoseLandmark::LeftHip)?;
        let right_hip = landmarks.require(PoseLandmark::RightHip)?;
        let left_shoulder = landmarks.require(PoseLandmark::LeftShoulder)?;
        let right_shoulder = landmarks.require(PoseLandmark::RightShoulder)?;

        let sample = Self {
            hip: (left_hip.y + right_hip.y) / 2.0 * height,
            shoulder: (left_shoulder.y + right_shoulder.y) / 2.0 * height,
        };
        if !sample.hip.is_finite() || !sample.shoulder.is_finite() {
            return Err(SkipReason::Unexpected(format!(
                "torso heights overflowed for frame height {frame_height}"
            )));
        }
        Ok(sample)
    }
}

fn round_tenth<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f32((value * 10.0).round() / 10.0)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JumpInfo {
    pub count: u32,
    pub state: JumpState,
    #[serde(serialize_with = "round_tenth")]
    pub last_jump_cm: f32,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(skip)]
    pub crouch_threshold: Option<f32>,
}

/// Counts jumps from the vertical motion of the hips.
///
/// The first `calibration_frames` frames with a visible body learn the
/// standing hip height and a pixel-to-centimetre ratio from the torso
/// length. Afterwards a crouch below the standing height arms the counter,
/// fast upward motion marks take-off and downward motion marks the landing,
/// at which point the jump height is taken from the highest hip position.
pub struct JumpCounter {
    config: JumpConfig,
    count: u32,
    state: JumpState,
    phase: Phase,
    hip_history: RollingMean,
    previous_hip: f32,
    ema: EmaSmoother,
    peak: Option<f32>,
    last_jump_cm: f32,
    jump_heights: Vec<f32>,
    feedback: String,
}

impl JumpCounter {
    pub fn new(config: JumpConfig) -> Self {
        let remaining = config.calibration_frames.max(1);
        let hip_history = RollingMean::new(config.history_len);
        let ema = EmaSmoother::new(config.ema_alpha);
        Self {
            count: 0,
            state: JumpState::Calibrating,
            phase: Phase::Collecting {
                remaining,
                hips: Vec::with_capacity(remaining as usize),
                shoulders: Vec::with_capacity(remaining as usize),
            },
            hip_history,
            previous_hip: 0.0,
            ema,
            peak: None,
            last_jump_cm: 0.0,
            jump_heights: Vec::new(),
            feedback: "Stand Still for Calibration".to_string(),
            config,
        }
    }

    pub fn state(&self) -> JumpState {
        self.state
    }

    pub fn calibration(&self) -> Option<Calibration> {
        match self.phase {
            Phase::Calibrated(calibration) => Some(calibration),
            Phase::Collecting { .. } => None,
        }
    }

    pub fn last_jump_cm(&self) -> f32 {
        self.last_jump_cm
    }

    /// Highest hip position (smallest y) of the current or last jump.
    pub fn jump_peak(&self) -> Option<f32> {
        self.peak
    }

    pub fn jump_heights(&self) -> &[f32] {
        &self.jump_heights
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn update(&mut self, landmarks: Option<&LandmarkSet>, frame_height: u32) -> JumpInfo {
        let skipped = match self.track(landmarks, frame_height) {
            Ok(()) => None,
            Err(reason) => {
                log::debug!("jump frame skipped in {:?}: {reason}", self.state);
                self.feedback = BODY_NOT_VISIBLE.to_string();
                Some(reason)
            }
        };

        JumpInfo {
            count: self.count,
            state: self.state,
            last_jump_cm: self.last_jump_cm,
            feedback: self.feedback.clone(),
            skipped,
            crouch_threshold: self.calibration().map(|c| c.crouch_threshold),
        }
    }

    fn track(&mut self, landmarks: Option<&LandmarkSet>, frame_height: u32) -> Result<(), SkipReason> {
        let landmarks = landmarks.ok_or(SkipReason::NoLandmarks)?;
        let sample = TorsoSample::measure(landmarks, frame_height)?;
        let hip = self.hip_history.push(sample.hip);

        match self.phase {
            Phase::Collecting { remaining: 0, .. } => {
                let calibration = self.finish_calibration(sample);
                self.step(hip, &calibration);
            }
            Phase::Collecting { .. } => self.collect(hip, sample),
            Phase::Calibrated(calibration) => self.step(hip, &calibration),
        }
        Ok(())
    }

    fn collect(&mut self, hip: f32, sample: TorsoSample) {
        let Phase::Collecting {
            remaining,
            hips,
            shoulders,
        } = &mut self.phase
        else {
            return;
        };

        self.state = JumpState::Calibrating;
        self.feedback = format!(
            "Stand Still for Calibration ({}s)",
            *remaining / self.config.frames_per_second.max(1)
        );
        hips.push(hip);
        shoulders.push(sample.shoulder);
        *remaining -= 1;
    }

    /// Runs on the first valid frame after the buffer is full; that frame is
    /// then tracked like any other.
    fn finish_calibration(&mut self, sample: TorsoSample) -> Calibration {
        let calibration = match &self.phase {
            Phase::Collecting {
                hips, shoulders, ..
            } => Calibration::from_samples(hips, shoulders, sample, &self.config),
            Phase::Calibrated(calibration) => *calibration,
        };
        log::info!(
            "jump calibration complete: standing hip {:.1}px, {:.3} cm/px, crouch threshold {:.1}px",
            calibration.standing_hip,
            calibration.pixels_to_cm,
            calibration.crouch_threshold
        );
        self.phase = Phase::Calibrated(calibration);
        self.previous_hip = calibration.standing_hip;
        self.state = JumpState::Idle;
        self.feedback = CALIBRATION_DONE.to_string();
        calibration
    }

    fn step(&mut self, hip: f32, calibration: &Calibration) {
        let smoothed = self.ema.smooth(hip);
        let velocity = smoothed - self.previous_hip;
        self.previous_hip = match self.config.velocity_reference {
            VelocityReference::PreviousSmoothed => smoothed,
            VelocityReference::PreviousRaw => hip,
        };

        match self.state {
            JumpState::Idle => {
                if hip > calibration.crouch_threshold {
                    self.state = JumpState::Crouching;
                    self.feedback = "Crouching...".to_string();
                }
            }
            JumpState::Crouching => {
                if velocity < self.config.takeoff_velocity {
                    self.state = JumpState::Jumping;
                    self.feedback = "JUMP!".to_string();
                    self.peak = Some(hip);
                }
            }
            JumpState::Jumping => {
                let peak = self.peak.map_or(hip, |p| p.min(hip));
                self.peak = Some(peak);
                if velocity > self.config.landing_velocity {
                    let height_cm = (calibration.standing_hip - peak) * calibration.pixels_to_cm;
                    self.last_jump_cm = height_cm;
                    self.jump_heights.push(height_cm);
                    self.count += 1;
                    self.state = JumpState::Idle;
                    self.feedback = "Nice jump!".to_string();
                    log::debug!("jump {} landed at {:.1} cm", self.count, height_cm);
                }
            }
            JumpState::Calibrating => {}
        }
    }
}

impl RepCounter for JumpCounter {
    fn exercise(&self) -> Exercise {
        Exercise::Jump
    }

    fn process(&mut self, landmarks: Option<&LandmarkSet>, frame_height: u32) -> CounterInfo {
        CounterInfo::Jump(self.update(landmarks, frame_height))
    }

    fn count(&self) -> u32 {
        self.count
    }
}
