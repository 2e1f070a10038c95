mod jump;
mod situp;

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

use crate::{
    config::Config,
    landmarks::{LandmarkError, LandmarkSet},
};

pub use jump::{Calibration, JumpCounter, JumpInfo, JumpState};
pub use situp::{BodySide, SideSelection, SitupCounter, SitupInfo, Stage, select_side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    Situp,
    Jump,
}

impl Exercise {
    pub fn label(&self) -> &'static str {
        match self {
            Exercise::Situp => "situp",
            Exercise::Jump => "jump",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Exercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "situp" | "sit-up" | "situps" => Ok(Exercise::Situp),
            "jump" | "jumps" => Ok(Exercise::Jump),
            other => Err(format!("unknown exercise '{other}', expected situp or jump")),
        }
    }
}

/// Why a frame left the counter untouched.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("no body detected")]
    NoLandmarks,
    #[error("malformed landmark data: {0}")]
    Malformed(#[serde(serialize_with = "serialize_display")] LandmarkError),
    #[error("unexpected tracking failure: {0}")]
    Unexpected(String),
}

impl From<LandmarkError> for SkipReason {
    fn from(err: LandmarkError) -> Self {
        SkipReason::Malformed(err)
    }
}

fn serialize_display<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: fmt::Display,
{
    serializer.collect_str(value)
}

/// Per-frame record handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "exercise", rename_all = "snake_case")]
pub enum CounterInfo {
    Situp(SitupInfo),
    Jump(JumpInfo),
}

impl CounterInfo {
    pub fn exercise(&self) -> Exercise {
        match self {
            CounterInfo::Situp(_) => Exercise::Situp,
            CounterInfo::Jump(_) => Exercise::Jump,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            CounterInfo::Situp(info) => info.count,
            CounterInfo::Jump(info) => info.count,
        }
    }

    pub fn skipped(&self) -> Option<&SkipReason> {
        match self {
            CounterInfo::Situp(info) => info.skipped.as_ref(),
            CounterInfo::Jump(info) => info.skipped.as_ref(),
        }
    }

    pub fn display_text(&self) -> String {
        match self {
            CounterInfo::Situp(info) => {
                format!("Reps: {} | Stage: {}", info.count, info.stage.label())
            }
            CounterInfo::Jump(info) => format!(
                "Jumps: {} | Last jump: {:.1} cm | {}",
                info.count, info.last_jump_cm, info.feedback
            ),
        }
    }
}

/// A per-stream repetition counter fed one frame's landmarks at a time.
pub trait RepCounter: Send {
    fn exercise(&self) -> Exercise;

    /// Advances the counter by one frame. `None` means the provider found
    /// no body in the frame.
    fn process(&mut self, landmarks: Option<&LandmarkSet>, frame_height: u32) -> CounterInfo;

    fn count(&self) -> u32;
}

pub fn build_counter(exercise: Exercise, config: &Config) -> Box<dyn RepCounter> {
    match exercise {
        Exercise::Situp => Box::new(SitupCounter::new(config.situp.clone())),
        Exercise::Jump => Box::new(JumpCounter::new(config.jump.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exercise_names() {
        assert_eq!("situp".parse::<Exercise>(), Ok(Exercise::Situp));
        assert_eq!("Jump".parse::<Exercise>(), Ok(Exercise::Jump));
        assert!("pushup".parse::<Exercise>().is_err());
    }

    #[test]
    fn built_counters_start_at_zero() {
        let config = Config::default();
        for exercise in [Exercise::Situp, Exercise::Jump] {
            let counter = build_counter(exercise, &config);
            assert_eq!(counter.exercise(), exercise);
            assert_eq!(counter.count(), 0);
        }
    }

    #[test]
    fn display_text_reads_like_the_panels() {
        let situp = CounterInfo::Situp(SitupInfo {
            count: 4,
            stage: Stage::Down,
            angle: Some(70.0),
            smoothed_angle: Some(75.0),
            skipped: None,
            rep_depth: None,
        });
        assert_eq!(situp.display_text(), "Reps: 4 | Stage: down");

        let jump = CounterInfo::Jump(JumpInfo {
            count: 2,
            state: JumpState::Idle,
            last_jump_cm: 27.46,
            feedback: "Nice jump!".to_string(),
            skipped: None,
            crouch_threshold: Some(320.0),
        });
        assert_eq!(jump.display_text(), "Jumps: 2 | Last jump: 27.5 cm | Nice jump!");
    }

    #[test]
    fn skip_reason_serializes_with_tag() {
        let json = serde_json::to_value(SkipReason::NoLandmarks).expect("serialize");
        assert_eq!(json["reason"], "no_landmarks");

        let json = serde_json::to_value(SkipReason::Malformed(LandmarkError::Missing(
            crate::landmarks::PoseLandmark::LeftHip,
        )))
        .expect("serialize");
        assert_eq!(json["reason"], "malformed");
        assert_eq!(json["detail"], "landmark left_hip is missing");
    }
}
