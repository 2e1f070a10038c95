use serde::Serialize;

use super::{CounterInfo, Exercise, RepCounter, SkipReason};
use crate::{
    config::SitupConfig,
    geometry::joint_angle,
    landmarks::{LandmarkError, LandmarkSet, PoseLandmark},
    smoothing::EmaSmoother,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Up,
    Down,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Up => "up",
            Stage::Down => "down",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodySide {
    Left,
    Right,
}

impl BodySide {
    fn joints(self) -> [PoseLandmark; 3] {
        match self {
            BodySide::Left => [
                PoseLandmark::LeftShoulder,
                PoseLandmark::LeftHip,
                PoseLandmark::LeftKnee,
            ],
            BodySide::Right => [
                PoseLandmark::RightShoulder,
                PoseLandmark::RightHip,
                PoseLandmark::RightKnee,
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SideSelection {
    pub side: BodySide,
    pub shoulder: (f32, f32),
    pub hip: (f32, f32),
    pub knee: (f32, f32),
    pub visibility: f32,
    /// Neither side cleared the visibility floor; the better one was used anyway.
    pub degraded: bool,
}

/// Picks the body side whose shoulder, hip and knee are most visible.
/// Ties go to the left side.
pub fn select_side(
    landmarks: &LandmarkSet,
    min_visibility: f32,
) -> Result<SideSelection, LandmarkError> {
    let left = side_points(landmarks, BodySide::Left)?;
    let right = side_points(landmarks, BodySide::Right)?;

    let (side, [shoulder, hip, knee], visibility) = if left.1 >= right.1 {
        (BodySide::Left, left.0, left.1)
    } else {
        (BodySide::Right, right.0, right.1)
    };

    Ok(SideSelection {
        side,
        shoulder,
        hip,
        knee,
        visibility,
        degraded: visibility <= min_visibility,
    })
}

fn side_points(
    landmarks: &LandmarkSet,
    side: BodySide,
) -> Result<([(f32, f32); 3], f32), LandmarkError> {
    let [shoulder, hip, knee] = side.joints();
    let shoulder = landmarks.require(shoulder)?;
    let hip = landmarks.require(hip)?;
    let knee = landmarks.require(knee)?;
    let visibility = (shoulder.visibility + hip.visibility + knee.visibility) / 3.0;
    Ok((
        [shoulder.position(), hip.position(), knee.position()],
        visibility,
    ))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SitupInfo {
    pub count: u32,
    pub stage: Stage,
    /// Unsmoothed hip angle of this frame.
    pub angle: Option<f32>,
    /// Running EMA that drives the stage; holds its last value on skipped frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_angle: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    /// Smallest smoothed angle of the rep in progress or just completed.
    #[serde(skip)]
    pub rep_depth: Option<f32>,
}

/// Counts sit-ups from the shoulder-hip-knee angle with a hysteresis band:
/// the smoothed angle has to fall below `down_angle` and then rise above
/// `up_angle` for one rep.
pub struct SitupCounter {
    config: SitupConfig,
    count: u32,
    stage: Stage,
    ema: EmaSmoother,
    deepest: Option<f32>,
    completed_depths: Vec<f32>,
}

impl SitupCounter {
    pub fn new(config: SitupConfig) -> Self {
        let ema = EmaSmoother::new(config.ema_alpha);
        Self {
            config,
            count: 0,
            stage: Stage::Up,
            ema,
            deepest: None,
            completed_depths: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Deepest smoothed angle reached in each completed rep, in order.
    pub fn rep_depths(&self) -> &[f32] {
        &self.completed_depths
    }

    pub fn update(&mut self, landmarks: Option<&LandmarkSet>) -> SitupInfo {
        let (angle, skipped) = match self.track(landmarks) {
            Ok(angle) => (Some(angle), None),
            Err(reason) => {
                log::debug!("sit-up frame skipped: {reason}");
                (None, Some(reason))
            }
        };

        SitupInfo {
            count: self.count,
            stage: self.stage,
            angle,
            smoothed_angle: self.ema.value(),
            skipped,
            rep_depth: self.completed_depths.last().copied().or(self.deepest),
        }
    }

    fn track(&mut self, landmarks: Option<&LandmarkSet>) -> Result<f32, SkipReason> {
        let landmarks = landmarks.ok_or(SkipReason::NoLandmarks)?;
        let selection = select_side(landmarks, self.config.min_visibility)?;
        if selection.degraded {
            log::debug!(
                "low landmark visibility ({:.2}), using {:?} side anyway",
                selection.visibility,
                selection.side
            );
        }

        let angle = joint_angle(selection.shoulder, selection.hip, selection.knee);
        let smoothed = self.ema.smooth(angle);
        self.step(smoothed);
        Ok(angle)
    }

    fn step(&mut self, smoothed: f32) {
        if self.stage == Stage::Down {
            self.deepest = Some(self.deepest.map_or(smoothed, |d| d.min(smoothed)));
        }

        if smoothed < self.config.down_angle && self.stage == Stage::Up {
            self.stage = Stage::Down;
            self.deepest = Some(smoothed);
        } else if smoothed > self.config.up_angle && self.stage == Stage::Down {
            self.count += 1;
            self.stage = Stage::Up;
            if let Some(depth) = self.deepest.take() {
                self.completed_depths.push(depth);
            }
            log::debug!("sit-up rep {} completed", self.count);
        }
    }
}

impl RepCounter for SitupCounter {
    fn exercise(&self) -> Exercise {
        Exercise::Situp
    }

    fn process(&mut self, landmarks: Option<&LandmarkSet>, _frame_height: u32) -> CounterInfo {
        CounterInfo::Situp(self.update(landmarks))
    }

    fn count(&self) -> u32 {
        self.count
    }
}
