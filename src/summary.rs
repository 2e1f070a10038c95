use serde::Serialize;

use crate::{
    counter::{CounterInfo, Exercise, SkipReason},
    geometry::mean,
};

/// Per-rep quality figures collected over a whole stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RepMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_depth_angle: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_jump_cm: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_jump_cm: Option<f32>,
    /// 1.0 when every rep looked the same, falling towards 0.0 as they spread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency_score: Option<f32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub exercise: Exercise,
    pub frames: u64,
    pub frames_without_body: u64,
    pub frames_malformed: u64,
    pub reps: u32,
    pub metrics: RepMetrics,
    #[serde(rename = "final")]
    pub final_info: Option<CounterInfo>,
}

/// Folds the per-frame counter output of one stream into a summary.
#[derive(Debug)]
pub struct SummaryBuilder {
    exercise: Exercise,
    frames: u64,
    frames_without_body: u64,
    frames_malformed: u64,
    reps: u32,
    rep_samples: Vec<f32>,
    last: Option<CounterInfo>,
}

impl SummaryBuilder {
    pub fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            frames: 0,
            frames_without_body: 0,
            frames_malformed: 0,
            reps: 0,
            rep_samples: Vec::new(),
            last: None,
        }
    }

    pub fn observe(&mut self, info: &CounterInfo) {
        self.frames += 1;
        match info.skipped() {
            Some(SkipReason::NoLandmarks) => self.frames_without_body += 1,
            Some(SkipReason::Malformed(_) | SkipReason::Unexpected(_)) => {
                self.frames_malformed += 1
            }
            None => {}
        }

        if info.count() > self.reps {
            let sample = match info {
                CounterInfo::Situp(situp) => situp.rep_depth,
                CounterInfo::Jump(jump) => Some(jump.last_jump_cm),
            };
            self.rep_samples.extend(sample);
            self.reps = info.count();
        }
        self.last = Some(info.clone());
    }

    pub fn finish(self) -> SessionSummary {
        let consistency_score = consistency(&self.rep_samples);
        let metrics = match self.exercise {
            Exercise::Situp => RepMetrics {
                average_depth_angle: mean(&self.rep_samples),
                consistency_score,
                ..RepMetrics::default()
            },
            Exercise::Jump => RepMetrics {
                average_jump_cm: mean(&self.rep_samples),
                best_jump_cm: self.rep_samples.iter().copied().reduce(f32::max),
                consistency_score,
                ..RepMetrics::default()
            },
        };

        SessionSummary {
            exercise: self.exercise,
            frames: self.frames,
            frames_without_body: self.frames_without_body,
            frames_malformed: self.frames_malformed,
            reps: self.reps,
            metrics,
            final_info: self.last,
        }
    }
}

/// One minus the coefficient of variation, clamped to `[0, 1]`.
fn consistency(samples: &[f32]) -> Option<f32> {
    let avg = mean(samples)?;
    if avg.abs() < f32::EPSILON {
        return None;
    }
    let variance = samples.iter().map(|s| (s - avg).powi(2)).sum::<f32>() / samples.len() as f32;
    Some((1.0 - variance.sqrt() / avg.abs()).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::{JumpInfo, JumpState, SitupInfo, Stage};

    fn jump(count: u32, last_jump_cm: f32, skipped: Option<SkipReason>) -> CounterInfo {
        CounterInfo::Jump(JumpInfo {
            count,
            state: JumpState::Idle,
            last_jump_cm,
            feedback: String::new(),
            skipped,
            crouch_threshold: None,
        })
    }

    #[test]
    fn collects_jump_heights_on_count_changes() {
        let mut builder = SummaryBuilder::new(Exercise::Jump);
        builder.observe(&jump(0, 0.0, Some(SkipReason::NoLandmarks)));
        builder.observe(&jump(1, 20.0, None));
        builder.observe(&jump(1, 20.0, None));
        builder.observe(&jump(2, 30.0, None));

        let summary = builder.finish();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.frames_without_body, 1);
        assert_eq!(summary.reps, 2);
        assert_eq!(summary.metrics.average_jump_cm, Some(25.0));
        assert_eq!(summary.metrics.best_jump_cm, Some(30.0));
        let score = summary.metrics.consistency_score.expect("score");
        assert!((score - 0.8).abs() < 1e-5);
    }

    #[test]
    fn situp_depths_feed_average_angle() {
        let mut builder = SummaryBuilder::new(Exercise::Situp);
        for (count, depth) in [(0, Some(70.0)), (1, Some(60.0)), (2, Some(80.0))] {
            builder.observe(&CounterInfo::Situp(SitupInfo {
                count,
                stage: Stage::Up,
                angle: Some(160.0),
                smoothed_angle: Some(160.0),
                skipped: None,
                rep_depth: depth,
            }));
        }
        let summary = builder.finish();
        assert_eq!(summary.metrics.average_depth_angle, Some(70.0));
        assert_eq!(summary.metrics.average_jump_cm, None);
    }

    #[test]
    fn empty_stream_has_no_metrics() {
        let summary = SummaryBuilder::new(Exercise::Jump).finish();
        assert_eq!(summary.reps, 0);
        assert_eq!(summary.metrics, RepMetrics::default());
        assert!(summary.final_info.is_none());
    }
}
