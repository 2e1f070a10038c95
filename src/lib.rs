//! Repetition counting for sit-ups and jumps from per-frame body landmarks.
//!
//! Landmarks come from an external pose estimator through
//! [`pipeline::LandmarkProvider`]; the counters in [`counter`] turn them into
//! rep counts, and [`pipeline::Session`] drives one stream end to end.

pub mod config;
pub mod counter;
pub mod geometry;
pub mod landmarks;
pub mod pipeline;
pub mod smoothing;
pub mod summary;
pub mod types;

pub use config::Config;
pub use counter::{CounterInfo, Exercise, JumpCounter, RepCounter, SitupCounter, build_counter};
pub use landmarks::{Landmark, LandmarkSet, PoseLandmark};
pub use summary::SessionSummary;
pub use types::Frame;
