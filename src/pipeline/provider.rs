use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    landmarks::{Landmark, LandmarkSet},
    types::Frame,
};

/// Turns a frame into body landmarks. `Ok(None)` means no body was found.
pub trait LandmarkProvider: Send {
    fn process(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>>;
}

impl<T: LandmarkProvider + ?Sized> LandmarkProvider for Box<T> {
    fn process(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        (**self).process(frame)
    }
}

#[derive(Debug, Deserialize)]
struct RecordLine {
    frame: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    landmarks: Option<HashMap<String, Landmark>>,
}

#[derive(Clone, Debug)]
pub struct RecordedFrame {
    pub index: u64,
    pub size: Option<(u32, u32)>,
    pub landmarks: Option<LandmarkSet>,
}

/// Landmarks captured earlier by an external pose estimator, one JSON
/// object per line.
#[derive(Clone, Debug, Default)]
pub struct RecordedLandmarks {
    frames: Vec<RecordedFrame>,
}

impl RecordedLandmarks {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open landmark recording {}", path.display()))?;
        let recorded = Self::parse(BufReader::new(file))
            .with_context(|| format!("failed to parse {}", path.display()))?;
        log::info!(
            "loaded {} recorded frames from {}",
            recorded.len(),
            path.display()
        );
        Ok(recorded)
    }

    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut frames = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: RecordLine = serde_json::from_str(trimmed)
                .with_context(|| format!("invalid landmark record on line {}", line_no + 1))?;

            let index = record.frame.unwrap_or(frames.len() as u64);
            let landmarks = record.landmarks.map(|named| {
                let (set, unknown) = LandmarkSet::from_named(named);
                if !unknown.is_empty() {
                    log::warn!(
                        "frame {index}: ignoring unknown landmark names {}",
                        unknown.join(", ")
                    );
                }
                set
            });

            frames.push(RecordedFrame {
                index,
                size: record.width.zip(record.height),
                landmarks,
            });
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// Frame size declared by the first record that has one.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frames.iter().find_map(|f| f.size)
    }

    /// Number of frames needed to replay every record.
    pub fn frame_count(&self) -> u64 {
        self.frames.iter().map(|f| f.index + 1).max().unwrap_or(0)
    }

    /// Later records win when two share a frame index.
    pub fn into_provider(self) -> RecordedProvider {
        let mut by_index = HashMap::with_capacity(self.frames.len());
        for frame in self.frames {
            if by_index.insert(frame.index, frame.landmarks).is_some() {
                log::warn!(
                    "frame {} recorded more than once, keeping the later record",
                    frame.index
                );
            }
        }
        RecordedProvider { by_index }
    }
}

/// Replays recorded landmarks by frame index; frames without a record
/// report no body.
#[derive(Debug)]
pub struct RecordedProvider {
    by_index: HashMap<u64, Option<LandmarkSet>>,
}

impl LandmarkProvider for RecordedProvider {
    fn process(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        match self.by_index.remove(&frame.index) {
            Some(landmarks) => Ok(landmarks),
            None => {
                log::debug!("no landmark record for frame {}", frame.index);
                Ok(None)
            }
        }
    }
}
