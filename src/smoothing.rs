use std::collections::VecDeque;

/// Single-value exponential moving average.
///
/// `alpha` weights the newest sample; `1.0` disables smoothing.
#[derive(Clone, Debug)]
pub struct EmaSmoother {
    alpha: f32,
    smoothed: Option<f32>,
}

impl EmaSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            smoothed: None,
        }
    }

    pub fn smooth(&mut self, value: f32) -> f32 {
        let next = match self.smoothed {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };
        self.smoothed = Some(next);
        next
    }

    pub fn value(&self) -> Option<f32> {
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = None;
    }
}

/// Mean over the last `capacity` samples.
#[derive(Clone, Debug)]
pub struct RollingMean {
    capacity: usize,
    samples: VecDeque<f32>,
}

impl RollingMean {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f32) -> f32 {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
