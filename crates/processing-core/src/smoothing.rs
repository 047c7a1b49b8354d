//! Box-window smoothing of coordinate columns.

use scopetrace_common::config::{PreprocessConfig, SmoothingMethod};

/// Available smoothing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingAlgorithm {
    /// Centered box average with edge padding; output length equals input length.
    RunningAverage { window: usize },

    /// Box average over full windows only; output has `n - window + 1` values.
    MovingAverage { window: usize },

    /// Pass-through.
    None,
}

/// Column smoothing engine.
#[derive(Debug, Clone, Copy)]
pub struct Smoother {
    algorithm: SmoothingAlgorithm,
}

impl Smoother {
    pub fn new(algorithm: SmoothingAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Smoother selected by the preprocessing configuration.
    pub fn from_config(config: &PreprocessConfig) -> Self {
        let window = config.smoothing_window;
        Self::new(match config.smoothing {
            SmoothingMethod::Running => SmoothingAlgorithm::RunningAverage { window },
            SmoothingMethod::Moving => SmoothingAlgorithm::MovingAverage { window },
            SmoothingMethod::None => SmoothingAlgorithm::None,
        })
    }

    pub fn algorithm(&self) -> SmoothingAlgorithm {
        self.algorithm
    }

    pub fn smooth(&self, data: &[f64]) -> Vec<f64> {
        match self.algorithm {
            SmoothingAlgorithm::RunningAverage { window } => running_average(data, window),
            SmoothingAlgorithm::MovingAverage { window } => moving_average(data, window),
            SmoothingAlgorithm::None => data.to_vec(),
        }
    }
}

/// Centered running average with the same length as `data`.
///
/// Sample `i` averages `data[i - (w - 1 - h) ..= i + h]` with
/// `h = (w - 1) / 2`, so even windows lean one sample towards the past.
/// Indices outside the data repeat the nearest edge sample.
pub fn running_average(data: &[f64], window: usize) -> Vec<f64> {
    if data.is_empty() || window <= 1 {
        return data.to_vec();
    }

    let n = data.len() as isize;
    let ahead = ((window - 1) / 2) as isize;
    let behind = (window - 1) as isize - ahead;
    let at = |i: isize| data[i.clamp(0, n - 1) as usize];

    let mut sum: f64 = (-behind..=ahead).map(at).sum();
    let mut result = Vec::with_capacity(data.len());
    result.push(sum / window as f64);

    for i in 1..n {
        sum += at(i + ahead) - at(i - 1 - behind);
        result.push(sum / window as f64);
    }

    result
}

/// Moving average over full windows ("valid" convolution with a box).
///
/// Empty when `window` is 0 or longer than `data`.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || window > data.len() {
        return vec![];
    }
    data.windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}
