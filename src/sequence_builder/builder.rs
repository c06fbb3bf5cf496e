//! Sequential (history → prediction) windowing.
//!
//! Slides a window of `history_length + predict_length` frames across the raw
//! tensor with stride 1. For every end index `e` in `[H + P, T)`:
//!
//! ```text
//! history = raw[e - P - H .. e - P]
//! predict = raw[e - P     .. e    ]
//! ```
//!
//! so sample `i` (with `e = H + P + i`) pairs frames `i .. i + H` with frames
//! `i + H .. i + H + P`. There are `T - H - P` samples; the final frame `T - 1`
//! never appears in a prediction block.
//!
//! # Memory
//!
//! Windows are materialized eagerly into two contiguous 5-D arrays:
//!
//! - `history`: `[N, H, C, height, width]`
//! - `predict`: `[N, P, C, height, width]`
//!
//! Memory is `O(N × (H + P) × C × height × width)`. Indexed access is a view
//! into these arrays and never copies.
//!
//! # Example
//!
//! ```ignore
//! use grid_window_dataset::sequence_builder::{SequenceConfig, SequentialWindows};
//!
//! let config = SequenceConfig::new(12, 3); // 12 frames in, 3 frames out
//! let windows = SequentialWindows::build(raw.view(), &config)?;
//!
//! let (history, predict) = windows.sample(0).unwrap();
//! assert_eq!(history.shape()[0], 12);
//! ```

use crate::error::{DatasetError, Result};
use ndarray::{s, Array5, ArrayView4, Axis};

/// Configuration for sequential windowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SequenceConfig {
    /// Number of past frames per sample (model input length)
    pub history_length: usize,

    /// Number of future frames per sample (model output length)
    pub predict_length: usize,
}

impl SequenceConfig {
    /// Create a new sequence configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use grid_window_dataset::sequence_builder::SequenceConfig;
    ///
    /// let config = SequenceConfig::new(12, 3);
    /// assert_eq!(config.window_size(), Some(15));
    /// ```
    pub fn new(history_length: usize, predict_length: usize) -> Self {
        Self {
            history_length,
            predict_length,
        }
    }

    /// Total frames covered by one sample, `None` if the sum overflows.
    #[inline]
    pub fn window_size(&self) -> Option<usize> {
        self.history_length.checked_add(self.predict_length)
    }

    /// Number of samples produced from a series of `num_timesteps` frames.
    ///
    /// Zero when the window does not fit strictly inside the series.
    #[inline]
    pub fn num_samples(&self, num_timesteps: usize) -> usize {
        self.window_size().map_or(0, |window| num_timesteps.saturating_sub(window))
    }

    /// Validate configuration.
    ///
    /// Returns Ok(()) if valid, Err(msg) otherwise.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.history_length == 0 {
            return Err("history_length must be > 0".to_string());
        }

        if self.predict_length == 0 {
            return Err("predict_length must be > 0".to_string());
        }

        Ok(())
    }
}

/// Materialized history/prediction blocks.
#[derive(Debug, Clone)]
pub struct SequentialWindows {
    config: SequenceConfig,

    /// `[N, H, C, height, width]`
    history: Array5<f64>,

    /// `[N, P, C, height, width]`
    predict: Array5<f64>,
}

impl SequentialWindows {
    /// Build all windows from a `[T, C, H, W]` tensor.
    ///
    /// A window that does not fit (`H + P >= T`) yields zero samples, not an
    /// error.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Configuration`] if either length is zero.
    pub fn build(raw: ArrayView4<'_, f64>, config: &SequenceConfig) -> Result<Self> {
        config.validate().map_err(DatasetError::Configuration)?;

        let (num_timesteps, channels, height, width) = raw.dim();
        let h = config.history_length;
        let p = config.predict_length;
        let n = config.num_samples(num_timesteps);

        // Block axes never exceed T; only an empty result can reach the cap.
        let mut history = Array5::zeros((n, h.min(num_timesteps), channels, height, width));
        let mut predict = Array5::zeros((n, p.min(num_timesteps), channels, height, width));

        for i in 0..n {
            history
                .index_axis_mut(Axis(0), i)
                .assign(&raw.slice(s![i..i + h, .., .., ..]));
            predict
                .index_axis_mut(Axis(0), i)
                .assign(&raw.slice(s![i + h..i + h + p, .., .., ..]));
        }

        if n == 0 {
            log::warn!(
                "Sequential window of {}+{} frames does not fit in {} timesteps; dataset is empty",
                h,
                p,
                num_timesteps
            );
        }

        Ok(Self {
            config: *config,
            history,
            predict,
        })
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.predict.len_of(Axis(0))
    }

    /// Whether no window fit in the series.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configuration these windows were built with.
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// All history blocks, `[N, H, C, height, width]`.
    pub fn history(&self) -> &Array5<f64> {
        &self.history
    }

    /// All prediction blocks, `[N, P, C, height, width]`.
    pub fn predict(&self) -> &Array5<f64> {
        &self.predict
    }

    /// Views of the history and prediction blocks of sample `index`.
    pub fn sample(&self, index: usize) -> Option<(ArrayView4<'_, f64>, ArrayView4<'_, f64>)> {
        if index >= self.len() {
            return None;
        }
        Some((
            self.history.index_axis(Axis(0), index),
            self.predict.index_axis(Axis(0), index),
        ))
    }
}
