//! Global min-max normalization for grid tensors.
//!
//! Spatiotemporal grids (flows, counts, speeds) are scaled with a single
//! global range computed over *every* element of the tensor, not per channel:
//!
//! ```text
//! diff       = max - min
//! normalized = (2 * value - (max + min)) / diff      // maps [min, max] to [-1, 1]
//! original   = (normalized * diff + (max + min)) / 2
//! ```
//!
//! The range is fitted once when the dataset is built and never recomputed.
//! `diff` is kept so model outputs can be mapped back to the original units.
//!
//! # Architecture
//!
//! ```text
//! Normalizer (trait)
//!     └── GlobalMinMaxNormalizer
//! ```
//!
//! # Usage
//!
//! ```
//! use grid_window_dataset::preprocessing::{GlobalMinMaxNormalizer, Normalizer};
//! use ndarray::Array4;
//!
//! let mut data = Array4::from_shape_fn((4, 1, 2, 2), |(t, _, _, _)| t as f64);
//! let normalizer = GlobalMinMaxNormalizer::fit(&data);
//!
//! assert_eq!(normalizer.diff(), 3.0);
//! normalizer.normalize_array_inplace(&mut data);
//! assert_eq!(data[[0, 0, 0, 0]], -1.0);
//! assert_eq!(data[[3, 0, 0, 0]], 1.0);
//! ```

use ndarray::{Array, ArrayBase, Data, DataMut, Dimension};

/// Trait for feature normalization strategies.
///
/// Implementers provide methods to:
/// 1. Update internal state with new data
/// 2. Normalize a single value
/// 3. Invert the mapping for model outputs
pub trait Normalizer: Send + Sync {
    /// Update normalizer state with a new value.
    fn update(&mut self, value: f64);

    /// Normalize a single value.
    fn normalize(&self, value: f64) -> f64;

    /// Map a normalized value back to the original scale.
    fn denormalize(&self, value: f64) -> f64;
}

/// Symmetric min-max normalization with one range for the whole tensor.
///
/// A constant tensor (`diff == 0`) normalizes to all zeros instead of NaN,
/// and denormalizes back to `min`.
///
/// NaN values are left out of the range: they do not move `min`/`max` and
/// are not counted, so the fitted range stays finite. NaN inputs still
/// normalize to NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalMinMaxNormalizer {
    min: f64,
    max: f64,
    count: u64,
}

impl GlobalMinMaxNormalizer {
    /// Create an empty normalizer. Feed it with [`Normalizer::update`].
    pub fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }

    /// Fit the global range over every element of `data`.
    ///
    /// Logs a warning when NaN values were skipped.
    pub fn fit<S, D>(data: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let mut normalizer = Self::new();
        for &value in data.iter() {
            normalizer.update(value);
        }

        let skipped = data.len() as u64 - normalizer.count;
        if skipped > 0 {
            log::warn!(
                "Skipped {} NaN values out of {} while fitting the min-max range",
                skipped,
                data.len()
            );
        }
        normalizer
    }

    /// Smallest value seen (0.0 before any update).
    pub fn min(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    /// Largest value seen (0.0 before any update).
    pub fn max(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// `max - min`, the scale needed to denormalize predictions.
    pub fn diff(&self) -> f64 {
        self.max() - self.min()
    }

    /// Number of non-NaN values the range was fitted on.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Normalize every element of `data` in place.
    pub fn normalize_array_inplace<S, D>(&self, data: &mut ArrayBase<S, D>)
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        data.mapv_inplace(|v| self.normalize(v));
    }

    /// Return a denormalized copy of `data` (e.g. a batch of model outputs).
    pub fn denormalize_array<S, D>(&self, data: &ArrayBase<S, D>) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        data.mapv(|v| self.denormalize(v))
    }
}

impl Default for GlobalMinMaxNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for GlobalMinMaxNormalizer {
    fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.count += 1;
    }

    fn normalize(&self, value: f64) -> f64 {
        let diff = self.diff();
        if diff == 0.0 {
            return 0.0;
        }
        (2.0 * value - (self.max() + self.min())) / diff
    }

    fn denormalize(&self, value: f64) -> f64 {
        (value * self.diff() + (self.max() + self.min())) / 2.0
    }
}
