//! Tensor preprocessing applied before any windowing.
//!
//! - **Normalization**: global min-max scaling of the raw grid to `[-1, 1]`,
//!   fitted once over all elements and invertible via the stored range.
//!
//! # Example
//!
//! ```ignore
//! use grid_window_dataset::preprocessing::{GlobalMinMaxNormalizer, Normalizer};
//!
//! let normalizer = GlobalMinMaxNormalizer::fit(&raw);
//! normalizer.normalize_array_inplace(&mut raw);
//!
//! // Later, map model outputs back to original units
//! let flows = normalizer.denormalize_array(&predictions);
//! ```

pub mod normalization;

pub use normalization::{GlobalMinMaxNormalizer, Normalizer};
