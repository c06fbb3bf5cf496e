//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! # Usage
//!
//! ```ignore
//! use grid_window_dataset::prelude::*;
//!
//! let mut dataset = GridDataset::open("data/taxi.npy", DEFAULT_LEAD_TIME, true)?;
//! dataset.set_periodical_representation_with(
//!     &PeriodicalConfig::default().with_skip_policy(SkipPolicy::Strict),
//! )?;
//! ```
//!
//! # What's Included
//!
//! ## Dataset
//! - [`GridDataset`] - Windowed dataset over a grid tensor
//! - [`Sample`] - Borrowed training sample
//! - [`WindowingMode`] - Active representation discriminant
//!
//! ## Configuration
//! - [`DatasetConfig`] - File-backed configuration
//! - [`RepresentationConfig`] - Representation choice
//! - [`SequenceConfig`] - Sequential window lengths
//! - [`PeriodicalConfig`] - Closeness/period/trend scales
//! - [`SkipPolicy`] - Skip offset computation
//!
//! ## Normalization
//! - [`Normalizer`] - Normalization trait
//! - [`GlobalMinMaxNormalizer`] - Global `[-1, 1]` scaling
//!
//! ## Errors
//! - [`DatasetError`], [`Result`]

// ============================================================================
// Dataset
// ============================================================================

pub use crate::dataset::{
    GridDataset, Representation, Sample, SampleIter, WindowingMode, DEFAULT_LEAD_TIME,
};

// ============================================================================
// Configuration
// ============================================================================

pub use crate::config::{DatasetConfig, RepresentationConfig};
pub use crate::sequence_builder::{PeriodicalConfig, Scale, SequenceConfig, SkipPolicy};

// ============================================================================
// Normalization
// ============================================================================

pub use crate::preprocessing::{GlobalMinMaxNormalizer, Normalizer};

// ============================================================================
// Errors
// ============================================================================

pub use crate::error::{DatasetError, Result};
