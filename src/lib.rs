//! Grid Window Dataset
//!
//! Windowed access to gridded spatiotemporal tensors for deep learning models.
//!
//! # Overview
//!
//! A pre-materialized `T × C × H × W` tensor (time, channel, grid height, grid
//! width) is loaded once and exposed as (input, target) training samples in
//! one of three representations:
//!
//! - **Lead-Time**: frame `i` → frame `i + lead_time`
//! - **Sequential**: `H` history frames → the next `P` frames
//! - **Periodical**: closeness / period / trend history with a one-hot
//!   hour-of-day and day-of-week encoding of the target (ST-ResNet style)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Grid Window Dataset                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  loader/           - NumPy .npy reading, rank check            │
//! │  preprocessing/    - Global min-max normalization              │
//! │  sequence_builder/ - Sequential and periodical sample builders │
//! │  dataset/          - GridDataset, indexed access               │
//! │  config/           - TOML/JSON dataset configuration           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_window_dataset::{GridDataset, Sample};
//!
//! let mut dataset = GridDataset::open("data/bike_nyc.npy", 48, true)?;
//! dataset.set_sequential_representation(12, 3)?;
//!
//! for i in 0..dataset.len() {
//!     let sample = dataset.get(i)?;
//!     let fields = sample.fields(); // [("history", ..), ("predict", ..)]
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod prelude;
pub mod preprocessing;
pub mod sequence_builder;

// Re-exports - Errors
pub use error::{DatasetError, Result};

// Re-exports - Config
pub use config::{DatasetConfig, RepresentationConfig};

// Re-exports - Dataset
pub use dataset::{
    GridDataset, Representation, Sample, SampleIter, WindowingMode, DEFAULT_LEAD_TIME,
};

// Re-exports - Loading
pub use loader::load_grid_tensor;

// Re-exports - Preprocessing
pub use preprocessing::{GlobalMinMaxNormalizer, Normalizer};

// Re-exports - Sequence Building
pub use sequence_builder::{
    PeriodicalConfig, PeriodicalFeatures, Scale, ScaleConfig, SequenceConfig, SequentialWindows,
    SkipPolicy, TIME_ENCODING_CHANNELS,
};
