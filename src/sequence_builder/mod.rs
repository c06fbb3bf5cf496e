//! Sample construction from a raw `[T, C, H, W]` grid tensor.
//!
//! Each builder turns the flat time series into its own sample-index space
//! and materializes the result eagerly, so indexed access is a plain view.
//!
//! # Architecture
//!
//! - **SequentialWindows**: `H` history frames paired with the next `P` frames
//! - **SequenceConfig**: history/prediction lengths
//! - **PeriodicalFeatures**: closeness/period/trend history + time encoding
//! - **PeriodicalConfig**: scale lengths, intervals and skip policy
//!
//! Lead-time pairing needs no builder; it indexes the raw tensor directly.
//!
//! # Example
//!
//! ```ignore
//! use grid_window_dataset::sequence_builder::{
//!     PeriodicalConfig, PeriodicalFeatures, SequenceConfig, SequentialWindows,
//! };
//!
//! let windows = SequentialWindows::build(raw.view(), &SequenceConfig::new(12, 3))?;
//! let features = PeriodicalFeatures::build(raw.view(), &PeriodicalConfig::default())?;
//! ```

mod builder;
pub mod periodical;

// Re-export all public types
pub use builder::{SequenceConfig, SequentialWindows};
pub use periodical::{
    encode_time, PeriodicalConfig, PeriodicalFeatures, Scale, ScaleConfig, SkipPolicy,
    TIME_ENCODING_CHANNELS,
};
