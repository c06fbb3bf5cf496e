//! Windowed spatiotemporal grid dataset.
//!
//! [`GridDataset`] owns one raw `[T, C, H, W]` tensor and exactly one derived
//! [`Representation`] of it. Three mutually exclusive representations exist:
//!
//! ```text
//! LeadTime    input = raw[i]                       target  = raw[i + lead_time]
//! Sequential  history = raw[i .. i+H]              predict = raw[i+H .. i+H+P]
//! Periodical  closeness/period/trend + time_encoding, target = raw[skip + i]
//! ```
//!
//! Switching representation builds the new derived tensors first and then
//! replaces the old value whole, so a failed reconfiguration leaves the
//! previous representation intact and no state from an earlier mode leaks
//! into the next.
//!
//! # Concurrency
//!
//! Reads (`len`, `get`, `iter`) take `&self`; reconfiguration takes
//! `&mut self`. `GridDataset` is `Send + Sync`, so a configured dataset can be
//! shared by reference with several sampling threads.
//!
//! # Example
//!
//! ```ignore
//! use grid_window_dataset::{GridDataset, Sample};
//!
//! let mut dataset = GridDataset::open("data/taxi_grid.npy", 48, true)?;
//! dataset.set_periodical_representation(3, 4, 4, 1, 24, 168)?;
//!
//! for sample in dataset.iter() {
//!     if let Sample::Periodical { closeness, time_encoding, target, .. } = sample {
//!         // feed the model
//!     }
//! }
//!
//! // Scale predictions back to flows
//! let diff = dataset.get_min_max_difference();
//! ```

use crate::config::{DatasetConfig, RepresentationConfig};
use crate::error::{DatasetError, Result};
use crate::loader;
use crate::preprocessing::GlobalMinMaxNormalizer;
use crate::sequence_builder::{
    PeriodicalConfig, PeriodicalFeatures, Scale, SequenceConfig, SequentialWindows,
};
use ndarray::{
    Array, Array4, ArrayBase, ArrayD, ArrayView3, ArrayView4, ArrayViewD, Axis, Data, Dimension,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Default offset between input and target frames (two days of hourly data).
pub const DEFAULT_LEAD_TIME: usize = 2 * 24;

/// Discriminant of the active representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowingMode {
    /// Frame `i` paired with frame `i + lead_time`
    LeadTime,
    /// History block paired with the following prediction block
    Sequential,
    /// Closeness/period/trend features paired with a target frame
    Periodical,
}

/// Derived state of the active windowing mode.
#[derive(Debug, Clone)]
pub enum Representation {
    /// Reads the raw tensor directly; nothing is materialized.
    LeadTime {
        /// Offset between input and target frame
        lead_time: usize,
    },
    /// Materialized history/prediction blocks.
    Sequential(SequentialWindows),
    /// Materialized closeness/period/trend features.
    Periodical(PeriodicalFeatures),
}

impl Representation {
    /// Which mode this representation belongs to.
    pub fn mode(&self) -> WindowingMode {
        match self {
            Representation::LeadTime { .. } => WindowingMode::LeadTime,
            Representation::Sequential(_) => WindowingMode::Sequential,
            Representation::Periodical(_) => WindowingMode::Periodical,
        }
    }
}

/// One training sample, borrowed from the dataset without copying.
///
/// Frames are `[C, H, W]`; blocks are `[len, C, H, W]`; periodical scale
/// features are `[C·len, H, W]`.
#[derive(Debug, Clone, Copy)]
pub enum Sample<'a> {
    /// Lead-time pair.
    LeadTime {
        /// Frame `i`
        input: ArrayView3<'a, f64>,
        /// Frame `i + lead_time`
        target: ArrayView3<'a, f64>,
    },

    /// Sequential pair.
    Sequential {
        /// `H` consecutive frames
        history: ArrayView4<'a, f64>,
        /// The `P` frames right after `history`
        predict: ArrayView4<'a, f64>,
    },

    /// Periodical features. Scale fields are `None` when that scale is inactive.
    Periodical {
        /// Recent frames, nearest first
        closeness: Option<ArrayView3<'a, f64>>,
        /// Daily-stride frames, nearest first
        period: Option<ArrayView3<'a, f64>>,
        /// Weekly-stride frames, nearest first
        trend: Option<ArrayView3<'a, f64>>,
        /// 31-channel one-hot hour/weekday grid of the target timestep
        time_encoding: ArrayView3<'a, f64>,
        /// Target frame
        target: ArrayView3<'a, f64>,
    },
}

impl<'a> Sample<'a> {
    /// Mode that produced this sample.
    pub fn mode(&self) -> WindowingMode {
        match self {
            Sample::LeadTime { .. } => WindowingMode::LeadTime,
            Sample::Sequential { .. } => WindowingMode::Sequential,
            Sample::Periodical { .. } => WindowingMode::Periodical,
        }
    }

    /// Field name → tensor pairs, in a stable order.
    ///
    /// Names: `input`/`target`, `history`/`predict`, or
    /// `closeness`/`period`/`trend`/`time_encoding`/`target` (inactive
    /// scales omitted).
    pub fn fields(&self) -> Vec<(&'static str, ArrayViewD<'a, f64>)> {
        match *self {
            Sample::LeadTime { input, target } => {
                vec![("input", input.into_dyn()), ("target", target.into_dyn())]
            }
            Sample::Sequential { history, predict } => {
                vec![("history", history.into_dyn()), ("predict", predict.into_dyn())]
            }
            Sample::Periodical {
                closeness,
                period,
                trend,
                time_encoding,
                target,
            } => {
                let scales = [
                    (Scale::Closeness, closeness),
                    (Scale::Period, period),
                    (Scale::Trend, trend),
                ];
                let mut fields: Vec<_> = scales
                    .into_iter()
                    .filter_map(|(scale, view)| view.map(|v| (scale.name(), v.into_dyn())))
                    .collect();
                fields.push(("time_encoding", time_encoding.into_dyn()));
                fields.push(("target", target.into_dyn()));
                fields
            }
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<ArrayViewD<'a, f64>> {
        self.fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, view)| view)
    }

    /// Owned field name → tensor map.
    pub fn into_map(self) -> BTreeMap<&'static str, ArrayD<f64>> {
        self.fields()
            .into_iter()
            .map(|(name, view)| (name, view.to_owned()))
            .collect()
    }
}

/// A `T × C × H × W` tensor exposed through one windowing mode at a time.
#[derive(Debug, Clone)]
pub struct GridDataset {
    /// Raw tensor, normalized in place when requested
    data: Array4<f64>,

    /// Global range fitted before normalization
    normalizer: GlobalMinMaxNormalizer,

    normalized: bool,

    representation: Representation,
}

impl GridDataset {
    /// Load a `.npy` tensor and expose it in lead-time mode.
    ///
    /// # Arguments
    ///
    /// * `path` - `.npy` file of shape `T × C × H × W`
    /// * `lead_time` - offset between input and target frame ([`DEFAULT_LEAD_TIME`] = 48)
    /// * `normalize` - map all values to `[-1, 1]` with the global min-max range
    ///
    /// # Errors
    ///
    /// Propagates [`loader::load_grid_tensor`] failures: I/O, `.npy` decoding,
    /// or a rank other than 4.
    pub fn open<P: AsRef<Path>>(path: P, lead_time: usize, normalize: bool) -> Result<Self> {
        let data = loader::load_grid_tensor(path)?;
        Ok(Self::from_array(data, lead_time, normalize))
    }

    /// Build a dataset from an in-memory tensor.
    pub fn from_array(mut data: Array4<f64>, lead_time: usize, normalize: bool) -> Self {
        let normalizer = GlobalMinMaxNormalizer::fit(&data);

        log::debug!(
            "Grid tensor {:?}: min={}, max={}, diff={}",
            data.shape(),
            normalizer.min(),
            normalizer.max(),
            normalizer.diff()
        );
        if normalizer.diff() == 0.0 && !data.is_empty() {
            log::warn!("Grid tensor is constant; normalized values will all be 0");
        }

        if normalize {
            normalizer.normalize_array_inplace(&mut data);
        }

        Self {
            data,
            normalizer,
            normalized: normalize,
            representation: Representation::LeadTime { lead_time },
        }
    }

    /// Load the tensor named in `config` and apply its representation.
    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        config.validate().map_err(DatasetError::Configuration)?;

        let mut dataset = Self::open(&config.path, config.lead_time, config.normalize)?;
        match &config.representation {
            RepresentationConfig::LeadTime => {}
            RepresentationConfig::Sequential(seq) => {
                dataset.set_sequential_representation(seq.history_length, seq.predict_length)?;
            }
            RepresentationConfig::Periodical(periodical) => {
                dataset.set_periodical_representation_with(periodical)?;
            }
        }
        Ok(dataset)
    }

    // ------------------------------------------------------------------------
    // Normalization
    // ------------------------------------------------------------------------

    /// `max - min` of the raw tensor, for denormalizing model outputs.
    pub fn get_min_max_difference(&self) -> f64 {
        self.normalizer.diff()
    }

    /// The fitted global range.
    pub fn normalization(&self) -> &GlobalMinMaxNormalizer {
        &self.normalizer
    }

    /// Whether the raw tensor was normalized at construction.
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Map values produced in this dataset's scale back to original units.
    ///
    /// Returns an unchanged copy when the dataset was not normalized.
    pub fn denormalize<S, D>(&self, values: &ArrayBase<S, D>) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        if self.normalized {
            self.normalizer.denormalize_array(values)
        } else {
            values.to_owned()
        }
    }

    // ------------------------------------------------------------------------
    // Raw tensor
    // ------------------------------------------------------------------------

    /// View of the (possibly normalized) raw tensor.
    pub fn raw(&self) -> ArrayView4<'_, f64> {
        self.data.view()
    }

    /// `(T, C, H, W)`.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.data.dim()
    }

    /// Number of frames `T`.
    pub fn num_timesteps(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Channels per frame `C`.
    pub fn num_channels(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Offset of the lead-time representation, `None` in the other modes.
    pub fn lead_time(&self) -> Option<usize> {
        match self.representation {
            Representation::LeadTime { lead_time } => Some(lead_time),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Representation
    // ------------------------------------------------------------------------

    /// Active windowing mode.
    pub fn mode(&self) -> WindowingMode {
        self.representation.mode()
    }

    /// Derived state of the active mode.
    pub fn representation(&self) -> &Representation {
        &self.representation
    }

    /// Pair frame `i` with frame `i + lead_time`, dropping any derived tensors.
    pub fn set_lead_time_representation(&mut self, lead_time: usize) {
        self.representation = Representation::LeadTime { lead_time };

        log::debug!(
            "Lead-time representation: lead_time={}, samples={}",
            lead_time,
            self.len()
        );
    }

    /// Pair `history_length` past frames with the next `predict_length` frames.
    ///
    /// A window longer than the series yields an empty dataset.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Configuration`] if either length is zero.
    pub fn set_sequential_representation(
        &mut self,
        history_length: usize,
        predict_length: usize,
    ) -> Result<()> {
        let config = SequenceConfig::new(history_length, predict_length);
        let windows = SequentialWindows::build(self.data.view(), &config)?;

        log::debug!(
            "Sequential representation: history={}, predict={}, samples={}",
            history_length,
            predict_length,
            windows.len()
        );

        self.representation = Representation::Sequential(windows);
        Ok(())
    }

    /// Decompose history into closeness, period and trend features.
    ///
    /// Uses the prioritized skip policy. Conventional values for hourly data
    /// are `(3, 4, 4, 1, 24, 168)`, see [`PeriodicalConfig::default`].
    ///
    /// # Errors
    ///
    /// [`DatasetError::Configuration`] if no scale is active, an active scale
    /// has a zero interval, `t_period` is outside `1..=24`, a look-back
    /// overflows `usize`, or a scale needs more history than the skip offset
    /// provides.
    pub fn set_periodical_representation(
        &mut self,
        len_closeness: usize,
        len_period: usize,
        len_trend: usize,
        t_closeness: usize,
        t_period: usize,
        t_trend: usize,
    ) -> Result<()> {
        let config = PeriodicalConfig::new(
            len_closeness,
            len_period,
            len_trend,
            t_closeness,
            t_period,
            t_trend,
        );
        self.set_periodical_representation_with(&config)
    }

    /// Periodical representation from a full configuration (including skip policy).
    pub fn set_periodical_representation_with(&mut self, config: &PeriodicalConfig) -> Result<()> {
        let features = PeriodicalFeatures::build(self.data.view(), config)?;
        self.representation = Representation::Periodical(features);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Indexed access
    // ------------------------------------------------------------------------

    /// Number of samples in the active mode.
    pub fn len(&self) -> usize {
        match &self.representation {
            Representation::LeadTime { lead_time } => self.num_timesteps().saturating_sub(*lead_time),
            Representation::Sequential(windows) => windows.len(),
            Representation::Periodical(features) => features.len(),
        }
    }

    /// Whether the active mode has no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample `index` of the active mode.
    ///
    /// # Errors
    ///
    /// [`DatasetError::IndexOutOfBounds`] unless `index < len()`.
    pub fn get(&self, index: usize) -> Result<Sample<'_>> {
        let len = self.len();
        if index >= len {
            return Err(DatasetError::IndexOutOfBounds { index, len });
        }

        let sample = match &self.representation {
            Representation::LeadTime { lead_time } => Sample::LeadTime {
                input: self.data.index_axis(Axis(0), index),
                target: self.data.index_axis(Axis(0), index + lead_time),
            },
            Representation::Sequential(windows) => Sample::Sequential {
                history: windows.history().index_axis(Axis(0), index),
                predict: windows.predict().index_axis(Axis(0), index),
            },
            Representation::Periodical(features) => {
                let at = move |scale: Scale| {
                    features.scale(scale).map(|a| a.index_axis(Axis(0), index))
                };
                Sample::Periodical {
                    closeness: at(Scale::Closeness),
                    period: at(Scale::Period),
                    trend: at(Scale::Trend),
                    time_encoding: features.time_encoding().index_axis(Axis(0), index),
                    target: features.target().index_axis(Axis(0), index),
                }
            }
        };

        Ok(sample)
    }

    /// Iterate over all samples of the active mode in index order.
    pub fn iter(&self) -> SampleIter<'_> {
        SampleIter {
            dataset: self,
            next: 0,
            len: self.len(),
        }
    }
}

impl<'a> IntoIterator for &'a GridDataset {
    type Item = Sample<'a>;
    type IntoIter = SampleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the samples of a [`GridDataset`].
pub struct SampleIter<'a> {
    dataset: &'a GridDataset,
    next: usize,
    len: usize,
}

impl<'a> Iterator for SampleIter<'a> {
    type Item = Sample<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let sample = self.dataset.get(self.next).ok();
        self.next += 1;
        sample
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SampleIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence_builder::SkipPolicy;

    /// T frames of shape [C, 2, 2], frame t filled with t.
    fn indexed_dataset(t: usize, c: usize, lead_time: usize) -> GridDataset {
        let data = Array4::from_shape_fn((t, c, 2, 2), |(t, _, _, _)| t as f64);
        GridDataset::from_array(data, lead_time, false)
    }

    fn frame_value(frame: ArrayView3<'_, f64>) -> f64 {
        let first = frame[[0, 0, 0]];
        assert!(frame.iter().all(|&v| v == first));
        first
    }

    #[test]
    fn test_defaults_to_lead_time() {
        let dataset = indexed_dataset(60, 1, DEFAULT_LEAD_TIME);
        assert_eq!(dataset.mode(), WindowingMode::LeadTime);
        assert_eq!(dataset.len(), 12);
        assert_eq!(dataset.lead_time(), Some(48));
    }

    #[test]
    fn test_lead_time_pairs() {
        let dataset = indexed_dataset(10, 1, 3);
        assert_eq!(dataset.len(), 7);

        for i in 0..dataset.len() {
            match dataset.get(i).unwrap() {
                Sample::LeadTime { input, target } => {
                    assert_eq!(frame_value(input), i as f64);
                    assert_eq!(frame_value(target), (i + 3) as f64);
                }
                other => panic!("unexpected sample {:?}", other.mode()),
            }
        }
    }

    #[test]
    fn test_lead_time_longer_than_series() {
        let dataset = indexed_dataset(5, 1, 48);
        assert!(dataset.is_empty());
        assert!(dataset.get(0).is_err());
    }

    #[test]
    fn test_out_of_bounds() {
        let mut dataset = indexed_dataset(10, 1, 3);
        match dataset.get(7) {
            Err(DatasetError::IndexOutOfBounds { index, len }) => {
                assert_eq!(index, 7);
                assert_eq!(len, 7);
            }
            other => panic!("expected IndexOutOfBounds, got {:?}", other.map(|s| s.mode())),
        }

        dataset.set_sequential_representation(2, 1).unwrap();
        assert!(dataset.get(6).is_ok());
        assert!(matches!(dataset.get(7), Err(DatasetError::IndexOutOfBounds { index: 7, len: 7 })));
    }

    #[test]
    fn test_normalization_applied_once() {
        let data = Array4::from_shape_fn((5, 1, 1, 2), |(t, _, _, w)| (t * 2 + w) as f64);
        let dataset = GridDataset::from_array(data.clone(), 1, true);

        assert!(dataset.is_normalized());
        assert_eq!(dataset.get_min_max_difference(), 9.0);
        assert_eq!(dataset.raw()[[0, 0, 0, 0]], -1.0);
        assert_eq!(dataset.raw()[[4, 0, 0, 1]], 1.0);

        let restored = dataset.denormalize(&dataset.raw());
        for (a, b) in restored.iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_diff_available_without_normalization() {
        let data = Array4::from_shape_fn((4, 1, 1, 1), |(t, _, _, _)| 10.0 * t as f64);
        let dataset = GridDataset::from_array(data.clone(), 1, false);

        assert!(!dataset.is_normalized());
        assert_eq!(dataset.get_min_max_difference(), 30.0);
        assert_eq!(dataset.raw(), data.view());
        assert_eq!(dataset.denormalize(&data), data);
    }

    #[test]
    fn test_sequential_samples() {
        let mut dataset = indexed_dataset(10, 1, 3);
        dataset.set_sequential_representation(2, 1).unwrap();

        assert_eq!(dataset.mode(), WindowingMode::Sequential);
        assert_eq!(dataset.len(), 7);

        match dataset.get(6).unwrap() {
            Sample::Sequential { history, predict } => {
                let h: Vec<f64> = history.outer_iter().map(frame_value).collect();
                let p: Vec<f64> = predict.outer_iter().map(frame_value).collect();
                assert_eq!(h, vec![6.0, 7.0]);
                assert_eq!(p, vec![8.0]);
            }
            other => panic!("unexpected sample {:?}", other.mode()),
        }
    }

    #[test]
    fn test_periodical_sample_fields() {
        let mut dataset = indexed_dataset(10, 1, 3);
        dataset.set_periodical_representation(2, 0, 1, 1, 2, 4).unwrap();

        assert_eq!(dataset.mode(), WindowingMode::Periodical);
        assert_eq!(dataset.len(), 6);

        let sample = dataset.get(0).unwrap();
        let names: Vec<&str> = sample.fields().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["closeness", "trend", "time_encoding", "target"]);

        assert!(sample.get("period").is_none());
        let target = sample.get("target").unwrap();
        assert_eq!(target[[0, 0, 0]], 4.0);
        let closeness = sample.get("closeness").unwrap();
        assert_eq!(closeness.shape(), &[2, 2, 2]);
        assert_eq!(closeness[[0, 0, 0]], 3.0);
        assert_eq!(closeness[[1, 0, 0]], 2.0);
    }

    #[test]
    fn test_periodical_strict_policy() {
        let mut dataset = indexed_dataset(20, 1, 3);
        let config = PeriodicalConfig::new(5, 0, 1, 1, 24, 3);

        assert!(dataset.set_periodical_representation_with(&config).is_err());
        assert_eq!(dataset.mode(), WindowingMode::LeadTime);

        dataset
            .set_periodical_representation_with(&config.with_skip_policy(SkipPolicy::Strict))
            .unwrap();
        assert_eq!(dataset.len(), 15);
    }

    #[test]
    fn test_failed_reconfiguration_keeps_previous_state() {
        let mut dataset = indexed_dataset(10, 1, 3);
        dataset.set_sequential_representation(2, 1).unwrap();

        let err = dataset
            .set_periodical_representation(0, 0, 0, 1, 24, 168)
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(dataset.mode(), WindowingMode::Sequential);
        assert_eq!(dataset.len(), 7);
    }

    #[test]
    fn test_switch_periodical_to_sequential() {
        let mut dataset = indexed_dataset(30, 1, 3);
        dataset.set_periodical_representation(3, 2, 0, 1, 4, 168).unwrap();
        assert_eq!(dataset.len(), 22);

        dataset.set_sequential_representation(4, 2).unwrap();
        assert_eq!(dataset.mode(), WindowingMode::Sequential);
        assert_eq!(dataset.len(), 24);
        assert!(matches!(dataset.representation(), Representation::Sequential(_)));

        let sample = dataset.get(0).unwrap();
        let names: Vec<&str> = sample.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["history", "predict"]);
    }

    #[test]
    fn test_back_to_lead_time() {
        let mut dataset = indexed_dataset(10, 1, 3);
        dataset.set_sequential_representation(2, 1).unwrap();
        assert_eq!(dataset.lead_time(), None);
        dataset.set_lead_time_representation(5);

        assert_eq!(dataset.mode(), WindowingMode::LeadTime);
        assert_eq!(dataset.lead_time(), Some(5));
        assert!(matches!(dataset.representation(), Representation::LeadTime { lead_time: 5 }));
        assert_eq!(dataset.len(), 5);
        let map = dataset.get(0).unwrap().into_map();
        assert_eq!(map["target"][[0, 0, 0]], 5.0);
    }

    #[test]
    fn test_overflowing_lengths() {
        let mut dataset = indexed_dataset(10, 1, 3);

        dataset.set_sequential_representation(usize::MAX, 1).unwrap();
        assert_eq!(dataset.mode(), WindowingMode::Sequential);
        assert!(dataset.is_empty());

        let err = dataset
            .set_periodical_representation(1, 0, 2, 1, 24, usize::MAX)
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(dataset.mode(), WindowingMode::Sequential);
    }

    #[test]
    fn test_iter_matches_get() {
        let mut dataset = indexed_dataset(12, 2, 4);
        dataset.set_sequential_representation(3, 2).unwrap();

        let iter = dataset.iter();
        assert_eq!(iter.len(), 7);

        for (i, sample) in dataset.iter().enumerate() {
            let expected = dataset.get(i).unwrap().into_map();
            assert_eq!(sample.into_map(), expected);
        }
        assert_eq!((&dataset).into_iter().count(), 7);
    }

    #[test]
    fn test_dataset_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GridDataset>();
    }
}
