//! Closeness / Period / Trend feature construction.
//!
//! Decomposes the history of every target frame into three look-back scales
//! at increasing stride, plus a one-hot encoding of the target's position in
//! the day and the week.
//!
//! # Scales
//!
//! ```text
//! Closeness:  len_closeness frames, t_closeness apart   (default 3 × 1h)
//! Period:     len_period frames,    t_period apart      (default 4 × 1 day)
//! Trend:      len_trend frames,     t_trend apart       (default 4 × 1 week)
//! ```
//!
//! For a target at absolute timestep `t`, a scale with length `L` and
//! interval `k` contributes the frames `t - k, t - 2k, ..., t - L·k`,
//! concatenated along the channel axis nearest first. A scale with `L = 0`
//! is inactive and produces no tensor at all.
//!
//! # Skip Offset
//!
//! The first `skip` timesteps cannot be targets because their history would
//! start before frame 0. Two policies compute `skip`:
//!
//! - [`SkipPolicy::Prioritized`] (default): the look-back of the first active
//!   scale in the order trend > period > closeness. This is the conventional
//!   ST-ResNet / DeepSTN formulation. It does not take the maximum over all
//!   scales, so a configuration where a lower-priority scale reaches further
//!   back than the chosen one is rejected with a configuration error.
//! - [`SkipPolicy::Strict`]: the maximum look-back over all active scales.
//!
//! # Time Encoding
//!
//! ```text
//! hour = t mod t_period            -> channel hour        (0..24)
//! day  = (t div t_period) mod 7    -> channel 24 + day    (24..31)
//! ```
//!
//! Both channels are 1 over the whole `H × W` grid, all others 0.
//! `t_period` is read as "timesteps per day", so it must be in `1..=24`.
//!
//! # Example
//!
//! ```ignore
//! use grid_window_dataset::sequence_builder::{PeriodicalConfig, PeriodicalFeatures};
//!
//! let config = PeriodicalConfig::default(); // 3/4/4 frames at 1h/1d/1w
//! let features = PeriodicalFeatures::build(raw.view(), &config)?;
//!
//! // 168 × 4 leading hours have no full trend history
//! assert_eq!(features.skip_offset(), 672);
//! assert_eq!(features.len(), raw.shape()[0] - 672);
//! ```

use crate::error::{DatasetError, Result};
use ndarray::{s, Array4, ArrayView4, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Hour-of-cycle channels in the time encoding.
pub const HOURS_PER_DAY: usize = 24;

/// Day-of-week channels in the time encoding.
pub const DAYS_PER_WEEK: usize = 7;

/// Total channels of the time encoding (24 + 7).
pub const TIME_ENCODING_CHANNELS: usize = HOURS_PER_DAY + DAYS_PER_WEEK;

/// How the number of leading timesteps without full history is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Look-back of the highest-priority active scale (trend > period > closeness).
    #[default]
    Prioritized,

    /// Maximum look-back over all active scales.
    Strict,
}

/// One of the three temporal look-back scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    /// Recent frames (hourly by default)
    Closeness,
    /// Same time on previous days
    Period,
    /// Same time in previous weeks
    Trend,
}

impl Scale {
    /// All scales, in sample field order.
    pub const ALL: [Scale; 3] = [Scale::Closeness, Scale::Period, Scale::Trend];

    /// Field name of this scale in a sample.
    pub fn name(&self) -> &'static str {
        match self {
            Scale::Closeness => "closeness",
            Scale::Period => "period",
            Scale::Trend => "trend",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Length and interval of a single scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleConfig {
    /// Number of frames taken (0 = inactive)
    pub len: usize,

    /// Timesteps between consecutive frames
    pub interval: usize,
}

impl ScaleConfig {
    /// Create a new scale configuration.
    pub fn new(len: usize, interval: usize) -> Self {
        Self { len, interval }
    }

    /// Whether this scale contributes a feature tensor.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.len > 0
    }

    /// How far back the farthest frame of this scale lies, `None` on overflow.
    #[inline]
    pub fn lookback(&self) -> Option<usize> {
        self.len.checked_mul(self.interval)
    }
}

/// Configuration for closeness/period/trend construction.
///
/// Defaults match hourly data: 3 hours, 4 days and 4 weeks of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodicalConfig {
    /// Frames in the closeness scale
    pub len_closeness: usize,

    /// Frames in the period scale
    pub len_period: usize,

    /// Frames in the trend scale
    pub len_trend: usize,

    /// Closeness interval in timesteps
    pub t_closeness: usize,

    /// Period interval in timesteps (timesteps per day)
    pub t_period: usize,

    /// Trend interval in timesteps (timesteps per week)
    pub t_trend: usize,

    /// Skip offset computation
    pub skip_policy: SkipPolicy,
}

impl PeriodicalConfig {
    /// Create a configuration with the prioritized skip policy.
    ///
    /// # Arguments
    ///
    /// * `len_closeness`, `len_period`, `len_trend` - frames per scale (0 disables a scale)
    /// * `t_closeness`, `t_period`, `t_trend` - interval of each scale in timesteps
    pub fn new(
        len_closeness: usize,
        len_period: usize,
        len_trend: usize,
        t_closeness: usize,
        t_period: usize,
        t_trend: usize,
    ) -> Self {
        Self {
            len_closeness,
            len_period,
            len_trend,
            t_closeness,
            t_period,
            t_trend,
            skip_policy: SkipPolicy::Prioritized,
        }
    }

    /// Set the skip policy.
    pub fn with_skip_policy(mut self, policy: SkipPolicy) -> Self {
        self.skip_policy = policy;
        self
    }

    /// Length and interval of one scale.
    pub fn scale(&self, scale: Scale) -> ScaleConfig {
        match scale {
            Scale::Closeness => ScaleConfig::new(self.len_closeness, self.t_closeness),
            Scale::Period => ScaleConfig::new(self.len_period, self.t_period),
            Scale::Trend => ScaleConfig::new(self.len_trend, self.t_trend),
        }
    }

    /// Scales with a non-zero length, in field order.
    pub fn active_scales(&self) -> impl Iterator<Item = (Scale, ScaleConfig)> + '_ {
        Scale::ALL
            .into_iter()
            .map(move |scale| (scale, self.scale(scale)))
            .filter(|(_, cfg)| cfg.is_active())
    }

    /// Skip offset under the configured policy, without further validation.
    fn raw_skip_offset(&self) -> std::result::Result<usize, String> {
        match self.skip_policy {
            SkipPolicy::Prioritized => {
                let (scale, cfg) = [Scale::Trend, Scale::Period, Scale::Closeness]
                    .into_iter()
                    .map(|scale| (scale, self.scale(scale)))
                    .find(|(_, cfg)| cfg.is_active())
                    .ok_or_else(no_active_scale)?;
                checked_lookback(scale, cfg)
            }
            SkipPolicy::Strict => self
                .active_scales()
                .map(|(scale, cfg)| checked_lookback(scale, cfg))
                .collect::<std::result::Result<Vec<_>, _>>()?
                .into_iter()
                .max()
                .ok_or_else(no_active_scale),
        }
    }

    /// Number of leading timesteps excluded from the targets.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Configuration`] if the configuration is invalid
    /// (see [`PeriodicalConfig::validate`]).
    pub fn skip_offset(&self) -> Result<usize> {
        self.validate().map_err(DatasetError::Configuration)?;
        self.raw_skip_offset().map_err(DatasetError::Configuration)
    }

    /// Validate configuration.
    ///
    /// Returns Ok(()) if valid, Err(msg) otherwise.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let skip = self.raw_skip_offset()?;

        if self.t_period == 0 || self.t_period > HOURS_PER_DAY {
            return Err(format!(
                "t_period ({}) must be in 1..={} to index the hour-of-day encoding",
                self.t_period, HOURS_PER_DAY
            ));
        }

        for (scale, cfg) in self.active_scales() {
            if cfg.interval == 0 {
                return Err(format!("{} interval must be > 0", scale));
            }

            let lookback = checked_lookback(scale, cfg)?;
            if lookback > skip {
                return Err(format!(
                    "{} look-back ({} steps) exceeds the skip offset ({} steps); \
                     use the strict skip policy",
                    scale, lookback, skip
                ));
            }
        }

        Ok(())
    }
}

fn no_active_scale() -> String {
    "at least one of len_closeness, len_period, len_trend must be > 0".to_string()
}

fn checked_lookback(scale: Scale, cfg: ScaleConfig) -> std::result::Result<usize, String> {
    cfg.lookback().ok_or_else(|| {
        format!(
            "{} look-back ({} frames x {} steps) overflows usize",
            scale, cfg.len, cfg.interval
        )
    })
}

impl Default for PeriodicalConfig {
    fn default() -> Self {
        Self::new(3, 4, 4, 1, 24, 24 * 7)
    }
}

/// Hour-of-cycle index of absolute timestep `t`.
#[inline]
pub fn hour_of_cycle(t: usize, t_period: usize) -> usize {
    t % t_period
}

/// Day-of-week index of absolute timestep `t`.
#[inline]
pub fn day_of_week(t: usize, t_period: usize) -> usize {
    (t / t_period) % DAYS_PER_WEEK
}

/// One-hot hour/weekday grids for the absolute timesteps in `timesteps`.
///
/// Returns `[timesteps.len(), 31, height, width]`. `t_period` must be in
/// `1..=24`; callers validate this through [`PeriodicalConfig::validate`].
pub fn encode_time(
    timesteps: Range<usize>,
    t_period: usize,
    height: usize,
    width: usize,
) -> Array4<f64> {
    let mut encoding = Array4::zeros((timesteps.len(), TIME_ENCODING_CHANNELS, height, width));

    for (row, t) in timesteps.enumerate() {
        let mut grid = encoding.index_axis_mut(Axis(0), row);
        grid.index_axis_mut(Axis(0), hour_of_cycle(t, t_period)).fill(1.0);
        grid.index_axis_mut(Axis(0), HOURS_PER_DAY + day_of_week(t, t_period)).fill(1.0);
    }

    encoding
}

/// Concatenate the frames of one scale for `n` targets starting at `skip`.
fn stack_scale(raw: ArrayView4<'_, f64>, cfg: ScaleConfig, skip: usize, n: usize) -> Array4<f64> {
    let (num_timesteps, channels, height, width) = raw.dim();
    // Frame count never exceeds T; only an empty result can reach the cap.
    let frames = cfg.len.min(num_timesteps);
    let mut stacked = Array4::zeros((n, channels * frames, height, width));

    if n == 0 {
        return stacked;
    }

    for k in 1..=cfg.len {
        let start = skip - cfg.interval * k;
        stacked
            .slice_mut(s![.., (k - 1) * channels..k * channels, .., ..])
            .assign(&raw.slice(s![start..start + n, .., .., ..]));
    }

    stacked
}

/// Materialized closeness/period/trend features.
#[derive(Debug, Clone)]
pub struct PeriodicalFeatures {
    config: PeriodicalConfig,
    skip: usize,

    /// `[N, C·len_closeness, H, W]`
    closeness: Option<Array4<f64>>,

    /// `[N, C·len_period, H, W]`
    period: Option<Array4<f64>>,

    /// `[N, C·len_trend, H, W]`
    trend: Option<Array4<f64>>,

    /// `[N, 31, H, W]`
    time_encoding: Array4<f64>,

    /// `[N, C, H, W]`
    target: Array4<f64>,
}

impl PeriodicalFeatures {
    /// Build all features from a `[T, C, H, W]` tensor.
    ///
    /// A skip offset at or beyond `T` yields zero samples, not an error.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Configuration`] if the configuration is invalid.
    pub fn build(raw: ArrayView4<'_, f64>, config: &PeriodicalConfig) -> Result<Self> {
        let skip = config.skip_offset()?;
        let (num_timesteps, channels, height, width) = raw.dim();
        let n = num_timesteps.saturating_sub(skip);

        let target = if n > 0 {
            raw.slice(s![skip.., .., .., ..]).to_owned()
        } else {
            Array4::zeros((0, channels, height, width))
        };

        let build_scale = |scale: Scale| {
            let cfg = config.scale(scale);
            cfg.is_active().then(|| stack_scale(raw, cfg, skip, n))
        };

        let features = Self {
            config: *config,
            skip,
            closeness: build_scale(Scale::Closeness),
            period: build_scale(Scale::Period),
            trend: build_scale(Scale::Trend),
            time_encoding: encode_time(skip..skip + n, config.t_period, height, width),
            target,
        };

        log::debug!(
            "Built periodical features: skip={}, samples={}, scales=[{}]",
            skip,
            n,
            config
                .active_scales()
                .map(|(scale, cfg)| format!("{}:{}x{}", scale, cfg.len, cfg.interval))
                .collect::<Vec<_>>()
                .join(", ")
        );
        if n == 0 {
            log::warn!(
                "Skip offset {} leaves no targets in {} timesteps; dataset is empty",
                skip,
                num_timesteps
            );
        }

        Ok(features)
    }

    /// Number of samples (`T - skip`).
    #[inline]
    pub fn len(&self) -> usize {
        self.target.len_of(Axis(0))
    }

    /// Whether no target has full history.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Leading timesteps excluded from the targets.
    pub fn skip_offset(&self) -> usize {
        self.skip
    }

    /// The configuration these features were built with.
    pub fn config(&self) -> &PeriodicalConfig {
        &self.config
    }

    /// Feature tensor of one scale, `None` if that scale is inactive.
    pub fn scale(&self, scale: Scale) -> Option<&Array4<f64>> {
        match scale {
            Scale::Closeness => self.closeness.as_ref(),
            Scale::Period => self.period.as_ref(),
            Scale::Trend => self.trend.as_ref(),
        }
    }

    /// Closeness features, `[N, C·len_closeness, H, W]`.
    pub fn closeness(&self) -> Option<&Array4<f64>> {
        self.closeness.as_ref()
    }

    /// Period features, `[N, C·len_period, H, W]`.
    pub fn period(&self) -> Option<&Array4<f64>> {
        self.period.as_ref()
    }

    /// Trend features, `[N, C·len_trend, H, W]`.
    pub fn trend(&self) -> Option<&Array4<f64>> {
        self.trend.as_ref()
    }

    /// One-hot hour/weekday encoding of each target, `[N, 31, H, W]`.
    pub fn time_encoding(&self) -> &Array4<f64> {
        &self.time_encoding
    }

    /// Target frames, `[N, C, H, W]`.
    pub fn target(&self) -> &Array4<f64> {
        &self.target
    }
}
