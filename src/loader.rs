//! NumPy array loading.
//!
//! Reads a single `.npy` file holding a `T × C × H × W` grid tensor into an
//! [`Array4<f64>`]. Float and integer arrays are accepted and widened to `f64`:
//!
//! | dtype | conversion |
//! |-------|------------|
//! | `<f8` | none |
//! | `<f4` | lossless widening |
//! | `<i8` | `as f64` |
//! | `<i4` | lossless widening |
//!
//! The rank is checked explicitly so a 3-D or 5-D file fails here with
//! [`DatasetError::InvalidShape`] instead of surfacing later as an indexing
//! panic.

use crate::error::{DatasetError, Result};
use ndarray::{Array4, ArrayD, Ix4};
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use std::fs;
use std::path::Path;

/// Rank of a grid tensor: time, channel, height, width.
pub const GRID_RANK: usize = 4;

/// Load a `.npy` file as a `[T, C, H, W]` tensor of `f64`.
///
/// # Errors
///
/// - [`DatasetError::Io`] if the file cannot be read
/// - [`DatasetError::Npy`] if it is not a valid `.npy` file or has an
///   unsupported dtype
/// - [`DatasetError::InvalidShape`] if the array is not rank 4
///
/// # Example
///
/// ```ignore
/// use grid_window_dataset::loader::load_grid_tensor;
///
/// let data = load_grid_tensor("data/bike_nyc.npy")?;
/// let (t, c, h, w) = data.dim();
/// ```
pub fn load_grid_tensor<P: AsRef<Path>>(path: P) -> Result<Array4<f64>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let array = read_widened(&bytes)?;
    let tensor = into_grid(array)?;

    log::debug!(
        "Loaded grid tensor {} with shape {:?}",
        path.display(),
        tensor.shape()
    );

    Ok(tensor)
}

/// Check that a dynamically shaped array is rank 4 and convert it.
pub fn into_grid(array: ArrayD<f64>) -> Result<Array4<f64>> {
    let shape = array.shape().to_vec();
    array
        .into_dimensionality::<Ix4>()
        .map_err(|_| DatasetError::InvalidShape {
            expected_rank: GRID_RANK,
            shape,
        })
}

/// Decode `.npy` bytes, trying each supported dtype in turn.
///
/// Only a descriptor mismatch moves on to the next dtype; any other decode
/// failure is returned immediately.
fn read_widened(bytes: &[u8]) -> Result<ArrayD<f64>> {
    match ArrayD::<f64>::read_npy(bytes) {
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        other => return Ok(other?),
    }

    match ArrayD::<f32>::read_npy(bytes) {
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        other => return Ok(other?.mapv(f64::from)),
    }

    match ArrayD::<i32>::read_npy(bytes) {
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        other => return Ok(other?.mapv(f64::from)),
    }

    let array = ArrayD::<i64>::read_npy(bytes)?;
    Ok(array.mapv(|v| v as f64))
}
