//! Checked numeric conversions for pixel coordinates

use crate::{Error, Result};

/// Truncate a pixel coordinate to `i32`, rejecting NaN, infinities and
/// values outside the `i32` range
///
/// # Errors
///
/// Returns an error if the value is not finite or outside i32 range
#[allow(clippy::cast_possible_truncation)]
pub fn f64_to_i32(value: f64) -> Result<i32> {
    if value.is_finite() && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&value) {
        Ok(value as i32)
    } else {
        Err(Error::InvalidInput(format!("Coordinate {value} does not fit in a pixel index")))
    }
}
