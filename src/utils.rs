//! Utility functions for image handling and numeric conversions.

pub mod image_conversion;
pub mod safe_cast;
