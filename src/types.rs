//! Common measurement types and traits.
//!
//! Items and box types share the same notion of outer dimensions (centimeters)
//! and weight (ounces). The traits here let the fit evaluation treat both
//! uniformly.

/// Global numerical tolerance for volume and weight comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Length, width and height of a parcel or box, in centimeters.
///
/// # Examples
/// ```
/// use shipment_packer::types::Dimensions;
///
/// let dims = Dimensions::new(30.0, 20.0, 10.0);
/// assert_eq!(dims.volume(), 6000.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    #[inline]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.length, self.width, self.height)
    }

    /// Volume in cubic centimeters.
    ///
    /// A degenerate axis (zero or below) yields a volume of 0.
    #[inline]
    pub fn volume(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        self.length * self.width * self.height
    }

    /// Checks whether any axis is zero or negative.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.length <= 0.0 || self.width <= 0.0 || self.height <= 0.0
    }
}

/// Trait for objects with outer dimensions.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Dimensions;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in ounces.
    fn weight_oz(&self) -> f64;
}

/// Validation helpers shared by items and box types.
pub mod validation {
    use crate::error::{InvalidInputError, Result};

    /// Validates a measurement (dimension or weight).
    ///
    /// Zero is accepted and means "no volume" or "no weight".
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `subject` - Description of the record, e.g. `item 'mug'`
    /// * `field` - Name of the field for error messages
    pub fn validate_measure(value: f64, subject: &str, field: &'static str) -> Result<f64> {
        if !value.is_finite() {
            return Err(InvalidInputError::NonFinite {
                subject: subject.to_string(),
                field,
                value,
            });
        }
        if value < 0.0 {
            return Err(InvalidInputError::Negative {
                subject: subject.to_string(),
                field,
                value,
            });
        }
        Ok(value)
    }

    /// Validates all three axes of a dimension triple.
    pub fn validate_dimensions(dims: (f64, f64, f64), subject: &str) -> Result<()> {
        validate_measure(dims.0, subject, "length_cm")?;
        validate_measure(dims.1, subject, "width_cm")?;
        validate_measure(dims.2, subject, "height_cm")?;
        Ok(())
    }
}
