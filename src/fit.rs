//! Fit evaluation between items and box types.
//!
//! Fitting is decided on aggregate volume and weight only. Items are never
//! arranged geometrically inside the box, so a long thin item may "fit" a
//! cube of equal volume. This is a known approximation and not 3D packing.

use crate::model::{BoxType, Item, PackedBox};
use crate::types::{Dimensional, Weighted};

/// Aggregate volume and weight of one or more items.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Load {
    pub volume: f64,
    pub weight_oz: f64,
}

impl Load {
    pub fn of<T: Dimensional + Weighted>(object: &T) -> Self {
        Self {
            volume: object.volume(),
            weight_oz: object.weight_oz(),
        }
    }

    /// Sums the load of several items.
    pub fn of_all<'a, T, I>(objects: I) -> Self
    where
        T: Dimensional + Weighted + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        objects.into_iter().fold(Self::default(), |acc, object| {
            acc + Self::of(object)
        })
    }
}

impl std::ops::Add for Load {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            volume: self.volume + rhs.volume,
            weight_oz: self.weight_oz + rhs.weight_oz,
        }
    }
}

/// Why a load does not fit a box type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Misfit {
    Volume,
    Weight,
}

/// Checks a load against an empty box type.
///
/// Returns the first violated constraint, volume before weight.
pub fn check_load(load: Load, box_type: &BoxType, epsilon: f64) -> Result<(), Misfit> {
    if load.volume > box_type.volume() + epsilon {
        return Err(Misfit::Volume);
    }
    if let Some(max_weight) = box_type.max_weight_oz {
        if load.weight_oz + box_type.tare_oz() > max_weight + epsilon {
            return Err(Misfit::Weight);
        }
    }
    Ok(())
}

/// Checks whether a load fits an empty box type.
#[inline]
pub fn fits_load(load: Load, box_type: &BoxType, epsilon: f64) -> bool {
    check_load(load, box_type, epsilon).is_ok()
}

/// Checks whether an item set fits together into one box of the given type.
///
/// # Examples
/// ```
/// use shipment_packer::fit::fits;
/// use shipment_packer::model::{BoxType, Item};
///
/// let small = BoxType::new("small", (30.0, 20.0, 10.0), 4.0).unwrap();
/// let mug = Item::new("mug", (20.0, 10.0, 5.0), 8.0).unwrap();
/// assert!(fits(std::slice::from_ref(&mug), &small, 1e-6));
/// ```
pub fn fits(items: &[Item], box_type: &BoxType, epsilon: f64) -> bool {
    fits_load(Load::of_all(items), box_type, epsilon)
}

/// Checks whether an additional load still fits into an already open box.
///
/// The combined contents are compared against the box capacity, so the
/// tolerance is granted once per box and not once per added item.
pub fn fits_remaining(packed: &PackedBox, load: Load, epsilon: f64) -> bool {
    let contents = Load {
        volume: packed.contents_volume_cm3(),
        weight_oz: packed.contents_weight_oz(),
    };
    fits_load(contents + load, packed.box_type(), epsilon)
}
