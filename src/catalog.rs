//! Candidate box types for a packing run.

use std::cmp::Ordering;

use crate::fit::{Load, Misfit, check_load};
use crate::model::BoxType;
use crate::types::Dimensional;

/// The tenant's box types ordered smallest first.
///
/// Ordering: internal volume ascending, then tare weight ascending, then the
/// original catalog position. Picking the first fitting entry therefore
/// yields the cheapest adequate box.
#[derive(Clone, Debug, Default)]
pub struct BoxCatalog {
    candidates: Vec<BoxType>,
}

impl BoxCatalog {
    pub fn new(box_types: Vec<BoxType>) -> Self {
        let mut candidates = box_types;
        // `sort_by` is stable, which keeps catalog order for full ties.
        candidates.sort_by(|a, b| {
            a.volume()
                .partial_cmp(&b.volume())
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    a.tare_oz()
                        .partial_cmp(&b.tare_oz())
                        .unwrap_or(Ordering::Equal)
                })
        });
        Self { candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxType> {
        self.candidates.iter()
    }

    /// Returns the smallest box type able to hold the load on its own.
    pub fn smallest_fitting(&self, load: Load, epsilon: f64) -> Option<&BoxType> {
        self.candidates
            .iter()
            .find(|box_type| check_load(load, box_type, epsilon).is_ok())
    }

    /// Explains why no candidate accepts the load.
    ///
    /// Weight is blamed only when every box with enough volume rejects the
    /// load on weight; otherwise the load is simply too large.
    pub fn rejection(&self, load: Load, epsilon: f64) -> Option<Misfit> {
        let mut saw_weight = false;
        for box_type in &self.candidates {
            match check_load(load, box_type, epsilon) {
                Ok(()) => return None,
                Err(Misfit::Weight) => saw_weight = true,
                Err(Misfit::Volume) => {}
            }
        }
        if saw_weight {
            Some(Misfit::Weight)
        } else {
            Some(Misfit::Volume)
        }
    }
}
