//! Packages for the shipping-rate request.
//!
//! One package per packed box; the gross weight is the box tare plus the
//! weight of everything inside it.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::PackedBox;
use crate::packer::PackingResult;

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackageWeight {
    pub value: f64,
    pub unit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackageDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub unit: String,
}

/// One shipment package as the rate API expects it.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ShipmentPackage {
    pub box_type_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_code: Option<String>,
    pub weight: PackageWeight,
    pub dimensions: PackageDimensions,
    pub item_ids: Vec<String>,
}

impl ShipmentPackage {
    const WEIGHT_UNIT: &'static str = "ounce";
    const DIMENSION_UNIT: &'static str = "centimeter";

    pub fn from_packed_box(packed: &PackedBox) -> Self {
        let box_type = packed.box_type();
        Self {
            box_type_id: box_type.id.clone(),
            package_code: box_type.carrier_code.clone(),
            weight: PackageWeight {
                value: packed.gross_weight_oz(),
                unit: Self::WEIGHT_UNIT.to_string(),
            },
            dimensions: PackageDimensions {
                length: box_type.length_cm,
                width: box_type.width_cm,
                height: box_type.height_cm,
                unit: Self::DIMENSION_UNIT.to_string(),
            },
            item_ids: packed.products().iter().map(|i| i.id.clone()).collect(),
        }
    }
}

impl PackingResult {
    /// Builds one rate-request package per packed box, in result order.
    pub fn shipment_packages(&self) -> Vec<ShipmentPackage> {
        self.packed.iter().map(ShipmentPackage::from_packed_box).collect()
    }
}
