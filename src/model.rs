//! Data models for shipment packing.
//!
//! - `Item`: one physical unit of a cart line item
//! - `BoxType`: a container definition from the tenant's package catalog
//! - `PackedBox`: a box type instance with the items assigned to it

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::error::Result;
use crate::types::validation::{validate_dimensions, validate_measure};
use crate::types::{Dimensional, Dimensions, EPSILON_GENERAL, Weighted};

/// One unit of a cart line item to be physically packed.
///
/// # Fields
/// * `id` - Identifier of the unit (unique within one packing run)
/// * `length_cm`, `width_cm`, `height_cm` - Outer dimensions
/// * `weight_oz` - Weight in ounces
/// * `ship_alone` - Forces exclusive occupancy of a box
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "mug-1",
    "length_cm": 20.0,
    "width_cm": 10.0,
    "height_cm": 5.0,
    "weight_oz": 8.0,
    "ship_alone": false
}))]
pub struct Item {
    pub id: String,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub weight_oz: f64,
    #[serde(default)]
    pub ship_alone: bool,
}

impl Item {
    /// Creates a new item with validation.
    ///
    /// # Examples
    /// ```
    /// use shipment_packer::model::Item;
    ///
    /// assert!(Item::new("mug", (20.0, 10.0, 5.0), 8.0).is_ok());
    /// assert!(Item::new("mug", (-20.0, 10.0, 5.0), 8.0).is_err());
    /// ```
    pub fn new(id: impl Into<String>, dims: (f64, f64, f64), weight_oz: f64) -> Result<Self> {
        let item = Self {
            id: id.into(),
            length_cm: dims.0,
            width_cm: dims.1,
            height_cm: dims.2,
            weight_oz,
            ship_alone: false,
        };
        item.validate()?;
        Ok(item)
    }

    /// Marks the item as requiring its own box.
    pub fn shipped_alone(mut self) -> Self {
        self.ship_alone = true;
        self
    }

    /// Re-checks every measurement. Used by the packer for items built as
    /// struct literals or deserialized without going through [`Item::new`].
    pub fn validate(&self) -> Result<()> {
        let subject = self.describe();
        validate_dimensions(self.dimensions().as_tuple(), &subject)?;
        validate_measure(self.weight_oz, &subject, "weight_oz")?;
        Ok(())
    }

    pub(crate) fn describe(&self) -> String {
        format!("item '{}'", self.id)
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length_cm, self.width_cm, self.height_cm)
    }
}

impl Weighted for Item {
    fn weight_oz(&self) -> f64 {
        self.weight_oz
    }
}

/// A candidate container from the tenant's package catalog.
///
/// Catalog entries are types, not stock: the packer may open any number of
/// boxes of the same type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "small",
    "label": "Small box",
    "length_cm": 30.0,
    "width_cm": 20.0,
    "height_cm": 10.0,
    "weight_oz": 4.0,
    "max_weight_oz": 320.0,
    "carrier_code": "package"
}))]
pub struct BoxType {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    /// Tare weight of the empty box.
    pub weight_oz: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight_oz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_code: Option<String>,
}

impl BoxType {
    /// Creates a new box type after validating the parameters.
    pub fn new(id: impl Into<String>, dims: (f64, f64, f64), tare_oz: f64) -> Result<Self> {
        let box_type = Self {
            id: id.into(),
            label: None,
            length_cm: dims.0,
            width_cm: dims.1,
            height_cm: dims.2,
            weight_oz: tare_oz,
            max_weight_oz: None,
            carrier_code: None,
        };
        box_type.validate()?;
        Ok(box_type)
    }

    /// Sets the maximum gross weight (items plus tare).
    pub fn with_max_weight(mut self, max_weight_oz: f64) -> Result<Self> {
        self.max_weight_oz = Some(max_weight_oz);
        self.validate()?;
        Ok(self)
    }

    pub fn with_carrier_code(mut self, code: impl Into<String>) -> Self {
        self.carrier_code = Some(code.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let subject = self.describe();
        validate_dimensions(self.dimensions().as_tuple(), &subject)?;
        validate_measure(self.weight_oz, &subject, "weight_oz")?;
        if let Some(max_weight) = self.max_weight_oz {
            validate_measure(max_weight, &subject, "max_weight_oz")?;
        }
        Ok(())
    }

    /// Tare weight of the empty box in ounces.
    #[inline]
    pub fn tare_oz(&self) -> f64 {
        self.weight_oz
    }

    pub(crate) fn describe(&self) -> String {
        format!("box type '{}'", self.id)
    }
}

impl Dimensional for BoxType {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length_cm, self.width_cm, self.height_cm)
    }
}

/// A box chosen by the packer together with its contents.
///
/// Fields are private: a packed box only grows through [`PackedBox::push`]
/// inside the packer, which checks capacity first. Once handed out in a
/// [`crate::packer::PackingResult`] it is read-only.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackedBox {
    #[serde(rename = "box")]
    box_type: BoxType,
    products: Vec<Item>,
    contents_weight_oz: f64,
    contents_volume_cm3: f64,
}

impl PackedBox {
    /// Opens an empty box of the given type.
    pub(crate) fn open(box_type: BoxType) -> Self {
        Self {
            box_type,
            products: Vec::new(),
            contents_weight_oz: 0.0,
            contents_volume_cm3: 0.0,
        }
    }

    /// Adds an item without capacity checks; callers check with
    /// [`crate::fit::fits_remaining`] first.
    pub(crate) fn push(&mut self, item: Item) {
        self.contents_weight_oz += item.weight_oz;
        self.contents_volume_cm3 += item.volume();
        self.products.push(item);
    }

    pub fn box_type(&self) -> &BoxType {
        &self.box_type
    }

    pub fn products(&self) -> &[Item] {
        &self.products
    }

    pub fn into_parts(self) -> (BoxType, Vec<Item>) {
        (self.box_type, self.products)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Sum of the contained item weights.
    pub fn contents_weight_oz(&self) -> f64 {
        self.contents_weight_oz
    }

    /// Sum of the contained item volumes.
    pub fn contents_volume_cm3(&self) -> f64 {
        self.contents_volume_cm3
    }

    /// Weight of the contents plus the tare of the box.
    pub fn gross_weight_oz(&self) -> f64 {
        self.contents_weight_oz + self.box_type.tare_oz()
    }

    /// Calculates the volume utilization in percent.
    pub fn utilization_percent(&self) -> f64 {
        let total = self.box_type.volume();
        if total <= EPSILON_GENERAL {
            return 0.0;
        }
        (self.contents_volume_cm3 / total) * 100.0
    }

    /// Whether the box holds a ship-alone item.
    pub fn is_exclusive(&self) -> bool {
        self.products.iter().any(|item| item.ship_alone)
    }
}
