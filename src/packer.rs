//! Greedy packing of cart items into catalog boxes.
//!
//! The packer works in three passes:
//! - ship-alone items each get the smallest box type that holds them alone
//! - regular items are placed first-fit into the boxes opened so far
//! - an item that fits no open box opens the smallest adequate box type
//!
//! Items no box type can hold end up in `unpacked`. That is a normal outcome,
//! not an error; only malformed measurements fail the run.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::catalog::BoxCatalog;
use crate::error::Result;
use crate::fit::{Load, Misfit, fits_remaining};
use crate::model::{BoxType, Item, PackedBox};
use crate::types::{Dimensional, EPSILON_GENERAL};

/// Order in which regular items are offered to the boxes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ItemOrder {
    /// Largest volume first; equal volumes keep input order.
    #[default]
    DescendingVolume,
    /// Input order unchanged.
    Input,
}

impl FromStr for ItemOrder {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "descending_volume" | "volume" => Ok(ItemOrder::DescendingVolume),
            "input" | "input_order" => Ok(ItemOrder::Input),
            other => Err(format!(
                "unknown item order '{}', expected 'descending_volume' or 'input'",
                other
            )),
        }
    }
}

/// Configuration for the packing algorithm.
#[derive(Copy, Clone, Debug)]
pub struct PackingConfig {
    /// Tolerance for volume and weight comparisons
    pub general_epsilon: f64,
    /// Processing order of regular items
    pub item_order: ItemOrder,
}

impl PackingConfig {
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }

    /// A usable tolerance is finite, positive and below one unit.
    pub fn is_valid_epsilon(value: f64) -> bool {
        value.is_finite() && value > 0.0 && value < 1.0
    }

    /// Replaces an unusable tolerance with the default.
    fn sanitized(self) -> Self {
        if Self::is_valid_epsilon(self.general_epsilon) {
            return self;
        }
        warn!(
            "⚠️ Ignoring invalid packing tolerance {}. Using {}.",
            self.general_epsilon,
            Self::DEFAULT_GENERAL_EPSILON
        );
        Self {
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            ..self
        }
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            item_order: ItemOrder::default(),
        }
    }
}

/// Builder for [`PackingConfig`].
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    pub fn item_order(mut self, order: ItemOrder) -> Self {
        self.config.item_order = order;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Outcome of one packing run.
#[derive(Clone, Debug, PartialEq)]
pub struct PackingResult {
    pub packed: Vec<PackedBox>,
    pub unpacked: Vec<UnpackedItem>,
}

impl PackingResult {
    fn empty() -> Self {
        Self {
            packed: Vec::new(),
            unpacked: Vec::new(),
        }
    }

    /// Whether every item found a box. Rate fetching should not proceed
    /// otherwise.
    pub fn is_complete(&self) -> bool {
        self.unpacked.is_empty()
    }

    pub fn box_count(&self) -> usize {
        self.packed.len()
    }

    pub fn unpacked_count(&self) -> usize {
        self.unpacked.len()
    }

    /// Number of items placed in boxes.
    pub fn packed_item_count(&self) -> usize {
        self.packed.iter().map(|b| b.products().len()).sum()
    }

    /// Iterates the items that could not be placed.
    pub fn unpacked_items(&self) -> impl Iterator<Item = &Item> {
        self.unpacked.iter().map(|entry| &entry.item)
    }

    /// Average volume utilization over all packed boxes.
    pub fn average_utilization(&self) -> f64 {
        if self.packed.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.packed.iter().map(|b| b.utilization_percent()).sum();
        sum / self.packed.len() as f64
    }

    /// Gross weight of all boxes including tare.
    pub fn total_gross_weight_oz(&self) -> f64 {
        self.packed.iter().map(|b| b.gross_weight_oz()).sum()
    }
}

/// Item that could not be placed in any box.
#[derive(Clone, Debug, PartialEq)]
pub struct UnpackedItem {
    pub item: Item,
    pub reason: UnpackedReason,
}

/// Reasons why an item could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnpackedReason {
    /// The catalog has no box types at all.
    NoBoxTypes,
    /// Some box has room, but none of them may carry the weight.
    TooHeavyForBox,
    /// The item is larger than every box type.
    ExceedsBoxVolume,
}

impl UnpackedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnpackedReason::NoBoxTypes => "no_box_types",
            UnpackedReason::TooHeavyForBox => "too_heavy_for_box",
            UnpackedReason::ExceedsBoxVolume => "exceeds_box_volume",
        }
    }
}

impl From<Misfit> for UnpackedReason {
    fn from(misfit: Misfit) -> Self {
        match misfit {
            Misfit::Volume => UnpackedReason::ExceedsBoxVolume,
            Misfit::Weight => UnpackedReason::TooHeavyForBox,
        }
    }
}

impl fmt::Display for UnpackedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnpackedReason::NoBoxTypes => write!(f, "No box types are configured"),
            UnpackedReason::TooHeavyForBox => {
                write!(f, "Item exceeds the maximum weight of every box large enough")
            }
            UnpackedReason::ExceedsBoxVolume => {
                write!(f, "Item volume exceeds every configured box type")
            }
        }
    }
}

/// Events emitted while packing, for live progress reporting.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// A new box was opened.
    BoxOpened {
        box_index: usize,
        box_type_id: String,
        ship_alone: bool,
    },
    /// An item was placed in a box.
    ItemPacked {
        box_index: usize,
        item_id: String,
        contents_weight_oz: f64,
        contents_volume_cm3: f64,
    },
    /// An item could not be placed.
    ItemRejected {
        item_id: String,
        reason_code: String,
        reason_text: String,
    },
    /// Packing finished.
    Finished { boxes: usize, unpacked: usize },
}

/// Packs items into boxes with the default configuration.
///
/// # Parameters
/// * `items` - Units to pack, one entry per physical unit
/// * `box_types` - The tenant's box catalog
///
/// # Returns
/// `PackingResult` with packed boxes and unpacked items, or an error if any
/// measurement is negative or not finite
pub fn pack(items: Vec<Item>, box_types: Vec<BoxType>) -> Result<PackingResult> {
    pack_with_config(items, box_types, PackingConfig::default())
}

/// Like [`pack`], with custom tolerances and item order.
pub fn pack_with_config(
    items: Vec<Item>,
    box_types: Vec<BoxType>,
    config: PackingConfig,
) -> Result<PackingResult> {
    pack_with_progress(items, box_types, config, |_| {})
}

/// Packing with a progress callback (suitable for SSE).
pub fn pack_with_progress(
    items: Vec<Item>,
    box_types: Vec<BoxType>,
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<PackingResult> {
    let config = config.sanitized();
    for item in &items {
        item.validate()?;
    }
    for box_type in &box_types {
        box_type.validate()?;
    }

    let mut run = PackingRun::new(BoxCatalog::new(box_types), config, &mut on_event);
    run.pack_all(items);
    Ok(run.finish())
}

/// State of a single packing run.
struct PackingRun<'a, F: FnMut(&PackEvent)> {
    catalog: BoxCatalog,
    config: PackingConfig,
    exclusive: Vec<PackedBox>,
    shared: Vec<PackedBox>,
    /// Unpacked items tagged with their input position.
    unpacked: Vec<(usize, UnpackedItem)>,
    on_event: &'a mut F,
}

impl<'a, F: FnMut(&PackEvent)> PackingRun<'a, F> {
    fn new(catalog: BoxCatalog, config: PackingConfig, on_event: &'a mut F) -> Self {
        Self {
            catalog,
            config,
            exclusive: Vec::new(),
            shared: Vec::new(),
            unpacked: Vec::new(),
            on_event,
        }
    }

    fn pack_all(&mut self, items: Vec<Item>) {
        if items.is_empty() {
            return;
        }

        let (alone, mut regular): (Vec<_>, Vec<_>) = items
            .into_iter()
            .enumerate()
            .partition(|(_, item)| item.ship_alone);

        if self.config.item_order == ItemOrder::DescendingVolume {
            regular.sort_by(|(a_idx, a), (b_idx, b)| {
                b.volume()
                    .partial_cmp(&a.volume())
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a_idx.cmp(b_idx))
            });
        }

        for (position, item) in alone {
            self.pack_alone(position, item);
        }
        for (position, item) in regular {
            self.pack_shared(position, item);
        }
    }

    fn pack_alone(&mut self, position: usize, item: Item) {
        let load = Load::of(&item);
        match self.catalog.smallest_fitting(load, self.config.general_epsilon) {
            Some(box_type) => {
                let packed = PackedBox::open(box_type.clone());
                self.exclusive.push(packed);
                let index = self.exclusive.len() - 1;
                self.emit_opened(index, true);
                self.place(index, true, item);
            }
            None => self.reject(position, item, load),
        }
    }

    fn pack_shared(&mut self, position: usize, item: Item) {
        let load = Load::of(&item);
        let epsilon = self.config.general_epsilon;

        if let Some(index) = self
            .shared
            .iter()
            .position(|packed| fits_remaining(packed, load, epsilon))
        {
            self.place(index, false, item);
            return;
        }

        match self.catalog.smallest_fitting(load, epsilon) {
            Some(box_type) => {
                let packed = PackedBox::open(box_type.clone());
                self.shared.push(packed);
                let index = self.shared.len() - 1;
                self.emit_opened(index, false);
                self.place(index, false, item);
            }
            None => self.reject(position, item, load),
        }
    }

    fn place(&mut self, index: usize, exclusive: bool, item: Item) {
        let item_id = item.id.clone();
        let box_index = self.event_index(index, exclusive);
        let packed = if exclusive {
            &mut self.exclusive[index]
        } else {
            &mut self.shared[index]
        };
        packed.push(item);
        let event = PackEvent::ItemPacked {
            box_index,
            item_id,
            contents_weight_oz: packed.contents_weight_oz(),
            contents_volume_cm3: packed.contents_volume_cm3(),
        };
        (self.on_event)(&event);
    }

    fn emit_opened(&mut self, index: usize, exclusive: bool) {
        let packed = if exclusive {
            &self.exclusive[index]
        } else {
            &self.shared[index]
        };
        debug!(
            box_type = %packed.box_type().id,
            ship_alone = exclusive,
            "opened box"
        );
        let event = PackEvent::BoxOpened {
            box_index: self.event_index(index, exclusive),
            box_type_id: packed.box_type().id.clone(),
            ship_alone: exclusive,
        };
        (self.on_event)(&event);
    }

    /// Events refer to the position a box will have in the final result,
    /// where exclusive boxes come first. Exclusive boxes are all opened
    /// before the first shared one, so the offset is stable.
    fn event_index(&self, index: usize, exclusive: bool) -> usize {
        if exclusive {
            index
        } else {
            self.exclusive.len() + index
        }
    }

    fn reject(&mut self, position: usize, item: Item, load: Load) {
        let reason = if self.catalog.is_empty() {
            UnpackedReason::NoBoxTypes
        } else {
            self.catalog
                .rejection(load, self.config.general_epsilon)
                .map(UnpackedReason::from)
                .unwrap_or(UnpackedReason::ExceedsBoxVolume)
        };
        debug!(item = %item.id, reason = reason.code(), "item left unpacked");
        let event = PackEvent::ItemRejected {
            item_id: item.id.clone(),
            reason_code: reason.code().to_string(),
            reason_text: reason.to_string(),
        };
        (self.on_event)(&event);
        self.unpacked.push((position, UnpackedItem { item, reason }));
    }

    fn finish(self) -> PackingResult {
        let PackingRun {
            exclusive,
            shared,
            mut unpacked,
            on_event,
            ..
        } = self;

        let mut result = PackingResult::empty();
        result.packed = exclusive
            .into_iter()
            .chain(shared)
            .filter(|packed| !packed.is_empty())
            .collect();

        unpacked.sort_by_key(|(position, _)| *position);
        result.unpacked = unpacked.into_iter().map(|(_, entry)| entry).collect();

        on_event(&PackEvent::Finished {
            boxes: result.packed.len(),
            unpacked: result.unpacked.len(),
        });
        result
    }
}
