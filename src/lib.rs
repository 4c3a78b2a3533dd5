//! Shipment packing engine for the multi-tenant storefront backend.
//!
//! Cart line items are packed into a tenant's box catalog with a greedy
//! smallest-box-first strategy; the resulting boxes become the packages of a
//! shipping-rate request.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fit;
pub mod input;
pub mod logging;
pub mod model;
pub mod packer;
pub mod shipment;
pub mod types;

pub use error::InvalidInputError;
pub use model::{BoxType, Item, PackedBox};
pub use packer::{PackingConfig, PackingResult, UnpackedReason, pack, pack_with_config};
