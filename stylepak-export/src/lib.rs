//! Export flattening for stylepak.
//!
//! Takes a loaded [`PackagesSet`](stylepak_packages::PackagesSet) and the
//! user's choices ([`ExportSelection`]) and produces the finished editor
//! item definitions plus the merged config tree. Nothing in the package set
//! is modified; every editor definition handed out is a private copy.

mod error;
mod items;
mod replace;
mod selection;

pub use error::{ExportError, Result};
pub use items::{ExportOutput, ExportedItem, export_items};
pub use replace::apply_replacements;
pub use selection::{
    ExportSelection, ItemDefault, ItemDefaults, PALETTE_SIZE, PALETTE_WIDTH, PalettePositions,
};
