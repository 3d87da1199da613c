//! Patch descriptions emitted by board transitions
//!
//! A transition returns the patches needed to bring a view of the old board
//! in line with the new one. Item patches are incremental; structural changes
//! ask the surface to redraw everything.

use serde::Serialize;

use crate::model::{BucketKey, Item, Tier};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Patch {
    /// `item` now sits at `index` of `bucket`
    ItemInserted {
        bucket: BucketKey,
        index: usize,
        item: Item,
    },

    /// The item that was at `index` of `bucket` is gone
    ItemRemoved {
        bucket: BucketKey,
        index: usize,
        item_id: String,
    },

    /// Name or color of an existing tier changed
    TierUpdated { tier: Tier },

    /// Tiers were added, removed or reordered
    TiersChanged,

    /// The whole board was replaced
    Reset,
}

impl Patch {
    /// Whether applying this patch needs a full redraw
    pub fn is_structural(&self) -> bool {
        matches!(self, Patch::TiersChanged | Patch::Reset)
    }
}
