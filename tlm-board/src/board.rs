//! Board state and its pure transitions
//!
//! `Board` owns the tier list and the bucket assignment. Every transition
//! either changes the board and returns the patches describing the change,
//! or leaves it untouched (empty patch list / `Err`). Nothing here performs
//! I/O; persistence and drawing are layered on top by the controller.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::BoardError;
use crate::model::{
    default_tiers, is_hex_color, next_palette_color, BucketKey, Item, Tier, MAX_TIER_NAME_CHARS,
    UNASSIGNED,
};
use crate::patch::Patch;

/// Tiers plus the bucket assignment
///
/// Invariants kept by every transition:
/// - every tier has a bucket, `unassigned` always has one, no other buckets exist
/// - every item id appears exactly once across all buckets
/// - at least one tier exists
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    tiers: Vec<Tier>,
    buckets: HashMap<BucketKey, Vec<Item>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::with_tiers(default_tiers())
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty board with the given tiers
    ///
    /// Tiers with an empty, reserved or repeated id are dropped. If nothing is
    /// left the default tiers are used instead.
    pub fn with_tiers(tiers: Vec<Tier>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(tiers.len());
        for tier in tiers {
            if tier.id.is_empty() || tier.id == UNASSIGNED || !seen.insert(tier.id.clone()) {
                warn!(tier_id = %tier.id, "Dropping tier with empty, reserved or duplicate id");
                continue;
            }
            kept.push(tier);
        }
        if kept.is_empty() {
            warn!("No usable tiers, falling back to the default configuration");
            kept = default_tiers();
        }

        let mut buckets = HashMap::with_capacity(kept.len() + 1);
        buckets.insert(BucketKey::Unassigned, Vec::new());
        for tier in &kept {
            buckets.insert(BucketKey::tier(tier.id.clone()), Vec::new());
        }

        Self {
            tiers: kept,
            buckets,
        }
    }

    /// Rebuild a board from decoded parts, repairing anything inconsistent
    ///
    /// Buckets whose key is neither a tier nor `unassigned` are merged into
    /// `unassigned`; repeated item ids keep their first occurrence.
    pub(crate) fn from_parts(tiers: Vec<Tier>, data: BTreeMap<String, Vec<Item>>) -> Self {
        let mut board = Self::with_tiers(tiers);
        let mut seen: HashSet<String> = HashSet::new();
        let mut orphans = Vec::new();

        for (key, items) in data {
            let key = BucketKey::from(key);
            match board.buckets.get_mut(&key) {
                Some(bucket) => {
                    for item in items {
                        if seen.insert(item.id.clone()) {
                            bucket.push(item);
                        } else {
                            warn!(item_id = %item.id, bucket = %key, "Dropping duplicate item");
                        }
                    }
                }
                None => {
                    warn!(bucket = %key, count = items.len(), "Moving items of unknown bucket to unassigned");
                    orphans.push(items);
                }
            }
        }

        let unassigned = board.buckets.entry(BucketKey::Unassigned).or_default();
        for item in orphans.into_iter().flatten() {
            if seen.insert(item.id.clone()) {
                unassigned.push(item);
            } else {
                warn!(item_id = %item.id, "Dropping duplicate item");
            }
        }

        board
    }

    // ========================================
    // Queries
    // ========================================

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier(&self, tier_id: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.id == tier_id)
    }

    pub fn bucket(&self, key: &BucketKey) -> Option<&[Item]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn has_bucket(&self, key: &BucketKey) -> bool {
        self.buckets.contains_key(key)
    }

    /// Bucket keys in display order: tiers top to bottom, then unassigned
    pub fn bucket_keys(&self) -> Vec<BucketKey> {
        self.tiers
            .iter()
            .map(|t| BucketKey::tier(t.id.clone()))
            .chain(std::iter::once(BucketKey::Unassigned))
            .collect()
    }

    /// Current bucket and index of an item
    pub fn locate(&self, item_id: &str) -> Option<(BucketKey, usize)> {
        self.bucket_keys().into_iter().find_map(|key| {
            self.buckets
                .get(&key)
                .and_then(|items| items.iter().position(|i| i.id == item_id))
                .map(|index| (key, index))
        })
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.buckets
            .values()
            .flat_map(|items| items.iter())
            .find(|i| i.id == item_id)
    }

    /// `base`, or `base_<n>` with the smallest `n` not already on the board
    pub fn fresh_item_id(&self, base: &str) -> String {
        if self.item(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}_{}", base, n))
            .find(|id| self.item(id).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    pub fn item_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Bucket contents keyed by their string key, in sorted key order
    pub(crate) fn bucket_map(&self) -> BTreeMap<String, Vec<Item>> {
        self.buckets
            .iter()
            .map(|(key, items)| (key.as_str().to_string(), items.clone()))
            .collect()
    }

    /// Check every structural invariant
    pub fn is_consistent(&self) -> bool {
        if self.tiers.is_empty() || !self.buckets.contains_key(&BucketKey::Unassigned) {
            return false;
        }
        if self.buckets.len() != self.tiers.len() + 1 {
            return false;
        }
        if !self
            .tiers
            .iter()
            .all(|t| self.buckets.contains_key(&BucketKey::tier(t.id.clone())))
        {
            return false;
        }
        let mut seen = HashSet::new();
        self.buckets
            .values()
            .flat_map(|items| items.iter())
            .all(|i| seen.insert(i.id.as_str()))
    }

    // ========================================
    // Item transitions
    // ========================================

    /// Put `item` at the front of `bucket`
    ///
    /// No-op for an unknown bucket or an id already on the board.
    pub fn add_item(&mut self, bucket: &BucketKey, item: Item) -> Vec<Patch> {
        if self.locate(&item.id).is_some() {
            debug!(item_id = %item.id, "Item already on the board, ignoring add");
            return Vec::new();
        }
        let Some(items) = self.buckets.get_mut(bucket) else {
            debug!(bucket = %bucket, "Unknown bucket, ignoring add");
            return Vec::new();
        };

        items.insert(0, item.clone());
        vec![Patch::ItemInserted {
            bucket: bucket.clone(),
            index: 0,
            item,
        }]
    }

    /// Move an item from one bucket to another
    ///
    /// The item lands just before `insert_before` in the target bucket, or at
    /// the end when that id is absent or not given. Moves into `unassigned`
    /// always append. No-op if the item is not in `from` or `to` is unknown.
    pub fn move_item(
        &mut self,
        item_id: &str,
        from: &BucketKey,
        to: &BucketKey,
        insert_before: Option<&str>,
    ) -> Vec<Patch> {
        if !self.buckets.contains_key(to) {
            debug!(bucket = %to, "Unknown target bucket, ignoring move");
            return Vec::new();
        }
        let Some(source) = self.buckets.get_mut(from) else {
            return Vec::new();
        };
        let Some(from_index) = source.iter().position(|i| i.id == item_id) else {
            debug!(item_id, bucket = %from, "Item not in source bucket, ignoring move");
            return Vec::new();
        };
        let item = source.remove(from_index);

        let target = self.buckets.entry(to.clone()).or_default();
        let index = match insert_before {
            _ if to.is_unassigned() => target.len(),
            Some(before) if before == item_id && from == to => from_index,
            Some(before) => target
                .iter()
                .position(|i| i.id == before)
                .unwrap_or(target.len()),
            None => target.len(),
        };
        target.insert(index, item.clone());

        vec![
            Patch::ItemRemoved {
                bucket: from.clone(),
                index: from_index,
                item_id: item_id.to_string(),
            },
            Patch::ItemInserted {
                bucket: to.clone(),
                index,
                item,
            },
        ]
    }

    /// Remove an item wherever it is
    pub fn remove_item(&mut self, item_id: &str) -> Vec<Patch> {
        let Some((bucket, index)) = self.locate(item_id) else {
            return Vec::new();
        };
        if let Some(items) = self.buckets.get_mut(&bucket) {
            items.remove(index);
        }
        vec![Patch::ItemRemoved {
            bucket,
            index,
            item_id: item_id.to_string(),
        }]
    }

    /// Empty every bucket, keeping the tiers
    pub fn clear(&mut self) -> Vec<Patch> {
        if self.item_count() == 0 {
            return Vec::new();
        }
        for items in self.buckets.values_mut() {
            items.clear();
        }
        vec![Patch::Reset]
    }

    // ========================================
    // Tier transitions
    // ========================================

    pub fn rename_tier(&mut self, tier_id: &str, name: &str) -> Result<Vec<Patch>, BoardError> {
        let name = validate_tier_name(name)?;
        let tier = self.tier_mut(tier_id)?;
        if tier.name == name {
            return Ok(Vec::new());
        }
        tier.name = name;
        Ok(vec![Patch::TierUpdated { tier: tier.clone() }])
    }

    pub fn recolor_tier(&mut self, tier_id: &str, color: &str) -> Result<Vec<Patch>, BoardError> {
        if !is_hex_color(color) {
            return Err(BoardError::InvalidColor(color.to_string()));
        }
        let color = color.to_ascii_lowercase();
        let tier = self.tier_mut(tier_id)?;
        if tier.color == color {
            return Ok(Vec::new());
        }
        tier.color = color;
        Ok(vec![Patch::TierUpdated { tier: tier.clone() }])
    }

    /// Advance a tier to the next palette color
    pub fn cycle_tier_color(&mut self, tier_id: &str) -> Result<Vec<Patch>, BoardError> {
        let current = self
            .tier(tier_id)
            .map(|t| t.color.clone())
            .ok_or_else(|| BoardError::UnknownTier(tier_id.to_string()))?;
        self.recolor_tier(tier_id, next_palette_color(&current))
    }

    /// Append a new tier with an empty bucket
    pub fn add_tier(&mut self, tier: Tier) -> Result<Vec<Patch>, BoardError> {
        let name = validate_tier_name(&tier.name)?;
        if !is_hex_color(&tier.color) {
            return Err(BoardError::InvalidColor(tier.color));
        }
        if tier.id.is_empty() || tier.id == UNASSIGNED || self.tier(&tier.id).is_some() {
            return Err(BoardError::DuplicateTier(tier.id));
        }

        self.buckets
            .insert(BucketKey::tier(tier.id.clone()), Vec::new());
        self.tiers.push(Tier {
            name,
            color: tier.color.to_ascii_lowercase(),
            ..tier
        });
        Ok(vec![Patch::TiersChanged])
    }

    /// Delete a tier, moving its items to the end of `unassigned`
    ///
    /// Refused with [`BoardError::LastTier`] when it is the only tier left.
    pub fn delete_tier(&mut self, tier_id: &str) -> Result<Vec<Patch>, BoardError> {
        let position = self
            .tiers
            .iter()
            .position(|t| t.id == tier_id)
            .ok_or_else(|| BoardError::UnknownTier(tier_id.to_string()))?;
        if self.tiers.len() <= 1 {
            return Err(BoardError::LastTier);
        }

        self.tiers.remove(position);
        let items = self
            .buckets
            .remove(&BucketKey::tier(tier_id))
            .unwrap_or_default();
        debug!(tier_id, moved = items.len(), "Tier deleted");
        self.buckets
            .entry(BucketKey::Unassigned)
            .or_default()
            .extend(items);

        Ok(vec![Patch::TiersChanged])
    }

    fn tier_mut(&mut self, tier_id: &str) -> Result<&mut Tier, BoardError> {
        self.tiers
            .iter_mut()
            .find(|t| t.id == tier_id)
            .ok_or_else(|| BoardError::UnknownTier(tier_id.to_string()))
    }
}

/// Trim and bound-check a tier name
pub fn validate_tier_name(name: &str) -> Result<String, BoardError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_TIER_NAME_CHARS {
        return Err(BoardError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}
