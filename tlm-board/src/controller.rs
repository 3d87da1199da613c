//! Board controller
//!
//! Owns the board and the storage port. Each operation runs the pure
//! transition, saves the full snapshot when something changed, and hands the
//! resulting patches back so the caller can update its view.
//!
//! Save failures (quota exceeded, unwritable directory) are logged and
//! swallowed: the in-memory board stays the source of truth for the session.

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::error::{BoardError, SnapshotError};
use crate::model::{BucketKey, Item, Tier, TIER_PALETTE};
use crate::patch::Patch;
use crate::snapshot;
use crate::storage::Storage;

pub struct BoardController<S: Storage> {
    board: Board,
    storage: S,
}

impl<S: Storage> BoardController<S> {
    /// Controller with a fresh default board (nothing saved until the first change)
    pub fn new(storage: S) -> Self {
        Self {
            board: Board::new(),
            storage,
        }
    }

    /// Controller restored from whatever `storage` holds
    ///
    /// A missing save gives the default board. An unreadable or corrupt save
    /// is logged and also gives the default board.
    pub fn restore(storage: S) -> Self {
        let board = match storage.load() {
            Ok(Some(blob)) => match snapshot::deserialize(&blob) {
                Ok(board) => {
                    info!(
                        tiers = board.tiers().len(),
                        items = board.item_count(),
                        "Board restored"
                    );
                    board
                }
                Err(e) => {
                    warn!("Could not decode saved board, starting fresh: {}", e);
                    Board::new()
                }
            },
            Ok(None) => {
                debug!("No saved board, starting with defaults");
                Board::new()
            }
            Err(e) => {
                warn!("Could not read saved board, starting fresh: {}", e);
                Board::new()
            }
        };
        Self { board, storage }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn item_count(&self) -> usize {
        self.board.item_count()
    }

    /// Current snapshot blob
    pub fn serialize(&self) -> Result<String, SnapshotError> {
        snapshot::serialize(&self.board)
    }

    /// Replace the board with a decoded snapshot
    pub fn import(&mut self, blob: &str) -> Result<Vec<Patch>, SnapshotError> {
        self.board = snapshot::deserialize(blob)?;
        Ok(self.commit(vec![Patch::Reset]))
    }

    // ========================================
    // Item operations
    // ========================================

    pub fn add_item(&mut self, bucket: &BucketKey, item: Item) -> Vec<Patch> {
        let patches = self.board.add_item(bucket, item);
        self.commit(patches)
    }

    pub fn move_item(
        &mut self,
        item_id: &str,
        from: &BucketKey,
        to: &BucketKey,
        insert_before: Option<&str>,
    ) -> Vec<Patch> {
        let patches = self.board.move_item(item_id, from, to, insert_before);
        self.commit(patches)
    }

    pub fn remove_item(&mut self, item_id: &str) -> Vec<Patch> {
        let patches = self.board.remove_item(item_id);
        self.commit(patches)
    }

    pub fn clear_all(&mut self) -> Vec<Patch> {
        let patches = self.board.clear();
        self.commit(patches)
    }

    // ========================================
    // Tier operations
    // ========================================

    pub fn rename_tier(&mut self, tier_id: &str, name: &str) -> Result<Vec<Patch>, BoardError> {
        let patches = self.board.rename_tier(tier_id, name)?;
        Ok(self.commit(patches))
    }

    pub fn recolor_tier(&mut self, tier_id: &str, color: &str) -> Result<Vec<Patch>, BoardError> {
        let patches = self.board.recolor_tier(tier_id, color)?;
        Ok(self.commit(patches))
    }

    pub fn cycle_tier_color(&mut self, tier_id: &str) -> Result<Vec<Patch>, BoardError> {
        let patches = self.board.cycle_tier_color(tier_id)?;
        Ok(self.commit(patches))
    }

    /// Append a tier with a fresh id and a random palette color
    ///
    /// Returns the new tier id alongside the patches.
    pub fn add_tier(&mut self, name: &str) -> Result<(String, Vec<Patch>), BoardError> {
        let id = self.fresh_tier_id();
        let color = TIER_PALETTE
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(TIER_PALETTE[0]);

        let patches = self.board.add_tier(Tier::new(id.clone(), name, color))?;
        info!(tier_id = %id, "Tier added");
        Ok((id, self.commit(patches)))
    }

    /// Delete a tier; its items go to `unassigned`
    pub fn delete_tier(&mut self, tier_id: &str) -> Result<Vec<Patch>, BoardError> {
        let patches = self.board.delete_tier(tier_id)?;
        info!(tier_id, "Tier deleted");
        Ok(self.commit(patches))
    }

    fn fresh_tier_id(&self) -> String {
        let base = format!("tier_{}", chrono::Utc::now().timestamp_millis());
        if self.board.tier(&base).is_none() {
            return base;
        }
        (1..)
            .map(|n| format!("{}_{}", base, n))
            .find(|id| self.board.tier(id).is_none())
            .unwrap_or(base)
    }

    // ========================================
    // Persistence
    // ========================================

    fn commit(&mut self, patches: Vec<Patch>) -> Vec<Patch> {
        if !patches.is_empty() {
            debug_assert!(self.board.is_consistent());
            self.persist();
        }
        patches
    }

    fn persist(&mut self) {
        let blob = match snapshot::serialize(&self.board) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Could not encode board for saving: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.save(&blob) {
            warn!("Could not save board: {}", e);
        }
    }
}
