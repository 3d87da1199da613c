//! View model and rendering
//!
//! [`render`] builds the complete view of a board from scratch and is
//! idempotent. [`RenderSurface::apply`] updates an existing view from the
//! patches a transition returned; after applying them the view equals a fresh
//! `render` of the new board.

use serde::Serialize;
use tracing::debug;

use tlm_common::{Candidate, MediaType};

use crate::board::Board;
use crate::model::{parse_hex_color, BucketKey, Item, Tier};
use crate::patch::Patch;

/// Shown for candidates without a cover image
pub const PLACEHOLDER_COVER: &str = "https://via.placeholder.com/200x120?text=No+Cover";

/// Longest description shown on a search result card, in characters
pub const CARD_DESCRIPTION_CHARS: usize = 100;

const ROW_BACKGROUND_OPACITY: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub src: String,
    pub label: String,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            src: item.src.clone(),
            label: item.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub tier_id: String,
    pub label: String,
    pub color: String,
    /// Light tint of `color` behind the row's items
    pub background: String,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnassignedView {
    pub items: Vec<ItemView>,
    /// The "drop images here" hint is visible only while the pool is empty
    pub show_drop_hint: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub rows: Vec<RowView>,
    pub unassigned: UnassignedView,
    pub item_count: usize,
}

impl BoardView {
    pub fn status_line(&self) -> String {
        format!("{} images uploaded", self.item_count)
    }

    fn items_mut(&mut self, bucket: &BucketKey) -> Option<&mut Vec<ItemView>> {
        match bucket {
            BucketKey::Unassigned => Some(&mut self.unassigned.items),
            BucketKey::Tier(id) => self
                .rows
                .iter_mut()
                .find(|r| &r.tier_id == id)
                .map(|r| &mut r.items),
        }
    }

    fn refresh_counters(&mut self) {
        self.unassigned.show_drop_hint = self.unassigned.items.is_empty();
        self.item_count = self.rows.iter().map(|r| r.items.len()).sum::<usize>()
            + self.unassigned.items.len();
    }
}

/// Anything that can bring itself up to date from patches
pub trait RenderSurface {
    /// `board` is the state after the transition that produced `patch`
    fn apply(&mut self, patch: &Patch, board: &Board);

    fn apply_all(&mut self, patches: &[Patch], board: &Board) {
        for patch in patches {
            self.apply(patch, board);
        }
    }
}

impl RenderSurface for BoardView {
    fn apply(&mut self, patch: &Patch, board: &Board) {
        if patch.is_structural() {
            *self = render(board);
            return;
        }
        match patch {
            Patch::ItemInserted {
                bucket,
                index,
                item,
            } => {
                let inserted = self.items_mut(bucket).is_some_and(|items| {
                    if *index > items.len() {
                        return false;
                    }
                    items.insert(*index, ItemView::from(item));
                    true
                });
                if !inserted {
                    debug!(bucket = %bucket, "Insert out of sync with view, redrawing");
                    *self = render(board);
                    return;
                }
            }
            Patch::ItemRemoved {
                bucket,
                index,
                item_id,
            } => {
                let removed = self.items_mut(bucket).is_some_and(|items| {
                    let position = if items.get(*index).is_some_and(|i| &i.id == item_id) {
                        Some(*index)
                    } else {
                        items.iter().position(|i| &i.id == item_id)
                    };
                    position.map(|p| items.remove(p)).is_some()
                });
                if !removed {
                    debug!(bucket = %bucket, item_id, "Remove out of sync with view, redrawing");
                    *self = render(board);
                    return;
                }
            }
            Patch::TierUpdated { tier } => {
                if let Some(row) = self.rows.iter_mut().find(|r| r.tier_id == tier.id) {
                    row.label = tier.name.clone();
                    row.color = tier.color.clone();
                    row.background = light_background(&tier.color);
                }
            }
            Patch::TiersChanged | Patch::Reset => {}
        }
        self.refresh_counters();
    }
}

/// Build the full view of a board
pub fn render(board: &Board) -> BoardView {
    let rows = board.tiers().iter().map(|tier| render_row(board, tier)).collect();
    let items: Vec<ItemView> = board
        .bucket(&BucketKey::Unassigned)
        .unwrap_or_default()
        .iter()
        .map(ItemView::from)
        .collect();

    BoardView {
        rows,
        unassigned: UnassignedView {
            show_drop_hint: items.is_empty(),
            items,
        },
        item_count: board.item_count(),
    }
}

fn render_row(board: &Board, tier: &Tier) -> RowView {
    RowView {
        tier_id: tier.id.clone(),
        label: tier.name.clone(),
        color: tier.color.clone(),
        background: light_background(&tier.color),
        items: board
            .bucket(&BucketKey::tier(tier.id.clone()))
            .unwrap_or_default()
            .iter()
            .map(ItemView::from)
            .collect(),
    }
}

/// `#rrggbb` as a faint `rgba(..)` tint
pub fn light_background(color: &str) -> String {
    let (r, g, b) = parse_hex_color(color).unwrap_or((0, 0, 0));
    format!("rgba({}, {}, {}, {})", r, g, b, ROW_BACKGROUND_OPACITY)
}

// ========================================
// Search result cards
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateCard {
    pub id: String,
    pub title: String,
    pub cover: String,
    pub description: String,
}

impl From<&Candidate> for CandidateCard {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.clone(),
            title: candidate.title.clone(),
            cover: candidate
                .cover
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_COVER.to_string()),
            description: card_description(&candidate.description),
        }
    }
}

/// Cards for a search result list, or the "nothing found" message
pub fn candidate_cards(
    media: MediaType,
    candidates: &[Candidate],
) -> Result<Vec<CandidateCard>, &'static str> {
    if candidates.is_empty() {
        return Err(media.no_results_text());
    }
    Ok(candidates.iter().map(CandidateCard::from).collect())
}

fn card_description(description: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        return "No description".to_string();
    }
    if description.chars().count() <= CARD_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let cut: String = description.chars().take(CARD_DESCRIPTION_CHARS).collect();
    format!("{}...", cut)
}
