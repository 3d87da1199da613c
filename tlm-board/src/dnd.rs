//! Drag and drop
//!
//! Dropping an item into a container inserts it next to the item whose
//! horizontal center is closest to the pointer: before it when the pointer is
//! left of that center, after it otherwise. The dragged item itself is never
//! an anchor.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::autoscroll::{AutoScroller, Point, Viewport};
use crate::controller::BoardController;
use crate::model::BucketKey;
use crate::patch::Patch;
use crate::storage::Storage;

/// Horizontal extent of a rendered item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBox {
    pub id: String,
    pub left: f64,
    pub width: f64,
}

impl ItemBox {
    pub fn new(id: impl Into<String>, left: f64, width: f64) -> Self {
        Self {
            id: id.into(),
            left,
            width,
        }
    }

    pub fn center(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// Boxes for items laid out left to right in a uniform grid row
pub fn grid_boxes<S: AsRef<str>>(ids: &[S], left: f64, cell_width: f64, gap: f64) -> Vec<ItemBox> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| ItemBox::new(id.as_ref(), left + i as f64 * (cell_width + gap), cell_width))
        .collect()
}

/// Where a drop would land
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionPoint {
    Before(String),
    After(String),
    /// No anchor: append
    End,
}

impl InsertionPoint {
    /// The `insert_before` id to hand to a move
    ///
    /// "After X" becomes "before whatever follows X", skipping the dragged
    /// item; `None` means append.
    pub fn insert_before_id(&self, items: &[ItemBox], dragged_id: Option<&str>) -> Option<String> {
        match self {
            InsertionPoint::Before(id) => Some(id.clone()),
            InsertionPoint::After(id) => items
                .iter()
                .skip_while(|b| &b.id != id)
                .skip(1)
                .find(|b| Some(b.id.as_str()) != dragged_id)
                .map(|b| b.id.clone()),
            InsertionPoint::End => None,
        }
    }
}

/// Nearest-center insertion point for a pointer at `pointer_x`
///
/// Ties keep the earlier item.
pub fn insertion_point(items: &[ItemBox], dragged_id: Option<&str>, pointer_x: f64) -> InsertionPoint {
    nearest(items, dragged_id, pointer_x)
        .map(|b| {
            if pointer_x < b.center() {
                InsertionPoint::Before(b.id.clone())
            } else {
                InsertionPoint::After(b.id.clone())
            }
        })
        .unwrap_or(InsertionPoint::End)
}

/// Horizontal offset of the drop indicator relative to the container
///
/// `None` when the container holds no other item.
pub fn indicator_offset(
    items: &[ItemBox],
    dragged_id: Option<&str>,
    pointer_x: f64,
    container_left: f64,
) -> Option<f64> {
    const HALF_INDICATOR: f64 = 1.5;

    let anchor = nearest(items, dragged_id, pointer_x)?;
    let edge = if pointer_x < anchor.center() {
        anchor.left
    } else {
        anchor.right()
    };
    Some(edge - container_left - HALF_INDICATOR)
}

fn nearest<'a>(items: &'a [ItemBox], dragged_id: Option<&str>, pointer_x: f64) -> Option<&'a ItemBox> {
    let mut best: Option<(&ItemBox, f64)> = None;
    for item in items.iter().filter(|b| Some(b.id.as_str()) != dragged_id) {
        let distance = (pointer_x - item.center()).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((item, distance));
        }
    }
    best.map(|(item, _)| item)
}

// ========================================
// Drag sessions
// ========================================

/// What is carried while dragging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub item_id: String,
    pub from: BucketKey,
}

impl DragPayload {
    pub fn new(item_id: impl Into<String>, from: BucketKey) -> Self {
        Self {
            item_id: item_id.into(),
            from,
        }
    }
}

/// A resolved drop, ready to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub item_id: String,
    pub from: BucketKey,
    pub to: BucketKey,
    pub insert_before: Option<String>,
}

impl MoveRequest {
    pub fn apply<S: Storage>(&self, controller: &mut BoardController<S>) -> Vec<Patch> {
        controller.move_item(
            &self.item_id,
            &self.from,
            &self.to,
            self.insert_before.as_deref(),
        )
    }
}

/// One drag, from pick-up to drop or cancel
///
/// Holds the auto-scroll timer, if any, so ending the session in any way
/// stops it.
pub struct DragSession {
    payload: DragPayload,
    hover: Option<BucketKey>,
    scroller: Option<AutoScroller>,
}

impl DragSession {
    pub fn begin(payload: DragPayload) -> Self {
        debug!(item_id = %payload.item_id, from = %payload.from, "Drag started");
        Self {
            payload,
            hover: None,
            scroller: None,
        }
    }

    pub fn with_auto_scroll(payload: DragPayload, scroller: AutoScroller) -> Self {
        Self {
            scroller: Some(scroller),
            ..Self::begin(payload)
        }
    }

    pub fn payload(&self) -> &DragPayload {
        &self.payload
    }

    /// Container currently under the pointer, for highlighting
    pub fn hovered(&self) -> Option<&BucketKey> {
        self.hover.as_ref()
    }

    pub fn hover(&mut self, container: Option<BucketKey>) {
        self.hover = container;
    }

    /// Feed a pointer update to the auto-scroller
    pub fn pointer_moved(&self, pointer: Point, viewport: Viewport) {
        if let Some(scroller) = &self.scroller {
            scroller.update(pointer, viewport);
        }
    }

    /// Finish the drag over `target`
    ///
    /// `items` are the boxes currently rendered in the target. Drops into
    /// `unassigned` always append.
    pub fn drop(self, target: BucketKey, items: &[ItemBox], pointer_x: f64) -> MoveRequest {
        let dragged = Some(self.payload.item_id.as_str());
        let insert_before = if target.is_unassigned() {
            None
        } else {
            insertion_point(items, dragged, pointer_x).insert_before_id(items, dragged)
        };
        debug!(
            item_id = %self.payload.item_id,
            to = %target,
            before = insert_before.as_deref().unwrap_or("<end>"),
            "Drop resolved"
        );

        MoveRequest {
            item_id: self.payload.item_id.clone(),
            from: self.payload.from.clone(),
            to: target,
            insert_before,
        }
    }

    /// Abandon the drag without moving anything
    pub fn cancel(self) {
        debug!(item_id = %self.payload.item_id, "Drag cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoscroll::ScrollPort;
    use crate::model::Item;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Three items centered at 100, 200 and 300
    fn row() -> Vec<ItemBox> {
        vec![
            ItemBox::new("x", 75.0, 50.0),
            ItemBox::new("y", 175.0, 50.0),
            ItemBox::new("z", 275.0, 50.0),
        ]
    }

    #[test]
    fn test_pointer_left_of_center_inserts_before() {
        assert_eq!(
            insertion_point(&row(), None, 180.0),
            InsertionPoint::Before("y".into())
        );
    }

    #[test]
    fn test_pointer_right_of_center_inserts_after() {
        let items = row();
        let point = insertion_point(&items, None, 260.0);
        assert_eq!(point, InsertionPoint::Before("z".into()));

        let point = insertion_point(&items, None, 240.0);
        assert_eq!(point, InsertionPoint::After("y".into()));
        assert_eq!(point.insert_before_id(&items, None), Some("z".to_string()));
    }

    #[test]
    fn test_after_last_item_appends() {
        let items = row();
        let point = insertion_point(&items, None, 400.0);
        assert_eq!(point, InsertionPoint::After("z".into()));
        assert_eq!(point.insert_before_id(&items, None), None);
    }

    #[test]
    fn test_equidistant_pointer_keeps_earlier_item() {
        // 150 is 50 away from both x and y.
        assert_eq!(
            insertion_point(&row(), None, 150.0),
            InsertionPoint::After("x".into())
        );
    }

    #[test]
    fn test_dragged_item_is_never_an_anchor() {
        let items = row();
        let point = insertion_point(&items, Some("y"), 200.0);
        assert_eq!(point, InsertionPoint::After("x".into()));
        // Skips the dragged item when resolving "after".
        assert_eq!(point.insert_before_id(&items, Some("y")), Some("z".to_string()));
    }

    #[test]
    fn test_empty_container_appends() {
        assert_eq!(insertion_point(&[], None, 10.0), InsertionPoint::End);
        let only_dragged = vec![ItemBox::new("x", 0.0, 50.0)];
        assert_eq!(insertion_point(&only_dragged, Some("x"), 10.0), InsertionPoint::End);
        assert_eq!(indicator_offset(&only_dragged, Some("x"), 10.0, 0.0), None);
    }

    #[test]
    fn test_indicator_offset() {
        let items = row();
        assert_eq!(indicator_offset(&items, None, 180.0, 50.0), Some(123.5));
        assert_eq!(indicator_offset(&items, None, 320.0, 50.0), Some(273.5));
    }

    #[test]
    fn test_grid_boxes_layout() {
        let boxes = grid_boxes(&["a", "b"], 10.0, 80.0, 8.0);
        assert_eq!(boxes[1], ItemBox::new("b", 98.0, 80.0));
        assert_eq!(boxes[1].center(), 138.0);
    }

    #[test]
    fn test_drop_into_tier_applies_move() {
        let mut controller = BoardController::new(MemoryStorage::new());
        let s = BucketKey::tier("s");
        controller.add_item(&s, Item::new("z", "src", "z"));
        controller.add_item(&s, Item::new("y", "src", "y"));
        controller.add_item(&BucketKey::Unassigned, Item::new("a", "src", "a"));

        let session = DragSession::begin(DragPayload::new("a", BucketKey::Unassigned));
        let boxes = grid_boxes(&["y", "z"], 0.0, 100.0, 0.0);
        let request = session.drop(s.clone(), &boxes, 120.0);
        assert_eq!(request.insert_before.as_deref(), Some("z"));

        request.apply(&mut controller);
        let ids: Vec<_> = controller
            .board()
            .bucket(&s)
            .unwrap()
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, ["y", "a", "z"]);
    }

    #[test]
    fn test_drop_into_unassigned_ignores_pointer() {
        let session = DragSession::begin(DragPayload::new("a", BucketKey::tier("s")));
        let request = session.drop(BucketKey::Unassigned, &row(), 10.0);
        assert_eq!(request.insert_before, None);
    }

    #[derive(Default)]
    struct CountingPort(AtomicUsize);

    impl ScrollPort for CountingPort {
        fn scroll_by(&self, _dx: f64, _dy: f64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ending_session_stops_auto_scroll() {
        let port = Arc::new(CountingPort::default());
        let mut session = DragSession::with_auto_scroll(
            DragPayload::new("a", BucketKey::Unassigned),
            AutoScroller::start(port.clone()),
        );
        session.hover(Some(BucketKey::tier("s")));
        session.pointer_moved(Point::new(400.0, 5.0), Viewport::new(800.0, 600.0));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        session.cancel();
        tokio::task::yield_now().await;
        let ticks = port.0.load(Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        assert!(ticks > 0);
        assert_eq!(port.0.load(Ordering::SeqCst), ticks);
    }
}
