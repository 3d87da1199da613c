//! tlm-board library - Board Controller
//!
//! Owns the tier list state: tiers, buckets and items. Every mutation is a
//! pure transition returning patches for the view, followed by a save of the
//! full snapshot through an injected storage port.
//!
//! Also here: the drag-and-drop geometry, edge auto-scroll, image uploads
//! and the client for the search gateway.

pub mod autoscroll;
pub mod board;
pub mod controller;
pub mod dnd;
pub mod error;
pub mod model;
pub mod patch;
pub mod render;
pub mod search;
pub mod snapshot;
pub mod storage;
pub mod upload;

pub use board::Board;
pub use controller::BoardController;
pub use error::{BoardError, SearchError, SnapshotError, StorageError, UploadError};
pub use model::{BucketKey, Item, Tier, UNASSIGNED};
pub use patch::Patch;
pub use render::{render, BoardView, RenderSurface};
pub use storage::{FileStorage, MemoryStorage, Storage};
