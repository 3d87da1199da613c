//! Versioned save format
//!
//! Current shape (version 2):
//!
//! ```json
//! {"version":2,"tierConfig":[{"id":"s","name":"S","color":"#ffb3d9"}],"tierData":{"s":[],"unassigned":[]}}
//! ```
//!
//! Older saves are upgraded on load:
//! - `{tierConfig?, tierData}` without a version: missing `tierConfig` means
//!   the default tiers
//! - a bare bucket map `{"s": [...], "unassigned": [...]}`: default tiers,
//!   every item kept
//!
//! Serialization is deterministic (bucket keys sorted), so saving a board
//! that was just loaded from a current-version blob reproduces it exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::board::Board;
use crate::error::SnapshotError;
use crate::model::{default_tiers, Item, Tier};

/// Fixed key the board is saved under
pub const STORAGE_KEY: &str = "tierMakerData";

/// Version written by [`serialize`]
pub const SNAPSHOT_VERSION: u32 = 2;

const VERSION_FIELD: &str = "version";
const TIER_CONFIG_FIELD: &str = "tierConfig";
const TIER_DATA_FIELD: &str = "tierData";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    version: u32,
    tier_config: &'a [Tier],
    tier_data: BTreeMap<String, Vec<Item>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TieredSnapshot {
    #[serde(default)]
    tier_config: Option<Vec<Tier>>,
    #[serde(default)]
    tier_data: BTreeMap<String, Vec<Item>>,
}

/// Encode the board as a current-version JSON blob
pub fn serialize(board: &Board) -> Result<String, SnapshotError> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        tier_config: board.tiers(),
        tier_data: board.bucket_map(),
    };
    Ok(serde_json::to_string(&snapshot)?)
}

/// Decode any supported save shape into a consistent board
pub fn deserialize(blob: &str) -> Result<Board, SnapshotError> {
    let value: Value = serde_json::from_str(blob)?;
    let Value::Object(object) = value else {
        return Err(SnapshotError::UnrecognisedShape(
            "top level is not an object".to_string(),
        ));
    };

    if let Some(version) = object.get(VERSION_FIELD) {
        let found = version.as_u64().ok_or_else(|| {
            SnapshotError::UnrecognisedShape(format!("version is not a number: {}", version))
        })?;
        if found > u64::from(SNAPSHOT_VERSION) {
            return Err(SnapshotError::UnsupportedVersion {
                found,
                supported: SNAPSHOT_VERSION,
            });
        }
    }

    if is_tiered(&object) {
        let snapshot: TieredSnapshot = serde_json::from_value(Value::Object(object))?;
        let tiers = snapshot.tier_config.unwrap_or_else(|| {
            info!("Save has no tier configuration, using default tiers");
            default_tiers()
        });
        debug!(tiers = tiers.len(), buckets = snapshot.tier_data.len(), "Loaded tiered save");
        return Ok(Board::from_parts(tiers, snapshot.tier_data));
    }

    let data: BTreeMap<String, Vec<Item>> = serde_json::from_value(Value::Object(object))?;
    info!(buckets = data.len(), "Upgrading legacy bucket-map save to default tiers");
    Ok(Board::from_parts(default_tiers(), data))
}

fn is_tiered(object: &Map<String, Value>) -> bool {
    [VERSION_FIELD, TIER_CONFIG_FIELD, TIER_DATA_FIELD]
        .iter()
        .any(|field| object.contains_key(*field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BucketKey;
    use serde_json::json;

    #[test]
    fn test_serialize_shape() {
        let mut board = Board::new();
        board.add_item(
            &BucketKey::tier("s"),
            Item::new("img_1", "data:image/png;base64,AA==", "a.png"),
        );

        let value: Value = serde_json::from_str(&serialize(&board).unwrap()).unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(value["tierConfig"].as_array().unwrap().len(), 6);
        assert_eq!(value["tierConfig"][0]["name"], "S");
        assert_eq!(value["tierData"]["s"][0]["id"], "img_1");
        assert_eq!(value["tierData"]["unassigned"], json!([]));
    }

    #[test]
    fn test_unversioned_tiered_save_is_accepted() {
        let blob = json!({
            "tierConfig": [{"id": "top", "name": "Top", "color": "#ffffff"}],
            "tierData": {"top": [{"id": "a", "src": "x", "name": "A"}], "unassigned": []}
        })
        .to_string();

        let board = deserialize(&blob).unwrap();
        assert_eq!(board.tiers().len(), 1);
        assert_eq!(board.bucket(&BucketKey::tier("top")).unwrap()[0].id, "a");
    }

    #[test]
    fn test_tier_data_without_config_uses_defaults() {
        let blob = json!({"tierData": {"a": [{"id": "x", "src": "s", "name": "n"}]}}).to_string();
        let board = deserialize(&blob).unwrap();
        assert_eq!(board.tiers(), default_tiers().as_slice());
        assert_eq!(board.item_count(), 1);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let blob = json!({"version": 3, "tierConfig": [], "tierData": {}}).to_string();
        assert!(matches!(
            deserialize(&blob),
            Err(SnapshotError::UnsupportedVersion { found: 3, .. })
        ));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(
            deserialize("[1, 2]"),
            Err(SnapshotError::UnrecognisedShape(_))
        ));
        assert!(matches!(deserialize("{"), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_item_metadata_survives() {
        let blob = json!({
            "tierData": {"s": [{"id": "igdb_1", "src": "https://x", "name": "Game", "summary": "", "rating": 87.5}]}
        })
        .to_string();

        let board = deserialize(&blob).unwrap();
        let item = board.item("igdb_1").unwrap();
        assert_eq!(item.summary.as_deref(), Some(""));
        assert_eq!(item.rating, Some(87.5));
    }
}
