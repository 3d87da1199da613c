//! Board data model: tiers, items and bucket keys

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of the permanent pseudo-tier holding unranked items
pub const UNASSIGNED: &str = "unassigned";

/// Longest tier name accepted, in characters
pub const MAX_TIER_NAME_CHARS: usize = 20;

/// Colors offered when creating or recoloring a tier
pub const TIER_PALETTE: [&str; 8] = [
    "#ffb3d9", "#f0e68c", "#98fb98", "#87ceeb", "#dda0dd", "#ffb6c1", "#ffa07a", "#98d8f0",
];

const DEFAULT_TIERS: [(&str, &str, &str); 6] = [
    ("s", "S", "#ffb3d9"),
    ("a", "A", "#f0e68c"),
    ("b", "B", "#98fb98"),
    ("c", "C", "#87ceeb"),
    ("d", "D", "#dda0dd"),
    ("f", "F", "#ffb6c1"),
];

/// The standard S/A/B/C/D/F configuration
pub fn default_tiers() -> Vec<Tier> {
    DEFAULT_TIERS
        .iter()
        .map(|(id, name, color)| Tier::new(*id, *name, *color))
        .collect()
}

/// A ranking row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub id: String,
    /// Display name shown in the row label
    pub name: String,
    /// `#rrggbb`
    pub color: String,
}

impl Tier {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// A single rankable image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique across the whole board
    pub id: String,
    /// Image source: a data URL for uploads, a remote URL for search results
    pub src: String,
    /// Label (file name or title)
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl Item {
    pub fn new(id: impl Into<String>, src: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            name: name.into(),
            summary: None,
            rating: None,
        }
    }
}

/// Identifies a bucket: a tier id or the unassigned pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BucketKey {
    Unassigned,
    Tier(String),
}

impl BucketKey {
    pub fn tier(id: impl Into<String>) -> Self {
        let id = id.into();
        if id == UNASSIGNED {
            BucketKey::Unassigned
        } else {
            BucketKey::Tier(id)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BucketKey::Unassigned => UNASSIGNED,
            BucketKey::Tier(id) => id,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, BucketKey::Unassigned)
    }
}

impl From<String> for BucketKey {
    fn from(s: String) -> Self {
        BucketKey::tier(s)
    }
}

impl From<&str> for BucketKey {
    fn from(s: &str) -> Self {
        BucketKey::tier(s)
    }
}

impl From<BucketKey> for String {
    fn from(key: BucketKey) -> Self {
        match key {
            BucketKey::Unassigned => UNASSIGNED.to_string(),
            BucketKey::Tier(id) => id,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `#rrggbb` into its components
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub fn is_hex_color(color: &str) -> bool {
    parse_hex_color(color).is_some()
}

/// Next palette color after `current`, wrapping around
///
/// Colors outside the palette restart the cycle at its first entry.
pub fn next_palette_color(current: &str) -> &'static str {
    match TIER_PALETTE
        .iter()
        .position(|c| c.eq_ignore_ascii_case(current))
    {
        Some(i) => TIER_PALETTE[(i + 1) % TIER_PALETTE.len()],
        None => TIER_PALETTE[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers_are_s_through_f() {
        let ids: Vec<_> = default_tiers().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["s", "a", "b", "c", "d", "f"]);
    }

    #[test]
    fn test_bucket_key_maps_sentinel() {
        assert_eq!(BucketKey::from("unassigned"), BucketKey::Unassigned);
        assert_eq!(BucketKey::from("s"), BucketKey::Tier("s".to_string()));
        assert_eq!(String::from(BucketKey::Unassigned), "unassigned");

        let json = serde_json::to_string(&BucketKey::tier("a")).unwrap();
        assert_eq!(json, "\"a\"");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ffb3d9"), Some((255, 179, 217)));
        assert_eq!(parse_hex_color("#FFB3D9"), Some((255, 179, 217)));
        assert_eq!(parse_hex_color("ffb3d9"), None);
        assert_eq!(parse_hex_color("#ffb3d"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn test_palette_cycle_wraps() {
        assert_eq!(next_palette_color("#ffb3d9"), "#f0e68c");
        assert_eq!(next_palette_color("#98d8f0"), "#ffb3d9");
        assert_eq!(next_palette_color("#123456"), "#ffb3d9");
    }

    #[test]
    fn test_item_metadata_is_omitted_when_absent() {
        let item = Item::new("img_1", "data:image/png;base64,AA==", "a.png");
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("summary").is_none());
        assert!(json.get("rating").is_none());
        assert_eq!(json["src"], "data:image/png;base64,AA==");
    }
}
