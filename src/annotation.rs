use std::path::Path;

use serde::{Deserialize, Serialize};
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;

use crate::error::Error;
use crate::geometry::{BoundingBox, PixelRect};
use crate::table::TableData;

/// Reserved key holding the line-items table region.
pub const TABLE_KEY: &str = "TABLE";
/// Reserved key holding the logo region.
pub const LOGO_KEY: &str = "LOGO";

/// One piece of text anchored at a box.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldAnnotation {
    pub id: String,
    pub text: String,
    pub bbox: BoundingBox,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableRegion {
    pub bbox: BoundingBox,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogoRegion {
    pub bbox: BoundingBox,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Text(FieldAnnotation),
    Table(TableRegion),
    Logo(LogoRegion),
}

/// Input annotation record, validated into a closed set of entries. Entry
/// order follows the key order of the source JSON.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputRecord {
    pub entries: Vec<Entry>,
}

fn parse_bbox(v: &Value) -> Result<BoundingBox, serde_json::Error> {
    BoundingBox::deserialize(v)
}

fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl InputRecord {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(&value)
    }

    /// Classify every key of the record. A malformed table region is fatal;
    /// a malformed text field or logo is skipped with a warning.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let Value::Object(map) = value else {
            return Err(Error::InvalidAnnotation(
                "annotation record must be a JSON object".into(),
            ));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (key, content) in map {
            match key.as_str() {
                TABLE_KEY => {
                    // Two levels of wrapping around the region: [[{"bbox": ...}]]
                    let raw = content
                        .get(0)
                        .and_then(|v| v.get(0))
                        .and_then(|v| v.get("bbox"))
                        .ok_or_else(|| {
                            Error::InvalidAnnotation(format!("{TABLE_KEY}: expected [[{{\"bbox\": ...}}]]"))
                        })?;
                    let bbox = parse_bbox(raw)
                        .map_err(|e| Error::InvalidAnnotation(format!("{TABLE_KEY} bbox: {e}")))?;
                    entries.push(Entry::Table(TableRegion { bbox }));
                }
                LOGO_KEY => {
                    let Some(raw) = content.get("bbox") else {
                        log::debug!("{LOGO_KEY} without bbox, ignored");
                        continue;
                    };
                    match parse_bbox(raw) {
                        Ok(bbox) => entries.push(Entry::Logo(LogoRegion { bbox })),
                        Err(e) => log::warn!("{LOGO_KEY}: unusable bbox ({e}), logo skipped"),
                    }
                }
                _ => {
                    let (Some(text), Some(raw)) = (content.get("text"), content.get("bbox")) else {
                        log::debug!("{key}: no text/bbox pair, ignored");
                        continue;
                    };
                    let Some(text) = text_of(text) else {
                        log::warn!("{key}: text is not a scalar, field skipped");
                        continue;
                    };
                    match parse_bbox(raw) {
                        Ok(bbox) => entries.push(Entry::Text(FieldAnnotation {
                            id: key.clone(),
                            text,
                            bbox,
                        })),
                        Err(e) => log::warn!("{key}: unusable bbox ({e}), field skipped"),
                    }
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldAnnotation> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Text(f) => Some(f),
            _ => None,
        })
    }

    pub fn table(&self) -> Option<&TableRegion> {
        self.entries.iter().find_map(|e| match e {
            Entry::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn logo(&self) -> Option<&LogoRegion> {
        self.entries.iter().find_map(|e| match e {
            Entry::Logo(l) => Some(l),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryText {
    Text(String),
    Table(TableData),
}

/// What was drawn for one key, in surface pixel space.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputEntry {
    pub bbox: PixelRect,
    pub text: EntryText,
}

/// Ground truth for a rendered invoice. Keys keep insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputAnnotation {
    entries: Vec<(String, OutputEntry)>,
}

impl OutputAnnotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry under `key`.
    pub fn insert(&mut self, key: impl Into<String>, entry: OutputEntry) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = entry,
            None => self.entries.push((key, entry)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OutputEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for OutputAnnotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}
