//! # Typography Preference
//!
//! Font family and size used by the dashboard.
//!
//! ## Resolution Order
//! ```text
//! ┌──────────────────────┐
//! │  server layer        │  restaurant customization sent with every page
//! ├──────────────────────┤
//! │  cached layer        │  JSON stored under `restaurant_typography`
//! ├──────────────────────┤
//! │  built-in default    │  Instrument Sans / normal
//! └──────────────────────┘
//! ```
//! Each field is taken from the highest layer that sets it. A cached value
//! that does not parse is treated as absent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Key the preference is persisted under.
pub const STORAGE_KEY: &str = "restaurant_typography";

pub const DEFAULT_FONT_FAMILY: &str = "Instrument Sans";

// =============================================================================
// Font Size
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Normal,
    Large,
    Xlarge,
}

impl Default for FontSize {
    fn default() -> Self {
        FontSize::Normal
    }
}

// =============================================================================
// Typography
// =============================================================================

/// Fully resolved typography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    #[serde(alias = "font_family")]
    pub font_family: String,
    #[serde(alias = "font_size")]
    pub font_size: FontSize,
}

impl Default for Typography {
    fn default() -> Self {
        Typography {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: FontSize::Normal,
        }
    }
}

/// A partial preference; unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TypographyLayer {
    /// Older caches wrote snake_case keys; both spellings are read.
    #[serde(default, alias = "font_family", skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, alias = "font_size", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
}

impl TypographyLayer {
    pub fn is_empty(&self) -> bool {
        self.font_family.is_none() && self.font_size.is_none()
    }
}

impl From<&Typography> for TypographyLayer {
    fn from(t: &Typography) -> Self {
        TypographyLayer {
            font_family: Some(t.font_family.clone()),
            font_size: Some(t.font_size),
        }
    }
}

/// Merges the layers: server over cached over default.
///
/// ```rust
/// use resto_core::typography::{resolve, FontSize, TypographyLayer};
///
/// let server = TypographyLayer { font_family: None, font_size: Some(FontSize::Large) };
/// let t = resolve(Some(&server), Some(r#"{"font_family":"Inter"}"#));
/// assert_eq!(t.font_family, "Inter");
/// assert_eq!(t.font_size, FontSize::Large);
/// ```
pub fn resolve(server: Option<&TypographyLayer>, cached: Option<&str>) -> Typography {
    let cached = cached.and_then(parse_cached);
    let layers = [server, cached.as_ref()];
    let default = Typography::default();

    let font_family = layers
        .iter()
        .flatten()
        .find_map(|l| l.font_family.clone().filter(|f| !f.trim().is_empty()))
        .unwrap_or(default.font_family);
    let font_size = layers
        .iter()
        .flatten()
        .find_map(|l| l.font_size)
        .unwrap_or(default.font_size);

    Typography {
        font_family,
        font_size,
    }
}

fn parse_cached(raw: &str) -> Option<TypographyLayer> {
    serde_json::from_str(raw).ok()
}

// =============================================================================
// Preference Store
// =============================================================================

/// Key/value storage for client preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// The effective typography for one session, with the store it persists to.
///
/// Built without a store it still answers with defaults and ignores writes.
pub struct TypographySettings<S: PreferenceStore> {
    current: Typography,
    store: Option<S>,
}

impl<S: PreferenceStore> TypographySettings<S> {
    pub fn load(server: Option<&TypographyLayer>, store: Option<S>) -> Self {
        let cached = store.as_ref().and_then(|s| s.get(STORAGE_KEY));
        TypographySettings {
            current: resolve(server, cached.as_deref()),
            store,
        }
    }

    pub fn current(&self) -> &Typography {
        &self.current
    }

    /// Applies a partial update and writes the result back to the store.
    pub fn update(&mut self, change: TypographyLayer) {
        if let Some(family) = change.font_family {
            self.current.font_family = family;
        }
        if let Some(size) = change.font_size {
            self.current.font_size = size;
        }
        if let Some(store) = self.store.as_mut() {
            if let Ok(json) = serde_json::to_string(&self.current) {
                store.set(STORAGE_KEY, json);
            }
        }
    }

    pub fn into_store(self) -> Option<S> {
        self.store
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
