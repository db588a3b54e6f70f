//! Marker icon selection and caching.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dashmap::DashMap;
use fleetsync_types::{AccountConfig, TrackedEntity};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_COLOR: &str = "#0b78d1";
pub const DEFAULT_SIZE: u32 = 44;
pub const CUSTOM_SIZE: u32 = 48;

fn source_color(source: &str) -> &'static str {
    match source {
        "A" => "#1e90ff",
        "B" => "#e11d48",
        _ => DEFAULT_COLOR,
    }
}

fn badge(text: &str) -> String {
    text.chars().take(2).collect::<String>().to_uppercase()
}

/// Visual description of a marker. Its JSON form is the cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub size: u32,
    pub label: String,
}

impl IconSpec {
    fn for_account(account: &AccountConfig) -> Self {
        Self { color: account.color.clone(), size: CUSTOM_SIZE, label: account.badge() }
    }

    fn for_entity(entity: &TrackedEntity) -> Self {
        Self {
            color: Some(source_color(&entity.source).to_string()),
            size: DEFAULT_SIZE,
            label: badge(&entity.name),
        }
    }

    fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

/// Rendered icon ready for the map surface.
#[derive(Debug, Clone, PartialEq)]
pub struct IconAsset {
    pub spec: IconSpec,
    /// `data:image/svg+xml;base64,...`
    pub data_url: String,
    pub size: u32,
    /// Pin tip, in pixels from the top-left corner
    pub anchor: (u32, u32),
    pub popup_anchor: (i32, i32),
}

impl IconAsset {
    fn render(spec: &IconSpec) -> Self {
        let size = spec.size.max(1);
        let tip = (f64::from(size) * 0.92).round() as u32;
        let popup = (f64::from(size) * 0.9).round() as i32;
        Self {
            spec: spec.clone(),
            data_url: format!("data:image/svg+xml;base64,{}", STANDARD.encode(pin_svg(spec))),
            size,
            anchor: (size / 2, tip),
            popup_anchor: (0, -popup),
        }
    }
}

fn pin_svg(spec: &IconSpec) -> String {
    let s = f64::from(spec.size.max(1));
    let color = spec.color.as_deref().unwrap_or(DEFAULT_COLOR);
    let half = s / 2.0;
    let head_r = (s * 0.33).round();
    let dot_r = (s * 0.18).round();
    let inner_r = (dot_r * 0.6).max(1.0);
    let stroke = (s * 0.03).round().max(1.0);
    let top = s * 0.08;
    let eye_y = s * 0.36;
    let tail_y = s * 0.80;
    let tip_y = s * 0.96;

    let text = if spec.label.is_empty() {
        String::new()
    } else {
        format!(
            r##"<text x="{half}" y="{y}" font-size="{fs}" text-anchor="middle" fill="#fff" font-family="Arial" font-weight="700">{label}</text>"##,
            y = s * 0.43,
            fs = (s * 0.12).max(8.0),
            label = escape_xml(&spec.label),
        )
    };

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{s}" height="{s}" viewBox="0 0 {s} {s}">"#,
            r##"<path d="M {half} {top} A {r} {r} 0 1 1 {half_left} {top} Z" fill="{c}" stroke="#ffffff" stroke-width="{stroke}"/>"##,
            r##"<circle cx="{half}" cy="{eye_y}" r="{dot_r}" fill="#ffffff"/>"##,
            r#"<circle cx="{half}" cy="{eye_y}" r="{inner_r}" fill="{c}"/>"#,
            r#"<polygon points="{tl},{tail_y} {tr},{tail_y} {half},{tip_y}" fill="{c}"/>"#,
            "{text}</svg>"
        ),
        s = s,
        half = half,
        top = top,
        r = head_r,
        half_left = half - 0.001,
        c = escape_xml(color),
        stroke = stroke,
        eye_y = eye_y,
        dot_r = dot_r,
        inner_r = inner_r,
        tl = half - 6.0,
        tr = half + 6.0,
        tail_y = tail_y,
        tip_y = tip_y,
        text = text,
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Picks a spec per entity and hands out shared, cached assets.
#[derive(Default)]
pub struct IconResolver {
    custom: RwLock<HashMap<String, IconSpec>>,
    cache: DashMap<String, Arc<IconAsset>>,
}

impl IconResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild per-account overrides from the user-added accounts, keyed by
    /// both imei and label.
    pub fn set_accounts(&self, accounts: &[AccountConfig]) {
        let mut custom = HashMap::with_capacity(accounts.len() * 2);
        for account in accounts {
            let spec = IconSpec::for_account(account);
            if !account.account_id.is_empty() {
                custom.insert(account.account_id.clone(), spec.clone());
            }
            custom.insert(account.label.clone(), spec);
        }
        *self.custom.write() = custom;
    }

    /// Custom spec keyed by raw id, id, name or source, in that order;
    /// otherwise the source default.
    pub fn spec_for(&self, entity: &TrackedEntity) -> IconSpec {
        let custom = self.custom.read();
        [&entity.raw_id, &entity.id, &entity.name, &entity.source]
            .into_iter()
            .filter(|key| !key.is_empty())
            .find_map(|key| custom.get(key.as_str()).cloned())
            .unwrap_or_else(|| IconSpec::for_entity(entity))
    }

    pub fn icon_for(&self, entity: &TrackedEntity) -> Arc<IconAsset> {
        self.icon_for_spec(&self.spec_for(entity))
    }

    /// Same spec, same `Arc`.
    pub fn icon_for_spec(&self, spec: &IconSpec) -> Arc<IconAsset> {
        self.cache
            .entry(spec.cache_key())
            .or_insert_with(|| Arc::new(IconAsset::render(spec)))
            .clone()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(source: &str, raw_id: &str, name: &str) -> TrackedEntity {
        TrackedEntity {
            id: format!("{source}::{raw_id}"),
            raw_id: raw_id.to_string(),
            source: source.to_string(),
            name: name.to_string(),
            lat: 0.0,
            lng: 0.0,
            description: String::new(),
            imei: None,
            heading: None,
        }
    }

    #[test]
    fn test_source_defaults() {
        let icons = IconResolver::new();
        let a = icons.spec_for(&entity("A", "1", "truck"));
        assert_eq!(a, IconSpec { color: Some("#1e90ff".to_string()), size: 44, label: "TR".to_string() });
        assert_eq!(icons.spec_for(&entity("B", "1", "x")).color.as_deref(), Some("#e11d48"));
        assert_eq!(icons.spec_for(&entity("Van", "1", "x")).color.as_deref(), Some(DEFAULT_COLOR));
    }

    #[test]
    fn test_custom_spec_by_raw_id_and_source() {
        let icons = IconResolver::new();
        icons.set_accounts(&[
            AccountConfig::new("868120", "pw", "delivery").with_color("#00aa00"),
            AccountConfig::new("999", "pw", "Van"),
        ]);

        let by_raw_id = icons.spec_for(&entity("A", "868120", "whatever"));
        assert_eq!(by_raw_id.color.as_deref(), Some("#00aa00"));
        assert_eq!(by_raw_id.size, 48);
        assert_eq!(by_raw_id.label, "DE");

        let by_source = icons.spec_for(&entity("Van", "5", "car"));
        assert_eq!(by_source.color, None);
        assert_eq!(by_source.label, "VA");
    }

    #[test]
    fn test_cache_reuses_asset() {
        let icons = IconResolver::new();
        let first = icons.icon_for(&entity("A", "1", "truck"));
        let second = icons.icon_for(&entity("A", "2", "trailer"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(icons.cached(), 1);

        let other = icons.icon_for(&entity("B", "1", "truck"));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(icons.cached(), 2);
    }

    #[test]
    fn test_asset_is_base64_svg() {
        let asset = IconAsset::render(&IconSpec { color: None, size: 44, label: "A<".to_string() });
        let encoded = asset.data_url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(DEFAULT_COLOR));
        assert!(svg.contains("A&lt;"));
        assert_eq!(asset.anchor, (22, 40));
        assert_eq!(asset.popup_anchor, (0, -40));
    }

    #[test]
    fn test_render_is_deterministic() {
        let spec = IconSpec { color: Some("#123456".to_string()), size: 48, label: "TR".to_string() };
        assert_eq!(IconAsset::render(&spec), IconAsset::render(&spec));
    }
}
