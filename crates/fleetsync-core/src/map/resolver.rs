//! Focus search over the merged entity list.
//!
//! Labels, backend device ids and display names are only loosely related,
//! so the search walks from exact to fuzzy:
//!
//! | tier | field(s)                 | compared against               |
//! |------|--------------------------|--------------------------------|
//! | a    | `id`                     | label or imei, exact           |
//! | b    | `raw_id`, `imei`         | imei, exact                    |
//! | c    | `name`                   | label, exact then substring    |
//! | d    | `raw_id`, `imei`         | imei of the account `label`    |
//! | e    | `name`, `raw_id`         | imei, substring                |

use fleetsync_types::{AccountConfig, FocusQuery, TrackedEntity};
use serde::{Deserialize, Serialize};

/// Zoom level never undercut when flying to an entity.
pub const FOCUS_MIN_ZOOM: u8 = 13;

/// Find the entity a focus query refers to; first tier with a hit wins.
pub fn resolve<'a>(
    query: &FocusQuery,
    entities: &'a [TrackedEntity],
    accounts: &[AccountConfig],
) -> Option<&'a TrackedEntity> {
    let label = non_blank(query.label.as_deref());
    let imei = non_blank(query.imei.as_deref());

    if label.is_none() && imei.is_none() {
        return None;
    }

    let matches_device = |e: &TrackedEntity, id: &str| e.raw_id == id || e.imei.as_deref() == Some(id);

    let by_id = entities.iter().find(|e| Some(e.id.as_str()) == label || Some(e.id.as_str()) == imei);
    if by_id.is_some() {
        return by_id;
    }

    if let Some(imei) = imei {
        if let Some(hit) = entities.iter().find(|e| matches_device(e, imei)) {
            return Some(hit);
        }
    }

    if let Some(label) = label {
        let by_name = entities
            .iter()
            .find(|e| e.name == label)
            .or_else(|| entities.iter().find(|e| e.name.contains(label)));
        if by_name.is_some() {
            return by_name;
        }

        let account_imei = accounts
            .iter()
            .find(|a| a.label == label && !a.account_id.is_empty())
            .map(|a| a.account_id.as_str());
        if let Some(account_imei) = account_imei {
            if let Some(hit) = entities.iter().find(|e| matches_device(e, account_imei)) {
                return Some(hit);
            }
        }
    }

    let imei = imei?;
    entities.iter().find(|e| e.name.contains(imei) || e.raw_id.contains(imei))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Where the map should fly for a resolved entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTarget {
    pub entity_id: String,
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
}

/// Fly-to target, or `None` when the entity has no finite position.
pub fn focus_target(entity: &TrackedEntity, current_zoom: u8) -> Option<FocusTarget> {
    entity.is_renderable().then(|| FocusTarget {
        entity_id: entity.id.clone(),
        lat: entity.lat,
        lng: entity.lng,
        zoom: current_zoom.max(FOCUS_MIN_ZOOM),
    })
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
            lat: 52.0,
            lng: 19.0,
            description: "speed: 0 km/h".to_string(),
            imei: None,
            heading: None,
        }
    }

    fn fleet() -> Vec<TrackedEntity> {
        let mut tagged = entity("B", "55", "Van");
        tagged.imei = Some("868120".to_string());
        vec![entity("A", "7", "Truck-1-East"), entity("A", "123", "Bus"), tagged, entity("B", "9", "Truck-1")]
    }

    #[test]
    fn test_exact_id() {
        let entities = fleet();
        let hit = resolve(&FocusQuery::by_label("A::123"), &entities, &[]).unwrap();
        assert_eq!(hit.name, "Bus");
    }

    #[test]
    fn test_imei_matches_raw_id() {
        let entities = vec![entity("A", "123", "Bus")];
        let hit = resolve(&FocusQuery::by_imei("123"), &entities, &[]).unwrap();
        assert_eq!(hit.id, "A::123");
    }

    #[test]
    fn test_imei_matches_device_imei() {
        let entities = fleet();
        assert_eq!(resolve(&FocusQuery::by_imei("868120"), &entities, &[]).unwrap().name, "Van");
    }

    #[test]
    fn test_label_exact_name_beats_substring() {
        let entities = fleet();
        let hit = resolve(&FocusQuery::by_label("Truck-1"), &entities, &[]).unwrap();
        assert_eq!(hit.id, "B::9");
    }

    #[test]
    fn test_label_substring_fallback() {
        let entities = vec![entity("A", "7", "Truck-1-East"), entity("A", "8", "Bus")];
        let hit = resolve(&FocusQuery::by_label("Truck-1"), &entities, &[]).unwrap();
        assert_eq!(hit.name, "Truck-1-East");
    }

    #[test]
    fn test_label_via_account_imei() {
        let entities = fleet();
        let accounts = vec![AccountConfig::new("55", "pw", "Delivery")];
        let hit = resolve(&FocusQuery::by_label("Delivery"), &entities, &accounts).unwrap();
        assert_eq!(hit.id, "B::55");
    }

    #[test]
    fn test_imei_substring_last_resort() {
        let entities = fleet();
        assert_eq!(resolve(&FocusQuery::by_imei("us"), &entities, &[]).unwrap().name, "Bus");
        assert_eq!(resolve(&FocusQuery::by_imei("12"), &entities, &[]).unwrap().raw_id, "123");
    }

    #[test]
    fn test_no_match_and_blank_query() {
        let entities = fleet();
        assert!(resolve(&FocusQuery::by_label("Tractor"), &entities, &[]).is_none());
        assert!(resolve(&FocusQuery::by_label("  "), &entities, &[]).is_none());
        assert!(resolve(&FocusQuery::default(), &entities, &[]).is_none());
    }

    #[test]
    fn test_focus_target_zoom_floor() {
        let e = entity("A", "1", "x");
        assert_eq!(focus_target(&e, 6).unwrap().zoom, 13);
        assert_eq!(focus_target(&e, 16).unwrap().zoom, 16);
        assert_eq!(focus_target(&e, 6).unwrap().entity_id, "A::1");

        let mut lost = entity("A", "2", "y");
        lost.lat = f64::NAN;
        assert!(focus_target(&lost, 6).is_none());
    }
}
