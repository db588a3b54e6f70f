//! On-demand reverse geocoding for one entity at a time.
//!
//! Not part of the polling cycle: a lookup happens when the user opens an
//! entity. Results are cached per entity id for a short TTL; failures are
//! not cached so the next request retries.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fleetsync_types::{AddressRecord, GeocodeError, LatLng};
use reqwest::header::ACCEPT_LANGUAGE;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, position: LatLng) -> Result<AddressRecord, GeocodeError>;
}

/// Nominatim `reverse` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, language: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| GeocodeError::Request { message: format!("invalid geocoder URL {base_url:?}: {e}") })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fleetsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodeError::Request { message: e.to_string() })?;

        Ok(Self { client, base_url, language: language.to_string() })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, position: LatLng) -> Result<AddressRecord, GeocodeError> {
        if !position.is_finite() {
            return Err(GeocodeError::InvalidCoordinates);
        }

        let lat = position.lat.to_string();
        let lon = position.lng.to_string();
        let resp = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("addressdetails", "1"),
                ("extratags", "1"),
                ("namedetails", "1"),
            ])
            .header(ACCEPT_LANGUAGE, self.language.as_str())
            .send()
            .await
            .map_err(|e| GeocodeError::Request { message: e.to_string() })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Status { status: status.as_u16() });
        }

        let body: Value = resp.json().await.map_err(|e| GeocodeError::Parse { message: e.to_string() })?;
        if let Some(error) = body.get("error") {
            return Err(GeocodeError::Parse { message: error.to_string() });
        }
        serde_json::from_value(body).map_err(|e| GeocodeError::Parse { message: e.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressState {
    Loading,
    Resolved(AddressRecord),
    Failed(GeocodeError),
}

struct CachedAddress {
    state: AddressState,
    updated_at: Instant,
}

/// Per-entity address cache in front of a [`Geocoder`].
pub struct AddressBook {
    geocoder: Arc<dyn Geocoder>,
    entries: DashMap<String, CachedAddress>,
    ttl: Duration,
}

impl AddressBook {
    pub fn new(geocoder: Arc<dyn Geocoder>, ttl: Duration) -> Self {
        Self { geocoder, entries: DashMap::new(), ttl }
    }

    /// Address of `entity_id` at `position`.
    ///
    /// A fresh cached record is returned as-is. While another lookup for the
    /// same entity is in flight this returns [`AddressState::Loading`]
    /// without a second request.
    pub async fn lookup(&self, entity_id: &str, position: LatLng) -> AddressState {
        if !position.is_finite() {
            return AddressState::Failed(GeocodeError::InvalidCoordinates);
        }

        let now = Instant::now();
        match self.entries.entry(entity_id.to_string()) {
            Entry::Occupied(mut slot) => {
                let cached = slot.get();
                let fresh = now.duration_since(cached.updated_at) < self.ttl;
                let reuse = match &cached.state {
                    AddressState::Loading if fresh => Some(AddressState::Loading),
                    AddressState::Resolved(record) if fresh => Some(AddressState::Resolved(record.clone())),
                    _ => None,
                };
                if let Some(state) = reuse {
                    return state;
                }
                slot.insert(CachedAddress { state: AddressState::Loading, updated_at: now });
            },
            Entry::Vacant(slot) => {
                slot.insert(CachedAddress { state: AddressState::Loading, updated_at: now });
            },
        }

        match self.geocoder.reverse(position).await {
            Ok(record) => {
                tracing::debug!("[geocode] resolved {}", entity_id);
                let state = AddressState::Resolved(record);
                self.entries.insert(
                    entity_id.to_string(),
                    CachedAddress { state: state.clone(), updated_at: Instant::now() },
                );
                state
            },
            Err(e) => {
                tracing::warn!("[geocode] {} failed: {}", entity_id, e);
                self.entries.remove(entity_id);
                AddressState::Failed(e)
            },
        }
    }

    /// Cached state without triggering a lookup.
    pub fn state(&self, entity_id: &str) -> Option<AddressState> {
        self.entries.get(entity_id).map(|c| c.state.clone())
    }

    pub fn forget(&self, entity_id: &str) {
        self.entries.remove(entity_id);
    }
}

/// One labelled line of an address popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRow {
    pub label: &'static str,
    pub value: String,
}

/// Rows for the fields that are present, in display order.
pub fn format_address(record: &AddressRecord) -> Vec<AddressRow> {
    let address = &record.address;
    [
        ("Street", &address.road),
        ("Number", &address.house_number),
        ("City", &address.city),
        ("Postcode", &address.postcode),
        ("Country", &address.country),
        ("Full address", &record.display_name),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| AddressRow { label, value: v.to_string() })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsync_types::AddressDetails;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeGeocoder {
        calls: AtomicUsize,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn reverse(&self, position: LatLng) -> Result<AddressRecord, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(GeocodeError::Status { status: 503 });
            }
            Ok(AddressRecord {
                display_name: Some(format!("{}, {}", position.lat, position.lng)),
                address: AddressDetails::default(),
            })
        }
    }

    const HERE: LatLng = LatLng::new(52.1, 19.2);

    #[tokio::test(start_paused = true)]
    async fn test_resolved_is_cached_for_ttl() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let book = AddressBook::new(geocoder.clone(), Duration::from_secs(30));

        assert!(matches!(book.lookup("A::7", HERE).await, AddressState::Resolved(_)));
        assert!(matches!(book.lookup("A::7", HERE).await, AddressState::Resolved(_)));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        book.lookup("A::7", HERE).await;
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let geocoder = Arc::new(FakeGeocoder { fail: true, ..FakeGeocoder::default() });
        let book = AddressBook::new(geocoder.clone(), Duration::from_secs(30));

        let state = book.lookup("A::7", HERE).await;
        assert_eq!(state, AddressState::Failed(GeocodeError::Status { status: 503 }));
        assert!(book.state("A::7").is_none());

        book.lookup("A::7", HERE).await;
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookup_sees_loading() {
        let gate = Arc::new(Notify::new());
        let geocoder = Arc::new(FakeGeocoder { gate: Some(gate.clone()), ..FakeGeocoder::default() });
        let book = Arc::new(AddressBook::new(geocoder.clone(), Duration::from_secs(30)));

        let first = tokio::spawn({
            let book = Arc::clone(&book);
            async move { book.lookup("A::7", HERE).await }
        });
        while geocoder.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(book.lookup("A::7", HERE).await, AddressState::Loading);
        assert_eq!(book.state("A::7"), Some(AddressState::Loading));

        gate.notify_one();
        assert!(matches!(first.await.unwrap(), AddressState::Resolved(_)));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_finite_position_fails_fast() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let book = AddressBook::new(geocoder.clone(), Duration::from_secs(30));
        let state = book.lookup("A::1", LatLng::new(f64::NAN, 1.0)).await;
        assert_eq!(state, AddressState::Failed(GeocodeError::InvalidCoordinates));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_format_address_rows() {
        let record = AddressRecord {
            display_name: Some("12, Main St, Warsaw, Poland".to_string()),
            address: AddressDetails {
                road: Some("Main St".to_string()),
                house_number: Some("12".to_string()),
                city: Some("Warsaw".to_string()),
                postcode: None,
                country: Some(String::new()),
            },
        };
        let labels: Vec<&str> = format_address(&record).iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Street", "Number", "City", "Full address"]);
        assert!(format_address(&AddressRecord::default()).is_empty());
    }
}
