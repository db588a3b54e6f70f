#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "integration test: panics are the assertion mechanism")]

use fleetsync_core::map::{format_address, AddressBook, AddressState, Geocoder, NominatimGeocoder};
use fleetsync_types::{GeocodeError, LatLng};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geocoder_for(server: &MockServer) -> NominatimGeocoder {
    NominatimGeocoder::new(&server.uri(), "ru", Duration::from_secs(5)).expect("valid mock url")
}

#[tokio::test]
async fn test_reverse_parses_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("lat", "52.1"))
        .and(query_param("lon", "19.2"))
        .and(query_param("addressdetails", "1"))
        .and(header("accept-language", "ru"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "display_name": "12, Marszałkowska, Warszawa, 00-001, Polska",
            "address": {
                "road": "Marszałkowska",
                "house_number": "12",
                "city": "Warszawa",
                "postcode": "00-001",
                "country": "Polska",
                "country_code": "pl"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = geocoder_for(&server).reverse(LatLng::new(52.1, 19.2)).await.expect("address");
    let rows = format_address(&record);

    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0].label, "Street");
    assert_eq!(rows[0].value, "Marszałkowska");
    assert_eq!(rows[5].label, "Full address");
}

#[tokio::test]
async fn test_http_failure_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = geocoder_for(&server).reverse(LatLng::new(1.0, 1.0)).await.expect_err("429");
    assert_eq!(err, GeocodeError::Status { status: 429 });
}

#[tokio::test]
async fn test_nominatim_error_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "Unable to geocode"})))
        .mount(&server)
        .await;

    let err = geocoder_for(&server).reverse(LatLng::new(0.0, 0.0)).await.expect_err("error body");
    assert!(matches!(err, GeocodeError::Parse { .. }));
}

#[tokio::test]
async fn test_address_book_hits_network_once_within_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"display_name": "Somewhere"})))
        .expect(1)
        .mount(&server)
        .await;

    let book = AddressBook::new(Arc::new(geocoder_for(&server)), Duration::from_secs(30));
    for _ in 0..3 {
        let state = book.lookup("A::7", LatLng::new(52.1, 19.2)).await;
        assert!(matches!(state, AddressState::Resolved(ref r) if r.display_name.as_deref() == Some("Somewhere")));
    }
}
