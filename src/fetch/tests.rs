//! Orchestrator tests over the scripted transport

use super::*;
use crate::constants::geo::KM_PER_DEGREE_LAT;
use crate::geo::{Coordinates, GeoPoint};
use crate::geometry::{encode_line_string, ByteOrder};
use crate::transport::{HttpResponse, StubTransport, TransportError};
use crate::trail::Difficulty;
use std::time::Duration;

const MONTSERRAT: &str = include_str!("../../tests/fixtures/results_montserrat.html");
const EMPTY: &str = include_str!("../../tests/fixtures/results_empty.html");
const UNKNOWN_LAYOUT: &str = include_str!("../../tests/fixtures/results_unknown_layout.html");
const DETAIL: &str = include_str!("../../tests/fixtures/trail_detail.html");

const BASE: &str = "http://stub.test";

fn test_config() -> Config {
    let mut config = Config::default();
    config.service.base_url = BASE.to_string();
    config
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        backoff: Duration::from_millis(1),
        timeout: Duration::from_millis(500),
    }
}

fn fetcher(stub: &StubTransport, config: &Config) -> TrailFetcher<StubTransport> {
    TrailFetcher::new(stub.clone(), config).with_policy(fast_policy())
}

/// Results page listing `ids` as cards
fn results_page(ids: &[&str]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li class="trail-card" data-trail-id="{id}"><a class="trail-title" href="/t/{id}">Trail {id}</a></li>"#
            )
        })
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", cards)
}

/// Two-point WKB line centred on (lat, lng)
fn line_at(lat: f64, lng: f64) -> Vec<u8> {
    encode_line_string(
        &[GeoPoint::new(lat - 0.001, lng), GeoPoint::new(lat + 0.001, lng)],
        ByteOrder::LittleEndian,
    )
}

fn line() -> Vec<u8> {
    line_at(41.6, 1.8)
}

fn search_url(fetcher: &TrailFetcher<StubTransport>, query: &SearchQuery, page: u32) -> String {
    fetcher.builder().build_page(query, page).unwrap().url()
}

fn geometry_url(fetcher: &TrailFetcher<StubTransport>, id: &str) -> String {
    fetcher.builder().geometry_request(id).url()
}

fn ids(outcome: &SearchOutcome) -> Vec<&str> {
    outcome.result.trails.iter().map(|t| t.external_id()).collect()
}

#[tokio::test]
async fn test_montserrat_search_skips_corrupt_card() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("Montserrat");

    stub.html(search_url(&fetcher, &query, 1), MONTSERRAT);
    stub.bytes(geometry_url(&fetcher, "1408223"), line());
    stub.bytes(geometry_url(&fetcher, "2219874"), line());

    let outcome = fetcher.search(&query).await.unwrap();

    assert_eq!(ids(&outcome), ["1408223", "2219874"]);
    assert_eq!(outcome.candidates, 2);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].stage, WarningStage::Parse);
    assert_eq!(outcome.result.trails[0].title(), "Montserrat - Sant Jeroni");
    assert_eq!(outcome.result.trails[0].path.len(), 2);
}

#[tokio::test]
async fn test_failed_candidates_are_isolated() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("sierra");

    stub.html(search_url(&fetcher, &query, 1), &results_page(&["a", "b", "c", "d", "e"]));
    stub.bytes(geometry_url(&fetcher, "a"), line());
    stub.bytes(geometry_url(&fetcher, "b"), vec![9, 9, 9]);
    stub.bytes(geometry_url(&fetcher, "c"), line());
    stub.respond(geometry_url(&fetcher, "d"), HttpResponse::new(503, "busy"));
    stub.bytes(geometry_url(&fetcher, "e"), line());

    let outcome = fetcher.search(&query).await.unwrap();

    assert_eq!(ids(&outcome), ["a", "c", "e"]);
    assert_eq!(outcome.warnings.len(), 2);
    assert!(outcome.warnings.iter().all(|w| w.stage == WarningStage::Geometry));
    assert_eq!(outcome.warnings[0].external_id.as_deref(), Some("b"));
    assert_eq!(outcome.warnings[0].kind, ErrorKind::MalformedGeometry);
    assert_eq!(outcome.warnings[1].kind, ErrorKind::UpstreamUnavailable);
    // the 503 was retried with the shared policy
    assert_eq!(stub.calls(&geometry_url(&fetcher, "d")), 3);
}

#[tokio::test]
async fn test_zero_results_is_success() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("nowhere");
    stub.html(search_url(&fetcher, &query, 1), EMPTY);

    let outcome = fetcher.search(&query).await.unwrap();

    assert!(outcome.result.is_empty());
    assert_eq!(outcome.candidates, 0);
    assert!(outcome.warnings.is_empty());
    assert_eq!(stub.total_calls(), 1);
}

#[tokio::test]
async fn test_unknown_layout_fails_the_query() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("Montserrat");
    stub.html(search_url(&fetcher, &query, 1), UNKNOWN_LAYOUT);

    let err = fetcher.search(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnparsableResponse);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_every_candidate_failing_fails_the_query() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("sierra");
    stub.html(search_url(&fetcher, &query, 1), &results_page(&["a", "b"]));
    stub.bytes(geometry_url(&fetcher, "a"), vec![1, 2]);
    stub.respond(geometry_url(&fetcher, "b"), HttpResponse::new(500, "oops"));

    let err = fetcher.search(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().contains("all 2 candidate(s)"));
}

#[tokio::test]
async fn test_every_geometry_undecodable_is_unparsable() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("sierra");
    stub.html(search_url(&fetcher, &query, 1), &results_page(&["a", "b"]));
    stub.bytes(geometry_url(&fetcher, "a"), vec![7]);
    stub.bytes(geometry_url(&fetcher, "b"), vec![7]);

    let err = fetcher.search(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnparsableResponse);
}

#[tokio::test]
async fn test_geographic_filter_applied() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let center = Coordinates::new(41.59, 1.83);
    let query = SearchQuery::near(center, 5.0);

    stub.html(search_url(&fetcher, &query, 1), &results_page(&["t9", "t1", "t4"]));
    for (id, km) in [("t9", 9.0), ("t1", 1.0), ("t4", 4.0)] {
        stub.bytes(
            geometry_url(&fetcher, id),
            line_at(center.lat + km / KM_PER_DEGREE_LAT, center.lng),
        );
    }

    let outcome = fetcher.search(&query).await.unwrap();
    assert_eq!(ids(&outcome), ["t1", "t4"]);
    assert_eq!(outcome.candidates, 3);
}

#[tokio::test]
async fn test_order_survives_out_of_order_completion() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("sierra");

    stub.html(search_url(&fetcher, &query, 1), &results_page(&["slow", "mid", "fast"]));
    for (id, delay) in [("slow", 60), ("mid", 20), ("fast", 0)] {
        stub.respond_after(
            geometry_url(&fetcher, id),
            Duration::from_millis(delay),
            HttpResponse::new(200, line()),
        );
    }

    let outcome = fetcher.search(&query).await.unwrap();
    assert_eq!(ids(&outcome), ["slow", "mid", "fast"]);
}

#[tokio::test]
async fn test_fan_out_is_bounded() {
    let stub = StubTransport::new();
    let mut config = test_config();
    config.fetch.concurrency = 3;
    let fetcher = fetcher(&stub, &config);
    let ids_in: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();
    let refs: Vec<&str> = ids_in.iter().map(String::as_str).collect();
    let query = SearchQuery::text("sierra").with_max_results(10);

    stub.html(search_url(&fetcher, &query, 1), &results_page(&refs));
    for id in &refs {
        stub.respond_after(
            geometry_url(&fetcher, id),
            Duration::from_millis(10),
            HttpResponse::new(200, line()),
        );
    }

    let outcome = fetcher.search(&query).await.unwrap();
    assert_eq!(outcome.result.len(), 10);
    assert!(stub.peak_in_flight() <= 3);
    assert!(stub.peak_in_flight() > 1);
}

#[tokio::test]
async fn test_max_results_caps_candidates() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("sierra").with_max_results(2);

    stub.html(search_url(&fetcher, &query, 1), &results_page(&["a", "b", "c"]));
    for id in ["a", "b", "c"] {
        stub.bytes(geometry_url(&fetcher, id), line());
    }

    let outcome = fetcher.search(&query).await.unwrap();
    assert_eq!(ids(&outcome), ["a", "b"]);
    assert_eq!(stub.calls(&geometry_url(&fetcher, "c")), 0);
}

#[tokio::test]
async fn test_pages_are_deduplicated() {
    let stub = StubTransport::new();
    let mut config = test_config();
    config.service.page_size = 2;
    let fetcher = fetcher(&stub, &config);
    let query = SearchQuery::text("sierra").with_max_results(3);

    stub.html(search_url(&fetcher, &query, 1), &results_page(&["a", "b"]));
    stub.html(search_url(&fetcher, &query, 2), &results_page(&["b", "c"]));
    for id in ["a", "b", "c"] {
        stub.bytes(geometry_url(&fetcher, id), line());
    }

    let outcome = fetcher.search(&query).await.unwrap();
    assert_eq!(ids(&outcome), ["a", "b", "c"]);
    assert_eq!(stub.calls(&geometry_url(&fetcher, "b")), 1);
    assert_eq!(stub.calls(&search_url(&fetcher, &query, 3)), 0);
}

#[tokio::test]
async fn test_short_page_stops_pagination() {
    let stub = StubTransport::new();
    let mut config = test_config();
    config.service.page_size = 2;
    let fetcher = fetcher(&stub, &config);
    let query = SearchQuery::text("sierra").with_max_results(5);

    stub.html(search_url(&fetcher, &query, 1), &results_page(&["a", "b"]));
    stub.html(search_url(&fetcher, &query, 2), &results_page(&["c"]));
    for id in ["a", "b", "c"] {
        stub.bytes(geometry_url(&fetcher, id), line());
    }

    let outcome = fetcher.search(&query).await.unwrap();
    assert_eq!(outcome.result.len(), 3);
    assert_eq!(stub.calls(&search_url(&fetcher, &query, 3)), 0);
}

#[tokio::test]
async fn test_later_page_failure_keeps_earlier_results() {
    let stub = StubTransport::new();
    let mut config = test_config();
    config.service.page_size = 2;
    let fetcher = fetcher(&stub, &config);
    let query = SearchQuery::text("sierra").with_max_results(4);

    stub.html(search_url(&fetcher, &query, 1), &results_page(&["a", "b"]));
    stub.respond(search_url(&fetcher, &query, 2), HttpResponse::new(503, "busy"));
    for id in ["a", "b"] {
        stub.bytes(geometry_url(&fetcher, id), line());
    }

    let outcome = fetcher.search(&query).await.unwrap();
    assert_eq!(ids(&outcome), ["a", "b"]);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].stage, WarningStage::Parse);
    assert_eq!(outcome.warnings[0].kind, ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_search_server_error_is_retried_then_fails() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("sierra");
    let url = search_url(&fetcher, &query, 1);
    stub.respond(url.clone(), HttpResponse::new(502, "bad gateway"));

    let err = fetcher.search(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.is_retryable());
    assert_eq!(stub.calls(&url), 3);
}

#[tokio::test]
async fn test_search_transport_failure_recovers() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("nowhere");
    let url = search_url(&fetcher, &query, 1);
    stub.fail(url.clone(), TransportError::Connect("reset".into()))
        .html(url.clone(), EMPTY);

    let outcome = fetcher.search(&query).await.unwrap();
    assert!(outcome.result.is_empty());
    assert_eq!(stub.calls(&url), 2);
}

#[tokio::test]
async fn test_rejected_search_is_invalid_query() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("sierra");
    let url = search_url(&fetcher, &query, 1);
    stub.respond(url.clone(), HttpResponse::new(400, "bad"));

    let err = fetcher.search(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidQuery);
    assert_eq!(stub.calls(&url), 1);
}

#[tokio::test]
async fn test_invalid_query_never_touches_network() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let mut query = SearchQuery::text("sierra");
    query.radius_km = Some(5.0);

    let err = fetcher.search(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidQuery);
    assert_eq!(stub.total_calls(), 0);
}

#[tokio::test]
async fn test_cancellation_discards_everything() {
    let stub = StubTransport::new();
    let fetcher = TrailFetcher::new(stub.clone(), &test_config()).with_policy(RetryPolicy {
        max_retries: 0,
        backoff: Duration::from_millis(1),
        timeout: Duration::from_secs(10),
    });
    let query = SearchQuery::text("sierra");
    stub.respond_after(
        search_url(&fetcher, &query, 1),
        Duration::from_secs(5),
        HttpResponse::new(200, results_page(&["a"])),
    );

    let cancel = tokio::time::sleep(Duration::from_millis(20));
    let err = fetcher.search_cancellable(&query, cancel).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(stub.calls(&geometry_url(&fetcher, "a")), 0);
}

#[tokio::test]
async fn test_uncancelled_search_completes() {
    let stub = StubTransport::new();
    let fetcher = fetcher(&stub, &test_config());
    let query = SearchQuery::text("nowhere");
    stub.html(search_url(&fetcher, &query, 1), EMPTY);

    let outcome = fetcher
        .search_cancellable(&query, std::future::pending())
        .await
        .unwrap();
    assert!(outcome.result.is_empty());
}

#[tokio::test]
async fn test_detail_stats_are_attached() {
    let stub = StubTransport::new();
    let mut config = test_config();
    config.search.fetch_details = true;
    let fetcher = fetcher(&stub, &config);
    let query = SearchQuery::text("sierra");

    stub.html(search_url(&fetcher, &query, 1), &results_page(&["a", "b"]));
    stub.bytes(geometry_url(&fetcher, "a"), line());
    stub.bytes(geometry_url(&fetcher, "b"), line());
    stub.html(fetcher.builder().detail_request("a", &format!("{}/t/a", BASE)).url(), DETAIL);
    // no detail page scripted for "b": the stub answers 404

    let outcome = fetcher.search(&query).await.unwrap();

    assert_eq!(ids(&outcome), ["a", "b"]);
    let stats = outcome.result.trails[0].stats.as_ref().unwrap();
    assert_eq!(stats.difficulty, Some(Difficulty::Moderate));
    assert!(outcome.result.trails[1].stats.is_none());

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].stage, WarningStage::Details);
    assert_eq!(outcome.warnings[0].external_id.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_detail_page_on_foreign_host_is_not_followed() {
    let stub = StubTransport::new();
    let mut config = test_config();
    config.search.fetch_details = true;
    let fetcher = fetcher(&stub, &config);
    let query = SearchQuery::text("sierra");
    let foreign = "http://internal.example/secrets";
    let page = format!(
        r#"<ul><li class="trail-card" data-trail-id="a"><a class="trail-title" href="{foreign}">Trail a</a></li></ul>"#
    );

    stub.html(search_url(&fetcher, &query, 1), &page);
    stub.bytes(geometry_url(&fetcher, "a"), line());
    stub.html(format!("{}/wikiloc/view.do?id=a", BASE), DETAIL);

    let outcome = fetcher.search(&query).await.unwrap();

    assert_eq!(stub.calls(foreign), 0);
    assert!(outcome.warnings.is_empty());
    let stats = outcome.result.trails[0].stats.as_ref().unwrap();
    assert_eq!(stats.difficulty, Some(Difficulty::Moderate));
}

#[test]
fn test_all_failed_classification() {
    let decode_only = all_failed(2, &[ErrorKind::MalformedGeometry, ErrorKind::MalformedGeometry]);
    assert_eq!(decode_only.kind(), ErrorKind::UnparsableResponse);

    let mixed = all_failed(2, &[ErrorKind::MalformedGeometry, ErrorKind::UpstreamUnavailable]);
    assert_eq!(mixed.kind(), ErrorKind::UpstreamUnavailable);
}
